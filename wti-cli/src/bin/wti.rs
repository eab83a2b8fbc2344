//! Switch nodes on a WTI serial power controller
use std::process::ExitCode;

use wti_cli::{parse_cli, quiet_requested, Options};
use wti_common::privilege::ProcessCredentials;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("WTI_LOG", "warn")).init();

    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version output is always shown
            if e.use_stderr() && quiet_requested(std::env::args_os()) {
                std::process::exit(e.exit_code());
            }
            e.exit();
        }
    };
    let options = Options::from_env(cli);

    match wti_cli::run(&options, &ProcessCredentials, std::io::stdin().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            if !options.quiet {
                eprintln!("wti: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
