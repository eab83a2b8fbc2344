use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use std::{ffi::OsString, path::PathBuf};
use wti_common::PowerCommand;

/// Switch nodes on a WTI serial power controller
#[derive(Debug, Parser)]
#[command(name = "wti", args_override_self = true)]
pub struct Cli {
    /// on/off/reset all nodes
    #[arg(short = 'a')]
    pub all: bool,
    /// configuration file (default: <ldir>/etc/wti.conf)
    #[arg(
        short = 'c',
        value_name = "conf",
        value_hint = clap::ValueHint::FilePath,
        allow_hyphen_values = true
    )]
    pub config: Option<PathBuf>,
    /// fanout for parallelism (default: 256 where implemented)
    #[arg(short = 'f', value_name = "fan", allow_hyphen_values = true)]
    pub fanout: Option<String>,
    /// powerman library directory (default: /usr/lib/powerman)
    #[arg(
        short = 'l',
        value_name = "ldir",
        value_hint = clap::ValueHint::DirPath,
        allow_hyphen_values = true
    )]
    pub library_dir: Option<PathBuf>,
    /// be quiet about any errors that may have occurred
    #[arg(short = 'q')]
    pub quiet: bool,
    /// comma separated list of nodes, or '-' to read nodes from stdin, one per line
    #[arg(short = 'w', value_name = "node,...", allow_hyphen_values = true)]
    pub nodes: Option<String>,
    /// action to apply to the nodes
    #[arg(value_enum, default_value_t = Action::On)]
    pub action: Action,
}

impl Cli {
    /// Returns true if any flag was given
    pub fn has_options(&self) -> bool {
        self.all
            || self.config.is_some()
            || self.fanout.is_some()
            || self.library_dir.is_some()
            || self.quiet
            || self.nodes.is_some()
    }
}

/// The power action requested on the command line
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum Action {
    /// turn on nodes
    On,
    /// turn off nodes
    Off,
    /// reset nodes
    Reset,
}

impl From<Action> for PowerCommand {
    fn from(value: Action) -> Self {
        match value {
            Action::On => PowerCommand::On,
            Action::Off => PowerCommand::Off,
            Action::Reset => PowerCommand::Reset,
        }
    }
}

/// Parse command line arguments
///
/// At least one flag is required; a bare command is rejected with a usage error.
pub fn parse_cli<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    if !cli.has_options() {
        return Err(Cli::command().error(
            ErrorKind::MissingRequiredArgument,
            "provide a list of nodes",
        ));
    }
    Ok(cli)
}

/// Check raw arguments for the quiet flag
///
/// Used to decide whether to print a usage error when the arguments as a whole could not be
/// parsed. Short flags may be grouped, e.g. `-aq`.
pub fn quiet_requested<I, T>(args: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into).skip(1);
    while let Some(arg) = args.next() {
        let Some(arg) = arg.to_str() else {
            continue;
        };
        if arg == "--" {
            break;
        }
        let Some(flags) = arg.strip_prefix('-') else {
            continue;
        };
        if flags.starts_with('-') {
            continue;
        }
        for (i, flag) in flags.char_indices() {
            match flag {
                'q' => return true,
                // The rest of the group, or the next argument, is this flag's value
                'c' | 'f' | 'l' | 'w' => {
                    if i + 1 == flags.len() {
                        args.next();
                    }
                    break;
                }
                _ => (),
            }
        }
    }
    false
}
