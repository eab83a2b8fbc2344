//! Command-line tool for a WTI serial power controller
//!
//! # wti
//!
//! Switches the outlets powering a set of named nodes on, off, or resets them. Node names are
//! mapped to controller ports by a configuration file in the powerman library directory.
//!
//! Usage example: `wti -w n1,n2,n3 reset`
//!
//! The tool must be run as root. Only one instance may drive the controller at a time; a second
//! instance fails immediately rather than waiting for the device.
use std::{io::BufRead, path::PathBuf};

use snafu::{ensure, ResultExt, Snafu};
use wti_common::{
    privilege::{self, Credentials, PrivilegeError},
    ConfigError, ControllerDevice, DeviceError, PortMap,
};

pub mod command;
pub mod options;

pub use command::{parse_cli, quiet_requested, Cli};
pub use options::Options;

/// Fatal errors which end a run
#[derive(Debug, Snafu)]
pub enum Error {
    /// The caller is not allowed to drive the controller
    #[snafu(display("{source}"))]
    Privilege { source: PrivilegeError },
    /// The library directory does not exist
    #[snafu(display("Couldn't find library directory: {}", path.display()))]
    LibraryDir { path: PathBuf },
    /// The configuration file could not be loaded
    #[snafu(display("{source}"))]
    Config { source: ConfigError },
    /// Node names could not be read from stdin
    #[snafu(display("Error reading node names from stdin: {source}"))]
    Stdin { source: std::io::Error },
    /// The controller device could not be used
    #[snafu(display("{source}"))]
    Device { source: DeviceError },
}

impl Error {
    /// The process exit code for this error
    ///
    /// A device which cannot be opened exits with 0, as the script this tool replaced always did.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Device {
                source: DeviceError::Open { .. },
            } => 0,
            _ => 1,
        }
    }
}

/// Carry out a run
///
/// Names for a stdin selection are read from `stdin`. Returns the number of commands written to
/// the controller.
pub fn run<C: Credentials, R: BufRead>(
    options: &Options,
    credentials: &C,
    stdin: R,
) -> Result<usize, Error> {
    log::debug!("Running with {options:?}");
    let selection = options
        .selection
        .clone()
        .read_names(stdin)
        .context(StdinSnafu)?;

    privilege::require_root(credentials).context(PrivilegeSnafu)?;

    ensure!(
        options.library_dir.is_dir(),
        LibraryDirSnafu {
            path: &options.library_dir
        }
    );
    let ports = PortMap::load_from_file(&options.config_file).context(ConfigSnafu)?;
    log::info!(
        "Loaded {} nodes from {}",
        ports.len(),
        options.config_file.display()
    );

    let names = selection.resolve(&ports);
    log::debug!("Fanout {} is not used by this device", options.fanout);

    let mut device = ControllerDevice::open(&options.device).context(DeviceSnafu)?;
    let count = device
        .send_commands(&options.password, &ports, &names, options.command)
        .context(DeviceSnafu)?;
    device.close().context(DeviceSnafu)?;

    log::info!(
        "Sent {} to {count} of {} requested nodes",
        options.command,
        names.len()
    );
    Ok(count)
}
