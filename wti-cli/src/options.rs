//! Run options, resolved once from the command line and environment
use std::{ffi::OsString, path::PathBuf};

use wti_common::{device::DEFAULT_DEVICE, NodeSelection, PowerCommand};

use crate::Cli;

/// Environment variable naming the powerman library directory
pub const POWERMANDIR_ENV: &str = "POWERMANDIR";
/// Library directory used when neither `-l` nor `POWERMANDIR` give one
pub const DEFAULT_LIBRARY_DIR: &str = "/usr/lib/powerman";
/// Configuration file, relative to the library directory
pub const DEFAULT_CONFIG_FILE: &str = "etc/wti.conf";
/// Accepted for compatibility with other powerman tools
pub const DEFAULT_FANOUT: &str = "256";

/// Everything needed to carry out a run
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// The powerman library directory, which must exist
    pub library_dir: PathBuf,
    /// The node to port configuration file
    pub config_file: PathBuf,
    /// Unused, and so not interpreted
    pub fanout: String,
    /// The nodes to command
    pub selection: NodeSelection,
    /// Suppress diagnostic messages
    pub quiet: bool,
    /// The command to send
    pub command: PowerCommand,
    /// Serial device the controller is attached to
    pub device: PathBuf,
    /// Prefix sent before each command
    pub password: String,
}

impl Options {
    /// Build options from parsed arguments and the value of `POWERMANDIR`, if set
    ///
    /// `POWERMANDIR` is ignored unless it names an existing directory. `-l` takes precedence over
    /// it. A relative config file is taken relative to the library directory.
    pub fn from_cli(cli: Cli, powerman_dir: Option<OsString>) -> Self {
        let env_dir = powerman_dir
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        let library_dir = cli
            .library_dir
            .or(env_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR));
        let config_file =
            library_dir.join(cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)));

        let selection = if cli.all {
            NodeSelection::All
        } else {
            cli.nodes
                .as_deref()
                .map(NodeSelection::from_arg)
                .unwrap_or_default()
        };

        Self {
            library_dir,
            config_file,
            fanout: cli.fanout.unwrap_or_else(|| DEFAULT_FANOUT.to_string()),
            selection,
            quiet: cli.quiet,
            command: cli.action.into(),
            device: PathBuf::from(DEFAULT_DEVICE),
            password: String::new(),
        }
    }

    /// Build options from arguments and the process environment
    pub fn from_env(cli: Cli) -> Self {
        Self::from_cli(cli, std::env::var_os(POWERMANDIR_ENV))
    }
}
