//! Node to port configuration file
//!
//! The configuration file maps node names to the controller port each node is plugged into. Each
//! line holds a node name and a port identifier, separated by whitespace:
//!
//! ```text
//! # node   port
//! n1       A1
//! n2       A2
//! ```
//!
//! Lines whose first token starts with `#` are comments. Lines with fewer than two tokens are
//! ignored, as is anything after the second token. When a node appears more than once, the last
//! entry wins.
use std::{
    collections::BTreeMap,
    io::BufRead,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};

use crate::lines::for_each_line;

/// Error returned when loading a configuration file
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// The file could not be opened
    #[snafu(display("Couldn't find configuration file: {}", path.display()))]
    Open {
        /// Path of the file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// The file was opened, but reading it failed
    #[snafu(display("Error reading configuration file {}: {source}", path.display()))]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Mapping from node name to controller port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMap(BTreeMap<String, String>);

impl PortMap {
    /// Read a port map from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<PortMap, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).context(OpenSnafu { path })?;
        Self::load_from_reader(std::io::BufReader::new(file)).context(ReadSnafu { path })
    }

    /// Read a port map from a buffered reader
    ///
    /// Invalid UTF-8 is replaced, so only IO errors fail the load.
    pub fn load_from_reader<R: BufRead>(reader: R) -> Result<PortMap, std::io::Error> {
        let mut map = PortMap::default();
        for_each_line(reader, |line| map.add_line(line))?;
        Ok(map)
    }

    /// Read a port map from a string
    pub fn load_from_str(s: &str) -> PortMap {
        let mut map = PortMap::default();
        for line in s.lines() {
            map.add_line(line);
        }
        map
    }

    fn add_line(&mut self, line: &str) {
        let mut tokens = line.split_whitespace();
        let (Some(name), Some(port)) = (tokens.next(), tokens.next()) else {
            return;
        };
        if name.starts_with('#') {
            return;
        }
        self.insert(name, port);
    }

    /// Add or replace the port for a node
    pub fn insert(&mut self, name: impl Into<String>, port: impl Into<String>) {
        self.0.insert(name.into(), port.into());
    }

    /// Get the port for a node, if the node is known
    pub fn port(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate over all node names, in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of nodes in the map
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no nodes are configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
