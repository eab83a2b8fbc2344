//! Choosing which nodes a command applies to
use std::io::BufRead;

use crate::{lines::for_each_line, PortMap};

/// The set of nodes a command is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelection {
    /// Every node in the port map
    All,
    /// An explicit list of node names
    List(Vec<String>),
    /// Node names read from standard input, one per line
    Stdin,
}

impl NodeSelection {
    /// Build a selection from a `-w` style argument
    ///
    /// `-` means read names from stdin, anything else is a comma separated list of names.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            NodeSelection::Stdin
        } else {
            NodeSelection::List(arg.split(',').map(str::to_string).collect())
        }
    }

    /// Read the names for a [NodeSelection::Stdin] selection from `reader`, until end of input
    ///
    /// Other selections are returned unchanged.
    pub fn read_names<R: BufRead>(self, reader: R) -> std::io::Result<Self> {
        match self {
            NodeSelection::Stdin => {
                let mut names = Vec::new();
                for_each_line(reader, |name| names.push(name.to_string()))?;
                Ok(NodeSelection::List(names))
            }
            other => Ok(other),
        }
    }

    /// Resolve the selection into an ordered list of node names
    ///
    /// Names are returned whether or not they appear in `ports`; unknown names are skipped when
    /// commands are written. A [NodeSelection::Stdin] selection which has not been read yields no
    /// names.
    pub fn resolve(&self, ports: &PortMap) -> Vec<String> {
        match self {
            NodeSelection::All => ports.names().map(str::to_string).collect(),
            NodeSelection::List(names) => names.clone(),
            NodeSelection::Stdin => Vec::new(),
        }
    }
}

impl Default for NodeSelection {
    fn default() -> Self {
        NodeSelection::List(Vec::new())
    }
}
