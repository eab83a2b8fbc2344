//! Common functionality for driving a WTI serial power controller.
//!
//! The pieces here are shared by the `wti` command line tool, and can be used directly by anything
//! else that needs to switch outlets on the controller:
//!
//! - A [PortMap], loaded from the two-column node/port configuration file
//! - [PowerCommand], the on/off/reset codes understood by the controller
//! - [NodeSelection], describing which nodes a run applies to
//! - A [ControllerDevice], which holds an exclusive lock on the serial device while commands are
//!   written
//! - A [privilege] check, since the controller is a shared device which only root may drive
#![warn(missing_docs, missing_debug_implementations)]

pub mod command;
pub mod device;
mod lines;
pub mod port_map;
pub mod privilege;
pub mod selection;

pub use command::PowerCommand;
pub use device::{write_commands, ControllerDevice, DeviceError};
pub use port_map::{ConfigError, PortMap};
pub use selection::NodeSelection;
