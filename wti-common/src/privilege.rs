//! Privilege check
//!
//! The controller is shared by every node it powers, so only root is allowed to drive it.
pub use nix::unistd::Uid;
use snafu::{ensure, Snafu};

/// Error returned when the caller may not drive the controller
#[derive(Debug, Snafu)]
pub enum PrivilegeError {
    /// The effective user is not root
    #[snafu(display("You must be root to run this"))]
    NotRoot {
        /// Effective user id of the process
        uid: u32,
    },
}

/// A source of the effective user identity
pub trait Credentials {
    /// Get the effective user id
    fn effective_uid(&self) -> Uid;
}

/// Reads the credentials of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCredentials;

impl Credentials for ProcessCredentials {
    fn effective_uid(&self) -> Uid {
        nix::unistd::geteuid()
    }
}

/// A fixed user id, for running as a known user
#[derive(Debug, Clone, Copy)]
pub struct FixedCredentials(pub Uid);

impl Credentials for FixedCredentials {
    fn effective_uid(&self) -> Uid {
        self.0
    }
}

/// Return an error unless the effective user is root
pub fn require_root<C: Credentials>(credentials: &C) -> Result<(), PrivilegeError> {
    let uid = credentials.effective_uid();
    log::debug!("Effective uid is {uid}");
    ensure!(uid.is_root(), NotRootSnafu { uid: uid.as_raw() });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_allowed() {
        assert!(require_root(&FixedCredentials(Uid::from_raw(0))).is_ok());
    }

    #[test]
    fn test_non_root_rejected() {
        let err = require_root(&FixedCredentials(Uid::from_raw(1000))).unwrap_err();
        assert!(matches!(err, PrivilegeError::NotRoot { uid: 1000 }));
        assert_eq!("You must be root to run this", err.to_string());
    }
}
