//! Access to the controller's serial device
//!
//! Commands are plain text lines of the form `<password><port><code>\r\n`. The controller does not
//! acknowledge them, so a successful write only means the kernel accepted the bytes.
//!
//! Only one session may talk to the controller at a time. [ControllerDevice::open] takes an
//! exclusive, non-blocking POSIX record lock (`F_SETLK`) on the whole device, and fails
//! immediately if another process already holds it. This is the same lock `lockf` takes, so the
//! other powerman tools are excluded as well. The lock is held until the device is closed or
//! dropped.
//!
//! Record locks belong to the process: a second [ControllerDevice] opened by the same process does
//! not conflict with the first, and closing either one releases the lock.
use std::{
    fs::{File, OpenOptions},
    io::Write,
    os::fd::AsRawFd,
    path::{Path, PathBuf},
};

use nix::{
    fcntl::{fcntl, FcntlArg},
    libc,
};
use snafu::{ResultExt, Snafu};

use crate::{PortMap, PowerCommand};

/// Path of the serial device the controller is attached to
pub const DEFAULT_DEVICE: &str = "/dev/ttyD23";

/// Errors returned by [ControllerDevice]
#[derive(Debug, Snafu)]
pub enum DeviceError {
    /// The device could not be opened
    #[snafu(display("Unable to access wti control device on port {}", path.display()))]
    Open {
        /// Device path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// Another session holds the device lock
    #[snafu(display("Unable to gain exclusive lock on wti control device on port {}", path.display()))]
    Lock {
        /// Device path
        path: PathBuf,
        /// Error returned by fcntl
        source: nix::Error,
    },
    /// Writing a command failed
    #[snafu(display("Error writing to wti control device on port {}", path.display()))]
    Write {
        /// Device path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// The lock could not be released
    #[snafu(display("Unable to release lock on wti control device on port {}", path.display()))]
    Unlock {
        /// Device path
        path: PathBuf,
        /// Error returned by fcntl
        source: nix::Error,
    },
}

/// Write one command line per known node to `out`
///
/// Nodes are written in the order given. Names which do not appear in `ports` are skipped. Returns
/// the number of command lines written.
pub fn write_commands<W: Write>(
    out: &mut W,
    password: &str,
    ports: &PortMap,
    names: &[String],
    command: PowerCommand,
) -> std::io::Result<usize> {
    let mut count = 0;
    for name in names {
        let Some(port) = ports.port(name) else {
            log::debug!("Skipping unknown node {name:?}");
            continue;
        };
        log::debug!("Sending {command} to node {name} on port {port}");
        write!(out, "{password}{port}{}\r\n", command.code())?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

/// Set or clear a record lock covering the whole file, without waiting
fn set_lock(file: &File, lock_type: libc::c_short) -> nix::Result<()> {
    // A zero length covers the file to its end, however far it grows
    let lock = libc::flock {
        l_type: lock_type,
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: 0,
        l_len: 0,
        l_pid: 0,
    };
    fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&lock)).map(drop)
}

/// An open, exclusively locked controller device
pub struct ControllerDevice {
    file: File,
    path: PathBuf,
    locked: bool,
}

impl core::fmt::Debug for ControllerDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerDevice")
            .field("path", &self.path)
            .field("locked", &self.locked)
            .finish()
    }
}

impl ControllerDevice {
    /// Open the device for reading and writing, and lock it
    ///
    /// Fails with [DeviceError::Open] if the device cannot be opened, or [DeviceError::Lock] if
    /// another process holds the lock. The lock is never waited on.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .context(OpenSnafu { path })?;
        // On failure the file is closed when dropped here
        set_lock(&file, libc::F_WRLCK as libc::c_short).context(LockSnafu { path })?;
        log::debug!("Locked {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            locked: true,
        })
    }

    /// The path of the device
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send `command` to every node in `names` which has a port in `ports`
    ///
    /// Returns the number of commands sent.
    pub fn send_commands(
        &mut self,
        password: &str,
        ports: &PortMap,
        names: &[String],
        command: PowerCommand,
    ) -> Result<usize, DeviceError> {
        write_commands(&mut self.file, password, ports, names, command).context(WriteSnafu {
            path: &self.path,
        })
    }

    /// Release the lock and close the device
    ///
    /// Dropping the device also releases the lock, but ignores any error in doing so.
    pub fn close(mut self) -> Result<(), DeviceError> {
        set_lock(&self.file, libc::F_UNLCK as libc::c_short).context(UnlockSnafu {
            path: &self.path,
        })?;
        self.locked = false;
        log::debug!("Released {}", self.path.display());
        Ok(())
    }
}

impl Drop for ControllerDevice {
    fn drop(&mut self) {
        if self.locked {
            // Closing the file drops the lock in any case
            if let Err(e) = set_lock(&self.file, libc::F_UNLCK as libc::c_short) {
                log::warn!("Failed to unlock {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{BufRead, BufReader, Read},
        process::{Child, ChildStdout, Command, Stdio},
    };

    fn ports() -> PortMap {
        PortMap::load_from_str("a 1\nc 3\n")
    }

    fn names(list: &str) -> Vec<String> {
        list.split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_write_known_nodes_in_order() {
        let mut out = Vec::new();
        let count =
            write_commands(&mut out, "", &ports(), &names("c,b,a"), PowerCommand::Off).unwrap();
        assert_eq!(2, count);
        assert_eq!(b"30\r\n10\r\n".as_slice(), out.as_slice());
    }

    #[test]
    fn test_write_codes_and_password() {
        for (command, expected) in [
            (PowerCommand::On, "pw11\r\n"),
            (PowerCommand::Off, "pw10\r\n"),
            (PowerCommand::Reset, "pw1T\r\n"),
        ] {
            let mut out = Vec::new();
            write_commands(&mut out, "pw", &ports(), &names("a"), command).unwrap();
            assert_eq!(expected, String::from_utf8(out).unwrap());
        }
    }

    #[test]
    fn test_unknown_nodes_only() {
        let mut out = Vec::new();
        let count =
            write_commands(&mut out, "", &ports(), &names("x,y"), PowerCommand::On).unwrap();
        assert_eq!(0, count);
        assert!(out.is_empty());
    }

    #[test]
    fn test_device_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyD23");
        std::fs::write(&path, "").unwrap();

        let mut device = ControllerDevice::open(&path).unwrap();
        assert_eq!(path.as_path(), device.path());
        let count = device
            .send_commands("", &ports(), &names("a,b,c"), PowerCommand::Reset)
            .unwrap();
        assert_eq!(2, count);
        device.close().unwrap();

        assert_eq!("1T\r\n3T\r\n", std::fs::read_to_string(&path).unwrap());
    }

    const HOLD_DEVICE_ENV: &str = "WTI_TEST_HOLD_DEVICE";
    const LOCK_HELD: &str = "wti-test-lock-held";

    /// Holds the device lock from a child process, until released
    struct LockHolder {
        child: Child,
        _stdout: BufReader<ChildStdout>,
    }

    impl LockHolder {
        fn spawn(path: &Path) -> Self {
            let mut child = Command::new(std::env::current_exe().unwrap())
                .args([
                    "--ignored",
                    "--exact",
                    "--nocapture",
                    "--test-threads=1",
                    "device::tests::hold_device_lock",
                ])
                .env(HOLD_DEVICE_ENV, path)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .spawn()
                .unwrap();
            let mut stdout = BufReader::new(child.stdout.take().unwrap());
            let mut line = String::new();
            while stdout.read_line(&mut line).unwrap() > 0 {
                if line.contains(LOCK_HELD) {
                    return Self {
                        child,
                        _stdout: stdout,
                    };
                }
                line.clear();
            }
            panic!("Child exited without locking {}", path.display());
        }

        fn release(mut self) {
            drop(self.child.stdin.take());
            self.child.wait().unwrap();
        }
    }

    /// Run in a child process by [LockHolder]
    #[test]
    #[ignore]
    fn hold_device_lock() {
        let Some(path) = std::env::var_os(HOLD_DEVICE_ENV) else {
            return;
        };
        let _device = ControllerDevice::open(path).unwrap();
        println!("{LOCK_HELD}");
        // Hold until the parent closes our stdin
        std::io::stdin().read_to_end(&mut Vec::new()).unwrap();
    }

    #[test]
    fn test_other_process_holds_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyD23");
        std::fs::write(&path, "").unwrap();

        let holder = LockHolder::spawn(&path);
        let err = ControllerDevice::open(&path).unwrap_err();
        assert!(matches!(err, DeviceError::Lock { .. }));
        assert!(err.to_string().starts_with("Unable to gain exclusive lock"));

        // Once released, the device can be locked again
        holder.release();
        let first = ControllerDevice::open(&path).unwrap();
        first.close().unwrap();
        drop(ControllerDevice::open(&path).unwrap());
        ControllerDevice::open(&path).unwrap();
    }

    #[test]
    fn test_lock_visible_to_other_processes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyD23");
        std::fs::write(&path, "").unwrap();

        let device = ControllerDevice::open(&path).unwrap();

        // The child fails its own open while we hold the lock
        let status = Command::new(std::env::current_exe().unwrap())
            .args([
                "--ignored",
                "--exact",
                "--test-threads=1",
                "device::tests::hold_device_lock",
            ])
            .env(HOLD_DEVICE_ENV, &path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!status.success());

        device.close().unwrap();
    }

    #[test]
    fn test_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let err = ControllerDevice::open(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DeviceError::Open { .. }));
    }
}
