//! Daemon process control: where the socket and pid file live, whether a
//! daemon answers, and stopping it.
//!
//! CHANGELOG:
//! - 20/10/2026 - Split out of the daemon binary

use anyhow::{bail, Context, Result};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Socket and pid file of one daemon instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    pub socket: PathBuf,
    pub pid_file: PathBuf,
}

impl DaemonPaths {
    /// Expand `~` in `socket`; the pid file sits next to it as `<socket>.pid`.
    pub fn resolve(socket: &str) -> Self {
        let socket = shellexpand::tilde(socket).into_owned();
        let pid_file = PathBuf::from(format!("{}.pid", socket));
        Self {
            socket: PathBuf::from(socket),
            pid_file,
        }
    }

    /// Create the socket's parent directory.
    pub fn prepare(&self) -> Result<()> {
        if let Some(parent) = self.socket.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }
        Ok(())
    }

    /// Pid recorded at start. Only positive pids are accepted.
    pub fn read_pid(&self) -> Result<i32> {
        let content = std::fs::read_to_string(&self.pid_file).with_context(|| {
            format!("No pid file at {:?} (is the daemon running?)", self.pid_file)
        })?;
        let pid: i32 = content
            .trim()
            .parse()
            .with_context(|| format!("Malformed pid file: {:?}", self.pid_file))?;
        if pid <= 0 {
            bail!("Refusing pid {} from {:?}", pid, self.pid_file);
        }
        Ok(pid)
    }

    /// Whether something accepts connections on the socket.
    pub fn is_running(&self) -> bool {
        UnixStream::connect(&self.socket).is_ok()
    }

    /// Send SIGTERM to the recorded pid and remove the socket and pid file.
    pub fn stop(&self) -> Result<i32> {
        let pid = self.read_pid()?;

        // SAFETY: kill(2) on a positive pid read from our own pid file.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            warn!(pid, "SIGTERM failed, process may already be gone");
        }

        remove_if_present(&self.pid_file);
        remove_if_present(&self.socket);
        Ok(pid)
    }
}

fn remove_if_present(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = ?path, error = %e, "could not remove daemon file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    fn scratch(name: &str) -> DaemonPaths {
        let dir = std::env::temp_dir().join(format!(
            "namematch-control-{}-{}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        DaemonPaths::resolve(&dir.join(name).to_string_lossy())
    }

    #[test]
    fn test_resolve() {
        let paths = DaemonPaths::resolve("/run/nm/daemon.sock");
        assert_eq!(paths.socket, PathBuf::from("/run/nm/daemon.sock"));
        assert_eq!(paths.pid_file, PathBuf::from("/run/nm/daemon.sock.pid"));

        let home = DaemonPaths::resolve("~/x.sock");
        assert!(!home.socket.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_read_pid() {
        let paths = scratch("d.sock");
        assert!(paths.read_pid().is_err());

        paths.prepare().unwrap();
        std::fs::write(&paths.pid_file, "1234\n").unwrap();
        assert_eq!(paths.read_pid().unwrap(), 1234);

        std::fs::write(&paths.pid_file, "abc").unwrap();
        assert!(paths.read_pid().is_err());

        // 0 and -1 would signal a whole process group
        std::fs::write(&paths.pid_file, "0").unwrap();
        assert!(paths.read_pid().is_err());
        std::fs::write(&paths.pid_file, "-1").unwrap();
        assert!(paths.read_pid().is_err());
        assert!(paths.stop().is_err());
        assert!(paths.pid_file.exists());
    }

    #[test]
    fn test_is_running() {
        let paths = scratch("d.sock");
        assert!(!paths.is_running());

        paths.prepare().unwrap();
        let _listener = UnixListener::bind(&paths.socket).unwrap();
        assert!(paths.is_running());
    }

    #[test]
    fn test_stop_signals_and_cleans_up() {
        let paths = scratch("d.sock");
        paths.prepare().unwrap();

        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        std::fs::write(&paths.pid_file, child.id().to_string()).unwrap();
        std::fs::write(&paths.socket, "").unwrap();

        assert_eq!(paths.stop().unwrap(), child.id() as i32);
        assert!(!child.wait().unwrap().success());
        assert!(!paths.pid_file.exists());
        assert!(!paths.socket.exists());
    }
}
