//! Fire-and-forget program launching.

use super::ToolError;
use log::{debug, warn};
use std::process::{Command, Stdio};

/// Run `command` through `sh -c` without waiting for it.
///
/// The child is detached from our stdio.  A background thread reaps it
/// when it exits so launched programs never linger as zombies.
pub fn spawn(command: &str) -> Result<u32, ToolError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: "sh".into(),
            source,
        })?;
    let pid = child.id();
    debug!("launched {:?} as pid {}", command, pid);

    let command = command.to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!("{:?} exited with {}", command, status),
        Ok(_) => {}
        Err(e) => warn!("waiting for {:?}: {}", command, e),
    });
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    #[test]
    fn spawn_returns_without_waiting() {
        let marker: PathBuf = std::env::temp_dir().join(format!(
            "hyprfeed-launch-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&marker);

        let started = Instant::now();
        let pid = spawn(&format!("sleep 1; touch {}", marker.display())).unwrap();
        assert!(pid > 0);
        assert!(started.elapsed() < Duration::from_secs(1));

        let deadline = Instant::now() + Duration::from_secs(5);
        while !marker.exists() {
            assert!(Instant::now() < deadline, "launched command never ran");
            std::thread::sleep(Duration::from_millis(20));
        }
        let _ = std::fs::remove_file(&marker);
    }
}
