//! Subprocess-backed [`Transport`].
//!
//! [`CommandTransport`] spawns a program with its stdout piped and hands the
//! pipe to the event bridge.  The reader owns the child: when the listener
//! drops it the child is killed and reaped, so a finished bridge never leaves
//! a zombie or a blocked pipeline behind.

use crate::traits::{Transport, TransportError};
use log::debug;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Spawns `program args…` and streams its stdout line by line.
///
/// stderr is discarded and stdin is closed.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    program: String,
    args: Vec<String>,
}

impl CommandTransport {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Run `script` through `sh -c`, e.g. a pipeline.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh", ["-c".to_string(), script.into()])
    }

    /// Build a transport from an argv-style list.  `None` if it is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }
}

impl Transport for CommandTransport {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                TransportError::Unavailable(format!("failed to spawn {}: {}", self.program, e))
            })?;
        debug!("spawned {} (pid {})", self.program, child.id());

        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::Unavailable(format!("{}: stdout was not captured", self.program))
        })?;
        Ok(Box::new(ChildReader {
            stdout: BufReader::new(stdout),
            child,
        }))
    }
}

/// Buffered stdout of a child process that owns the child itself.
struct ChildReader {
    stdout: BufReader<ChildStdout>,
    child: Child,
}

impl Read for ChildReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl BufRead for ChildReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.stdout.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.stdout.consume(amt)
    }
}

impl Drop for ChildReader {
    fn drop(&mut self) {
        // Already-exited children make kill() fail; wait() still reaps them.
        let _ = self.child.kill();
        match self.child.wait() {
            Ok(status) => debug!("child {} exited: {}", self.child.id(), status),
            Err(e) => debug!("child {} wait failed: {}", self.child.id(), e),
        }
    }
}

//  Tests
