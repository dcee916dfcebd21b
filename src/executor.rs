use crate::error::{Error, Result};
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// An external interpreter that reads a program on stdin.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpreter {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for Interpreter {
    /// `R --no-save --quiet`
    fn default() -> Self {
        Interpreter {
            command: "R".to_string(),
            args: vec!["--no-save".to_string(), "--quiet".to_string()],
        }
    }
}

/// What a successful run produced. The output is not interpreted.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub status: ExitStatus,
    /// Captured stdout followed by captured stderr.
    pub output: String,
}

impl Interpreter {
    /// An interpreter invoked with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Interpreter {
            command: command.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn spawn_error(&self, source: io::Error) -> Error {
        Error::Spawn {
            command: self.command.clone(),
            source,
        }
    }

    /// Run `program` in a fresh interpreter process and wait for it.
    ///
    /// Blocks until the process exits. A non-zero exit is
    /// [`Error::ExternalExecution`] carrying the submitted program.
    pub fn run(&self, program: &str) -> Result<ExecutionOutput> {
        tracing::debug!(command = %self.command, args = ?self.args, "spawning interpreter");
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Feed stdin from another thread so a chatty interpreter cannot fill
        // its output pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = format!("{}\n", program);
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let out = child.wait_with_output().map_err(|e| self.spawn_error(e))?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The process may exit without reading all of its input.
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(self.spawn_error(e)),
                Err(_) => return Err(self.spawn_error(io::Error::other("stdin writer panicked"))),
            }
        }

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        if !out.status.success() {
            return Err(Error::ExternalExecution {
                status: out.status,
                program: program.to_string(),
                output,
            });
        }
        Ok(ExecutionOutput {
            status: out.status,
            output,
        })
    }
}
