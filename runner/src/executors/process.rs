use super::ExecutorError;
use std::{
    ops::{Deref, DerefMut},
    os::unix::process::ExitStatusExt,
    process::{Child, Command, ExitStatus},
};
use tracing::{debug, error};

/// Child process that is always reaped, waiting on drop if `wait` was never reached
#[derive(Debug)]
pub struct WaitedChild {
    child: Child,
    program: String,
    reaped: bool,
}

impl Drop for WaitedChild {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }

        match self.child.wait() {
            Ok(status) => debug!(program = %self.program, status = ?status, "Reaped child on drop"),
            Err(error) => error!(program = %self.program, error = ?error, "Failed to reap child"),
        }
    }
}

impl WaitedChild {
    pub fn spawn(program: &str, mut command: Command) -> Result<Self, ExecutorError> {
        match command.spawn() {
            Ok(child) => Ok(Self {
                child,
                program: program.to_string(),
                reaped: false,
            }),
            Err(source) => Err(ExecutorError::Spawn {
                program: program.to_string(),
                source,
            }),
        }
    }

    pub fn wait(&mut self) -> Result<ExitStatus, ExecutorError> {
        debug!("Waiting on {} ({})", self.program, self.child.id());

        let status = self.child.wait().map_err(|source| ExecutorError::Wait {
            program: self.program.clone(),
            source,
        })?;
        self.reaped = true;

        Ok(status)
    }
}

impl Deref for WaitedChild {
    type Target = Child;

    fn deref(&self) -> &Self::Target {
        &self.child
    }
}

impl DerefMut for WaitedChild {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.child
    }
}

/// run `command` to completion, any unsuccessful exit is an error
pub fn run_blocking(program: &str, command: Command) -> Result<(), ExecutorError> {
    let mut child = WaitedChild::spawn(program, command)?;
    let status = child.wait()?;

    check_status(program, status)
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), ExecutorError> {
    if status.success() {
        return Ok(());
    }

    match status.code() {
        Some(code) => Err(ExecutorError::Exit {
            program: program.to_string(),
            code,
        }),
        // no exit code on unix means a signal ended the process
        None => Err(ExecutorError::Signal {
            program: program.to_string(),
            signal: status.signal().unwrap_or_default(),
        }),
    }
}
