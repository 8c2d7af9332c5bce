use log::{info, warn};
use std::{fmt::Display, process::Command};

#[derive(Debug, PartialEq)]
pub enum ShutdownError {
    SpawnFailed(String),
    CommandFailed(String),
}

impl Display for ShutdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&match self {
            ShutdownError::SpawnFailed(msg) => format!("failed to run shutdown command: {}", msg),
            ShutdownError::CommandFailed(msg) => format!("shutdown command failed: {}", msg),
        })
    }
}

impl std::error::Error for ShutdownError {}

/// Asks the host to power off. Nothing meaningful comes back on success since
/// the process is expected to be torn down shortly after.
pub trait ShutdownTrigger {
    fn shutdown(&mut self) -> Result<(), ShutdownError>;
}

pub struct SystemShutdown {
    command: Vec<String>,
    sync_command: Vec<String>,
}

impl SystemShutdown {
    pub fn new(command: Vec<String>) -> Self {
        SystemShutdown {
            command,
            sync_command: vec!["sync".to_string()],
        }
    }

    /// Replaces the command run before powering off. An empty command skips the step.
    pub fn with_sync_command(mut self, sync_command: Vec<String>) -> Self {
        self.sync_command = sync_command;
        self
    }
}

fn run(command: &[String]) -> Result<(), ShutdownError> {
    let (program, args) = match command.split_first() {
        Some(split) => split,
        None => return Err(ShutdownError::SpawnFailed("no shutdown command configured".to_string())),
    };

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| ShutdownError::SpawnFailed(format!("{}: {}", program, e)))?;

    if !status.success() {
        return Err(ShutdownError::CommandFailed(format!("{} exited with {}", program, status)));
    }

    Ok(())
}

impl ShutdownTrigger for SystemShutdown {
    fn shutdown(&mut self) -> Result<(), ShutdownError> {
        if self.command.is_empty() {
            return Err(ShutdownError::SpawnFailed("no shutdown command configured".to_string()));
        }

        // flush filesystem buffers first, the power may go away before the init system does it
        if !self.sync_command.is_empty() {
            if let Err(e) = run(&self.sync_command) {
                warn!("Failed to sync filesystems before shutdown: {}", e);
            }
        }

        info!("Requesting host shutdown: {}", self.command.join(" "));
        run(&self.command)
    }
}
