use std::ffi::{OsStr, OsString};
use std::process::Command;

use tracing::info;

use crate::error::StartupError;

/// The server command that takes over the process once startup has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
}

impl Handoff {
    /// `command` is the full argument vector; the first element is the program.
    pub fn new(command: Vec<OsString>, envs: Vec<(String, String)>) -> Result<Self, StartupError> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| StartupError::config("no server command given to hand off to"))?;

        Ok(Self {
            program,
            args: parts.collect(),
            envs,
        })
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)));
        cmd
    }

    /// Replace the current process image with the server command.
    ///
    /// Only returns if the exec itself failed.
    #[cfg(unix)]
    pub fn exec(self) -> StartupError {
        use std::os::unix::process::CommandExt;

        info!(
            program = %self.program.to_string_lossy(),
            argc = self.args.len(),
            "handoff=exec"
        );
        let source = self.command().exec();
        StartupError::Handoff {
            program: self.program.to_string_lossy().into_owned(),
            source,
        }
    }

    /// Without exec, run the server as a child and mirror its exit status.
    #[cfg(not(unix))]
    pub fn exec(self) -> StartupError {
        info!(
            program = %self.program.to_string_lossy(),
            argc = self.args.len(),
            "handoff=spawn"
        );
        match self.command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(source) => StartupError::Handoff {
                program: self.program.to_string_lossy().into_owned(),
                source,
            },
        }
    }
}
