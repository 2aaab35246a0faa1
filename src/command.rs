//! External tool invocation
//!
//! Each FreeSurfer step is a blocking subprocess call described by a
//! [`ToolCommand`]. Callers go through the [`CommandRunner`] trait so the
//! extraction pipeline can be driven by a scripted runner in tests.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A program name plus its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status and captured streams of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Short human-readable failure reason.
    pub fn failure_reason(&self) -> String {
        let status = match self.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// Runs a [`ToolCommand`] to completion.
///
/// An `Err` means the process could not be started at all; a non-zero exit
/// is reported through [`CommandOutput::status`].
pub trait CommandRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Spawns real subprocesses and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Binary names of the FreeSurfer tools used for surface extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSurferTools {
    pub binarize: String,
    pub pretess: String,
    pub marching_cubes: String,
    pub convert: String,
}

impl Default for FreeSurferTools {
    fn default() -> Self {
        Self {
            binarize: "mri_binarize".to_string(),
            pretess: "mri_pretess".to_string(),
            marching_cubes: "mri_mc".to_string(),
            convert: "mris_convert".to_string(),
        }
    }
}

impl FreeSurferTools {
    /// `mri_binarize --i <volume> --match <codes...> --o <mask>`
    pub fn binarize(&self, volume: &Path, codes: &[u32], mask: &Path) -> ToolCommand {
        ToolCommand::new(&self.binarize)
            .arg("--i")
            .arg(volume)
            .arg("--match")
            .args(codes.iter().map(|c| c.to_string()))
            .arg("--o")
            .arg(mask)
    }

    /// `mri_pretess <mask> <label> <norm> <output>`
    pub fn pretess(&self, mask: &Path, label_value: u32, norm: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.pretess)
            .arg(mask)
            .arg(label_value.to_string())
            .arg(norm)
            .arg(output)
    }

    /// `mri_mc <mask> <label> <surface>`
    pub fn marching_cubes(&self, mask: &Path, label_value: u32, surface: &Path) -> ToolCommand {
        ToolCommand::new(&self.marching_cubes)
            .arg(mask)
            .arg(label_value.to_string())
            .arg(surface)
    }

    /// `mris_convert <surface> <output>`
    pub fn convert(&self, surface: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.convert).arg(surface).arg(output)
    }

    pub fn programs(&self) -> [&str; 4] {
        [
            self.binarize.as_str(),
            self.pretess.as_str(),
            self.marching_cubes.as_str(),
            self.convert.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_command_line() {
        let tools = FreeSurferTools::default();
        let cmd = tools.binarize(Path::new("/s/mri/aseg.mgz"), &[11, 12, 26], Path::new("/d/m.mgz"));
        assert_eq!(
            cmd.to_string(),
            "mri_binarize --i /s/mri/aseg.mgz --match 11 12 26 --o /d/m.mgz"
        );
    }

    #[test]
    fn test_pretess_and_mc_command_lines() {
        let tools = FreeSurferTools::default();
        let mask = Path::new("m.mgz");
        assert_eq!(
            tools.pretess(mask, 1, Path::new("norm.mgz"), mask).to_string(),
            "mri_pretess m.mgz 1 norm.mgz m.mgz"
        );
        assert_eq!(
            tools.marching_cubes(mask, 1, Path::new("m.surf")).to_string(),
            "mri_mc m.mgz 1 m.surf"
        );
        assert_eq!(
            tools.convert(Path::new("m.surf"), Path::new("m.vtk")).to_string(),
            "mris_convert m.surf m.vtk"
        );
    }

    #[test]
    fn test_failure_reason() {
        assert_eq!(CommandOutput::failure(2, "  bad input\n").failure_reason(), "exit status 2: bad input");
        assert_eq!(CommandOutput::failure(1, "").failure_reason(), "exit status 1");
        let killed = CommandOutput { status: None, ..CommandOutput::default() };
        assert_eq!(killed.failure_reason(), "terminated by signal");
        assert!(CommandOutput::success().is_success());
    }

    #[test]
    fn test_system_runner_missing_program() {
        let cmd = ToolCommand::new("brainprint-definitely-not-a-real-binary");
        assert!(SystemRunner.run(&cmd).is_err());
    }
}
