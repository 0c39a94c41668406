//! Container-runtime engine adapter.
//!
//! Drives a running Lean container through the runtime CLI (`docker` or a
//! compatible one such as `podman`): `cp` for file transfer, `exec` for the
//! launcher and for artifact search.

use crate::domain::error::LeanboxError;
use crate::domain::invocation::InvocationParams;
use crate::ports::config_port::ConfigPort;
use crate::ports::engine_port::{EngineExit, EnginePort};
use std::path::Path;
use std::process::{Command, Output, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerEngine {
    pub runtime: String,
    pub container: String,
    /// Launcher working directory inside the container.
    pub working_dir: String,
    pub launcher: String,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            container: "lean_engine".to_string(),
            working_dir: "/Lean/Launcher/bin/Debug".to_string(),
            launcher: "QuantConnect.Lean.Launcher.dll".to_string(),
        }
    }
}

impl DockerEngine {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        Self {
            runtime: config.get_string_or("engine", "runtime", &defaults.runtime),
            container: config.get_string_or("engine", "container", &defaults.container),
            working_dir: config.get_string_or("engine", "working_dir", &defaults.working_dir),
            launcher: config.get_string_or("engine", "launcher", &defaults.launcher),
        }
    }

    fn in_container(&self, path: &str) -> String {
        format!("{}:{}", self.container, path)
    }

    pub fn copy_in_command(&self, src: &Path, dst: &str) -> Command {
        let mut cmd = Command::new(&self.runtime);
        cmd.arg("cp").arg(src).arg(self.in_container(dst));
        cmd
    }

    pub fn copy_out_command(&self, src: &str, dst: &Path) -> Command {
        let mut cmd = Command::new(&self.runtime);
        cmd.arg("cp").arg(self.in_container(src)).arg(dst);
        cmd
    }

    pub fn launch_command(&self, params: &InvocationParams) -> Command {
        let mut cmd = Command::new(&self.runtime);
        cmd.args(["exec", "-w", self.working_dir.as_str(), self.container.as_str()])
            .args(["dotnet", self.launcher.as_str()])
            .args(["--algorithm-type-name", params.type_name.as_str()])
            .args(["--algorithm-language", params.language.as_str()])
            .args(["--algorithm-location", params.location.as_str()]);
        cmd
    }

    pub fn find_command(&self, root: &str, extensions: &[String]) -> Command {
        let mut cmd = Command::new(&self.runtime);
        cmd.args(["exec", self.container.as_str(), "find", root, "-type", "f", "("]);
        for (i, ext) in extensions.iter().enumerate() {
            if i > 0 {
                cmd.arg("-o");
            }
            cmd.arg("-name").arg(format!("*.{ext}"));
        }
        cmd.arg(")");
        cmd
    }

    /// Run to completion with captured output; non-zero exit is an error.
    fn run_captured(&self, mut cmd: Command) -> Result<Output, LeanboxError> {
        let rendered = render(&cmd);
        tracing::debug!(command = %rendered, "running engine command");
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.unavailable(e))?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(LeanboxError::EngineCommand {
                command: rendered,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn unavailable(&self, err: std::io::Error) -> LeanboxError {
        LeanboxError::EngineUnavailable {
            runtime: self.runtime.clone(),
            reason: err.to_string(),
        }
    }
}

impl EnginePort for DockerEngine {
    fn transfer_file(&self, src: &Path, dst: &str) -> Result<(), LeanboxError> {
        self.run_captured(self.copy_in_command(src, dst)).map(|_| ())
    }

    fn invoke(&self, params: &InvocationParams) -> Result<EngineExit, LeanboxError> {
        let mut cmd = self.launch_command(params);
        tracing::debug!(command = %render(&cmd), "launching engine");
        // Engine output streams straight to the operator's terminal.
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.unavailable(e))?;
        Ok(EngineExit {
            code: status.code(),
        })
    }

    fn find_files(&self, root: &str, extensions: &[String]) -> Result<Vec<String>, LeanboxError> {
        let output = self.run_captured(self.find_command(root, extensions))?;
        Ok(parse_find_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn copy_out(&self, src: &str, dst: &Path) -> Result<(), LeanboxError> {
        self.run_captured(self.copy_out_command(src, dst)).map(|_| ())
    }
}

pub fn parse_find_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn render(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
