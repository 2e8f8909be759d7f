//! Chart renderer subprocess
//!
//! Runs Helm v2's `helm template` and buffers its whole stdout. Stderr is
//! inherited so the renderer's own messages reach the user unchanged.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{CliError, Result};

/// Invocation of the chart renderer
#[derive(Debug, Clone)]
pub struct Renderer {
    program: PathBuf,
}

impl Renderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to the renderer for one chart
    pub fn args(name: &str, namespace: &str, values: &Path, chart: &Path) -> Vec<OsString> {
        vec![
            "template".into(),
            "--name".into(),
            name.into(),
            "--namespace".into(),
            namespace.into(),
            "--values".into(),
            values.into(),
            chart.into(),
        ]
    }

    /// Render a chart, returning the manifest stream
    pub fn render(&self, name: &str, namespace: &str, values: &Path, chart: &Path) -> Result<String> {
        tracing::debug!(
            program = %self.program.display(),
            chart = %chart.display(),
            "running chart renderer"
        );

        let output = Command::new(&self.program)
            .args(Self::args(name, namespace, values, chart))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            // Killed by a signal: no status to forward
            let status = output.status.code().unwrap_or(1);
            return Err(CliError::Renderer {
                status,
                message: format!("`{}` exited with {}", self.program.display(), output.status),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| CliError::input("renderer output is not valid UTF-8"))
    }

    fn spawn_error(&self, err: std::io::Error) -> CliError {
        if err.kind() == ErrorKind::NotFound {
            CliError::io_with_help(
                format!("renderer `{}` not found", self.program.display()),
                "install Helm v2 or point --helm (or CHART2SLS_HELM) at the binary",
            )
        } else {
            CliError::from(err)
        }
    }
}
