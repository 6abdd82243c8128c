//! Subprocess execution for the external tools (`swift`, `xcodebuild`).

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Lines of tool output kept in error messages.
const OUTPUT_TAIL_LINES: usize = 20;

/// Builder for one tool invocation.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
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

    /// Run the tool from `cwd`.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run the tool and capture its output.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!("running `{}`", self.display_command());
        cmd.output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))
    }

    /// Run the tool and fail on a non-zero exit.
    ///
    /// The error carries the tail of both streams; `xcodebuild` reports
    /// compile errors on stdout.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            bail!(
                "`{}` failed with exit code {:?}\n{}{}",
                self.display_command(),
                output.status.code(),
                tail(&output.stdout),
                tail(&output.stderr)
            );
        }
        Ok(output)
    }

    /// Run the tool, fail on a non-zero exit, and return stdout as UTF-8.
    pub fn exec_stdout(&self) -> Result<String> {
        let output = self.exec_and_check()?;
        String::from_utf8(output.stdout)
            .with_context(|| format!("`{}` produced non-UTF-8 output", self.display_command()))
    }

    /// The command line, for logs and error messages.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Last [`OUTPUT_TAIL_LINES`] lines of a captured stream.
fn tail(stream: &[u8]) -> String {
    let text = String::from_utf8_lossy(stream);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    let mut out = lines[start..].join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Locate a required tool, failing with a hint when it is not on PATH.
pub fn require_executable(name: &str) -> Result<PathBuf> {
    which::which(name).with_context(|| {
        format!(
            "`{}` not found in PATH\n\
             hint: install the Xcode command line tools",
            name
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_exec_stdout() {
        let stdout = ProcessBuilder::new("echo").arg("hello").exec_stdout().unwrap();
        assert!(stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_reports_output_tail() {
        let script = "for i in $(seq 1 30); do echo line$i; done; exit 3";
        let err = ProcessBuilder::new("sh")
            .args(["-c", script])
            .exec_and_check()
            .unwrap_err()
            .to_string();

        assert!(err.contains("exit code Some(3)"));
        assert!(err.contains("line30"));
        assert!(!err.contains("line10\n"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("xcodebuild").args(["-create-xcframework", "-output", "Out"]);

        assert_eq!(
            pb.display_command(),
            "xcodebuild -create-xcframework -output Out"
        );
    }
}
