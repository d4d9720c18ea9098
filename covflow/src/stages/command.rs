//! External command actions.

use super::StageAction;
use crate::core::ActionOutcome;
use crate::trigger::TriggerContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// A stage action that invokes an external command.
///
/// The command inherits the trigger context's environment (overlaid on the
/// parent process environment so tool resolution keeps working), runs in an
/// optional working directory, and has stdout and stderr captured. Success is
/// a zero exit status; the runner knows nothing else about the command.
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    extra_env: HashMap<String, String>,
}

impl CommandAction {
    /// Creates an action for the given program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            extra_env: HashMap::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a command-specific environment variable on top of the context
    /// environment.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    /// Renders the command line for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[async_trait]
impl StageAction for CommandAction {
    async fn run(&self, ctx: &TriggerContext) -> ActionOutcome {
        debug!(command = %self.command_line(), "Spawning stage command");

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .envs(ctx.env())
            .envs(&self.extra_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        match cmd.output().await {
            Ok(out) => {
                let mut captured = String::from_utf8_lossy(&out.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&out.stderr);
                if !stderr.is_empty() {
                    if !captured.is_empty() && !captured.ends_with('\n') {
                        captured.push('\n');
                    }
                    captured.push_str(&stderr);
                }

                if out.status.success() {
                    ActionOutcome::success(captured)
                } else {
                    ActionOutcome::failure_with_output(
                        format!("'{}' exited with {}", self.program, out.status),
                        captured,
                    )
                }
            }
            Err(err) => {
                ActionOutcome::failure(format!("Failed to spawn '{}': {err}", self.program))
            }
        }
    }
}
