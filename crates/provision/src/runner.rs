//! Command execution over a remote channel.
//!
//! `CommandRunner` is the seam between the task graph and the transport:
//! production uses SSH, tests record commands locally.

use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use crate::graph::TaskGraph;
use crate::tasks::Task;
use async_trait::async_trait;
use tracing::info;

/// Executes a single shell command against the target host.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command`, failing on a non-zero exit status.
    async fn run(&self, task: &str, command: &str) -> Result<()>;
}

/// Runs commands on the configured host over `ssh`.
pub struct SshRunner {
    user: String,
    host: String,
    keyfile: String,
}

impl SshRunner {
    /// Builds a runner from the provisioning config.
    ///
    /// # Errors
    ///
    /// Returns an error when no host is configured.
    pub fn from_config(config: &ProvisionConfig) -> Result<Self> {
        let host = config.require_host()?.to_string();
        Ok(Self {
            user: config.user.clone(),
            host,
            keyfile: config.ssh_keyfile.clone(),
        })
    }
}

#[async_trait]
impl CommandRunner for SshRunner {
    async fn run(&self, task: &str, command: &str) -> Result<()> {
        let destination = format!("{}@{}", self.user, self.host);
        let status = tokio::process::Command::new("ssh")
            .args(["-i", &self.keyfile, "-o", "BatchMode=yes", &destination, command])
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::CommandFailed {
                task: task.to_string(),
                command: command.to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Resolves a target task to an execution order and runs it.
pub struct Provisioner<R: CommandRunner> {
    graph: TaskGraph,
    runner: R,
}

impl<R: CommandRunner> Provisioner<R> {
    /// Creates a provisioner over the full task registry.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            graph: TaskGraph::registry(),
            runner,
        }
    }

    /// Returns the tasks that running `target` would execute, in order.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tasks or dependency cycles.
    pub fn plan(&self, target: &str) -> Result<Vec<&'static Task>> {
        self.graph.execution_order(target)
    }

    /// Runs `target` and all of its prerequisites.
    ///
    /// Commands run strictly in order; the first failure aborts the run,
    /// leaving later tasks untouched.
    ///
    /// # Errors
    ///
    /// Returns the planning error or the first command failure.
    pub async fn run(&self, target: &str) -> Result<()> {
        let order = self.plan(target)?;
        for task in &order {
            info!(task = task.name, commands = task.commands.len(), "Running provisioning task");
            for command in task.commands {
                self.runner.run(task.name, command).await?;
            }
        }
        info!(target, tasks = order.len(), "Provisioning complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, task: &str, command: &str) -> Result<()> {
            if self.fail_on == Some(command) {
                return Err(ProvisionError::CommandFailed {
                    task: task.to_string(),
                    command: command.to_string(),
                    status: 1,
                });
            }
            self.commands.lock().unwrap().push(command.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_prerequisite_commands_before_target_commands() {
        let provisioner = Provisioner::new(RecordingRunner::default());
        provisioner.run("install-vim").await.unwrap();

        let commands = provisioner.runner.commands.lock().unwrap();
        assert_eq!(commands.last().unwrap(), "apt-get install -y vim-nox");
        assert!(commands.iter().any(|c| c == "apt-get update"));
        assert!(
            commands.iter().position(|c| c == "apt-get update").unwrap()
                < commands.iter().position(|c| c.contains("vim-nox")).unwrap()
        );
    }

    #[tokio::test]
    async fn first_command_failure_aborts_the_run() {
        let runner = RecordingRunner {
            fail_on: Some("apt-get update"),
            ..RecordingRunner::default()
        };
        let provisioner = Provisioner::new(runner);

        let err = provisioner.run("install-vim").await.unwrap_err();
        assert!(matches!(err, ProvisionError::CommandFailed { .. }));
        // Nothing past the failing command ran.
        assert!(provisioner
            .runner
            .commands
            .lock()
            .unwrap()
            .iter()
            .all(|c| !c.contains("vim-nox")));
    }

    #[test]
    fn ssh_runner_requires_a_host() {
        let config = ProvisionConfig::default();
        assert!(SshRunner::from_config(&config).is_err());
    }
}
