//! Result and connection option types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a remote command terminated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitState {
    /// Exited normally with a status code
    Code(u32),
    /// Terminated by a signal
    Signal {
        /// Signal name as reported by the server
        name: String,
        /// Optional error message sent with the signal
        message: String,
    },
    /// Channel closed without exit status or exit signal
    Missing,
}

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// How the command terminated
    pub exit: ExitState,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit == ExitState::Code(0)
    }

    /// Textual description of the failure, `None` on success
    #[must_use]
    pub fn failure_detail(&self) -> Option<String> {
        if self.success() {
            return None;
        }

        let detail = match &self.exit {
            ExitState::Code(status) => format!("Process exited with status {status}"),
            ExitState::Signal { name, message } => {
                let mut detail = format!(
                    "Process exited with status {} from signal {name}",
                    signal_status(name)
                );
                if !message.is_empty() {
                    detail.push_str(". Reason: ");
                    detail.push_str(message);
                }
                detail
            }
            ExitState::Missing => {
                "wait: remote command exited without exit status or exit signal".to_string()
            }
        };
        Some(detail)
    }
}

/// Signals with a well-known number, named as on the wire
const SIGNALS: [(&str, u32); 13] = [
    ("HUP", 1),
    ("INT", 2),
    ("QUIT", 3),
    ("ILL", 4),
    ("ABRT", 6),
    ("FPE", 8),
    ("KILL", 9),
    ("USR1", 10),
    ("SEGV", 11),
    ("USR2", 12),
    ("PIPE", 13),
    ("ALRM", 14),
    ("TERM", 15),
];

/// Shell-style status for a signal death: 128 plus the signal number
fn signal_status(name: &str) -> u32 {
    128 + SIGNALS
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(0, |(_, number)| *number)
}

/// Name for a signal number, falling back to the number itself
pub(crate) fn signal_name(number: i32) -> String {
    SIGNALS
        .iter()
        .find(|(_, n)| u32::try_from(number).is_ok_and(|number| number == *n))
        .map_or_else(|| number.to_string(), |(name, _)| (*name).to_string())
}

/// Server host key verification policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Accept any server key (no verification)
    #[default]
    AcceptAny,
    /// Require the key to be present in `~/.ssh/known_hosts`
    KnownHosts,
}

/// SSH connection options shared by every host of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshOptions {
    /// Login user (defaults to root)
    #[serde(default = "default_user")]
    pub user: String,
    /// Port (default 22)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host key verification policy
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// Extra private keys tried before the default locations
    #[serde(default)]
    pub identity_files: Vec<String>,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_port() -> u16 {
    22
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            user: default_user(),
            port: default_port(),
            host_key_policy: HostKeyPolicy::default(),
            identity_files: Vec::new(),
        }
    }
}

impl SshOptions {
    /// Set login user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set host key policy
    #[must_use]
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit: ExitState) -> CommandResult {
        CommandResult {
            exit,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_success_has_no_detail() {
        let r = result(ExitState::Code(0));
        assert!(r.success());
        assert_eq!(r.failure_detail(), None);
    }

    #[test]
    fn test_failure_details() {
        assert_eq!(
            result(ExitState::Code(2)).failure_detail().as_deref(),
            Some("Process exited with status 2")
        );
        assert_eq!(
            result(ExitState::Signal {
                name: "KILL".into(),
                message: String::new()
            })
            .failure_detail()
            .as_deref(),
            Some("Process exited with status 137 from signal KILL")
        );
        assert_eq!(
            result(ExitState::Signal {
                name: "XCPU".into(),
                message: "cpu limit".into()
            })
            .failure_detail()
            .as_deref(),
            Some("Process exited with status 128 from signal XCPU. Reason: cpu limit")
        );
        assert!(
            result(ExitState::Missing)
                .failure_detail()
                .unwrap()
                .contains("without exit status")
        );
    }

    #[test]
    fn test_ssh_options_defaults() {
        let opts = SshOptions::default();
        assert_eq!(opts.user, "root");
        assert_eq!(opts.port, 22);
        assert_eq!(opts.host_key_policy, HostKeyPolicy::AcceptAny);

        let opts = opts
            .with_user("admin")
            .with_port(2222)
            .with_host_key_policy(HostKeyPolicy::KnownHosts);
        assert_eq!(opts.user, "admin");
        assert_eq!(opts.port, 2222);
        assert_eq!(opts.host_key_policy, HostKeyPolicy::KnownHosts);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(15), "TERM");
        assert_eq!(signal_name(64), "64");
    }
}
