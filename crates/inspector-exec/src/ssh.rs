//! SSH command execution using russh crate

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::agent::client::AgentClient;
use russh::keys::{PrivateKeyWithHashAlg, check_known_hosts, ssh_key};
use russh::{ChannelMsg, Disconnect, Sig, client};
use tracing::{debug, info, instrument};

use crate::credentials::{AuthMethod, Credentials};
use crate::error::ExecError;
use crate::result::{CommandResult, ExitState, HostKeyPolicy, SshOptions};
use crate::traits::{Connector, RemoteSession};

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            // StrictHostKeyChecking=no
            HostKeyPolicy::AcceptAny => Ok(true),
            HostKeyPolicy::KnownHosts => {
                match check_known_hosts(&self.host, self.port, server_public_key) {
                    Ok(known) => {
                        if !known {
                            debug!(host = %self.host, "server key not in known_hosts");
                        }
                        Ok(known)
                    }
                    Err(e) => {
                        debug!(host = %self.host, error = %e, "server key rejected");
                        Ok(false)
                    }
                }
            }
        }
    }
}

/// Opens authenticated SSH sessions
///
/// Holds the process-wide credentials and connection options; cheap to share
/// between host tasks.
#[derive(Debug, Clone)]
pub struct SshConnector {
    options: SshOptions,
    credentials: Arc<Credentials>,
}

impl SshConnector {
    /// Create a connector offering `credentials` to every host
    pub fn new(options: SshOptions, credentials: Arc<Credentials>) -> Self {
        Self {
            options,
            credentials,
        }
    }

    /// Try every credential in order until one is accepted
    async fn authenticate(
        &self,
        host: &str,
        session: &mut client::Handle<SshClientHandler>,
    ) -> Result<(), ExecError> {
        let user = &self.options.user;
        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        let mut failures = Vec::new();

        for method in self.credentials.methods() {
            let outcome = match method {
                AuthMethod::Agent { socket } => {
                    authenticate_with_agent(session, user, socket, hash_alg).await
                }
                AuthMethod::Key { key, .. } => session
                    .authenticate_publickey(
                        user,
                        PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
                    )
                    .await
                    .map(|res| res.success())
                    .map_err(|e| e.to_string()),
            };

            match outcome {
                Ok(true) => {
                    debug!(host, method = method.kind(), "authenticated");
                    return Ok(());
                }
                Ok(false) => failures.push(format!("{} rejected", method.kind())),
                Err(e) => failures.push(format!("{}: {e}", method.kind())),
            }
        }

        if failures.is_empty() {
            failures.push("no authentication method available".to_string());
        }
        Err(ExecError::AuthenticationFailed(failures.join("; ")))
    }
}

async fn authenticate_with_agent(
    session: &mut client::Handle<SshClientHandler>,
    user: &str,
    socket: &std::path::Path,
    hash_alg: Option<ssh_key::HashAlg>,
) -> Result<bool, String> {
    let mut agent = AgentClient::connect_uds(socket)
        .await
        .map_err(|e| format!("failed to connect to agent: {e}"))?;
    let identities = agent
        .request_identities()
        .await
        .map_err(|e| format!("failed to list agent identities: {e}"))?;

    for identity in identities {
        match session
            .authenticate_publickey_with(user, identity, hash_alg, &mut agent)
            .await
        {
            Ok(res) if res.success() => return Ok(true),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "agent identity failed"),
        }
    }

    Ok(false)
}

#[async_trait]
impl Connector for SshConnector {
    #[instrument(skip(self), fields(port = self.options.port, user = %self.options.user))]
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteSession>, ExecError> {
        if host.trim().is_empty() {
            return Err(ExecError::InvalidHost(host.to_string()));
        }

        info!(host, "connecting to SSH");

        let config = Arc::new(client::Config::default());
        let handler = SshClientHandler {
            host: host.to_string(),
            port: self.options.port,
            policy: self.options.host_key_policy,
        };

        let mut session = client::connect(config, (host, self.options.port), handler)
            .await
            .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        if let Err(e) = self.authenticate(host, &mut session).await {
            // best effort, the handle is dropped either way
            let _ = session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            return Err(e);
        }

        info!(host, "SSH connected and authenticated");

        Ok(Box::new(SshSession {
            host: host.to_string(),
            session: Some(session),
        }))
    }

    fn transport(&self) -> &'static str {
        "ssh"
    }
}

/// One authenticated SSH connection
///
/// Dropping it tears the connection down; [`RemoteSession::close`] does so
/// politely.
pub struct SshSession {
    host: String,
    session: Option<client::Handle<SshClientHandler>>,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.host)
            .field("connected", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    #[instrument(skip(self), fields(host = %self.host))]
    async fn run(&mut self, cmd: &str) -> Result<CommandResult, ExecError> {
        let session = self.session.as_mut().ok_or(ExecError::NotConnected)?;

        debug!(command = %cmd, "executing remote command");

        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::SessionOpen(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::SessionOpen(e.to_string()))?;

        let mut capture = Capture::default();

        // exit-status may arrive after EOF, so drain until the channel closes
        while let Some(msg) = channel.wait().await {
            if capture.apply(msg).is_break() {
                break;
            }
        }

        let result = capture.finish(start.elapsed());

        debug!(
            command = %cmd,
            exit = ?result.exit,
            duration = ?result.duration,
            "remote command completed"
        );

        Ok(result)
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        if let Some(session) = self.session.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?;
            info!(host = %self.host, "SSH disconnected");
        }
        Ok(())
    }
}

/// Output and exit state gathered from one exec channel
#[derive(Debug, Default)]
struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit: Option<ExitState>,
}

impl Capture {
    /// Fold one channel message in; breaks once the channel is closed
    fn apply(&mut self, msg: ChannelMsg) -> ControlFlow<()> {
        match msg {
            ChannelMsg::Data { data } => self.stdout.extend_from_slice(&data),
            // ext 1 is stderr; it never reaches the column value
            ChannelMsg::ExtendedData { data, ext: 1 } => self.stderr.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status } => self.exit = Some(ExitState::Code(exit_status)),
            ChannelMsg::ExitSignal {
                signal_name,
                error_message,
                ..
            } => {
                self.exit = Some(ExitState::Signal {
                    name: signal_label(&signal_name),
                    message: error_message,
                });
            }
            ChannelMsg::Close => return ControlFlow::Break(()),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn finish(self, duration: Duration) -> CommandResult {
        CommandResult {
            exit: self.exit.unwrap_or(ExitState::Missing),
            stdout: String::from_utf8_lossy(&self.stdout).to_string(),
            stderr: String::from_utf8_lossy(&self.stderr).to_string(),
            duration,
        }
    }
}

/// Signal name without the `SIG` prefix, as sent on the wire
fn signal_label(sig: &Sig) -> String {
    match sig {
        Sig::Custom(name) => name.clone(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> SshConnector {
        SshConnector::new(SshOptions::default(), Arc::new(Credentials::from_methods(vec![])))
    }

    #[tokio::test]
    async fn test_empty_host_is_rejected() {
        let err = connector().connect("  ").await.unwrap_err();
        assert!(matches!(err, ExecError::InvalidHost(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_fails_to_connect() {
        // bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = SshConnector::new(
            SshOptions::default().with_port(port),
            Arc::new(Credentials::from_methods(vec![])),
        );
        let err = connector.connect("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, ExecError::ConnectionFailed(_)));
    }

    #[tokio::test]
    #[ignore = "requires SSH server"]
    async fn test_ssh_round_trip() {
        let creds = Credentials::resolve(&crate::CredentialSources::from_env(&[]))
            .await
            .unwrap();
        let connector = SshConnector::new(SshOptions::default(), Arc::new(creds));
        let mut session = connector.connect("localhost").await.unwrap();
        let result = session.run("echo hello").await.unwrap();
        assert_eq!(result.stdout.trim_end(), "hello");
        session.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires SSH server and a running agent"]
    async fn test_agent_round_trip() {
        let socket = std::env::var_os("SSH_AUTH_SOCK").unwrap();
        let creds = Credentials::from_methods(vec![AuthMethod::Agent {
            socket: socket.into(),
        }]);
        let connector = SshConnector::new(SshOptions::default(), Arc::new(creds));
        let mut session = connector.connect("localhost").await.unwrap();
        let result = session.run("true").await.unwrap();
        assert_eq!(result.exit, ExitState::Code(0));
        session.close().await.unwrap();
    }

    fn data(bytes: &[u8]) -> ChannelMsg {
        ChannelMsg::Data {
            data: russh::CryptoVec::from_slice(bytes),
        }
    }

    fn drain(messages: Vec<ChannelMsg>) -> (CommandResult, usize) {
        let mut capture = Capture::default();
        let mut consumed = 0;
        for msg in messages {
            consumed += 1;
            if capture.apply(msg).is_break() {
                break;
            }
        }
        (capture.finish(Duration::ZERO), consumed)
    }

    #[test]
    fn test_exit_status_after_eof_is_kept() {
        let (result, consumed) = drain(vec![
            data(b"up 3 days\n"),
            ChannelMsg::Eof,
            ChannelMsg::ExitStatus { exit_status: 3 },
            ChannelMsg::Close,
        ]);

        assert_eq!(consumed, 4);
        assert_eq!(result.stdout, "up 3 days\n");
        assert_eq!(result.exit, ExitState::Code(3));
        assert_eq!(
            result.failure_detail().as_deref(),
            Some("Process exited with status 3")
        );
    }

    #[test]
    fn test_close_stops_the_fold() {
        let (result, consumed) = drain(vec![
            data(b"a"),
            ChannelMsg::Close,
            data(b"late"),
        ]);

        assert_eq!(consumed, 2);
        assert_eq!(result.stdout, "a");
    }

    #[test]
    fn test_exit_signal_is_mapped() {
        let (result, _) = drain(vec![
            ChannelMsg::ExitSignal {
                signal_name: Sig::KILL,
                core_dumped: false,
                error_message: "oom".to_string(),
                lang_tag: String::new(),
            },
            ChannelMsg::Close,
        ]);

        assert_eq!(
            result.exit,
            ExitState::Signal {
                name: "KILL".to_string(),
                message: "oom".to_string(),
            }
        );
        assert_eq!(
            result.failure_detail().as_deref(),
            Some("Process exited with status 137 from signal KILL. Reason: oom")
        );
    }

    #[test]
    fn test_custom_signal_name_is_verbatim() {
        assert_eq!(signal_label(&Sig::Custom("XCPU".to_string())), "XCPU");
        assert_eq!(signal_label(&Sig::TERM), "TERM");
    }

    #[test]
    fn test_close_without_status_is_missing() {
        let (result, _) = drain(vec![data(b"partial"), ChannelMsg::Eof, ChannelMsg::Close]);

        assert_eq!(result.exit, ExitState::Missing);
        assert!(!result.success());
    }

    #[test]
    fn test_stderr_is_kept_apart() {
        let (result, _) = drain(vec![
            data(b"out\n"),
            ChannelMsg::ExtendedData {
                data: russh::CryptoVec::from_slice(b"warning\n"),
                ext: 1,
            },
            ChannelMsg::ExitStatus { exit_status: 0 },
            ChannelMsg::Close,
        ]);

        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "warning\n");
        assert_eq!(result.failure_detail(), None);
    }
}
