// ABOUTME: GMP over an SSH session channel using russh.
// ABOUTME: Handles host key checks, agent/key/password auth, and channel I/O.

use super::error::{Error, Result};
use super::frame::ResponseFramer;
use super::{Connection, with_timeout};
use async_trait::async_trait;
use russh::client::{self, Config, Handle, Msg};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{check_known_hosts, learn_known_hosts};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{Channel, ChannelMsg, Disconnect};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

/// SSH client handler for russh.
pub(crate) struct SshHandler {
    host: String,
    port: u16,
    trust_on_first_use: bool,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                // Host not in known_hosts
                if self.trust_on_first_use {
                    tracing::warn!(
                        "Trust-On-First-Use: accepting unknown host key for {}:{}",
                        self.host,
                        self.port
                    );
                    if let Err(e) = learn_known_hosts(&self.host, self.port, server_public_key) {
                        tracing::warn!("Failed to save host key to known_hosts: {}", e);
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::error!("Host key for {}:{} has changed", self.host, self.port);
                Ok(false)
            }
            Err(_) => Ok(self.trust_on_first_use),
        }
    }
}

/// Authentication method resolved before connecting.
enum AuthMethod {
    Agent(AgentClient<UnixStream>),
    KeyFile(Arc<ssh_key::PrivateKey>),
    Password,
}

/// Where and how to log in. Kept apart from the live session so it can be
/// moved into the connect future.
#[derive(Debug, Clone)]
struct SshTarget {
    host: String,
    port: u16,
    user: String,
    trust_on_first_use: bool,
}

/// GMP over the stdin/stdout of an SSH exec channel.
pub struct SshConnection {
    target: SshTarget,
    timeout: Option<Duration>,
    session: Option<Handle<SshHandler>>,
    channel: Option<Channel<Msg>>,
}

impl std::fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnection")
            .field("target", &self.target)
            .field("session", &self.session.as_ref().map(|_| "<russh::Handle>"))
            .finish()
    }
}

impl SshConnection {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            target: SshTarget {
                host: host.into(),
                port: 22,
                user: user.into(),
                trust_on_first_use: false,
            },
            timeout: None,
            session: None,
            channel: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.target.port = port;
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.target.trust_on_first_use = tofu;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SshTarget {
    /// Pick the agent, then default key files, then password.
    async fn resolve_auth_method(&self) -> Result<AuthMethod> {
        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(AuthMethod::Agent(agent));
        }

        if let Ok(home) = std::env::var("HOME") {
            let default_keys = [
                format!("{}/.ssh/id_ed25519", home),
                format!("{}/.ssh/id_rsa", home),
                format!("{}/.ssh/id_ecdsa", home),
            ];
            for key_path in &default_keys {
                if let Ok(key) = load_secret_key(key_path, None) {
                    return Ok(AuthMethod::KeyFile(Arc::new(key)));
                }
            }
        }

        tracing::debug!("No SSH agent or key found; falling back to password auth");
        Ok(AuthMethod::Password)
    }

    async fn authenticate(
        &self,
        session: &mut Handle<SshHandler>,
        auth_method: AuthMethod,
    ) -> Result<bool> {
        match auth_method {
            AuthMethod::Agent(mut agent) => {
                let keys = agent.request_identities().await.map_err(|e| {
                    Error::AgentUnavailable(format!("failed to list agent keys: {}", e))
                })?;

                for key in &keys {
                    match session
                        .authenticate_publickey_with(&self.user, key.clone(), None, &mut agent)
                        .await
                    {
                        Ok(result) if result.success() => return Ok(true),
                        _ => continue,
                    }
                }
                self.authenticate_password(session).await
            }
            AuthMethod::KeyFile(key) => {
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(Error::Protocol)?
                    .flatten();

                let result = session
                    .authenticate_publickey(&self.user, PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await
                    .map_err(Error::Protocol)?;

                if result.success() {
                    Ok(true)
                } else {
                    self.authenticate_password(session).await
                }
            }
            AuthMethod::Password => self.authenticate_password(session).await,
        }
    }

    /// The GMP account has no SSH password of its own; an empty one is tried last.
    async fn authenticate_password(&self, session: &mut Handle<SshHandler>) -> Result<bool> {
        let result = session
            .authenticate_password(&self.user, "")
            .await
            .map_err(Error::Protocol)?;
        Ok(result.success())
    }

    async fn open(self) -> Result<(Handle<SshHandler>, Channel<Msg>)> {
        let auth_method = self.resolve_auth_method().await?;

        // The console may sit idle for a long time between commands.
        let russh_config = Config {
            inactivity_timeout: None,
            ..Default::default()
        };

        let handler = SshHandler {
            host: self.host.clone(),
            port: self.port,
            trust_on_first_use: self.trust_on_first_use,
        };

        let mut session = client::connect(
            Arc::new(russh_config),
            (self.host.as_str(), self.port),
            handler,
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("Connection refused") {
                Error::Connection(format!("connection refused to {}:{}", self.host, self.port))
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        if !self.authenticate(&mut session, auth_method).await? {
            return Err(Error::AuthenticationFailed);
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| Error::Connection(format!("failed to open channel: {}", e)))?;

        // gvmd is the login shell of the GMP user; an empty command attaches to it.
        channel
            .exec(true, "")
            .await
            .map_err(|e| Error::Connection(format!("failed to start GMP channel: {}", e)))?;

        Ok((session, channel))
    }
}

#[async_trait]
impl Connection for SshConnection {
    async fn connect(&mut self) -> Result<()> {
        let (session, channel) = with_timeout(self.timeout, self.target.clone().open()).await?;
        self.session = Some(session);
        self.channel = Some(channel);
        Ok(())
    }

    async fn send(&mut self, data: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, async {
            channel.data(data.as_bytes()).await.map_err(Error::Protocol)
        })
        .await
    }

    async fn read(&mut self) -> Result<String> {
        let channel = self.channel.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, async {
            let mut framer = ResponseFramer::new();
            loop {
                match channel.wait().await {
                    Some(ChannelMsg::Data { data }) => {
                        if framer.push(&data) {
                            return Ok(framer.finish());
                        }
                    }
                    Some(ChannelMsg::ExtendedData { data, ext }) if ext == 1 => {
                        tracing::debug!("gvmd stderr: {}", String::from_utf8_lossy(&data));
                    }
                    Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                        return Err(if framer.is_empty() {
                            Error::ChannelClosed
                        } else {
                            Error::ClosedMidResponse
                        });
                    }
                    Some(_) => {}
                }
            }
        })
        .await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            let _ = channel.eof().await;
        }
        if let Some(session) = self.session.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "en")
                .await
                .map_err(Error::Protocol)?;
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!(
            "ssh://{}@{}:{}",
            self.target.user, self.target.host, self.target.port
        )
    }
}
