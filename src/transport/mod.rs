// ABOUTME: Connections that carry GMP bytes: SSH channel, TLS socket, Unix socket.
// ABOUTME: Exposes one Connection trait and a factory keyed by ConnectionConfig.

mod error;
mod frame;
mod socket;
mod ssh;
mod tls;

pub use error::{Error, Result};
pub use frame::ResponseFramer;
pub use socket::UnixSocketConnection;
pub use ssh::SshConnection;
pub use tls::TlsConnection;

use crate::config::ConnectionConfig;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_BUFFER_SIZE: usize = 65536;

/// A byte stream to gvmd. Connecting is explicit so the client can defer it
/// until the first command.
#[async_trait]
pub trait Connection: Send {
    async fn connect(&mut self) -> Result<()>;

    /// Write one command.
    async fn send(&mut self, data: &str) -> Result<()>;

    /// Read exactly one response.
    async fn read(&mut self) -> Result<String>;

    async fn disconnect(&mut self) -> Result<()>;

    /// Endpoint description for display, e.g. `tls://host:9390`.
    fn endpoint(&self) -> String;
}

/// Build the connection for the selected transport. Nothing is opened yet.
pub fn open(config: &ConnectionConfig) -> Box<dyn Connection> {
    tracing::debug!("Using {} transport to {}", config.kind(), config.endpoint());
    match config {
        ConnectionConfig::Ssh {
            hostname,
            port,
            ssh_user,
            timeout,
        } => Box::new(
            SshConnection::new(hostname, ssh_user)
                .port(*port)
                .timeout(*timeout)
                .trust_on_first_use(true),
        ),
        ConnectionConfig::Tls {
            hostname,
            port,
            certfile,
            keyfile,
            cafile,
            timeout,
            ..
        } => Box::new(TlsConnection::new(
            hostname.clone(),
            *port,
            certfile.clone(),
            keyfile.clone(),
            cafile.clone(),
            *timeout,
        )),
        ConnectionConfig::Socket { path, timeout } => {
            Box::new(UnixSocketConnection::new(path.clone(), *timeout))
        }
    }
}

/// Run `fut`, bounded by `timeout` when one is set.
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(limit)),
        },
        None => fut.await,
    }
}

/// Read from an async stream until one response is complete.
pub(crate) async fn read_response<S>(stream: &mut S) -> Result<String>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut framer = ResponseFramer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::ClosedMidResponse);
        }
        if framer.push(&buf[..n]) {
            return Ok(framer.finish());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn read_response_stops_at_root_close() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server.write_all(b"<a status=\"200\">").await.unwrap();
            server.write_all(b"<b/></a>").await.unwrap();
        });

        let response = read_response(&mut client).await.unwrap();
        assert_eq!(response, r#"<a status="200"><b/></a>"#);
    }

    #[tokio::test]
    async fn read_response_fails_on_early_eof() {
        let (mut client, server) = tokio::io::duplex(64);
        drop(server);

        let err = read_response(&mut client).await.unwrap_err();
        assert!(matches!(err, Error::ClosedMidResponse));
    }

    #[tokio::test]
    async fn timeout_is_enforced() {
        let result: Result<()> = with_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[test]
    fn factory_picks_transport_by_config() {
        let socket = open(&ConnectionConfig::Socket {
            path: PathBuf::from("/tmp/gvmd.sock"),
            timeout: None,
        });
        assert_eq!(socket.endpoint(), "unix:///tmp/gvmd.sock");

        let tls = open(&ConnectionConfig::Tls {
            hostname: "gsm".to_string(),
            port: 9390,
            certfile: None,
            keyfile: None,
            cafile: None,
            no_credentials: false,
            timeout: None,
        });
        assert_eq!(tls.endpoint(), "tls://gsm:9390");
    }
}
