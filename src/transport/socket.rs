// ABOUTME: GMP over a local Unix-domain socket.
// ABOUTME: Plain tokio UnixStream; no authentication at the transport layer.

use super::error::{Error, Result};
use super::{Connection, read_response, with_timeout};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

#[derive(Debug)]
pub struct UnixSocketConnection {
    path: PathBuf,
    timeout: Option<Duration>,
    stream: Option<UnixStream>,
}

impl UnixSocketConnection {
    pub fn new(path: PathBuf, timeout: Option<Duration>) -> Self {
        Self {
            path,
            timeout,
            stream: None,
        }
    }
}

#[async_trait]
impl Connection for UnixSocketConnection {
    async fn connect(&mut self) -> Result<()> {
        let stream = with_timeout(self.timeout, async {
            UnixStream::connect(&self.path).await.map_err(|e| {
                Error::Connection(format!("{}: {}", self.path.display(), e))
            })
        })
        .await?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, data: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, async {
            stream.write_all(data.as_bytes()).await?;
            Ok(())
        })
        .await
    }

    async fn read(&mut self) -> Result<String> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        with_timeout(self.timeout, read_response(stream)).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!("unix://{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn round_trip_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvmd.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let n = stream.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"<get_version/>");
            stream
                .write_all(br#"<get_version_response status="200" status_text="OK"><version>22.4</version></get_version_response>"#)
                .await
                .unwrap();
        });

        let mut connection = UnixSocketConnection::new(path, Some(Duration::from_secs(5)));
        connection.connect().await.unwrap();
        connection.send("<get_version/>").await.unwrap();
        let response = connection.read().await.unwrap();
        connection.disconnect().await.unwrap();

        assert!(response.contains("<version>22.4</version>"));
    }

    #[tokio::test]
    async fn missing_socket_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut connection = UnixSocketConnection::new(dir.path().join("absent.sock"), None);
        let err = connection.connect().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn send_before_connect_is_rejected() {
        let mut connection = UnixSocketConnection::new(PathBuf::from("/nonexistent"), None);
        let err = connection.send("<help/>").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
