// ABOUTME: Minimal GMP client bound to one connection and one response transform.
// ABOUTME: Connects lazily on the first command and disconnects at most once.

mod error;
mod response;
mod transform;

pub use error::GmpError;
pub use response::{Response, escape};
pub use transform::{CheckCommandTransform, RawTransform, Transform};

use crate::transport::Connection;

/// A GMP session.
pub struct Gmp {
    connection: Box<dyn Connection>,
    transform: Box<dyn Transform>,
    connected: bool,
    credentials_enabled: bool,
}

impl std::fmt::Debug for Gmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gmp")
            .field("endpoint", &self.connection.endpoint())
            .field("connected", &self.connected)
            .finish()
    }
}

impl Gmp {
    pub fn new(connection: Box<dyn Connection>, transform: Box<dyn Transform>) -> Self {
        Self {
            connection,
            transform,
            connected: false,
            credentials_enabled: true,
        }
    }

    /// Mark the session as certificate-only. `authenticate` still sends,
    /// but notes the mismatch in the log.
    pub fn without_credentials(mut self) -> Self {
        self.credentials_enabled = false;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn endpoint(&self) -> String {
        self.connection.endpoint()
    }

    async fn ensure_connected(&mut self) -> Result<(), GmpError> {
        if !self.connected {
            tracing::info!("Connecting to {}", self.connection.endpoint());
            self.connection.connect().await?;
            self.connected = true;
        }
        Ok(())
    }

    /// Send raw command XML and return the transformed response.
    pub async fn send_command(&mut self, command: &str) -> Result<Response, GmpError> {
        self.ensure_connected().await?;
        tracing::debug!("Sending command: {}", command);
        self.connection.send(command).await?;
        let raw = self.connection.read().await?;
        tracing::debug!("Received response: {}", raw);
        self.transform.transform(raw)
    }

    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Response, GmpError> {
        if !self.credentials_enabled {
            tracing::info!("Authenticating although --no-credentials was given");
        }
        let command = format!(
            "<authenticate><credentials><username>{}</username><password>{}</password></credentials></authenticate>",
            escape(username),
            escape(password)
        );
        self.send_command(&command).await
    }

    /// Send `<name key="value" .../>`.
    pub async fn command(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<Response, GmpError> {
        let command = build_command(name, attributes)?;
        self.send_command(&command).await
    }

    /// Close the connection if it was opened. Safe to call repeatedly.
    pub async fn disconnect(&mut self) -> Result<(), GmpError> {
        if self.connected {
            self.connected = false;
            tracing::info!("Disconnecting from {}", self.connection.endpoint());
            self.connection.disconnect().await?;
        }
        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn build_command(name: &str, attributes: &[(String, String)]) -> Result<String, GmpError> {
    if !is_identifier(name) {
        return Err(GmpError::InvalidCommand(format!("bad command name '{}'", name)));
    }
    let mut command = format!("<{}", name);
    for (key, value) in attributes {
        if !is_identifier(key) {
            return Err(GmpError::InvalidCommand(format!("bad attribute name '{}'", key)));
        }
        command.push_str(&format!(" {}=\"{}\"", key, escape(value)));
    }
    command.push_str("/>");
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{self, Connection};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        sent: Vec<String>,
        connects: usize,
        disconnects: usize,
    }

    struct Scripted {
        replies: VecDeque<String>,
        log: Arc<Mutex<Log>>,
    }

    #[async_trait]
    impl Connection for Scripted {
        async fn connect(&mut self) -> transport::Result<()> {
            self.log.lock().unwrap().connects += 1;
            Ok(())
        }

        async fn send(&mut self, data: &str) -> transport::Result<()> {
            self.log.lock().unwrap().sent.push(data.to_string());
            Ok(())
        }

        async fn read(&mut self) -> transport::Result<String> {
            self.replies
                .pop_front()
                .ok_or(transport::Error::ClosedMidResponse)
        }

        async fn disconnect(&mut self) -> transport::Result<()> {
            self.log.lock().unwrap().disconnects += 1;
            Ok(())
        }

        fn endpoint(&self) -> String {
            "mock://gvmd".to_string()
        }
    }

    fn client(replies: &[&str]) -> (Gmp, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let connection = Scripted {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            log: log.clone(),
        };
        (
            Gmp::new(Box::new(connection), Box::new(CheckCommandTransform)),
            log,
        )
    }

    #[tokio::test]
    async fn connects_lazily_once() {
        let (mut gmp, log) = client(&[r#"<a status="200"/>"#, r#"<b status="200"/>"#]);
        assert!(!gmp.is_connected());

        gmp.send_command("<a/>").await.unwrap();
        gmp.send_command("<b/>").await.unwrap();

        assert!(gmp.is_connected());
        assert_eq!(log.lock().unwrap().connects, 1);
    }

    #[tokio::test]
    async fn authenticate_escapes_credentials() {
        let (mut gmp, log) = client(&[r#"<authenticate_response status="200"/>"#]);

        gmp.authenticate("admin", "p<&>").await.unwrap();

        assert_eq!(
            log.lock().unwrap().sent[0],
            "<authenticate><credentials><username>admin</username><password>p&lt;&amp;&gt;</password></credentials></authenticate>"
        );
    }

    #[tokio::test]
    async fn authenticate_still_sent_without_credentials() {
        let (gmp, log) = client(&[r#"<authenticate_response status="200"/>"#]);
        let mut gmp = gmp.without_credentials();

        let response = gmp.authenticate("admin", "admin").await.unwrap();

        assert!(response.is_ok());
        assert_eq!(log.lock().unwrap().sent.len(), 1);
    }

    #[tokio::test]
    async fn command_builds_attributes() {
        let (mut gmp, log) = client(&[r#"<get_tasks_response status="200"/>"#]);

        gmp.command(
            "get_tasks",
            &[("filter".to_string(), "name=\"scan\"".to_string())],
        )
        .await
        .unwrap();

        assert_eq!(
            log.lock().unwrap().sent[0],
            r#"<get_tasks filter="name=&quot;scan&quot;"/>"#
        );
    }

    #[tokio::test]
    async fn bad_command_name_is_rejected() {
        let (mut gmp, _) = client(&[]);
        let err = gmp.command("get tasks", &[]).await.unwrap_err();
        assert!(matches!(err, GmpError::InvalidCommand(_)));
    }

    #[tokio::test]
    async fn disconnect_happens_once() {
        let (mut gmp, log) = client(&[r#"<a status="200"/>"#]);
        gmp.send_command("<a/>").await.unwrap();

        gmp.disconnect().await.unwrap();
        gmp.disconnect().await.unwrap();

        assert_eq!(log.lock().unwrap().disconnects, 1);
    }

    #[tokio::test]
    async fn disconnect_without_connect_does_nothing() {
        let (mut gmp, log) = client(&[]);
        gmp.disconnect().await.unwrap();
        assert_eq!(log.lock().unwrap().disconnects, 0);
    }
}
