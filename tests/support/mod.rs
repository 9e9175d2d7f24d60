// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted GMP connection, scripted console input, and tracing setup.

use async_trait::async_trait;
use gvm_shell::shell::{LineReader, ReadOutcome};
use gvm_shell::transport::{self, Connection};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("gvm_shell=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// What a [`MockConnection`] saw.
#[derive(Debug, Default)]
pub struct ConnectionLog {
    pub connects: usize,
    pub disconnects: usize,
    pub sent: Vec<String>,
}

/// Connection that answers each command with the next canned reply.
pub struct MockConnection {
    replies: VecDeque<String>,
    log: Arc<Mutex<ConnectionLog>>,
}

impl MockConnection {
    #[allow(dead_code)]
    pub fn new(replies: &[&str]) -> (Self, Arc<Mutex<ConnectionLog>>) {
        let log = Arc::new(Mutex::new(ConnectionLog::default()));
        let connection = Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            log: log.clone(),
        };
        (connection, log)
    }
}

#[async_trait]
impl Connection for MockConnection {
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

/// Console input fed from a fixed list of lines, then end of input.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    pub reads: usize,
}

impl ScriptedInput {
    #[allow(dead_code)]
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            reads: 0,
        }
    }
}

#[async_trait]
impl LineReader for ScriptedInput {
    async fn read_line(&mut self, _prompt: &str) -> io::Result<ReadOutcome> {
        self.reads += 1;
        Ok(self
            .lines
            .pop_front()
            .map(ReadOutcome::Line)
            .unwrap_or(ReadOutcome::Eof))
    }
}
