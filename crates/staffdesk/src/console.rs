//! Terminal host: stdin lines are activity, notices go to stdout

use staffdesk_api::{NoticeKind, SessionNotice};
use staffdesk_host_api::{
    ActivityEvent, ActivityKind, ActivitySource, HostError, HostResult, SessionSignals,
};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Treats every line read from stdin as one qualifying interaction.
///
/// A line naming an interaction kind (`pointer`, `scroll`, ...) is
/// reported as that kind; anything else counts as a key press.
#[derive(Default)]
pub struct StdinActivitySource {
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl StdinActivitySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySource for StdinActivitySource {
    fn attach(&self) -> HostResult<mpsc::UnboundedReceiver<ActivityEvent>> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| HostError::Unavailable("stdin reader lock poisoned".into()))?;
        if reader.is_some() {
            return Err(HostError::AlreadyAttached);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *reader = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let kind = line.parse().unwrap_or(ActivityKind::Key);
                        if tx.send(ActivityEvent::new(kind)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        }));

        Ok(rx)
    }

    fn detach(&self) {
        match self.reader.lock() {
            Ok(mut reader) => {
                if let Some(handle) = reader.take() {
                    handle.abort();
                }
            }
            Err(_) => warn!("stdin reader lock poisoned, leaving reader running"),
        }
    }
}

/// Prints notices and announces termination
pub struct ConsoleSignals;

impl SessionSignals for ConsoleSignals {
    fn notify(&self, notice: SessionNotice) {
        let tag = match notice.kind {
            NoticeKind::Warning => "warning",
            NoticeKind::Expired => "expired",
        };
        println!("[{}] {}", tag, notice.message);
    }

    fn terminate(&self) {
        println!("Logged out.");
    }
}
