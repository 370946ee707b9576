//! Host-side collaborators: wall-clock formatting and mail delivery.
use chrono::{FixedOffset, Offset, Utc};
use tank_traits::{BoxError, MailTransport, WallClock};

use crate::error::HwError;

/// HH:MM:SS at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemWallClock {
    offset: FixedOffset,
}

impl SystemWallClock {
    /// Out-of-range offsets fall back to UTC.
    pub fn new(utc_offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| {
            tracing::warn!(utc_offset_secs, "invalid UTC offset, using UTC");
            Utc.fix()
        });
        Self { offset }
    }
}

impl Default for SystemWallClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl WallClock for SystemWallClock {
    fn formatted_time(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// Mail transport that writes each message to the log instead of a server.
///
/// `offline()` builds one that refuses every send, for exercising the
/// failure path end to end.
#[derive(Debug, Default)]
pub struct LogTransport {
    offline: bool,
    sent: u64,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            sent: 0,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl MailTransport for LogTransport {
    fn send(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), BoxError> {
        if self.offline {
            return Err(Box::new(HwError::Transport("no connectivity".into())));
        }
        self.sent += 1;
        tracing::info!(recipient, subject, body, "mail delivered (log transport)");
        Ok(())
    }
}
