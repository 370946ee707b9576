//! Alert mailbox and its background dispatcher.
//!
//! The control loop only ever touches the `Mailbox`: a single slot guarded by
//! its own mutex, last write wins. The dispatcher thread drains it on a
//! fixed poll and does the slow transport call with no lock held.
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use tank_traits::{MailTransport, WallClock};

use crate::config::NotifyCfg;
use crate::error::TankError;
use crate::event_log::LogEntry;
use crate::hw_error::map_hw_error;
use crate::telemetry::SharedTank;

/// Coalescing single-slot request box.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slot: Arc<Mutex<Option<String>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message`, replacing any undelivered one. Never blocks on I/O.
    ///
    /// Returns `true` when a pending message was overwritten.
    pub fn post(&self, message: &str) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.replace(message.to_string()).is_some()
    }

    /// Take the pending message and clear the slot in one step.
    pub fn take(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Nothing was pending.
    Idle,
    Sent,
    /// Dropped after one attempt.
    Failed(TankError),
}

/// Mail body: the alert plus the tank state it was sent in.
pub fn compose_body(message: &str, level_pct: f32, pump: &str, time: &str) -> String {
    format!("{message}\nLevel: {level_pct:.1}%\nPump: {pump}\nTime: {time}")
}

/// Drain the mailbox once. Failures are logged and the message is dropped.
pub fn deliver_pending<T, W>(
    mailbox: &Mailbox,
    transport: &mut T,
    wall: &W,
    shared: &SharedTank,
    cfg: &NotifyCfg,
) -> Delivery
where
    T: MailTransport + ?Sized,
    W: WallClock + ?Sized,
{
    let Some(message) = mailbox.take() else {
        return Delivery::Idle;
    };
    let snap = shared.snapshot();
    let now = wall.formatted_time();
    let body = compose_body(&message, snap.level_rounded(), snap.pump.as_str(), &now);
    match transport.send(&cfg.recipient, &cfg.subject, &body) {
        Ok(()) => {
            tracing::info!(message = %message, recipient = %cfg.recipient, "notification sent");
            Delivery::Sent
        }
        Err(e) => {
            let reason = match map_hw_error(e.as_ref()) {
                TankError::Transport(r) | TankError::Hardware(r) => r,
                _ => e.to_string(),
            };
            tracing::warn!(message = %message, reason = %reason, "notification failed");
            shared.append_event(LogEntry::new(&now, &format!("Email failed: {reason}")));
            Delivery::Failed(TankError::Transport(reason))
        }
    }
}

/// Background worker draining a `Mailbox`.
///
/// Dropping the handle stops the worker (after one last drain) and joins it.
pub struct Dispatcher {
    stop_tx: Option<xch::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn spawn<T, W>(
        mailbox: Mailbox,
        mut transport: T,
        wall: W,
        shared: SharedTank,
        cfg: NotifyCfg,
    ) -> Self
    where
        T: MailTransport + Send + 'static,
        W: WallClock + Send + 'static,
    {
        let (stop_tx, stop_rx) = xch::bounded::<()>(1);
        let poll = Duration::from_millis(cfg.poll_ms.max(1));
        let join_handle = std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(poll) {
                    Err(xch::RecvTimeoutError::Timeout) => {
                        deliver_pending(&mailbox, &mut transport, &wall, &shared, &cfg);
                    }
                    Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => break,
                }
            }
            deliver_pending(&mailbox, &mut transport, &wall, &shared, &cfg);
            tracing::trace!("dispatcher thread exiting");
        });
        Self {
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }

    /// Stop and join now.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("dispatcher thread panicked");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
