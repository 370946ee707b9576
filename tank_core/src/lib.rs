#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tank control logic (hardware-agnostic).
//!
//! All hardware goes through the `tank_traits` collaborator traits
//! (`Ranger`, `Actuator`, `WallClock`, `MailTransport`, `Clock`), so every
//! piece here runs unchanged against the simulator, test mocks or GPIO.
//!
//! ## Architecture
//!
//! - **Sampling**: median-of-N ultrasonic pings with a timeout sentinel (`sampler`)
//! - **Estimation**: distance to percent, EMA smoothed (`level`)
//! - **Control**: LOW/HIGH hysteresis, fill counting (`controller`)
//! - **History**: fixed-capacity ring of actions (`event_log`)
//! - **Telemetry**: one mutex over all observable state, atomic snapshots (`telemetry`)
//! - **Alerts**: coalescing mailbox plus background dispatcher (`notify`)
//! - **Loop**: cadence, actuation ordering and shutdown (`runner`)
//!
//! ## Concurrency
//!
//! The control thread is the only writer of tank state. HTTP handlers take
//! `SharedTank::snapshot()`; the dispatcher thread reads the `Mailbox` and
//! appends failure entries. No critical section performs I/O.

pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod event_log;
pub mod hw_error;
pub mod level;
pub mod mocks;
pub mod notify;
pub mod runner;
pub mod sampler;
pub mod status;
pub mod telemetry;
pub mod text;
pub mod util;

pub use config::{ControlCfg, LevelCfg, LoopCfg, NotifyCfg, SamplerCfg};
pub use controller::{ControlEvent, Decision, PumpController};
pub use error::{Report, Result, TankError};
pub use event_log::{EventLog, LOG_CAPACITY, LogEntry};
pub use level::{LevelEstimator, instant_level};
pub use notify::{Delivery, Dispatcher, Mailbox, deliver_pending};
pub use runner::{BOOT_ACTION, ControlLoop, CycleOutcome};
pub use sampler::{DistanceSampler, OUT_OF_RANGE_CM};
pub use status::{PumpStatus, TankStatus};
pub use telemetry::{NEVER_FILLED, SharedTank, TelemetrySnapshot};
