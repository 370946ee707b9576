//! Maps `Box<dyn Error>` from trait boundaries to typed `TankError`.
//!
//! The traits in `tank_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `tank_hardware::HwError`.

use crate::error::TankError;

/// Map a trait-boundary error to a typed `TankError`.
///
/// Known hardware error types are downcast first, then string heuristics
/// apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TankError {
    #[cfg(feature = "hardware-errors")]
    {
        use tank_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::EchoTimeout => TankError::Timeout,
                HwError::Transport(reason) => TankError::Transport(reason.clone()),
                other => TankError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TankError::Timeout
    } else {
        TankError::Hardware(s)
    }
}
