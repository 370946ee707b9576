pub mod error;
#[cfg(feature = "hardware")]
pub mod hcsr04;
pub mod services;
pub mod sim;
pub mod util;

pub use services::{LogTransport, SystemWallClock};
pub use sim::{SimTankParams, SimulatedActuator, SimulatedRanger, SimulatedTank};

#[cfg(feature = "hardware")]
use tank_traits::{Actuator, BoxError, Ranger};

#[cfg(feature = "hardware")]
pub struct HardwareRanger {
    sensor: hcsr04::Hcsr04,
}

#[cfg(feature = "hardware")]
impl HardwareRanger {
    pub fn new(trig_pin: u8, echo_pin: u8) -> error::Result<Self> {
        Ok(Self {
            sensor: hcsr04::Hcsr04::new(trig_pin, echo_pin)?,
        })
    }
}

#[cfg(feature = "hardware")]
impl Ranger for HardwareRanger {
    fn emit_pulse(&mut self) -> Result<(), BoxError> {
        self.sensor.trigger();
        Ok(())
    }

    fn measure_echo(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<std::time::Duration>, BoxError> {
        match self.sensor.echo_with_timeout(timeout) {
            Ok(width) => Ok(Some(width)),
            Err(error::HwError::EchoTimeout) => {
                tracing::debug!("hcsr04 echo timeout");
                Ok(None)
            }
            Err(e) => {
                tracing::error!("echo read error: {}", e);
                Err(Box::new(e))
            }
        }
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareActuator {
    out: hcsr04::RelayBuzzer,
}

#[cfg(feature = "hardware")]
impl HardwareActuator {
    pub fn new(relay_pin: u8, buzzer_pin: u8, relay_active_low: bool) -> error::Result<Self> {
        Ok(Self {
            out: hcsr04::RelayBuzzer::new(relay_pin, buzzer_pin, relay_active_low)?,
        })
    }
}

#[cfg(feature = "hardware")]
impl Actuator for HardwareActuator {
    fn set_relay(&mut self, energized: bool) -> Result<(), BoxError> {
        self.out.relay(energized);
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), BoxError> {
        self.out.buzzer(on);
        Ok(())
    }
}
