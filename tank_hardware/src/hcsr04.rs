use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_while_level;

/// HC-SR04 style ultrasonic ranger on two GPIO lines.
pub struct Hcsr04 {
    trig: OutputPin,
    echo: InputPin,
}

impl Hcsr04 {
    pub fn new(trig_pin: u8, echo_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut trig = gpio
            .get(trig_pin)
            .map_err(|e| HwError::Gpio(format!("trig pin {trig_pin}: {e}")))?
            .into_output();
        trig.set_low(); // idle low
        let echo = gpio
            .get(echo_pin)
            .map_err(|e| HwError::Gpio(format!("echo pin {echo_pin}: {e}")))?
            .into_input();
        Ok(Self { trig, echo })
    }

    /// 10 µs trigger pulse preceded by a short low settle.
    pub fn trigger(&mut self) {
        self.trig.set_low();
        spin_for(Duration::from_micros(2));
        self.trig.set_high();
        spin_for(Duration::from_micros(10));
        self.trig.set_low();
    }

    /// Width of the echo pulse, bounded by `timeout` overall.
    pub fn echo_with_timeout(&mut self, timeout: Duration) -> Result<Duration> {
        let echo = &self.echo;
        let waited = wait_while_level(|| echo.is_high(), false, timeout, Duration::ZERO)?;
        let width = wait_while_level(
            || echo.is_high(),
            true,
            timeout.saturating_sub(waited),
            Duration::ZERO,
        )?;
        trace!(width_us = width.as_micros() as u64, "hcsr04 echo");
        Ok(width)
    }
}

/// Relay and buzzer outputs.
pub struct RelayBuzzer {
    relay: OutputPin,
    buzzer: OutputPin,
    relay_active_low: bool,
}

impl RelayBuzzer {
    pub fn new(relay_pin: u8, buzzer_pin: u8, relay_active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let relay = gpio
            .get(relay_pin)
            .map_err(|e| HwError::Gpio(format!("relay pin {relay_pin}: {e}")))?
            .into_output();
        let buzzer = gpio
            .get(buzzer_pin)
            .map_err(|e| HwError::Gpio(format!("buzzer pin {buzzer_pin}: {e}")))?
            .into_output_low();
        let mut out = Self {
            relay,
            buzzer,
            relay_active_low,
        };
        out.relay(false);
        Ok(out)
    }

    pub fn relay(&mut self, energized: bool) {
        if energized != self.relay_active_low {
            self.relay.set_high();
        } else {
            self.relay.set_low();
        }
    }

    pub fn buzzer(&mut self, on: bool) {
        if on {
            self.buzzer.set_high();
        } else {
            self.buzzer.set_low();
        }
    }
}

#[inline(always)]
fn spin_for(d: Duration) {
    let start = Instant::now();
    while start.elapsed() < d {
        std::hint::spin_loop();
    }
}
