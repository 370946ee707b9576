//! Human-readable error descriptions and structured JSON error formatting.

use tank_core::TankError;

fn find_tank_error(err: &eyre::Report) -> Option<&TankError> {
    err.chain().find_map(|e| e.downcast_ref::<TankError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(te) = find_tank_error(err) {
        return match te {
            TankError::SensorInvalid { distance_cm } => format!(
                "What happened: The ultrasonic sensor gave no usable reading ({distance_cm:.1} cm).\nLikely causes: TRIG/ECHO miswired, no 5V/GND, sensor aimed past the water surface, or tank.height_cm set too small.\nHow to fix: Check [pins] trig/echo and the wiring, verify tank.height_cm, and consider raising sampler.echo_timeout_ms."
            ),
            TankError::Timeout => "What happened: The ultrasonic echo never arrived.\nLikely causes: ECHO pin not connected or the echo timeout is too low for the tank depth.\nHow to fix: Verify the ECHO wiring and raise sampler.echo_timeout_ms in the config.".to_string(),
            TankError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/tank_config.toml for a sample."
            ),
            TankError::Hardware(msg) | TankError::HardwareFault(msg) => format!(
                "What happened: A hardware output or input failed ({msg}).\nLikely causes: Incorrect pin numbers, relay board unpowered, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values and wiring; ensure the process may access GPIO."
            ),
            TankError::Transport(msg) => format!(
                "What happened: A notification could not be delivered ({msg}).\nLikely causes: No network connectivity or a wrong recipient.\nHow to fix: Check connectivity and [notify].recipient."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing at a readable TOML file. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Missing [pins]/[tank] sections or out-of-range values.\nHow to fix: Edit the TOML config and try again. Details: {msg}"
        );
    }

    if lower.contains("open ultrasonic") || lower.contains("open relay") || lower.contains("gpio") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("binding telemetry") {
        return format!(
            "What happened: The telemetry endpoint could not listen.\nLikely causes: Address already in use or not permitted.\nHow to fix: Pick another address with --bind or [http].bind. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 configuration, 3 sensor, 4 hardware, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match find_tank_error(err) {
        Some(TankError::Config(_)) => 2,
        Some(TankError::SensorInvalid { .. } | TankError::Timeout) => 3,
        Some(TankError::Hardware(_) | TankError::HardwareFault(_)) => 4,
        Some(TankError::Transport(_)) => 1,
        None => {
            let lower = format!("{err:#}").to_ascii_lowercase();
            if lower.contains("config") || lower.contains("must be") {
                2
            } else {
                1
            }
        }
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match find_tank_error(err) {
        Some(TankError::SensorInvalid { .. }) => "SensorInvalid",
        Some(TankError::Timeout) => "Timeout",
        Some(TankError::Config(_)) => "Config",
        Some(TankError::Hardware(_) | TankError::HardwareFault(_)) => "Hardware",
        Some(TankError::Transport(_)) => "Transport",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    match find_tank_error(err) {
        Some(TankError::SensorInvalid { distance_cm }) => json!({
            "reason": reason_name(err),
            "details": { "distance_cm": distance_cm },
            "message": humanize(err),
        })
        .to_string(),
        _ => json!({ "reason": reason_name(err), "message": humanize(err) }).to_string(),
    }
}
