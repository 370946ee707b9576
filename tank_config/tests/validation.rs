use std::io::Write;

use rstest::rstest;
use tank_config::{load_file, load_toml};

const MINIMAL: &str = r#"
[pins]
trig = 5
echo = 18
relay = 23
buzzer = 19

[tank]
height_cm = 10.0
"#;

#[test]
fn minimal_config_takes_firmware_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert!(cfg.pins.relay_active_low);
    assert_eq!(cfg.control.low_pct, 20.0);
    assert_eq!(cfg.control.high_pct, 80.0);
    assert_eq!(cfg.control.cadence_ms, 100);
    assert_eq!(cfg.sampler.samples, 5);
    assert_eq!(cfg.sampler.echo_timeout_ms, 20);
    assert_eq!(cfg.filter.ema_alpha, 0.3);
    assert_eq!(cfg.notify.poll_ms, 200);
    assert!(!cfg.notify.enabled);
}

#[test]
fn missing_tank_section_is_a_parse_error() {
    let toml = r#"
[pins]
trig = 5
echo = 18
relay = 23
buzzer = 19
"#;
    assert!(load_toml(toml).is_err());
}

#[rstest]
#[case("[control]\nlow_pct = 80.0\nhigh_pct = 20.0", "low_pct must be below")]
#[case("[control]\nhigh_pct = 120.0", "high_pct must be in")]
#[case("[control]\ncadence_ms = 0", "cadence_ms must be >= 1")]
#[case("[sampler]\nsamples = 4", "samples must be odd")]
#[case("[sampler]\necho_timeout_ms = 0", "echo_timeout_ms must be >= 1")]
#[case("[filter]\nema_alpha = 0.0", "ema_alpha must be in")]
#[case("[notify]\nenabled = true\nrecipient = \"nobody\"", "recipient must be an email")]
#[case("[http]\nbind = \"not an addr\"", "http.bind must be")]
#[case("[logging]\nrotation = \"weekly\"", "rotation must be")]
fn rejects_out_of_range_values(#[case] extra: &str, #[case] needle: &str) {
    let toml = format!("{MINIMAL}\n{extra}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn rejects_non_positive_height() {
    let toml = MINIMAL.replace("height_cm = 10.0", "height_cm = 0.0");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("zero height");
    assert!(format!("{err}").contains("tank.height_cm must be > 0"));
}

#[test]
fn load_file_parses_and_validates() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{MINIMAL}\n[notify]\nenabled = true\nrecipient = \"me@example.com\"\n").unwrap();
    let cfg = load_file(f.path()).expect("valid file");
    assert_eq!(cfg.notify.recipient, "me@example.com");
    assert_eq!(cfg.notify.subject, "Smart Tank");
}

#[test]
fn load_file_reports_missing_path() {
    let err = load_file(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(format!("{err}").contains("read config"));
}
