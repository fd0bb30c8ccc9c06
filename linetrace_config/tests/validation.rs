use linetrace_config::{StrategyKind, load_file, load_toml};
use rstest::rstest;
use std::fs;

const FULL: &str = r#"
[sensors]
channels = [0, 1, 2, 3]
white_is_high = true
dark_threshold = 0.55

[filter]
window = 4

[steering]
strategy = "paired"
base_speed = 0.4
gain = 0.6
deadband = 0.05
max_output = 0.85
left_group = [0, 1]
right_group = [2, 3]

[control]
rate_hz = 25.0
monitor_only = true

[safety]
loss_limit = 6

[ramp]
duration_ms = 200
steps = 4

[pins]
left_in1 = 6
left_in2 = 5
right_in1 = 26
right_in2 = 27

[logging]
level = "debug"
rotation = "daily"
cycle_every = 5
"#;

#[test]
fn accepts_full_document() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.steering.strategy, StrategyKind::Paired);
    assert!(cfg.control.monitor_only);
    assert_eq!(cfg.steering.left_group.as_deref(), Some(&[0usize, 1][..]));
    assert_eq!(cfg.logging.cycle_every, 5);
}

#[rstest]
#[case("[control]\nrate_hz = 0.0\n", "rate_hz must be > 0")]
#[case("[control]\nrate_hz = -5.0\n", "rate_hz must be > 0")]
#[case("[steering]\nbase_speed = 1.5\n", "base_speed must be in [0.0, 1.0]")]
#[case("[steering]\ngain = -0.1\n", "gain must be a finite value >= 0")]
#[case("[steering]\ndeadband = 1.0\n", "deadband must be in [0.0, 1.0)")]
#[case("[steering]\nmax_output = 0.0\n", "max_output must be in (0.0, 1.0]")]
#[case("[sensors]\nchannels = []\n", "at least one channel")]
#[case("[sensors]\nchannels = [0, 4]\n", "exceeds mcp3004 channel")]
#[case("[sensors]\nchannels = [0, 1, 1]\n", "twice")]
#[case("[sensors]\ndark_threshold = 1.0\n", "dark_threshold must be in (0.0, 1.0)")]
#[case("[filter]\nwindow = 0\n", "filter.window must be >= 1")]
#[case("[safety]\nloss_limit = 0\n", "loss_limit must be >= 1")]
#[case("[steering]\nleft_group = [0, 7]\n", "left_group index 7 out of range")]
#[case("[steering]\nright_group = []\n", "right_group must not be empty")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("[logging]\ncycle_every = 0\n", "cycle_every must be >= 1")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}").to_lowercase();
    assert!(
        msg.contains(&needle.to_lowercase()),
        "expected {needle:?} in {msg:?}"
    );
}

#[test]
fn rejects_paired_strategy_on_single_channel() {
    let cfg = load_toml("[sensors]\nchannels = [2]\n[steering]\nstrategy = \"paired\"\n")
        .expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn unknown_fields_types_fail_to_parse() {
    assert!(load_toml("[control]\nrate_hz = \"fast\"\n").is_err());
}

#[test]
fn load_file_reads_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.toml");
    fs::write(&good, FULL).expect("write");
    let cfg = load_file(&good).expect("load good");
    assert_eq!(cfg.ramp.steps, 4);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[control]\nrate_hz = 0\n").expect("write");
    assert!(load_file(&bad).is_err());

    let missing = dir.path().join("missing.toml");
    let err = load_file(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/linetrace.toml");
    let cfg = load_file(&path).expect("sample config loads");
    assert_eq!(cfg.steering.strategy, StrategyKind::Centroid);
    assert_eq!(cfg.pins.spi_clock_hz, 1_000_000);
}

#[rstest]
#[case(StrategyKind::Centroid)]
#[case(StrategyKind::Paired)]
#[case(StrategyKind::Threshold)]
fn strategy_name_matches_toml_spelling(#[case] kind: StrategyKind) {
    let doc = format!("[steering]\nstrategy = \"{}\"\n", kind.as_str());
    let cfg = load_toml(&doc).expect("parse TOML");
    assert_eq!(cfg.steering.strategy, kind);
}
