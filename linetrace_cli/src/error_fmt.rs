//! Human-readable error descriptions and structured JSON error formatting.

use linetrace_core::error::{BuildError, TracerError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensors => {
                "What happened: No sensor array was provided to the controller.\nLikely causes: The sensor backend failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor array is created successfully and passed via with_sensors(...).".to_string()
            }
            BuildError::MissingMotors => {
                "What happened: No motors were provided to the controller.\nLikely causes: The motor driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the motors are created successfully and passed via with_motors(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the overrides, then rerun. See etc/linetrace.toml for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TracerError>() {
        return match te {
            TracerError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A missing file, a TOML syntax error, or an out-of-range value.\nHow to fix: Check the path passed to --config and the value named above, then rerun."
            ),
            TracerError::Timeout => {
                "What happened: Sensor read timed out.\nLikely causes: ADC not wired correctly, no power/ground, or wrong SPI bus.\nHow to fix: Verify the MCP3004 wiring and the [pins] spi_* values in the config.".to_string()
            }
            TracerError::Hardware(msg) | TracerError::HardwareFault(msg) => format!(
                "What happened: Hardware access failed ({msg}).\nLikely causes: Wrong pin numbers, SPI not enabled, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure SPI is enabled and the process may access /dev/gpiomem and /dev/spidev*."
            ),
            TracerError::StopFailed(msg) => format!(
                "What happened: The motors did not acknowledge the final stop ({msg}).\nLikely causes: Motor driver lost power or a GPIO write failed.\nHow to fix: Cut motor power now, then check the DRV8835 wiring before the next run."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("spidev") || lower.contains("gpio") {
        return "What happened: Failed to initialize hardware.\nLikely causes: SPI disabled or insufficient GPIO permissions.\nHow to fix: Enable SPI (raspi-config) and run as a user in the gpio and spi groups.".to_string();
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

/// Stable reason name for the JSON error object.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            BuildError::MissingSensors | BuildError::MissingMotors => "Build",
        };
    }
    match err.downcast_ref::<TracerError>() {
        Some(TracerError::Config(_)) => "InvalidConfig",
        Some(TracerError::Timeout) => "Timeout",
        Some(TracerError::Hardware(_) | TracerError::HardwareFault(_)) => "Hardware",
        Some(TracerError::StopFailed(_)) => "StopFailed",
        None => "Error",
    }
}

/// Exit codes: configuration 2, hardware init 3, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ) {
        return 2;
    }
    match err.downcast_ref::<TracerError>() {
        Some(TracerError::Config(_)) => 2,
        Some(
            TracerError::Hardware(_) | TracerError::HardwareFault(_) | TracerError::Timeout,
        ) => 3,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let e = eyre::Report::new(TracerError::Config("control.rate_hz must be > 0".into()));
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("rate_hz"));
        let b = eyre::Report::new(BuildError::InvalidConfig("gain must be finite and >= 0"));
        assert_eq!(exit_code_for_error(&b), 2);
    }

    #[test]
    fn hardware_init_exits_with_three_through_context() {
        use eyre::WrapErr;
        let e: eyre::Result<()> =
            Err(eyre::Report::new(TracerError::HardwareFault("spi: no such device".into())));
        let e = e.wrap_err("hardware init").unwrap_err();
        assert_eq!(exit_code_for_error(&e), 3);
        assert_eq!(reason_name(&e), "Hardware");
    }

    #[test]
    fn untyped_errors_exit_with_one() {
        let e = eyre::eyre!("something odd");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).contains("Original: something odd"));
    }

    #[test]
    fn json_error_is_one_object() {
        let e = eyre::Report::new(TracerError::StopFailed("driver unresponsive".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "StopFailed");
        assert_eq!(v["exit_code"], 1);
        assert!(v["message"].as_str().unwrap().contains("Cut motor power"));
    }
}
