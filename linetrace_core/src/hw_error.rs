//! Maps `Box<dyn Error>` from trait boundaries to typed `TracerError`.
//!
//! The traits in `linetrace_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `linetrace_hardware::HwError`.

use crate::error::TracerError;

/// Map a trait-boundary error to a typed `TracerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TracerError {
    #[cfg(feature = "hardware-errors")]
    {
        use linetrace_hardware::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Simulated | HwError::Io(_) => TracerError::Hardware(hw.to_string()),
                other => TracerError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TracerError::Timeout
    } else {
        TracerError::Hardware(s)
    }
}
