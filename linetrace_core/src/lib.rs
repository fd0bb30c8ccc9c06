#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Line-following controller (hardware-agnostic).
//!
//! All hardware interactions go through `linetrace_traits::SensorArray` and
//! `linetrace_traits::MotorPair`.
//!
//! ## Architecture
//!
//! - **Normalization**: raw readings to `[0, 1]`, background high (`normalize`)
//! - **Filtering**: per-channel moving average (`filter`)
//! - **Estimation**: lateral offset strategies behind `LineEstimator` (`estimator`)
//! - **Mixing**: differential steering (`mixer`)
//! - **Safety**: line-loss supervision with emergency stop (`monitor`)
//! - **Startup**: soft-start ramp (`ramp`)
//! - **Loop**: `TracerCore::step` per cycle, `runner::drive` for a whole run
//!
//! Sign convention: a negative offset means the line is left of center, and
//! a positive offset slows the left wheel and speeds up the right.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod hw_error;
pub mod logger;
pub mod mixer;
pub mod mocks;
pub mod monitor;
pub mod normalize;
pub mod presence;
pub mod ramp;
pub mod runner;
pub mod shutdown;
pub mod status;
pub mod tracer;
pub mod util;

pub use builder::{Missing, Set, Tracer, TracerBuilder, TracerG, build_tracer};
pub use config::{
    FilterCfg, LoopCfg, RampCfg, RunConfig, SafetyCfg, SensorCfg, SteeringCfg, Strategy,
};
pub use error::{BuildError, Result, TracerError};
pub use estimator::{
    LineEstimator, PairedGroup, ThresholdVote, WeightedCentroid, channel_weights, compute_center,
};
pub use filter::{ChannelFilter, SmoothingBuffer, moving_average};
pub use logger::{CaptureSink, DiagnosticSink, FileSink, NullSink, TracingSink};
pub use mixer::{Mixer, MotorCommand, mix_to_motors};
pub use monitor::{LossMonitor, LossState};
pub use normalize::normalize;
pub use presence::line_present;
pub use ramp::{RampOutcome, SoftStart, ramp_sequence};
pub use runner::{LoopStats, RunParams, RunSummary};
pub use shutdown::{Shutdown, ShutdownHandle};
pub use status::{CycleReport, Fault, Maneuver};
pub use tracer::TracerCore;
