//! Lateral offset estimation.
//!
//! Every estimator maps a normalized, smoothed vector (left-to-right, white
//! background at 1.0) to an offset in `[-1, 1]`: negative when the line is to
//! the left of center, positive when it is to the right.

use crate::config::Strategy;

/// Added to the centroid denominator so an all-background vector yields 0.
pub const CENTROID_EPSILON: f32 = 1e-9;

pub trait LineEstimator {
    fn estimate(&self, values: &[f32]) -> f32;
    fn name(&self) -> &'static str;
}

/// Channel positions evenly spaced over `[-1, 1]`, left-most most negative.
///
/// A single channel sits at 0.
pub fn channel_weights(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![0.0; n];
    }
    let half = (n as f32 - 1.0) / 2.0;
    (0..n).map(|i| (i as f32 - half) / half).collect()
}

/// How much a channel looks like line: 0 over background, 1 over black.
#[inline]
fn line_likeness(v: f32) -> f32 {
    if v.is_finite() {
        (1.0 - v).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn finish(offset: f32, deadband: f32) -> f32 {
    if !offset.is_finite() || offset.abs() < deadband {
        0.0
    } else {
        offset.clamp(-1.0, 1.0)
    }
}

fn centroid_with(weights: &[f32], values: &[f32], deadband: f32) -> f32 {
    if values.len() <= 1 {
        return 0.0;
    }
    let (num, den) = weights
        .iter()
        .zip(values)
        .fold((0.0f32, 0.0f32), |(num, den), (w, &v)| {
            let m = line_likeness(v);
            (num + w * m, den + m)
        });
    finish(num / (den + CENTROID_EPSILON), deadband)
}

/// Weighted centroid of line-likeness, deadbanded and clamped.
pub fn compute_center(values: &[f32], deadband: f32) -> f32 {
    centroid_with(&channel_weights(values.len()), values, deadband)
}

/// Default estimator: `compute_center` with precomputed weights.
#[derive(Debug, Clone)]
pub struct WeightedCentroid {
    weights: Vec<f32>,
    deadband: f32,
}

impl WeightedCentroid {
    pub fn new(channels: usize, deadband: f32) -> Self {
        Self {
            weights: channel_weights(channels),
            deadband,
        }
    }
}

impl LineEstimator for WeightedCentroid {
    fn estimate(&self, values: &[f32]) -> f32 {
        if values.len() == self.weights.len() {
            centroid_with(&self.weights, values, self.deadband)
        } else {
            compute_center(values, self.deadband)
        }
    }

    fn name(&self) -> &'static str {
        "centroid"
    }
}

/// Left group mean minus right group mean.
///
/// The darker side has the lower mean, so the offset leans towards it.
#[derive(Debug, Clone)]
pub struct PairedGroup {
    left: Vec<usize>,
    right: Vec<usize>,
    deadband: f32,
}

impl PairedGroup {
    pub fn new(left: Vec<usize>, right: Vec<usize>, deadband: f32) -> Self {
        Self {
            left,
            right,
            deadband,
        }
    }

    /// First half against second half; an odd middle channel belongs to neither.
    pub fn halves(channels: usize, deadband: f32) -> Self {
        let left = (0..channels / 2).collect();
        let right = (channels.div_ceil(2)..channels).collect();
        Self::new(left, right, deadband)
    }

    pub fn groups(&self) -> (&[usize], &[usize]) {
        (&self.left, &self.right)
    }
}

fn group_mean(values: &[f32], group: &[usize]) -> Option<f32> {
    let picked: Vec<f32> = group.iter().filter_map(|&i| values.get(i).copied()).collect();
    crate::filter::moving_average(&picked)
}

impl LineEstimator for PairedGroup {
    fn estimate(&self, values: &[f32]) -> f32 {
        match (group_mean(values, &self.left), group_mean(values, &self.right)) {
            (Some(l), Some(r)) => finish(l - r, self.deadband),
            _ => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "paired"
    }
}

/// Mean position of the channels below the dark threshold.
#[derive(Debug, Clone)]
pub struct ThresholdVote {
    weights: Vec<f32>,
    threshold: f32,
    deadband: f32,
}

impl ThresholdVote {
    pub fn new(channels: usize, threshold: f32, deadband: f32) -> Self {
        Self {
            weights: channel_weights(channels),
            threshold,
            deadband,
        }
    }
}

impl LineEstimator for ThresholdVote {
    fn estimate(&self, values: &[f32]) -> f32 {
        let owned;
        let weights = if values.len() == self.weights.len() {
            &self.weights
        } else {
            owned = channel_weights(values.len());
            &owned
        };
        let votes: Vec<f32> = weights
            .iter()
            .zip(values)
            .filter(|&(_, &v)| v < self.threshold)
            .map(|(&w, _)| w)
            .collect();
        crate::filter::moving_average(&votes).map_or(0.0, |m| finish(m, self.deadband))
    }

    fn name(&self) -> &'static str {
        "threshold"
    }
}

/// Build the estimator selected by `strategy`.
pub fn for_strategy(
    strategy: &Strategy,
    channels: usize,
    dark_threshold: f32,
    deadband: f32,
) -> Box<dyn LineEstimator> {
    match strategy {
        Strategy::Centroid => Box::new(WeightedCentroid::new(channels, deadband)),
        Strategy::Paired { left, right } if left.is_empty() || right.is_empty() => {
            let halves = PairedGroup::halves(channels, deadband);
            let (l, r) = halves.groups();
            let left = if left.is_empty() { l.to_vec() } else { left.clone() };
            let right = if right.is_empty() { r.to_vec() } else { right.clone() };
            Box::new(PairedGroup::new(left, right, deadband))
        }
        Strategy::Paired { left, right } => {
            Box::new(PairedGroup::new(left.clone(), right.clone(), deadband))
        }
        Strategy::Threshold => Box::new(ThresholdVote::new(channels, dark_threshold, deadband)),
    }
}
