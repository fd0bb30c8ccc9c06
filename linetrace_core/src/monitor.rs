//! Line-loss supervision.

/// Supervisor state after the latest observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossState {
    Tracking,
    /// Line missing for fewer than `loss_limit` consecutive cycles.
    Lost,
    /// Line missing for `loss_limit` or more cycles; motors held at zero.
    EmergencyStop,
}

impl LossState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracking => "tracking",
            Self::Lost => "lost",
            Self::EmergencyStop => "emergency-stop",
        }
    }

    /// Every state but `Tracking` forces a zero command.
    pub fn forces_stop(&self) -> bool {
        !matches!(self, Self::Tracking)
    }
}

impl core::fmt::Display for LossState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts consecutive line-absent cycles and latches an emergency stop.
///
/// Recovery is automatic: the first cycle with the line present returns to
/// `Tracking` with the counter at 0.
#[derive(Debug, Clone)]
pub struct LossMonitor {
    limit: u32,
    count: u32,
    count_before: u32,
    state: LossState,
}

impl LossMonitor {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            count: 0,
            count_before: 0,
            state: LossState::Tracking,
        }
    }

    fn classify(&self) -> LossState {
        match self.count {
            0 => LossState::Tracking,
            n if n < self.limit => LossState::Lost,
            _ => LossState::EmergencyStop,
        }
    }

    fn transition(&mut self) -> LossState {
        let next = self.classify();
        match (self.state, next) {
            (from, LossState::EmergencyStop) if from != LossState::EmergencyStop => {
                tracing::warn!(
                    cycles = self.count,
                    limit = self.limit,
                    "line lost; emergency stop"
                );
            }
            (LossState::EmergencyStop | LossState::Lost, LossState::Tracking) => {
                tracing::info!(from = %self.state, "line reacquired");
            }
            (LossState::Tracking, LossState::Lost) => {
                tracing::debug!("line lost");
            }
            _ => {}
        }
        self.state = next;
        next
    }

    /// Record one cycle's presence and return the resulting state.
    pub fn observe(&mut self, present: bool) -> LossState {
        self.count_before = self.count;
        self.count = if present {
            0
        } else {
            self.count.saturating_add(1)
        };
        self.transition()
    }

    /// Re-record the latest observation as absent.
    ///
    /// Used when the cycle's command could not be written. Calling it again for
    /// the same cycle has no further effect.
    pub fn revise_as_lost(&mut self) -> LossState {
        self.count = self.count_before.saturating_add(1);
        self.transition()
    }

    pub fn state(&self) -> LossState {
        self.state
    }

    /// Consecutive line-absent cycles so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.count_before = 0;
        self.state = LossState::Tracking;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(6)]
    fn latches_after_limit_absent_cycles(#[case] limit: u32) {
        let mut m = LossMonitor::new(limit);
        for _ in 1..limit {
            assert_eq!(m.observe(false), LossState::Lost);
        }
        assert_eq!(m.observe(false), LossState::EmergencyStop);
        assert_eq!(m.observe(false), LossState::EmergencyStop);
        assert_eq!(m.count(), limit + 1);
    }

    #[test]
    fn one_present_cycle_recovers() {
        let mut m = LossMonitor::new(2);
        m.observe(false);
        m.observe(false);
        assert_eq!(m.state(), LossState::EmergencyStop);
        assert_eq!(m.observe(true), LossState::Tracking);
        assert_eq!(m.count(), 0);
    }

    #[test]
    fn revising_counts_the_cycle_once() {
        let mut m = LossMonitor::new(6);
        m.observe(false);
        m.observe(true);
        assert_eq!(m.revise_as_lost(), LossState::Lost);
        assert_eq!(m.count(), 2);
        m.revise_as_lost();
        assert_eq!(m.count(), 2);
    }

    #[test]
    fn zero_limit_behaves_as_one() {
        let mut m = LossMonitor::new(0);
        assert_eq!(m.limit(), 1);
        assert_eq!(m.observe(false), LossState::EmergencyStop);
        m.reset();
        assert_eq!(m.state(), LossState::Tracking);
    }

    #[test]
    fn only_tracking_lets_commands_through() {
        assert!(!LossState::Tracking.forces_stop());
        assert!(LossState::Lost.forces_stop());
        assert!(LossState::EmergencyStop.forces_stop());
    }
}
