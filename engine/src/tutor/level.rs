//! Level Tracker
//!
//! Adaptive tier state machine. Outcomes are kept per subject, but a single
//! global tier moves in response to the recent success rate of whichever
//! subject just received feedback.
//!
//! Transition rules, evaluated after every outcome:
//! - rate over the last `window` outcomes strictly above `advance_above`:
//!   up one tier, unless already Advanced
//! - otherwise strictly below `retreat_below`: down one tier, unless
//!   already Beginner
//! - otherwise unchanged

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tutor_sdk::{Subject, Tier};

use crate::config::LevelConfig;

/// Direction of a tier change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Advanced,
    Retreated,
    Unchanged,
}

/// Result of recording one outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelChange {
    pub subject: Subject,
    pub previous: Tier,
    pub current: Tier,
    /// Success rate over the window that drove the decision
    pub recent_rate: f64,
}

impl LevelChange {
    pub fn transition(&self) -> Transition {
        match self.current.cmp(&self.previous) {
            std::cmp::Ordering::Greater => Transition::Advanced,
            std::cmp::Ordering::Less => Transition::Retreated,
            std::cmp::Ordering::Equal => Transition::Unchanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTracker {
    current_level: Tier,
    success_rate: BTreeMap<Subject, Vec<bool>>,
    policy: LevelConfig,
}

impl Default for LevelTracker {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}

impl LevelTracker {
    /// New tracker at Beginner with no outcomes
    pub fn new(policy: LevelConfig) -> Self {
        Self {
            current_level: Tier::Beginner,
            success_rate: BTreeMap::new(),
            policy,
        }
    }

    pub fn current_level(&self) -> Tier {
        self.current_level
    }

    pub fn policy(&self) -> &LevelConfig {
        &self.policy
    }

    /// Every outcome recorded for a subject, oldest first
    pub fn outcomes(&self, subject: Subject) -> &[bool] {
        self.success_rate
            .get(&subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Success rate over the most recent window, `None` before any outcome
    pub fn recent_rate(&self, subject: Subject) -> Option<f64> {
        let outcomes = self.outcomes(subject);
        if outcomes.is_empty() {
            return None;
        }

        let window = self.policy.window.max(1);
        let recent = &outcomes[outcomes.len().saturating_sub(window)..];
        let successes = recent.iter().filter(|&&success| success).count();
        Some(successes as f64 / recent.len() as f64)
    }

    /// Record one outcome and re-evaluate the tier
    pub fn record_outcome(&mut self, subject: Subject, success: bool) -> LevelChange {
        self.success_rate.entry(subject).or_default().push(success);

        let recent_rate = self.recent_rate(subject).unwrap_or(0.0);
        let previous = self.current_level;

        let current = if recent_rate > self.policy.advance_above {
            previous.next().unwrap_or(previous)
        } else if recent_rate < self.policy.retreat_below {
            previous.previous().unwrap_or(previous)
        } else {
            previous
        };
        self.current_level = current;

        let change = LevelChange {
            subject,
            previous,
            current,
            recent_rate,
        };

        match change.transition() {
            Transition::Unchanged => tracing::debug!(
                "Level stays {} ({} recent rate {:.2})",
                current,
                subject,
                recent_rate
            ),
            transition => tracing::info!(
                "Level {:?}: {} -> {} ({} recent rate {:.2})",
                transition,
                previous,
                current,
                subject,
                recent_rate
            ),
        }

        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_all(tracker: &mut LevelTracker, subject: Subject, outcomes: &[bool]) -> LevelChange {
        let mut last = None;
        for &outcome in outcomes {
            last = Some(tracker.record_outcome(subject, outcome));
        }
        last.unwrap()
    }

    #[test]
    fn test_starts_at_beginner() {
        let tracker = LevelTracker::default();
        assert_eq!(tracker.current_level(), Tier::Beginner);
        assert!(tracker.outcomes(Subject::Physics).is_empty());
        assert_eq!(tracker.recent_rate(Subject::Physics), None);
    }

    #[test]
    fn test_single_success_advances() {
        let mut tracker = LevelTracker::default();
        let change = tracker.record_outcome(Subject::Mathematics, true);

        assert_eq!(change.previous, Tier::Beginner);
        assert_eq!(change.current, Tier::Intermediate);
        assert_eq!(change.recent_rate, 1.0);
        assert_eq!(change.transition(), Transition::Advanced);
    }

    #[test]
    fn test_five_successes_reach_advanced_and_clamp() {
        let mut tracker = LevelTracker::default();
        let change = record_all(&mut tracker, Subject::Mathematics, &[true; 5]);

        assert_eq!(change.previous, Tier::Advanced);
        assert_eq!(change.current, Tier::Advanced);
        assert_eq!(change.transition(), Transition::Unchanged);
    }

    #[test]
    fn test_four_of_five_is_not_enough() {
        let mut tracker = LevelTracker::default();
        record_all(&mut tracker, Subject::Physics, &[true, true, true, true]);
        tracker.current_level = Tier::Intermediate;

        // 4/5 = 0.8 is not strictly above the threshold
        let change = tracker.record_outcome(Subject::Physics, false);
        assert_eq!(change.recent_rate, 0.8);
        assert_eq!(change.current, Tier::Intermediate);
    }

    #[test]
    fn test_failures_retreat_and_clamp_at_beginner() {
        let mut tracker = LevelTracker::new(LevelConfig::default());
        tracker.current_level = Tier::Intermediate;

        let change = tracker.record_outcome(Subject::Chemistry, false);
        assert_eq!(change.current, Tier::Beginner);
        assert_eq!(change.transition(), Transition::Retreated);

        let change = tracker.record_outcome(Subject::Chemistry, false);
        assert_eq!(change.previous, Tier::Beginner);
        assert_eq!(change.current, Tier::Beginner);
    }

    #[test]
    fn test_window_only_counts_recent_outcomes() {
        let mut tracker = LevelTracker::default();
        record_all(
            &mut tracker,
            Subject::Mathematics,
            &[false, false, false, true, true, true, true, true],
        );

        assert_eq!(tracker.outcomes(Subject::Mathematics).len(), 8);
        assert_eq!(tracker.recent_rate(Subject::Mathematics), Some(1.0));
    }

    #[test]
    fn test_subjects_are_tracked_separately() {
        let mut tracker = LevelTracker::default();
        tracker.record_outcome(Subject::Mathematics, true);
        let change = tracker.record_outcome(Subject::Physics, false);

        assert_eq!(tracker.outcomes(Subject::Mathematics), &[true]);
        assert_eq!(tracker.outcomes(Subject::Physics), &[false]);
        // The tier is shared, so the physics failure pulls it back down
        assert_eq!(change.previous, Tier::Intermediate);
        assert_eq!(change.current, Tier::Beginner);
    }

    #[test]
    fn test_custom_policy() {
        let policy = LevelConfig {
            window: 2,
            advance_above: 0.5,
            retreat_below: 0.1,
        };
        let mut tracker = LevelTracker::new(policy);

        let change = record_all(&mut tracker, Subject::Physics, &[false, true]);
        assert_eq!(change.recent_rate, 0.5);
        assert_eq!(change.current, Tier::Beginner);
    }

    #[test]
    fn test_tracker_serializes() {
        let mut tracker = LevelTracker::default();
        tracker.record_outcome(Subject::Chemistry, true);

        let json = serde_json::to_string(&tracker).unwrap();
        assert!(json.contains("\"chemistry\":[true]"));

        let restored: LevelTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tracker);
    }
}
