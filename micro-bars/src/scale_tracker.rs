use heapless::Vec;

use crate::config::MAX_HISTORY;
use crate::error::ConfigError;

/// Largest value a slot may hold. A full history still sums to a finite value.
pub const MAX_GROUP_VALUE: f32 = f32::MAX / (2 * MAX_HISTORY) as f32;

/// Produces the divisor that brings bar heights back into display range.
///
/// Keeps the maxima of the last `history_size` groups of `group_size`
/// frames. The newest slot is still being filled; `running_sum` holds the
/// sum of all the others so the average never has to walk the history.
pub struct ScaleTracker {
    /// Group maxima, oldest first. The last slot is the group in progress.
    history: Vec<f32, MAX_HISTORY>,
    running_sum: f32,
    frame_in_group: u32,
    group_size: u32,
    min_scale: f32,
}

impl ScaleTracker {
    pub fn new(history_size: usize, group_size: u32, min_scale: f32) -> Result<Self, ConfigError> {
        if history_size == 0 || history_size > MAX_HISTORY {
            return Err(ConfigError::InvalidHistory {
                size: history_size,
                max: MAX_HISTORY,
            });
        }
        if group_size == 0 {
            return Err(ConfigError::InvalidGroupSize);
        }
        if !(min_scale.is_finite() && min_scale > 0.0) {
            return Err(ConfigError::InvalidMinScale);
        }

        let mut history = Vec::new();
        history
            .resize(history_size, 0.0)
            .map_err(|_| ConfigError::InvalidHistory {
                size: history_size,
                max: MAX_HISTORY,
            })?;

        Ok(Self {
            history,
            running_sum: 0.0,
            frame_in_group: 0,
            group_size,
            min_scale,
        })
    }

    /// Feeds the maximum of the current frame and returns the scale divisor.
    ///
    /// The result is never below the (floored) frame maximum, so the frame
    /// that drives the scale is never clipped. Non-finite input counts as 0,
    /// huge input is capped at [`MAX_GROUP_VALUE`].
    pub fn update(&mut self, frame_max: f32) -> f32 {
        let frame_max = if frame_max.is_finite() { frame_max } else { 0.0 };
        let frame_max = frame_max.max(self.min_scale).min(MAX_GROUP_VALUE);

        if self.frame_in_group == 0 {
            self.rotate();
        }
        self.frame_in_group = (self.frame_in_group + 1) % self.group_size;

        let newest = self.newest_mut();
        *newest = newest.max(frame_max);
        let newest = *newest;

        let average = (self.running_sum + newest) / self.history.len() as f32;
        average.max(frame_max)
    }

    /// Drops the oldest group and opens a fresh one.
    ///
    /// The sum is rebuilt from the completed slots, never adjusted in place.
    fn rotate(&mut self) {
        let last = self.history.len() - 1;
        self.history.rotate_left(1);
        self.history[last] = 0.0;
        self.running_sum = self.history[..last].iter().sum();
    }

    fn newest_mut(&mut self) -> &mut f32 {
        let last = self.history.len() - 1;
        &mut self.history[last]
    }

    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|slot| *slot = 0.0);
        self.running_sum = 0.0;
        self.frame_in_group = 0;
    }

    pub fn history(&self) -> &[f32] {
        &self.history
    }

    /// Sum of every completed group, the newest slot excluded.
    pub fn running_sum(&self) -> f32 {
        self.running_sum
    }

    pub fn frame_in_group(&self) -> u32 {
        self.frame_in_group
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn completed_sum(tracker: &ScaleTracker) -> f32 {
        let history = tracker.history();
        history[..history.len() - 1].iter().sum()
    }

    #[test]
    fn test_new_scale_tracker() {
        let tracker = ScaleTracker::new(4, 8, 500.0).unwrap();
        assert_eq!(tracker.history(), &[0.0; 4]);
        assert_eq!(tracker.running_sum(), 0.0);
        assert_eq!(tracker.frame_in_group(), 0);

        assert!(matches!(
            ScaleTracker::new(0, 8, 500.0),
            Err(ConfigError::InvalidHistory { .. })
        ));
        assert!(matches!(
            ScaleTracker::new(MAX_HISTORY + 1, 8, 500.0),
            Err(ConfigError::InvalidHistory { .. })
        ));
        assert!(matches!(
            ScaleTracker::new(4, 0, 500.0),
            Err(ConfigError::InvalidGroupSize)
        ));
        assert!(matches!(
            ScaleTracker::new(4, 8, f32::NAN),
            Err(ConfigError::InvalidMinScale)
        ));
    }

    #[test]
    fn test_quiet_input_is_floored() {
        let mut tracker = ScaleTracker::new(4, 8, 500.0).unwrap();
        assert_eq!(tracker.update(0.0), 500.0);
        assert_eq!(tracker.update(120.0), 500.0);
        assert_eq!(tracker.update(f32::NAN), 500.0);
    }

    #[test]
    fn test_divisor_never_below_frame_max() {
        let mut tracker = ScaleTracker::new(4, 2, 1.0).unwrap();
        let inputs = [10.0, 300.0, 5.0, 5.0, 1000.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 50.0];
        for &value in &inputs {
            let divisor = tracker.update(value);
            assert!(divisor >= value, "divisor {} below frame max {}", divisor, value);
        }
    }

    #[test]
    fn test_average_smooths_after_loud_frame() {
        let mut tracker = ScaleTracker::new(4, 1, 1.0).unwrap();
        // one group per frame
        assert_eq!(tracker.update(800.0), 800.0);
        // history [0, 0, 800, 100]: average 225 beats the frame max
        assert_abs_diff_eq!(tracker.update(100.0), 225.0, epsilon = 1e-4);
        // history [0, 800, 100, 100]
        assert_abs_diff_eq!(tracker.update(100.0), 250.0, epsilon = 1e-4);
        // history [800, 100, 100, 100]
        assert_abs_diff_eq!(tracker.update(100.0), 275.0, epsilon = 1e-4);
        // the loud group falls out of the window
        assert_abs_diff_eq!(tracker.update(100.0), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn test_groups_merge_frames() {
        let mut tracker = ScaleTracker::new(3, 4, 1.0).unwrap();
        for value in [10.0, 40.0, 20.0, 30.0] {
            tracker.update(value);
        }
        assert_eq!(tracker.history(), &[0.0, 0.0, 40.0]);
        assert_eq!(tracker.frame_in_group(), 0);

        tracker.update(5.0);
        assert_eq!(tracker.history(), &[0.0, 40.0, 5.0]);
        assert_eq!(tracker.running_sum(), 40.0);
    }

    #[test]
    fn test_running_sum_matches_history() {
        let mut tracker = ScaleTracker::new(5, 3, 1.0).unwrap();
        let mut value = 7.0f32;
        for _ in 0..200 {
            // deterministic but uneven input
            value = (value * 13.0 + 11.0) % 997.0;
            tracker.update(value);
            assert_abs_diff_eq!(tracker.running_sum(), completed_sum(&tracker), epsilon = 1e-2);
        }
    }

    #[test]
    fn test_single_slot_history() {
        let mut tracker = ScaleTracker::new(1, 2, 1.0).unwrap();
        assert_eq!(tracker.update(50.0), 50.0);
        assert_eq!(tracker.update(20.0), 50.0);
        // new group, the old maximum is gone
        assert_eq!(tracker.update(20.0), 20.0);
        assert_eq!(tracker.running_sum(), 0.0);
    }

    #[test]
    fn test_infinite_input_counts_as_silence() {
        let mut tracker = ScaleTracker::new(4, 1, 1.0).unwrap();
        assert_eq!(tracker.update(f32::INFINITY), 1.0);
        assert_eq!(tracker.update(f32::NEG_INFINITY), 1.0);
        for _ in 0..10 {
            tracker.update(100.0);
        }
        assert_eq!(tracker.running_sum(), 300.0);
        assert_eq!(tracker.update(1000.0), 1000.0);
        // history [100, 100, 1000, 10]
        assert_abs_diff_eq!(tracker.update(10.0), 302.5, epsilon = 1e-3);
    }

    #[test]
    fn test_recovers_after_overflowing_burst() {
        let mut tracker = ScaleTracker::new(4, 1, 1.0).unwrap();
        for _ in 0..3 {
            let divisor = tracker.update(3.0e38);
            assert!(divisor.is_finite());
            assert!(tracker.running_sum().is_finite());
        }
        for _ in 0..10 {
            tracker.update(100.0);
            assert!(tracker.running_sum().is_finite());
        }
        assert_eq!(tracker.running_sum(), completed_sum(&tracker));
        assert_eq!(tracker.update(100.0), 100.0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = ScaleTracker::new(4, 2, 1.0).unwrap();
        for _ in 0..9 {
            tracker.update(900.0);
        }
        tracker.reset();
        assert_eq!(tracker.history(), &[0.0; 4]);
        assert_eq!(tracker.running_sum(), 0.0);
        assert_eq!(tracker.update(10.0), 10.0);
    }
}
