//! # Channel Activation
//!
//! Maps AUX channel ranges to VTX band/channel settings so a pilot can switch
//! frequency from the radio.
//!
//! ## Matching Rules
//!
//! - Conditions are scanned in table order; the first whose range contains
//!   the AUX value wins, so overlapping ranges resolve to the lowest index.
//! - A winner is applied only when its index differs from the last applied
//!   index. Holding a switch position does not re-program the hardware.
//! - When nothing matches, the last applied setting stays in effect.
//!
//! ## Ranges
//!
//! Channel values are clamped into 900-2100 us before comparison. Ranges are
//! inclusive on both ends and can be built from 25 us configurator steps with
//! [`ChannelRange::from_steps`].

use serde::{Deserialize, Serialize};

use super::inputs::FlightInputs;
use crate::vtx::types::{Band, Channel};

/// Capacity of the activation-condition table.
pub const MAX_CHANNEL_ACTIVATION_CONDITION_COUNT: usize = 10;

/// Lowest RC value considered by range checks (us).
pub const CHANNEL_RANGE_MIN: u16 = 900;

/// Highest RC value considered by range checks (us).
pub const CHANNEL_RANGE_MAX: u16 = 2100;

/// Width of one configurator range step (us).
pub const CHANNEL_RANGE_STEP_WIDTH: u16 = 25;

/// Fixed-capacity activation table.
pub type ActivationConditions =
    heapless::Vec<ChannelActivationCondition, MAX_CHANNEL_ACTIVATION_CONDITION_COUNT>;

/// Inclusive RC value range in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub low: u16,
    pub high: u16,
}

impl ChannelRange {
    pub fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Builds a range from configurator steps (`900 + step * 25` us).
    ///
    /// # Examples
    ///
    /// ```
    /// use vtx_control::control::activation::ChannelRange;
    ///
    /// let range = ChannelRange::from_steps(32, 48);
    /// assert_eq!(range, ChannelRange::new(1700, 2100));
    /// ```
    pub fn from_steps(start_step: u8, end_step: u8) -> Self {
        let to_us = |step: u8| {
            (CHANNEL_RANGE_MIN + step as u16 * CHANNEL_RANGE_STEP_WIDTH).min(CHANNEL_RANGE_MAX)
        };
        Self::new(to_us(start_step), to_us(end_step))
    }

    /// A range with `low > high` never matches.
    pub fn is_usable(&self) -> bool {
        self.low <= self.high
    }

    pub fn contains(&self, value: u16) -> bool {
        let value = value.clamp(CHANNEL_RANGE_MIN, CHANNEL_RANGE_MAX);
        self.is_usable() && (self.low..=self.high).contains(&value)
    }
}

/// One row of the activation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelActivationCondition {
    /// 0 = AUX1
    pub aux_channel_index: u8,
    pub range: ChannelRange,
    pub band: Band,
    pub channel: Channel,
}

impl ChannelActivationCondition {
    /// True when the condition's AUX channel currently sits inside its range.
    pub fn is_active(&self, inputs: &dyn FlightInputs) -> bool {
        inputs
            .aux_value(self.aux_channel_index)
            .is_some_and(|value| self.range.contains(value))
    }
}

/// Tracks which activation condition was last applied.
#[derive(Debug, Default)]
pub struct ActivationMatcher {
    last_index: Option<usize>,
}

impl ActivationMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the last applied condition.
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Index of the first active condition.
    pub fn find_active(
        conditions: &[ChannelActivationCondition],
        inputs: &dyn FlightInputs,
    ) -> Option<usize> {
        conditions.iter().position(|condition| condition.is_active(inputs))
    }

    /// Evaluates the table and returns a condition to apply, if the winning
    /// index changed since the last call that returned one.
    pub fn update<'a>(
        &mut self,
        conditions: &'a [ChannelActivationCondition],
        inputs: &dyn FlightInputs,
    ) -> Option<(usize, &'a ChannelActivationCondition)> {
        let index = Self::find_active(conditions, inputs)?;
        if self.last_index == Some(index) {
            return None;
        }
        self.last_index = Some(index);
        Some((index, &conditions[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::inputs::RcSnapshot;

    fn condition(
        aux: u8,
        low: u16,
        high: u16,
        band: Band,
        channel: u8,
    ) -> ChannelActivationCondition {
        ChannelActivationCondition {
            aux_channel_index: aux,
            range: ChannelRange::new(low, high),
            band,
            channel: Channel::new(channel).unwrap(),
        }
    }

    fn aux(index: u8, value: u16) -> RcSnapshot {
        let mut inputs = RcSnapshot::default();
        inputs.set_aux(index, value);
        inputs
    }

    // ==================== Range Tests ====================

    #[test]
    fn test_range_inclusive_bounds() {
        let range = ChannelRange::new(1300, 1700);
        assert!(range.contains(1300));
        assert!(range.contains(1700));
        assert!(!range.contains(1299));
        assert!(!range.contains(1701));
    }

    #[test]
    fn test_range_clamps_input() {
        let low = ChannelRange::new(900, 1000);
        assert!(low.contains(500));

        let high = ChannelRange::new(2000, 2100);
        assert!(high.contains(2500));
    }

    #[test]
    fn test_inverted_range_never_matches() {
        let range = ChannelRange::new(1800, 1200);
        assert!(!range.is_usable());
        assert!(!range.contains(1500));
    }

    #[test]
    fn test_range_from_steps() {
        assert_eq!(ChannelRange::from_steps(0, 4), ChannelRange::new(900, 1000));
        assert_eq!(ChannelRange::from_steps(24, 200), ChannelRange::new(1500, 2100));
    }

    // ==================== Matcher Tests ====================

    #[test]
    fn test_empty_table_never_matches() {
        let mut matcher = ActivationMatcher::new();
        assert!(matcher.update(&[], &aux(0, 1500)).is_none());
        assert_eq!(matcher.last_index(), None);
    }

    #[test]
    fn test_lowest_index_wins_on_overlap() {
        let table = [
            condition(0, 1400, 1600, Band::BoscamA, 1),
            condition(0, 1000, 2000, Band::Raceband, 8),
        ];
        let mut matcher = ActivationMatcher::new();

        let (index, applied) = matcher.update(&table, &aux(0, 1500)).unwrap();
        assert_eq!(index, 0);
        assert_eq!(applied.band, Band::BoscamA);
    }

    #[test]
    fn test_repeated_match_is_noop() {
        let table = [condition(0, 1400, 1600, Band::BoscamA, 1)];
        let mut matcher = ActivationMatcher::new();
        let inputs = aux(0, 1500);

        assert!(matcher.update(&table, &inputs).is_some());
        for _ in 0..10 {
            assert!(matcher.update(&table, &inputs).is_none());
        }
    }

    #[test]
    fn test_overlap_does_not_alternate() {
        let table = [
            condition(0, 1000, 2000, Band::BoscamA, 1),
            condition(0, 1000, 2000, Band::BoscamB, 2),
        ];
        let mut matcher = ActivationMatcher::new();
        let inputs = aux(0, 1500);

        assert_eq!(matcher.update(&table, &inputs).map(|(i, _)| i), Some(0));
        assert!(matcher.update(&table, &inputs).is_none());
        assert_eq!(matcher.last_index(), Some(0));
    }

    #[test]
    fn test_no_match_is_sticky() {
        let table = [
            condition(0, 900, 1200, Band::BoscamA, 1),
            condition(0, 1800, 2100, Band::BoscamB, 2),
        ];
        let mut matcher = ActivationMatcher::new();

        matcher.update(&table, &aux(0, 1000));
        assert!(matcher.update(&table, &aux(0, 1500)).is_none());
        assert_eq!(matcher.last_index(), Some(0));

        let (index, _) = matcher.update(&table, &aux(0, 2000)).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_switching_back_reapplies() {
        let table = [
            condition(0, 900, 1200, Band::BoscamA, 1),
            condition(0, 1800, 2100, Band::BoscamB, 2),
        ];
        let mut matcher = ActivationMatcher::new();

        assert!(matcher.update(&table, &aux(0, 1000)).is_some());
        assert!(matcher.update(&table, &aux(0, 2000)).is_some());
        assert_eq!(matcher.update(&table, &aux(0, 1000)).map(|(i, _)| i), Some(0));
    }

    #[test]
    fn test_missing_aux_channel_does_not_match() {
        let table = [condition(3, 900, 2100, Band::BoscamA, 1)];
        let mut matcher = ActivationMatcher::new();
        assert!(matcher.update(&table, &aux(0, 1500)).is_none());
    }

    #[test]
    fn test_conditions_on_different_aux_channels() {
        let table = [
            condition(1, 1800, 2100, Band::Fatshark, 3),
            condition(0, 1800, 2100, Band::Raceband, 4),
        ];
        let mut matcher = ActivationMatcher::new();

        let mut inputs = aux(0, 2000);
        inputs.set_aux(1, 1000);

        let (index, applied) = matcher.update(&table, &inputs).unwrap();
        assert_eq!(index, 1);
        assert_eq!(applied.band, Band::Raceband);
    }
}
