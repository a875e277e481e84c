//! # Single-Button Control
//!
//! Maps how long the VTX button was held to the action performed on release.
//! Shorter holds are the more frequent actions.
//!
//! | Hold time | Action |
//! |-----------|--------|
//! | <= 25 ms | none (bounce) |
//! | <= 1 s | cycle channel |
//! | <= 3 s | cycle band |
//! | <= 5 s | cycle RF power |
//! | <= 10 s | toggle power |
//! | > 10 s | save state |

/// Action selected by a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    CycleChannel,
    CycleBand,
    CycleRfPower,
    TogglePower,
    SaveState,
}

/// Holds at or below this are treated as contact bounce.
pub const BUTTON_DEBOUNCE_MS: u64 = 25;

impl ButtonAction {
    /// Picks the action for a hold of `held_ms` milliseconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use vtx_control::control::button::ButtonAction;
    ///
    /// assert_eq!(ButtonAction::from_hold_ms(10), None);
    /// assert_eq!(ButtonAction::from_hold_ms(500), Some(ButtonAction::CycleChannel));
    /// assert_eq!(ButtonAction::from_hold_ms(12_000), Some(ButtonAction::SaveState));
    /// ```
    pub fn from_hold_ms(held_ms: u64) -> Option<Self> {
        match held_ms {
            0..=BUTTON_DEBOUNCE_MS => None,
            26..=1000 => Some(ButtonAction::CycleChannel),
            1001..=3000 => Some(ButtonAction::CycleBand),
            3001..=5000 => Some(ButtonAction::CycleRfPower),
            5001..=10_000 => Some(ButtonAction::TogglePower),
            _ => Some(ButtonAction::SaveState),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_boundaries() {
        assert_eq!(ButtonAction::from_hold_ms(0), None);
        assert_eq!(ButtonAction::from_hold_ms(25), None);
        assert_eq!(ButtonAction::from_hold_ms(26), Some(ButtonAction::CycleChannel));
        assert_eq!(ButtonAction::from_hold_ms(1000), Some(ButtonAction::CycleChannel));
        assert_eq!(ButtonAction::from_hold_ms(1001), Some(ButtonAction::CycleBand));
        assert_eq!(ButtonAction::from_hold_ms(3000), Some(ButtonAction::CycleBand));
        assert_eq!(ButtonAction::from_hold_ms(3001), Some(ButtonAction::CycleRfPower));
        assert_eq!(ButtonAction::from_hold_ms(5000), Some(ButtonAction::CycleRfPower));
        assert_eq!(ButtonAction::from_hold_ms(5001), Some(ButtonAction::TogglePower));
        assert_eq!(ButtonAction::from_hold_ms(10_000), Some(ButtonAction::TogglePower));
        assert_eq!(ButtonAction::from_hold_ms(10_001), Some(ButtonAction::SaveState));
    }
}
