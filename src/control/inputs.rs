//! Flight-controller state consumed by the control loop.

/// Number of stick channels preceding the first AUX channel.
pub const NON_AUX_CHANNEL_COUNT: usize = 4;

/// Arming state and RC channel samples.
pub trait FlightInputs {
    /// True while the craft is armed.
    fn is_armed(&self) -> bool;

    /// Raw value of an RC channel (0-based over all channels), in microseconds.
    fn rc_value(&self, channel: usize) -> Option<u16>;

    /// Raw value of an AUX channel (0 = AUX1).
    fn aux_value(&self, aux_index: u8) -> Option<u16> {
        self.rc_value(NON_AUX_CHANNEL_COUNT + aux_index as usize)
    }
}

/// A fixed sample of flight inputs.
///
/// # Examples
///
/// ```
/// use vtx_control::control::inputs::{FlightInputs, RcSnapshot};
///
/// let inputs = RcSnapshot::new(vec![1500, 1500, 1000, 1500, 1900]);
/// assert_eq!(inputs.aux_value(0), Some(1900));
/// assert_eq!(inputs.aux_value(1), None);
/// assert!(!inputs.is_armed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RcSnapshot {
    pub armed: bool,
    pub channels: Vec<u16>,
}

impl RcSnapshot {
    pub fn new(channels: Vec<u16>) -> Self {
        Self { armed: false, channels }
    }

    /// Sets the value of an AUX channel, growing the channel list if needed.
    pub fn set_aux(&mut self, aux_index: u8, value: u16) {
        let channel = NON_AUX_CHANNEL_COUNT + aux_index as usize;
        if self.channels.len() <= channel {
            self.channels.resize(channel + 1, 1500);
        }
        self.channels[channel] = value;
    }
}

impl FlightInputs for RcSnapshot {
    fn is_armed(&self) -> bool {
        self.armed
    }

    fn rc_value(&self, channel: usize) -> Option<u16> {
        self.channels.get(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aux_offset() {
        let mut inputs = RcSnapshot::default();
        inputs.set_aux(2, 1800);

        assert_eq!(inputs.channels.len(), NON_AUX_CHANNEL_COUNT + 3);
        assert_eq!(inputs.rc_value(6), Some(1800));
        assert_eq!(inputs.aux_value(2), Some(1800));
        assert_eq!(inputs.aux_value(0), Some(1500));
    }
}
