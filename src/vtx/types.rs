//! # VTX Value Types
//!
//! Strongly typed band, channel and device identifiers.
//!
//! ## Band Table
//!
//! | Number | Band | Display name |
//! |--------|------|--------------|
//! | 1 | Boscam A | BOSCAM A |
//! | 2 | Boscam B | BOSCAM B |
//! | 3 | Boscam E | BOSCAM E |
//! | 4 | Fatshark / Airwaves | FATSHARK |
//! | 5 | Raceband | RACEBAND |
//!
//! Band and channel numbers are 1-based everywhere they are stored. The menu
//! shows bands as a 0-based tab index, see [`Band::tab_index`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, VtxError};

/// Number of selectable bands.
pub const BAND_COUNT: u8 = 5;

/// Number of channels per band.
pub const CHANNEL_COUNT: u8 = 8;

/// Display names for the bands, indexed by 0-based tab index.
pub const BAND_NAMES: [&str; BAND_COUNT as usize] = [
    "BOSCAM A",
    "BOSCAM B",
    "BOSCAM E",
    "FATSHARK",
    "RACEBAND",
];

/// 5.8 GHz channel frequencies in MHz, `[band - 1][channel - 1]`.
const FREQUENCY_TABLE_MHZ: [[u16; CHANNEL_COUNT as usize]; BAND_COUNT as usize] = [
    [5865, 5845, 5825, 5805, 5785, 5765, 5745, 5725], // Boscam A
    [5733, 5752, 5771, 5790, 5809, 5828, 5847, 5866], // Boscam B
    [5705, 5685, 5665, 5645, 5885, 5905, 5925, 5945], // Boscam E
    [5740, 5760, 5780, 5800, 5820, 5840, 5860, 5880], // Fatshark
    [5658, 5695, 5732, 5769, 5806, 5843, 5880, 5917], // Raceband
];

/// One of the five 5.8 GHz analog video bands.
///
/// Serialized as its 1-based band number.
///
/// # Examples
///
/// ```
/// use vtx_control::vtx::types::Band;
///
/// let band = Band::try_from(4u8).unwrap();
/// assert_eq!(band, Band::Fatshark);
/// assert_eq!(band.name(), "FATSHARK");
/// assert_eq!(band.tab_index(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Band {
    BoscamA = 1,
    BoscamB = 2,
    BoscamE = 3,
    Fatshark = 4,
    Raceband = 5,
}

impl Band {
    /// All bands in band-number order.
    pub const ALL: [Band; BAND_COUNT as usize] = [
        Band::BoscamA,
        Band::BoscamB,
        Band::BoscamE,
        Band::Fatshark,
        Band::Raceband,
    ];

    /// Returns the 1-based band number.
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Returns the 0-based index used by the menu tab widget.
    #[must_use]
    pub fn tab_index(self) -> u8 {
        self.number() - 1
    }

    /// Converts a 0-based menu tab index back to a band.
    ///
    /// # Errors
    ///
    /// Returns [`VtxError::InvalidBand`] if the index is past the last band.
    pub fn from_tab_index(index: u8) -> Result<Self> {
        Self::try_from(index.saturating_add(1))
    }

    /// Returns the menu display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        BAND_NAMES[self.tab_index() as usize]
    }

    /// Next band, saturating at Raceband.
    #[must_use]
    pub fn saturating_next(self) -> Self {
        Self::ALL[(self.tab_index() as usize + 1).min(Self::ALL.len() - 1)]
    }

    /// Previous band, saturating at Boscam A.
    #[must_use]
    pub fn saturating_prev(self) -> Self {
        Self::ALL[self.tab_index().saturating_sub(1) as usize]
    }

    /// Next band, wrapping from Raceband back to Boscam A.
    #[must_use]
    pub fn wrapping_next(self) -> Self {
        Self::ALL[(self.tab_index() as usize + 1) % Self::ALL.len()]
    }
}

impl TryFrom<u8> for Band {
    type Error = VtxError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Band::BoscamA),
            2 => Ok(Band::BoscamB),
            3 => Ok(Band::BoscamE),
            4 => Ok(Band::Fatshark),
            5 => Ok(Band::Raceband),
            other => Err(VtxError::InvalidBand(other)),
        }
    }
}

impl From<Band> for u8 {
    fn from(band: Band) -> Self {
        band.number()
    }
}

/// A 1-based channel number within a band (1-8).
///
/// # Examples
///
/// ```
/// use vtx_control::vtx::types::Channel;
///
/// assert!(Channel::new(8).is_ok());
/// assert!(Channel::new(0).is_err());
/// assert!(Channel::new(9).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    /// First channel of a band.
    pub const FIRST: Channel = Channel(1);

    /// Last channel of a band.
    pub const LAST: Channel = Channel(CHANNEL_COUNT);

    /// Creates a channel from its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`VtxError::InvalidChannel`] outside 1-8.
    pub fn new(number: u8) -> Result<Self> {
        if (1..=CHANNEL_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(VtxError::InvalidChannel(number))
        }
    }

    /// Creates a channel, clamping the number into 1-8.
    #[must_use]
    pub fn clamped(number: u8) -> Self {
        Self(number.clamp(1, CHANNEL_COUNT))
    }

    /// Returns the 1-based channel number.
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn saturating_next(self) -> Self {
        Self::clamped(self.0 + 1)
    }

    #[must_use]
    pub fn saturating_prev(self) -> Self {
        Self::clamped(self.0 - 1)
    }

    #[must_use]
    pub fn wrapping_next(self) -> Self {
        Self(self.0 % CHANNEL_COUNT + 1)
    }
}

impl TryFrom<u8> for Channel {
    type Error = VtxError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.number()
    }
}

/// Looks up the center frequency of a band/channel pair in MHz.
///
/// # Examples
///
/// ```
/// use vtx_control::vtx::types::{frequency_mhz, Band, Channel};
///
/// assert_eq!(frequency_mhz(Band::Raceband, Channel::new(1).unwrap()), 5658);
/// ```
#[must_use]
pub fn frequency_mhz(band: Band, channel: Channel) -> u16 {
    FREQUENCY_TABLE_MHZ[band.tab_index() as usize][(channel.number() - 1) as usize]
}

/// Identifies the backend behind a [`VtxDevice`](super::device::VtxDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// RTC6705 over SPI (write-only)
    Rtc6705,
    /// TBS SmartAudio over half-duplex UART
    SmartAudio,
    /// ImmersionRC Tramp over half-duplex UART
    Tramp,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Band Tests ====================

    #[test]
    fn test_band_numbers() {
        assert_eq!(Band::BoscamA.number(), 1);
        assert_eq!(Band::Fatshark.number(), 4);
        assert_eq!(Band::Raceband.number(), 5);
    }

    #[test]
    fn test_band_try_from_rejects_out_of_range() {
        assert!(matches!(Band::try_from(0u8), Err(VtxError::InvalidBand(0))));
        assert!(matches!(Band::try_from(6u8), Err(VtxError::InvalidBand(6))));
    }

    #[test]
    fn test_band_tab_index_round_trip() {
        for band in Band::ALL {
            let tab = band.tab_index();
            assert!(tab < BAND_COUNT);
            assert_eq!(Band::from_tab_index(tab).unwrap(), band);
        }
    }

    #[test]
    fn test_band_from_tab_index_out_of_range() {
        assert!(Band::from_tab_index(5).is_err());
        assert!(Band::from_tab_index(255).is_err());
    }

    #[test]
    fn test_band_names() {
        assert_eq!(Band::BoscamA.name(), "BOSCAM A");
        assert_eq!(Band::Raceband.name(), "RACEBAND");
    }

    #[test]
    fn test_band_saturating_steps() {
        assert_eq!(Band::Raceband.saturating_next(), Band::Raceband);
        assert_eq!(Band::BoscamA.saturating_prev(), Band::BoscamA);
        assert_eq!(Band::BoscamB.saturating_next(), Band::BoscamE);
        assert_eq!(Band::BoscamB.saturating_prev(), Band::BoscamA);
    }

    #[test]
    fn test_band_wrapping_next() {
        assert_eq!(Band::Raceband.wrapping_next(), Band::BoscamA);
        assert_eq!(Band::Fatshark.wrapping_next(), Band::Raceband);
    }

    // ==================== Channel Tests ====================

    #[test]
    fn test_channel_bounds() {
        assert!(Channel::new(1).is_ok());
        assert!(Channel::new(8).is_ok());
        assert!(matches!(Channel::new(0), Err(VtxError::InvalidChannel(0))));
        assert!(matches!(Channel::new(9), Err(VtxError::InvalidChannel(9))));
    }

    #[test]
    fn test_channel_clamped() {
        assert_eq!(Channel::clamped(0), Channel::FIRST);
        assert_eq!(Channel::clamped(42), Channel::LAST);
        assert_eq!(Channel::clamped(5).number(), 5);
    }

    #[test]
    fn test_channel_steps() {
        assert_eq!(Channel::LAST.saturating_next(), Channel::LAST);
        assert_eq!(Channel::FIRST.saturating_prev(), Channel::FIRST);
        assert_eq!(Channel::LAST.wrapping_next(), Channel::FIRST);
        assert_eq!(Channel::FIRST.wrapping_next().number(), 2);
    }

    // ==================== Frequency Tests ====================

    #[test]
    fn test_frequency_lookup() {
        assert_eq!(frequency_mhz(Band::BoscamA, Channel::FIRST), 5865);
        assert_eq!(frequency_mhz(Band::Fatshark, Channel::FIRST), 5740);
        assert_eq!(frequency_mhz(Band::Raceband, Channel::LAST), 5917);
    }

    #[test]
    fn test_frequencies_in_5g8_band() {
        for band in Band::ALL {
            for n in 1..=CHANNEL_COUNT {
                let freq = frequency_mhz(band, Channel::new(n).unwrap());
                assert!((5600..=6000).contains(&freq), "{:?} ch{} = {}", band, n, freq);
            }
        }
    }
}
