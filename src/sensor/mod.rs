//! BME688 channel layout, readings and the serial line protocol.

pub mod protocol;
pub mod serial;

pub use protocol::{LineLayout, parse_line};
pub use serial::{LineEvent, LineReader, PortInfo, SerialError, SerialSettings, available_ports, open_port};

/// Number of gas-resistance channels reported per reading.
pub const GAS_CHANNEL_COUNT: usize = 10;

/// Gas channel column names, in the order the device sends them.
pub const GAS_CHANNELS: [&str; GAS_CHANNEL_COUNT] = [
    "G320", "G295", "G270", "G245", "G220", "G195", "G170", "G145", "G120", "G100",
];

/// Index of the reference channel every ratio is taken against.
pub const REFERENCE_CHANNEL: usize = GAS_CHANNEL_COUNT - 1;

/// Number of ratio features derived from one reading.
pub const RATIO_FEATURE_COUNT: usize = GAS_CHANNEL_COUNT - 1;

/// Ratio feature names, aligned with the generated firmware `ratios[]` array.
pub const RATIO_FEATURES: [&str; RATIO_FEATURE_COUNT] = [
    "R_G320", "R_G295", "R_G270", "R_G245", "R_G220", "R_G195", "R_G170", "R_G145", "R_G120",
];

/// One parsed device reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Leading sample counter, present only in the indexed line layout.
    pub index: Option<f64>,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Raw gas resistances in [`GAS_CHANNELS`] order.
    pub gases: [f64; GAS_CHANNEL_COUNT],
}

impl Reading {
    /// Reference-channel resistance.
    pub fn reference(&self) -> f64 {
        self.gases[REFERENCE_CHANNEL]
    }

    /// Ratio features for this reading, `None` when the reference is not positive.
    pub fn ratios(&self) -> Option<[f32; RATIO_FEATURE_COUNT]> {
        let mut gases = [0f32; GAS_CHANNEL_COUNT];
        for (dst, &src) in gases.iter_mut().zip(self.gases.iter()) {
            *dst = src as f32;
        }
        gas_ratios(&gases)
    }
}

/// Divide each channel by the reference channel the same way the firmware does, in `f32`.
pub fn gas_ratios(gases: &[f32; GAS_CHANNEL_COUNT]) -> Option<[f32; RATIO_FEATURE_COUNT]> {
    let reference = gases[REFERENCE_CHANNEL];
    if !(reference > 0.0) || !reference.is_finite() {
        return None;
    }
    let mut ratios = [0f32; RATIO_FEATURE_COUNT];
    for (ratio, &gas) in ratios.iter_mut().zip(gases.iter()) {
        *ratio = gas / reference;
    }
    Some(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_divide_by_reference() {
        let mut gases = [0f32; GAS_CHANNEL_COUNT];
        for (i, gas) in gases.iter_mut().enumerate() {
            *gas = (i as f32 + 1.0) * 10.0;
        }
        let ratios = gas_ratios(&gases).unwrap();
        assert_eq!(ratios[0], 10.0 / 100.0);
        assert_eq!(ratios[8], 90.0 / 100.0);
    }

    #[test]
    fn non_positive_reference_has_no_ratios() {
        let mut gases = [1f32; GAS_CHANNEL_COUNT];
        gases[REFERENCE_CHANNEL] = 0.0;
        assert!(gas_ratios(&gases).is_none());
        gases[REFERENCE_CHANNEL] = -3.0;
        assert!(gas_ratios(&gases).is_none());
        gases[REFERENCE_CHANNEL] = f32::NAN;
        assert!(gas_ratios(&gases).is_none());
    }

    #[test]
    fn feature_names_follow_channels() {
        for (feature, channel) in RATIO_FEATURES.iter().zip(GAS_CHANNELS.iter()) {
            assert_eq!(*feature, format!("R_{channel}"));
        }
    }
}
