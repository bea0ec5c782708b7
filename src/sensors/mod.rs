//! Sense HAT sensors - register maps, calibration, verification and the board itself

pub mod ambient;
pub mod calibration;
pub mod compensation;
pub mod registers;
pub mod sense_hat;
pub mod verify;

use serde::Serialize;

use registers::hts221::av_conf;

pub use ambient::CpuTemperature;
pub use compensation::Compensation;
pub use sense_hat::{SenseHat, SenseHatOptions};

/// One emitted sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub temperature_celsius: f64,
    pub temperature_fahrenheit: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => calibration::celsius_to_fahrenheit(celsius),
        }
    }
}

/// HTS221 internal averaging, as AV_CONF field values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Averaging {
    avgt: u8,
    avgh: u8,
}

impl Averaging {
    /// `None` unless both counts are ones the chip supports
    pub fn new(temperature_samples: u16, humidity_samples: u16) -> Option<Self> {
        Some(Self {
            avgt: field_for(&av_conf::TEMPERATURE_SAMPLES, temperature_samples)?,
            avgh: field_for(&av_conf::HUMIDITY_SAMPLES, humidity_samples)?,
        })
    }

    pub fn temperature_samples(&self) -> u16 {
        av_conf::TEMPERATURE_SAMPLES[usize::from(self.avgt)]
    }

    pub fn humidity_samples(&self) -> u16 {
        av_conf::HUMIDITY_SAMPLES[usize::from(self.avgh)]
    }

    pub fn register_value(&self) -> u8 {
        ((self.avgt << av_conf::AVGT_SHIFT) & av_conf::AVGT_MASK) | (self.avgh & av_conf::AVGH_MASK)
    }
}

impl Default for Averaging {
    fn default() -> Self {
        Self {
            avgt: 3,
            avgh: 3,
        }
    }
}

fn field_for(table: &[u16; 8], samples: u16) -> Option<u8> {
    table
        .iter()
        .position(|&n| n == samples)
        .and_then(|i| u8::try_from(i).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_averaging_matches_reset_value() {
        let averaging = Averaging::default();
        assert_eq!(averaging.register_value(), 0x1B);
        assert_eq!(averaging.temperature_samples(), av_conf::DEFAULT_TEMPERATURE_SAMPLES);
        assert_eq!(averaging.humidity_samples(), av_conf::DEFAULT_HUMIDITY_SAMPLES);
        assert_eq!(
            Averaging::new(
                av_conf::DEFAULT_TEMPERATURE_SAMPLES,
                av_conf::DEFAULT_HUMIDITY_SAMPLES
            ),
            Some(averaging)
        );
    }

    #[test]
    fn test_averaging_extremes() {
        assert_eq!(Averaging::new(2, 4).unwrap().register_value(), 0x00);
        assert_eq!(Averaging::new(256, 512).unwrap().register_value(), 0x3F);
    }

    #[test]
    fn test_rejects_unsupported_counts() {
        assert_eq!(Averaging::new(3, 32), None);
        assert_eq!(Averaging::new(16, 2), None);
        assert_eq!(Averaging::new(512, 32), None);
    }

    #[test]
    fn test_reading_serializes_with_expected_fields() {
        let reading = Reading {
            temperature_celsius: 25.0,
            temperature_fahrenheit: 77.0,
            humidity: 50.5,
        };
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature_celsius": 25.0,
                "temperature_fahrenheit": 77.0,
                "humidity": 50.5,
            })
        );
    }
}
