//! Two-point linear calibration
//!
//! The HTS221 ships with two factory calibration points per quantity. A live
//! raw reading is mapped onto physical units by the line through them:
//!
//! ```text
//! value = v0 + (raw - r0) * (v1 - v0) / (r1 - r0)
//! ```
//!
//! Readings outside `[r0, r1]` are extrapolated along the same line.

use crate::logger::Logger;

/// One factory anchor: a raw ADC count and the physical value it stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub raw: i16,
    pub value: f64,
}

impl CalibrationPoint {
    pub const fn new(raw: i16, value: f64) -> Self {
        Self { raw, value }
    }
}

/// The two anchors of a quantity's transfer line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPointCalibration {
    pub p0: CalibrationPoint,
    pub p1: CalibrationPoint,
}

impl TwoPointCalibration {
    pub const fn new(p0: CalibrationPoint, p1: CalibrationPoint) -> Self {
        Self { p0, p1 }
    }

    /// Identical raw anchors leave the slope undefined
    pub fn is_degenerate(&self) -> bool {
        self.p0.raw == self.p1.raw
    }

    /// `None` when the calibration is degenerate
    pub fn interpolate(&self, raw: i16) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }

        let r0 = f64::from(self.p0.raw);
        let r1 = f64::from(self.p1.raw);
        let x = f64::from(raw);

        Some(self.p0.value + (x - r0) * (self.p1.value - self.p0.value) / (r1 - r0))
    }

    /// Interpolate, or log through `logger` and return `0.0` if the
    /// calibration data is degenerate.
    pub fn apply(&self, raw: i16, quantity: &str, logger: &impl Logger) -> f64 {
        match self.interpolate(raw) {
            Some(value) => value,
            None => {
                logger.error(&format!(
                    "Invalid {} calibration data: both raw calibration points are {}. Cannot perform interpolation.",
                    quantity, self.p0.raw
                ));
                0.0
            }
        }
    }
}

/// Decode the temperature anchors from T0_degC_x8, T1_degC_x8 and T1/T0 MSB.
///
/// Each anchor is a 10-bit value in 1/8 °C: the low 8 bits come from its own
/// register, the top 2 from T1_T0_MSB (bits 1:0 for T0, bits 3:2 for T1).
pub fn temperature_anchors(t0_x8_lsb: u8, t1_x8_lsb: u8, msb: u8) -> (f64, f64) {
    let t0_x8 = u16::from(t0_x8_lsb) | (u16::from(msb & 0x03) << 8);
    let t1_x8 = u16::from(t1_x8_lsb) | (u16::from(msb & 0x0C) << 6);

    (f64::from(t0_x8) / 8.0, f64::from(t1_x8) / 8.0)
}

/// Humidity anchors are stored as %rH x2
pub fn humidity_anchor(rh_x2: u8) -> f64 {
    f64::from(rh_x2) / 2.0
}

/// Relative humidity cannot leave 0..=100 %
pub fn clamp_humidity(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
