//! The Sense HAT as a whole: one bus, four chips, calibrated readings

use super::ambient::{AmbientSource, NoAmbient};
use super::calibration::{
    clamp_humidity, humidity_anchor, temperature_anchors, CalibrationPoint, TwoPointCalibration,
};
use super::compensation::Compensation;
use super::registers::{hts221, SENSE_HAT_CHIPS};
use super::verify::{verify_chips, VerificationReport};
use super::{Averaging, Reading, TemperatureUnit};
use crate::i2c::{Bus, BusError, LinuxI2c, Transport};
use crate::logger::{Logger, NullLogger};

/// Settings applied when the board is brought up
#[derive(Debug, Clone, Copy, Default)]
pub struct SenseHatOptions {
    pub compensation: Compensation,
    /// Written to AV_CONF when set, chip defaults otherwise
    pub averaging: Option<Averaging>,
}

/// Owns the bus; devices are borrowed from it per transaction.
///
/// Calibration registers are re-read on every sample. They only change on a
/// chip reset, so this costs a few extra transfers and nothing else.
pub struct SenseHat<T, L = NullLogger> {
    bus: Bus<T>,
    logger: L,
    compensation: Compensation,
    ambient: Box<dyn AmbientSource>,
}

impl<L: Logger> SenseHat<LinuxI2c, L> {
    /// Open `path` and initialise the humidity/temperature chip
    pub fn open(path: &str, logger: L, options: SenseHatOptions) -> Result<Self, BusError> {
        Self::new(Bus::open(path, hts221::CHIP.address)?, logger, options)
    }
}

impl<T: Transport, L: Logger> SenseHat<T, L> {
    pub fn new(bus: Bus<T>, logger: L, options: SenseHatOptions) -> Result<Self, BusError> {
        let mut sense_hat = Self {
            bus,
            logger,
            compensation: options.compensation,
            ambient: Box::new(NoAmbient),
        };
        sense_hat.init(options.averaging)?;
        Ok(sense_hat)
    }

    /// Source of the external metric for proportional compensation
    pub fn with_ambient(mut self, ambient: impl AmbientSource + 'static) -> Self {
        self.ambient = Box::new(ambient);
        self
    }

    fn init(&mut self, averaging: Option<Averaging>) -> Result<(), BusError> {
        let mut hts = self.bus.device(hts221::CHIP.name, hts221::CHIP.address);

        if let Some(averaging) = averaging {
            hts.write_byte(hts221::reg::AV_CONF, averaging.register_value())?;
            self.logger.debug(&format!(
                "HTS221 averaging set to {} temperature / {} humidity samples",
                averaging.temperature_samples(),
                averaging.humidity_samples()
            ));
        }

        hts.write_byte(hts221::reg::CTRL_REG1, hts221::CTRL_REG1_ACTIVE)?;
        self.logger
            .debug(&format!("{} powered up on {}", hts221::CHIP.name, self.bus.path()));
        Ok(())
    }

    /// Check every chip's identity register; logs one line per chip plus a summary
    pub fn verify(&mut self) -> VerificationReport {
        self.logger.info("Testing SenseHat hardware...");

        let report = verify_chips(&mut self.bus, &SENSE_HAT_CHIPS, &self.logger);

        if report.all_passed {
            self.logger
                .info("✅ All SenseHat hardware components verified successfully");
        } else {
            self.logger.error(
                "❌ One or more SenseHat hardware components failed verification. \
                 Please review the error messages above for details.",
            );
        }
        report
    }

    fn temperature_calibration(&mut self) -> Result<TwoPointCalibration, BusError> {
        let mut hts = self.bus.device(hts221::CHIP.name, hts221::CHIP.address);

        let t0_x8 = hts.read_byte(hts221::reg::T0_DEGC_X8)?;
        let t1_x8 = hts.read_byte(hts221::reg::T1_DEGC_X8)?;
        let msb = hts.read_byte(hts221::reg::T1_T0_MSB)?;
        let (t0, t1) = temperature_anchors(t0_x8, t1_x8, msb);

        let t0_raw = hts.read_i16(hts221::reg::T0_OUT_L, hts221::reg::T0_OUT_H)?;
        let t1_raw = hts.read_i16(hts221::reg::T1_OUT_L, hts221::reg::T1_OUT_H)?;

        Ok(TwoPointCalibration::new(
            CalibrationPoint::new(t0_raw, t0),
            CalibrationPoint::new(t1_raw, t1),
        ))
    }

    fn humidity_calibration(&mut self) -> Result<TwoPointCalibration, BusError> {
        let mut hts = self.bus.device(hts221::CHIP.name, hts221::CHIP.address);

        let h0 = humidity_anchor(hts.read_byte(hts221::reg::H0_RH_X2)?);
        let h1 = humidity_anchor(hts.read_byte(hts221::reg::H1_RH_X2)?);
        let h0_raw = hts.read_i16(hts221::reg::H0_T0_OUT_L, hts221::reg::H0_T0_OUT_H)?;
        let h1_raw = hts.read_i16(hts221::reg::H1_T0_OUT_L, hts221::reg::H1_T0_OUT_H)?;

        Ok(TwoPointCalibration::new(
            CalibrationPoint::new(h0_raw, h0),
            CalibrationPoint::new(h1_raw, h1),
        ))
    }

    /// Interpolated temperature in °C before compensation
    pub fn read_raw_temperature(&mut self) -> Result<f64, BusError> {
        let calibration = self.temperature_calibration()?;
        let raw = self
            .bus
            .device(hts221::CHIP.name, hts221::CHIP.address)
            .read_i16(hts221::reg::TEMP_OUT_L, hts221::reg::TEMP_OUT_H)?;
        self.logger.trace(&format!("TEMP_OUT = {}", raw));

        Ok(calibration.apply(raw, "temperature", &self.logger))
    }

    /// Compensated temperature in the requested unit
    pub fn read_temperature(&mut self, unit: TemperatureUnit) -> Result<f64, BusError> {
        let celsius = self.read_raw_temperature()?;

        let external = if self.compensation.needs_external_metric() {
            let metric = self.ambient.sample();
            if metric.is_none() {
                self.logger
                    .warn("External metric unavailable, temperature compensation skipped");
            }
            metric
        } else {
            None
        };
        let celsius = self.compensation.apply(celsius, external);

        Ok(unit.from_celsius(celsius))
    }

    /// Relative humidity in %, clamped to 0..=100
    pub fn read_humidity(&mut self) -> Result<f64, BusError> {
        let calibration = self.humidity_calibration()?;
        let raw = self
            .bus
            .device(hts221::CHIP.name, hts221::CHIP.address)
            .read_i16(hts221::reg::HUMIDITY_OUT_L, hts221::reg::HUMIDITY_OUT_H)?;
        self.logger.trace(&format!("HUMIDITY_OUT = {}", raw));

        Ok(clamp_humidity(calibration.apply(raw, "humidity", &self.logger)))
    }

    /// One full record; Fahrenheit is derived from the compensated Celsius value
    pub fn sample(&mut self) -> Result<Reading, BusError> {
        let temperature_celsius = self.read_temperature(TemperatureUnit::Celsius)?;
        let humidity = self.read_humidity()?;

        Ok(Reading {
            temperature_celsius,
            temperature_fahrenheit: TemperatureUnit::Fahrenheit.from_celsius(temperature_celsius),
            humidity,
        })
    }
}
