//! Hardware identity check against each chip's WHO_AM_I register

use serde::Serialize;

use super::registers::Chip;
use crate::i2c::{Bus, Transport};
use crate::logger::Logger;

/// Outcome for a single chip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipCheck {
    pub name: &'static str,
    pub address: u8,
    pub expected: u8,
    /// `None` if the identity register could not be read at all
    pub actual: Option<u8>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<ChipCheck>,
    pub all_passed: bool,
}

impl VerificationReport {
    pub fn failed(&self) -> impl Iterator<Item = &ChipCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

/// Read every chip's identity register and compare it with the expected id.
///
/// Mismatches and unreadable chips are reported, never raised, so a caller can
/// keep running with a partially working sensor set.
pub fn verify_chips<T: Transport>(
    bus: &mut Bus<T>,
    chips: &[Chip],
    logger: &impl Logger,
) -> VerificationReport {
    let checks: Vec<ChipCheck> = chips
        .iter()
        .map(|chip| check_chip(bus, chip, logger))
        .collect();
    let all_passed = checks.iter().all(|check| check.passed);

    VerificationReport { checks, all_passed }
}

fn check_chip<T: Transport>(bus: &mut Bus<T>, chip: &Chip, logger: &impl Logger) -> ChipCheck {
    let actual = match bus.device(chip.name, chip.address).read_byte(chip.who_am_i) {
        Ok(id) => Some(id),
        Err(e) => {
            logger.error(&format!("❌ {} could not be read: {}", chip.name, e));
            None
        }
    };

    let passed = actual == Some(chip.device_id);
    match actual {
        Some(id) if passed => {
            logger.info(&format!("✅ {} hardware ID verified: 0x{:02X}", chip.name, id));
        }
        Some(id) => {
            logger.error(&format!(
                "❌ {} hardware ID mismatch: expected 0x{:02X}, got 0x{:02X}",
                chip.name, chip.device_id, id
            ));
        }
        None => {}
    }

    ChipCheck {
        name: chip.name,
        address: chip.address,
        expected: chip.device_id,
        actual,
        passed,
    }
}
