//! Register maps for the Sense HAT chips

/// A chip on the bus and how to recognise it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chip {
    pub name: &'static str,
    pub address: u8,
    pub who_am_i: u8,
    pub device_id: u8,
}

pub mod hts221 {
    use super::Chip;

    pub const CHIP: Chip = Chip {
        name: "Humidity Sensor",
        address: 0x5F,
        who_am_i: reg::WHO_AM_I,
        device_id: 0xBC,
    };

    pub mod reg {
        pub const WHO_AM_I: u8 = 0x0F;
        pub const AV_CONF: u8 = 0x10;
        pub const CTRL_REG1: u8 = 0x20;
        #[allow(dead_code)]
        pub const CTRL_REG2: u8 = 0x21;
        #[allow(dead_code)]
        pub const CTRL_REG3: u8 = 0x22;
        #[allow(dead_code)]
        pub const STATUS_REG: u8 = 0x27;
        pub const HUMIDITY_OUT_L: u8 = 0x28;
        pub const HUMIDITY_OUT_H: u8 = 0x29;
        pub const TEMP_OUT_L: u8 = 0x2A;
        pub const TEMP_OUT_H: u8 = 0x2B;
        pub const H0_RH_X2: u8 = 0x30;
        pub const H1_RH_X2: u8 = 0x31;
        pub const T0_DEGC_X8: u8 = 0x32;
        pub const T1_DEGC_X8: u8 = 0x33;
        pub const T1_T0_MSB: u8 = 0x35;
        pub const H0_T0_OUT_L: u8 = 0x36;
        pub const H0_T0_OUT_H: u8 = 0x37;
        pub const H1_T0_OUT_L: u8 = 0x3A;
        pub const H1_T0_OUT_H: u8 = 0x3B;
        pub const T0_OUT_L: u8 = 0x3C;
        pub const T0_OUT_H: u8 = 0x3D;
        pub const T1_OUT_L: u8 = 0x3E;
        pub const T1_OUT_H: u8 = 0x3F;
    }

    /// CTRL_REG1 bits
    pub mod ctrl1 {
        /// Power down control, 1 = active
        pub const PD: u8 = 0x80;
        /// Block data update: output registers hold until both bytes are read
        pub const BDU: u8 = 0x04;
        #[allow(dead_code)]
        pub const ODR_ONE_SHOT: u8 = 0x00;
        pub const ODR_1HZ: u8 = 0x01;
        #[allow(dead_code)]
        pub const ODR_7HZ: u8 = 0x02;
        #[allow(dead_code)]
        pub const ODR_12_5HZ: u8 = 0x03;
    }

    /// Value written to CTRL_REG1 at startup (0x85)
    pub const CTRL_REG1_ACTIVE: u8 = ctrl1::PD | ctrl1::BDU | ctrl1::ODR_1HZ;

    /// AV_CONF layout: AVGT in bits 5:3, AVGH in bits 2:0
    pub mod av_conf {
        pub const AVGT_SHIFT: u8 = 3;
        pub const AVGT_MASK: u8 = 0x38;
        pub const AVGH_MASK: u8 = 0x07;

        /// Temperature sample counts, indexed by AVGT field value
        pub const TEMPERATURE_SAMPLES: [u16; 8] = [2, 4, 8, 16, 32, 64, 128, 256];
        /// Humidity sample counts, indexed by AVGH field value
        pub const HUMIDITY_SAMPLES: [u16; 8] = [4, 8, 16, 32, 64, 128, 256, 512];

        /// Reset defaults: 16 temperature / 32 humidity samples
        pub const DEFAULT_TEMPERATURE_SAMPLES: u16 = 16;
        pub const DEFAULT_HUMIDITY_SAMPLES: u16 = 32;
    }
}

pub mod lps25h {
    use super::Chip;

    pub const CHIP: Chip = Chip {
        name: "Pressure Sensor",
        address: 0x5C,
        who_am_i: reg::WHO_AM_I,
        device_id: 0xBD,
    };

    pub mod reg {
        pub const WHO_AM_I: u8 = 0x0F;
    }
}

pub mod lsm9ds1 {
    pub mod mag {
        use super::super::Chip;

        pub const CHIP: Chip = Chip {
            name: "Magnetometer Sensor",
            address: 0x1C,
            who_am_i: reg::WHO_AM_I_M,
            device_id: 0x3D,
        };

        pub mod reg {
            pub const WHO_AM_I_M: u8 = 0x0F;
        }
    }

    pub mod gyro {
        use super::super::Chip;

        pub const CHIP: Chip = Chip {
            name: "Gyroscope/Accelerometer Sensor",
            address: 0x6A,
            who_am_i: reg::WHO_AM_I,
            device_id: 0x68,
        };

        pub mod reg {
            pub const WHO_AM_I: u8 = 0x0F;
        }
    }
}

/// Every chip the Sense HAT carries, in verification order
pub const SENSE_HAT_CHIPS: [Chip; 4] = [
    hts221::CHIP,
    lps25h::CHIP,
    lsm9ds1::mag::CHIP,
    lsm9ds1::gyro::CHIP,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_reg1_composition() {
        assert_eq!(hts221::CTRL_REG1_ACTIVE, 0x85);
    }

    #[test]
    fn test_chip_addresses_are_distinct_7bit() {
        for (i, a) in SENSE_HAT_CHIPS.iter().enumerate() {
            assert!(a.address < 0x80);
            for b in SENSE_HAT_CHIPS.iter().skip(i + 1) {
                assert_ne!(a.address, b.address);
            }
        }
    }

    #[test]
    fn test_hts221_control_block_layout() {
        use hts221::{ctrl1, reg};

        assert_eq!(
            [reg::CTRL_REG1, reg::CTRL_REG2, reg::CTRL_REG3],
            [0x20, 0x21, 0x22]
        );
        assert_eq!(reg::STATUS_REG, 0x27);
        assert_eq!(
            [ctrl1::ODR_ONE_SHOT, ctrl1::ODR_1HZ, ctrl1::ODR_7HZ, ctrl1::ODR_12_5HZ],
            [0, 1, 2, 3]
        );
    }
}
