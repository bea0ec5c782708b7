//! Linux i2c-dev transport

use std::io;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use super::Transport;

/// An open `/dev/i2c-N` character device. Closed when dropped.
pub type LinuxI2c = LinuxI2CDevice;

/// Open `path` with `address` as the initial target
pub fn open(path: &str, address: u8) -> io::Result<LinuxI2c> {
    LinuxI2CDevice::new(path, u16::from(address)).map_err(io::Error::from)
}

impl Transport for LinuxI2CDevice {
    fn set_address(&mut self, address: u8) -> io::Result<()> {
        self.set_slave_address(u16::from(address))
            .map_err(io::Error::from)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        I2CDevice::write(self, bytes)
            .map(|()| bytes.len())
            .map_err(io::Error::from)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        I2CDevice::read(self, buf)
            .map(|()| buf.len())
            .map_err(io::Error::from)
    }
}
