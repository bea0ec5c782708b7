//! Register transaction layer - a shared I2C bus and the devices addressed on it
//!
//! The bus remembers which 7-bit address is currently selected so that
//! back-to-back transactions against the same chip skip the address switch.
//!
//! Nothing in this layer logs; faults come back as `BusError` and the caller
//! reports them through its own `Logger`.
//!
//! There is no locking here. A `Device` mutably borrows its `Bus` for the
//! length of a transaction, so within one thread the borrow checker enforces a
//! single accessor. Across threads the owner must make sure only one context
//! touches the bus at a time (verification finishes before polling starts).

pub mod linux;

#[cfg(test)]
pub mod mock;

use std::io;

pub use linux::LinuxI2c;

/// Errors from the register layer. Every variant is an I/O fault.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to open I2C bus {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to select address 0x{address:02X} on {path}: {source}")]
    Select {
        path: String,
        address: u8,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {device} (0x{address:02X}) register 0x{register:02X}: {source}")]
    Io {
        device: &'static str,
        address: u8,
        register: u8,
        #[source]
        source: io::Error,
    },

    #[error("short transfer on {device} (0x{address:02X}) register 0x{register:02X}: expected {expected} byte(s), got {actual}")]
    ShortTransfer {
        device: &'static str,
        address: u8,
        register: u8,
        expected: usize,
        actual: usize,
    },
}

/// Raw byte transport underneath a `Bus`.
///
/// `set_address` switches the target of subsequent reads and writes.
/// `read`/`write` report how many bytes actually moved.
pub trait Transport {
    fn set_address(&mut self, address: u8) -> io::Result<()>;
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Exclusive owner of a bus handle plus the currently selected address.
///
/// The handle is released when the transport is dropped.
pub struct Bus<T> {
    path: String,
    transport: T,
    active: Option<u8>,
}

impl Bus<LinuxI2c> {
    /// Open a Linux i2c-dev character device, e.g. `/dev/i2c-1`, with
    /// `address` already selected
    pub fn open(path: impl Into<String>, address: u8) -> Result<Self, BusError> {
        let path = path.into();
        let transport = linux::open(&path, address).map_err(|source| BusError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            active: Some(address),
            ..Self::with_transport(path, transport)
        })
    }
}

impl<T: Transport> Bus<T> {
    pub fn with_transport(path: impl Into<String>, transport: T) -> Self {
        Self {
            path: path.into(),
            transport,
            active: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Make `address` the target of the next transfer. No-op if already selected.
    pub fn select(&mut self, address: u8) -> Result<(), BusError> {
        if self.active == Some(address) {
            return Ok(());
        }

        if let Err(source) = self.transport.set_address(address) {
            // The kernel may have left the previous address or none at all
            self.active = None;
            return Err(BusError::Select {
                path: self.path.clone(),
                address,
                source,
            });
        }

        self.active = Some(address);
        Ok(())
    }

    /// Borrow the bus as a named device at `address`
    pub fn device(&mut self, name: &'static str, address: u8) -> Device<'_, T> {
        Device {
            bus: self,
            name,
            address,
        }
    }
}

/// A named, addressed endpoint on a `Bus`, alive for one borrow of it
pub struct Device<'b, T> {
    bus: &'b mut Bus<T>,
    name: &'static str,
    address: u8,
}

impl<T: Transport> Device<'_, T> {
    /// Write the register pointer, then read one byte back
    pub fn read_byte(&mut self, register: u8) -> Result<u8, BusError> {
        self.bus.select(self.address)?;

        let written = self
            .bus
            .transport
            .write(&[register])
            .map_err(|source| self.io_error(register, source))?;
        self.check_count(register, 1, written)?;

        let mut value = [0u8; 1];
        let read = self
            .bus
            .transport
            .read(&mut value)
            .map_err(|source| self.io_error(register, source))?;
        self.check_count(register, 1, read)?;

        Ok(value[0])
    }

    /// Read a little-endian register pair as a two's-complement `i16`.
    ///
    /// The two bytes come from separate transactions.
    pub fn read_i16(&mut self, lo_register: u8, hi_register: u8) -> Result<i16, BusError> {
        let low = self.read_byte(lo_register)?;
        let high = self.read_byte(hi_register)?;
        Ok(i16::from_le_bytes([low, high]))
    }

    /// Write `[register, value]` in a single transaction
    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        self.bus.select(self.address)?;

        let written = self
            .bus
            .transport
            .write(&[register, value])
            .map_err(|source| self.io_error(register, source))?;
        self.check_count(register, 2, written)
    }

    fn io_error(&self, register: u8, source: io::Error) -> BusError {
        BusError::Io {
            device: self.name,
            address: self.address,
            register,
            source,
        }
    }

    fn check_count(&self, register: u8, expected: usize, actual: usize) -> Result<(), BusError> {
        if expected == actual {
            return Ok(());
        }
        Err(BusError::ShortTransfer {
            device: self.name,
            address: self.address,
            register,
            expected,
            actual,
        })
    }
}
