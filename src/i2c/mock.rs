//! In-memory register file standing in for real chips in tests

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::Transport;

#[derive(Default)]
struct State {
    registers: HashMap<(u8, u8), u8>,
    address: Option<u8>,
    pointer: u8,
    selects: usize,
    writes: Vec<(u8, Vec<u8>)>,
    fail_select: bool,
    fail_io: bool,
    short_reads: bool,
    short_writes: bool,
}

/// Cloneable handle; clones share one register file so a test can keep
/// inspecting it after handing a clone to a `Bus`.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_register(&self, address: u8, register: u8, value: u8) {
        self.state().registers.insert((address, register), value);
    }

    pub fn set_i16(&self, address: u8, lo_register: u8, hi_register: u8, value: i16) {
        let [low, high] = value.to_le_bytes();
        self.set_register(address, lo_register, low);
        self.set_register(address, hi_register, high);
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.state()
            .registers
            .get(&(address, register))
            .copied()
            .unwrap_or(0)
    }

    pub fn select_count(&self) -> usize {
        self.state().selects
    }

    /// Multi-byte writes (register + value) in order, keyed by address
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.state().writes.clone()
    }

    pub fn fail_select(&self, fail: bool) {
        self.state().fail_select = fail;
    }

    pub fn fail_io(&self, fail: bool) {
        self.state().fail_io = fail;
    }

    pub fn short_reads(&self, short: bool) {
        self.state().short_reads = short;
    }

    pub fn short_writes(&self, short: bool) {
        self.state().short_writes = short;
    }
}

impl Transport for MockTransport {
    fn set_address(&mut self, address: u8) -> io::Result<()> {
        let mut state = self.state();
        if state.fail_select {
            return Err(io::Error::new(io::ErrorKind::Other, "select rejected"));
        }
        state.selects += 1;
        state.address = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        if state.fail_io {
            return Err(io::Error::new(io::ErrorKind::Other, "write failed"));
        }
        let address = state
            .address
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no address selected"))?;
        if state.short_writes {
            return Ok(bytes.len().saturating_sub(1));
        }
        match bytes {
            [register] => state.pointer = *register,
            [register, value] => {
                state.registers.insert((address, *register), *value);
                state.writes.push((address, bytes.to_vec()));
            }
            _ => return Err(io::Error::new(io::ErrorKind::InvalidInput, "unexpected write")),
        }
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let state = self.state();
        if state.fail_io {
            return Err(io::Error::new(io::ErrorKind::Other, "read failed"));
        }
        if state.short_reads {
            return Ok(0);
        }
        let address = state
            .address
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no address selected"))?;
        for (offset, byte) in buf.iter_mut().enumerate() {
            let register = state.pointer.wrapping_add(offset as u8);
            *byte = state.registers.get(&(address, register)).copied().unwrap_or(0);
        }
        Ok(buf.len())
    }
}
