//! Host-side stand-ins for the hardware the pipeline talks to.

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{self, ErrorType, OutputPin, PinState};
use embedded_hal::i2c::{self, I2c, Operation, SevenBitAddress};

use crate::{Converter, Transport};

/// Shared view of the multiplexer address lines.
#[derive(Clone, Default)]
pub struct Bus(Rc<RefCell<[bool; 5]>>);

impl Bus {
  pub fn pins<const N: usize>(&self) -> [FakePin; N] {
    core::array::from_fn(|line| FakePin { line, bus: self.clone(), broken: false })
  }

  pub fn levels(&self) -> [bool; 5] {
    *self.0.borrow()
  }

  pub fn channel(&self) -> usize {
    self.levels().iter().enumerate().map(|(k, high)| usize::from(*high) << k).sum()
  }
}

pub struct FakePin {
  line: usize,
  bus: Bus,
  broken: bool,
}

impl FakePin {
  pub fn broken(bus: &Bus, line: usize) -> Self {
    Self { line, bus: bus.clone(), broken: true }
  }

  fn drive(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
    if self.broken {
      return Err(digital::ErrorKind::Other);
    }
    self.bus.0.borrow_mut()[self.line] = high;
    Ok(())
  }
}

impl ErrorType for FakePin {
  type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    self.drive(false)
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    self.drive(true)
  }
}

/// Converter whose samples come from a closure of
/// `(sweep, selected tx, converter input)`. `cells` is the number of reads
/// that make up one sweep.
pub struct FakeAdc<F> {
  bus: Bus,
  cells: usize,
  source: F,
  /// Every `(tx, input)` pair in read order.
  pub reads: Vec<(usize, u8)>,
}

impl<F: FnMut(usize, usize, u8) -> u16> FakeAdc<F> {
  pub fn new(bus: &Bus, cells: usize, source: F) -> Self {
    Self { bus: bus.clone(), cells, source, reads: Vec::new() }
  }
}

impl<F: FnMut(usize, usize, u8) -> u16> Converter for FakeAdc<F> {
  fn sample(&mut self, input: u8) -> u16 {
    let tx = self.bus.channel();
    let sweep = self.reads.len() / self.cells;
    self.reads.push((tx, input));
    (self.source)(sweep, tx, input)
  }
}

/// Indicator that remembers every level it was driven to.
#[derive(Default)]
pub struct FakeLed {
  pub states: Vec<PinState>,
}

impl ErrorType for FakeLed {
  type Error = Infallible;
}

impl OutputPin for FakeLed {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    self.states.push(PinState::Low);
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    self.states.push(PinState::High);
    Ok(())
  }
}

/// Transport that captures payloads; endpoints listed in `offline` refuse them.
#[derive(Default)]
pub struct FakeTransport {
  pub sent: Vec<(u8, Vec<u8>)>,
  pub offline: Vec<u8>,
}

impl FakeTransport {
  pub fn text(&self, index: usize) -> &str {
    core::str::from_utf8(&self.sent[index].1).unwrap()
  }

  pub fn endpoints(&self) -> Vec<u8> {
    self.sent.iter().map(|(endpoint, _)| *endpoint).collect()
  }

  pub fn joined(&self) -> std::string::String {
    self.sent.iter().map(|(_, bytes)| core::str::from_utf8(bytes).unwrap()).collect()
  }
}

impl Transport for FakeTransport {
  type Error = ();

  fn send(&mut self, endpoint: u8, payload: &[u8]) -> Result<(), Self::Error> {
    if self.offline.contains(&endpoint) {
      return Err(());
    }
    self.sent.push((endpoint, payload.to_vec()));
    Ok(())
  }
}

/// Register-file I²C device with an auto-incrementing register pointer.
pub struct FakeI2c {
  pub address: u8,
  pub regs: [u8; 256],
  pointer: u8,
  /// Raw payload of every write operation.
  pub writes: Vec<Vec<u8>>,
}

impl FakeI2c {
  pub fn new(address: u8) -> Self {
    Self { address, regs: [0; 256], pointer: 0, writes: Vec::new() }
  }
}

impl i2c::ErrorType for FakeI2c {
  type Error = i2c::ErrorKind;
}

impl I2c<SevenBitAddress> for FakeI2c {
  fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    if address != self.address {
      return Err(i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
    }
    for op in operations {
      match op {
        Operation::Write(bytes) => {
          self.writes.push(bytes.to_vec());
          if let Some((&reg, data)) = bytes.split_first() {
            self.pointer = reg;
            for &byte in data {
              self.regs[self.pointer as usize] = byte;
              self.pointer = self.pointer.wrapping_add(1);
            }
          }
        }
        Operation::Read(buf) => {
          for byte in buf.iter_mut() {
            *byte = self.regs[self.pointer as usize];
            self.pointer = self.pointer.wrapping_add(1);
          }
        }
      }
    }
    Ok(())
  }
}
