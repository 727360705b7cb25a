//! Row-oriented packetizer for [`crate::Mode::ImmediateTransmit`].
//!
//! A sweep is sent as ASCII row records `"<tx>,<v0>,...,<vN-1>:"`, sample
//! values zero-padded to [`crate::Resolution::field_width`]. Records
//! accumulate into a bounded [`Packet`] which is flushed after every fourth
//! row and after the last row. The last row also carries the motion sample as
//! `"_<ax>_<ay>_<az>_<gx>_<gy>_<gz>"` (the temperature slot is not sent).

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::decimal_digits;
use crate::{
  ConfigError, Delivery, Dimensions, EndpointPolicy, Frame, MotionSample, Resolution, Transport, ROWS_PER_PACKET,
};

/// Largest payload the wireless transport accepts in one write.
pub const PACKET_CAPACITY: usize = 180;

/// Longest motion suffix: six fields of `"_-32768"`.
const MOTION_SUFFIX_MAX: usize = 6 * 7;

/// Fixed-capacity payload bound for one endpoint.
///
/// Writes past [`PACKET_CAPACITY`] are dropped and mark the packet truncated;
/// they never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
  endpoint: u8,
  bytes: Vec<u8, PACKET_CAPACITY>,
  truncated: bool,
}

impl Packet {
  pub const fn new() -> Self {
    Self { endpoint: 0, bytes: Vec::new(), truncated: false }
  }

  pub const fn endpoint(&self) -> u8 {
    self.endpoint
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub const fn is_truncated(&self) -> bool {
    self.truncated
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn clear(&mut self) {
    self.bytes.clear();
    self.truncated = false;
  }

  /// Append as much of `bytes` as fits.
  pub fn push_truncating(&mut self, bytes: &[u8]) {
    let room = PACKET_CAPACITY - self.bytes.len();
    let take = bytes.len().min(room);
    _ = self.bytes.extend_from_slice(&bytes[..take]);
    if take < bytes.len() {
      self.truncated = true;
    }
  }
}

impl Write for Packet {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.push_truncating(s.as_bytes());
    Ok(())
  }
}

/// `true` when the packet is flushed after `row` in a sweep of `rows` rows.
pub const fn flushes_at(row: usize, rows: usize) -> bool {
  row % ROWS_PER_PACKET == ROWS_PER_PACKET - 1 || row + 1 == rows
}

/// Serializes sweeps into packets and rotates them across endpoints.
#[derive(Debug, Clone)]
pub struct Packetizer {
  policy: EndpointPolicy,
  width: usize,
  packet: Packet,
}

impl Packetizer {
  pub const fn new(policy: EndpointPolicy, resolution: Resolution) -> Self {
    Self { policy, width: resolution.field_width(), packet: Packet::new() }
  }

  pub const fn policy(&self) -> EndpointPolicy {
    self.policy
  }

  /// Encode `frame` row by row, sending one packet per flush.
  ///
  /// Send failures are counted in the returned [`Delivery`] and do not stop
  /// the remaining rows.
  pub fn emit<T: Transport>(&mut self, frame: &Frame, motion: Option<MotionSample>, transport: &mut T) -> Delivery {
    let rows = frame.dimensions().tx;
    let mut delivery = Delivery::default();
    self.packet.clear();

    for (tx, samples) in frame.rows() {
      self.write_row(tx, samples);

      if tx + 1 == rows {
        if let Some(motion) = motion {
          self.write_motion(&motion);
        }
      }

      if flushes_at(tx, rows) {
        // Endpoint indices are bounded by MAX_TX, so they fit in a u8.
        self.packet.endpoint = self.policy.endpoint(tx) as u8;
        if self.packet.truncated {
          delivery.truncated += 1;
          warn!("packet for endpoint {} truncated at {} bytes", self.packet.endpoint, PACKET_CAPACITY);
        }
        let result = transport.send(self.packet.endpoint, self.packet.as_bytes());
        delivery.record(result, self.packet.endpoint, self.packet.len());
        trace!("flushed row {} to endpoint {} ({} bytes)", tx, self.packet.endpoint, self.packet.len());
        self.packet.clear();
      }
    }

    delivery
  }

  fn write_row(&mut self, tx: usize, samples: &[u16]) {
    _ = write!(self.packet, "{}", tx);
    for &sample in samples {
      _ = write!(self.packet, ",{:0width$}", sample, width = self.width);
    }
    self.packet.push_truncating(b":");
  }

  fn write_motion(&mut self, motion: &MotionSample) {
    for value in motion.accel.iter().chain(motion.gyro.iter()) {
      _ = write!(self.packet, "_{}", value);
    }
  }
}

/// Bytes a row record occupies when every sample fits `width` digits.
const fn row_len(tx: usize, rx: usize, width: usize) -> usize {
  decimal_digits(tx as u32) + rx * (1 + width) + 1
}

/// Reject layouts whose flushes would address a missing endpoint or whose
/// in-range sweeps could not fit a packet.
pub(crate) fn check_budget(
  dims: Dimensions,
  width: usize,
  policy: EndpointPolicy,
  endpoints: u8,
) -> Result<(), ConfigError> {
  let last = dims.tx - 1;
  let needed = policy.endpoint(last) + 1;
  if needed > endpoints as usize {
    return Err(ConfigError::EndpointBudget { needed, available: endpoints as usize });
  }

  let mut len = 0;
  for row in 0..dims.tx {
    len += row_len(row, dims.rx, width);
    if row == last {
      len += MOTION_SUFFIX_MAX;
    }
    if flushes_at(row, dims.tx) {
      if len > PACKET_CAPACITY {
        return Err(ConfigError::PacketCapacity { needed: len, capacity: PACKET_CAPACITY });
      }
      len = 0;
    }
  }

  Ok(())
}
