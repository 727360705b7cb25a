use core::fmt::Write;

use heapless::String;

use crate::{Baseline, Delivery, Frame, Transport, MAX_RX};

/// Room for `"31"` plus sixteen `",65535"` fields and the newline.
const LINE_CAPACITY: usize = 2 + MAX_RX * 6 + 1;

/// Endpoint used for text lines; line transports have only one.
const SERIAL_ENDPOINT: u8 = 0;

/// Plain-text fallback output: one `"tx,v0,...,vN-1\n"` line per row, in scan
/// order, with unpadded values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialEmitter;

impl SerialEmitter {
  pub fn emit<T: Transport>(&self, frame: &Frame, transport: &mut T) -> Delivery {
    let mut delivery = Delivery::default();
    for (tx, samples) in frame.rows() {
      let line = row_line(tx, samples);
      delivery.record(transport.send(SERIAL_ENDPOINT, line.as_bytes()), SERIAL_ENDPOINT, line.len());
    }
    delivery
  }

  /// Calibration report: every baseline row as `"v0,v1,...,vN-1,\n"`.
  pub fn emit_baseline<T: Transport>(&self, baseline: &Baseline, transport: &mut T) -> Delivery {
    let mut delivery = Delivery::default();
    for (_, floors) in baseline.rows() {
      let mut line = String::<LINE_CAPACITY>::new();
      for &floor in floors {
        _ = write!(line, "{},", floor);
      }
      _ = line.push('\n');
      delivery.record(transport.send(SERIAL_ENDPOINT, line.as_bytes()), SERIAL_ENDPOINT, line.len());
    }
    delivery
  }
}

fn row_line(tx: usize, samples: &[u16]) -> String<LINE_CAPACITY> {
  let mut line = String::new();
  _ = write!(line, "{}", tx);
  for &sample in samples {
    _ = write!(line, ",{}", sample);
  }
  _ = line.push('\n');
  line
}
