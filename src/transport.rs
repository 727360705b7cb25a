use core::fmt;

/// Outbound channel for encoded sweeps.
///
/// `endpoint` selects one of the transport's data channels (for example a
/// BLE characteristic). Line-oriented transports have a single channel and
/// ignore it. A failed send is never fatal to the pipeline: it is counted and
/// logged, and the sweep carries on.
pub trait Transport {
  type Error;

  /// Blocking write of one payload to `endpoint`.
  fn send(&mut self, endpoint: u8, payload: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
  type Error = T::Error;

  fn send(&mut self, endpoint: u8, payload: &[u8]) -> Result<(), Self::Error> {
    T::send(self, endpoint, payload)
  }
}

/// Text transport over anything implementing [`core::fmt::Write`], such as a
/// HAL UART.
pub struct LineWriter<W> {
  writer: W,
}

impl<W: fmt::Write> LineWriter<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn writer(&self) -> &W {
    &self.writer
  }

  pub fn release(self) -> W {
    self.writer
  }
}

/// Why a [`LineWriter`] refused a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
  /// The payload is not valid UTF-8.
  Encoding,
  /// The underlying writer reported an error (e.g. nothing attached).
  Write,
}

impl<W: fmt::Write> Transport for LineWriter<W> {
  type Error = LineError;

  fn send(&mut self, _endpoint: u8, payload: &[u8]) -> Result<(), Self::Error> {
    let text = core::str::from_utf8(payload).map_err(|_| LineError::Encoding)?;
    self.writer.write_str(text).map_err(|_| LineError::Write)
  }
}

/// Transport with no receiver attached; every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl Transport for Disconnected {
  type Error = ();

  fn send(&mut self, _endpoint: u8, _payload: &[u8]) -> Result<(), Self::Error> {
    Err(())
  }
}

/// Outcome of emitting one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delivery {
  /// Payloads accepted by the transport.
  pub sent: u16,
  /// Payloads the transport refused.
  pub failed: u16,
  /// Payloads cut short at capacity.
  pub truncated: u16,
}

impl Delivery {
  pub(crate) fn record<E>(&mut self, result: Result<(), E>, endpoint: u8, len: usize) {
    match result {
      Ok(()) => self.sent += 1,
      Err(_) => {
        self.failed += 1;
        warn!("endpoint {} refused {} bytes", endpoint, len);
      }
    }
  }
}
