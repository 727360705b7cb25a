use super::ConfigError;

/// Largest number of transmit rows a five-line multiplexer can address.
pub const MAX_TX: usize = 32;
/// Largest number of receive channels sampled per transmit row.
pub const MAX_RX: usize = 16;

/// Shape of one sweep: `tx` transmit rows by `rx` receive columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dimensions {
  pub tx: usize,
  pub rx: usize,
}

impl Dimensions {
  pub const fn new(tx: usize, rx: usize) -> Self {
    Self { tx, rx }
  }

  pub const fn cells(&self) -> usize {
    self.tx * self.rx
  }

  pub(crate) const fn validate(&self) -> Result<(), ConfigError> {
    if self.tx == 0 || self.rx == 0 {
      return Err(ConfigError::NoChannels);
    }
    if self.tx > MAX_TX {
      return Err(ConfigError::TooManyTx { tx: self.tx, max: MAX_TX });
    }
    if self.rx > MAX_RX {
      return Err(ConfigError::TooManyRx { rx: self.rx, max: MAX_RX });
    }
    Ok(())
  }
}

/// Electrode layout: how many transmit rows the multiplexer walks, and which
/// converter input each receive column is wired to.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Grid {
  pub tx: u8,
  inputs: [u8; MAX_RX],
  rx: usize,
}

impl Grid {
  pub const fn new<const RX: usize>(tx: u8, inputs: [u8; RX]) -> Self {
    assert!(RX <= MAX_RX, "maximum 16 rx channels");
    let mut full = [0; MAX_RX];
    let mut i = 0;
    while i < RX {
      full[i] = inputs[i];
      i += 1;
    }
    Self { tx, inputs: full, rx: RX }
  }

  pub const fn with_tx(mut self, tx: u8) -> Self {
    self.tx = tx;
    self
  }

  pub const fn with_inputs<const RX: usize>(self, inputs: [u8; RX]) -> Self {
    Self::new(self.tx, inputs)
  }

  /// Converter inputs in receive-column order.
  pub fn inputs(&self) -> &[u8] {
    &self.inputs[..self.rx]
  }

  pub const fn dimensions(&self) -> Dimensions {
    Dimensions::new(self.tx as usize, self.rx)
  }
}

impl Default for Grid {
  fn default() -> Self {
    Self::new(23, [0, 1, 2, 3, 4, 5, 6, 7])
  }
}
