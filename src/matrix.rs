use crate::{ConfigError, Dimensions, MAX_RX, MAX_TX};

/// One sweep of raw converter samples, tx-major.
///
/// Storage is fixed at [`MAX_TX`] × [`MAX_RX`]; only the configured
/// [`Dimensions`] are visible through the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
  cells: [[u16; MAX_RX]; MAX_TX],
  dims: Dimensions,
}

impl Frame {
  pub fn new(dims: Dimensions) -> Result<Self, ConfigError> {
    dims.validate()?;
    Ok(Self { cells: [[0; MAX_RX]; MAX_TX], dims })
  }

  pub const fn dimensions(&self) -> Dimensions {
    self.dims
  }

  pub fn get(&self, tx: usize, rx: usize) -> Option<u16> {
    self.row(tx)?.get(rx).copied()
  }

  /// Returns the previous value, or `None` when the cell is outside the frame.
  pub fn set(&mut self, tx: usize, rx: usize, value: u16) -> Option<u16> {
    let cell = self.row_mut(tx)?.get_mut(rx)?;
    Some(core::mem::replace(cell, value))
  }

  pub fn row(&self, tx: usize) -> Option<&[u16]> {
    (tx < self.dims.tx).then(|| &self.cells[tx][..self.dims.rx])
  }

  pub fn row_mut(&mut self, tx: usize) -> Option<&mut [u16]> {
    if tx < self.dims.tx {
      Some(&mut self.cells[tx][..self.dims.rx])
    } else {
      None
    }
  }

  /// Rows in scan order, paired with their tx index.
  pub fn rows(&self) -> impl Iterator<Item = (usize, &[u16])> + '_ {
    self.cells[..self.dims.tx].iter().map(|row| &row[..self.dims.rx]).enumerate()
  }

  pub(crate) fn check_shape(&self, expected: Dimensions) -> Result<(), ConfigError> {
    if self.dims == expected {
      Ok(())
    } else {
      Err(ConfigError::ShapeMismatch { expected, actual: self.dims })
    }
  }
}

/// Per-cell noise floor: the running maximum of every sample seen while
/// calibrating. It is exposed to callers but not consulted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline(Frame);

impl Baseline {
  pub fn new(dims: Dimensions) -> Result<Self, ConfigError> {
    Frame::new(dims).map(Self)
  }

  /// Raise every cell to at least the matching sample of `frame`.
  pub fn absorb(&mut self, frame: &Frame) -> Result<(), ConfigError> {
    frame.check_shape(self.0.dims)?;
    for (tx, row) in frame.rows() {
      for (floor, &sample) in self.0.cells[tx].iter_mut().zip(row) {
        *floor = (*floor).max(sample);
      }
    }
    Ok(())
  }

  pub const fn dimensions(&self) -> Dimensions {
    self.0.dims
  }

  pub fn get(&self, tx: usize, rx: usize) -> Option<u16> {
    self.0.get(tx, rx)
  }

  pub fn row(&self, tx: usize) -> Option<&[u16]> {
    self.0.row(tx)
  }

  pub fn rows(&self) -> impl Iterator<Item = (usize, &[u16])> + '_ {
    self.0.rows()
  }

  pub fn as_frame(&self) -> &Frame {
    &self.0
  }
}
