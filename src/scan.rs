use embedded_hal::digital::OutputPin;

use crate::{Dimensions, Error, Frame, Grid, Mux};

/// Analog-to-digital converter shared by all receive columns.
///
/// Reads are taken as-is: a garbage sample is handed downstream unchanged, so
/// converter health is the implementor's concern.
pub trait Converter {
  /// Blocking single conversion on converter input `input`.
  fn sample(&mut self, input: u8) -> u16;
}

impl<T: Converter + ?Sized> Converter for &mut T {
  fn sample(&mut self, input: u8) -> u16 {
    T::sample(self, input)
  }
}

/// Walks the transmit rows through the multiplexer and samples every receive
/// column on each of them.
pub struct Scanner<P, A, const LINES: usize> {
  mux: Mux<P, LINES>,
  adc: A,
  grid: Grid,
}

impl<P, E, A, const LINES: usize> Scanner<P, A, LINES>
where
  P: OutputPin<Error = E>,
  A: Converter,
{
  pub fn new(mux: Mux<P, LINES>, adc: A, grid: Grid) -> Self {
    Self { mux, adc, grid }
  }

  pub const fn dimensions(&self) -> Dimensions {
    self.grid.dimensions()
  }

  /// One full sweep into a fresh frame.
  pub fn scan(&mut self) -> Result<Frame, Error<E>> {
    let mut frame = Frame::new(self.dimensions())?;
    self.scan_into(&mut frame)?;
    Ok(frame)
  }

  /// One full sweep, tx-major: each row is selected once, then its columns
  /// are read in wiring order.
  pub fn scan_into(&mut self, frame: &mut Frame) -> Result<(), Error<E>> {
    let dims = self.dimensions();
    frame.check_shape(dims)?;

    for tx in 0..dims.tx {
      self.mux.select(tx).map_err(Error::Pin)?;
      if let Some(row) = frame.row_mut(tx) {
        for (cell, &input) in row.iter_mut().zip(self.grid.inputs()) {
          *cell = self.adc.sample(input);
        }
      }
    }

    trace!("sweep {}x{} done", dims.tx, dims.rx);
    Ok(())
  }

  pub fn release(self) -> (Mux<P, LINES>, A) {
    (self.mux, self.adc)
  }
}
