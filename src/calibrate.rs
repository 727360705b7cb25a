use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::{Baseline, Converter, Error, Frame, Scanner};

/// Sweeps folded into the baseline by the reference firmware.
pub const DEFAULT_CALIBRATION_FRAMES: u16 = 30;

/// Startup noise calibration: the per-cell maximum over a fixed number of
/// sweeps. No averaging, no variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibrator {
  frames: u16,
}

impl Calibrator {
  pub const fn new(frames: u16) -> Self {
    Self { frames }
  }

  pub const fn frames(&self) -> u16 {
    self.frames
  }

  /// Run the calibration sweeps, blinking `indicator` while they last.
  ///
  /// Blocks for `frames × tx × rx` conversions. The indicator is driven low
  /// once the baseline is complete; its errors are ignored.
  pub fn run<P, E, A, L, const LINES: usize>(
    &self,
    scanner: &mut Scanner<P, A, LINES>,
    indicator: &mut L,
  ) -> Result<Baseline, Error<E>>
  where
    P: OutputPin<Error = E>,
    A: Converter,
    L: OutputPin,
  {
    let dims = scanner.dimensions();
    let mut baseline = Baseline::new(dims)?;
    let mut frame = Frame::new(dims)?;

    for i in 0..self.frames {
      _ = indicator.set_state(blink(i));
      scanner.scan_into(&mut frame)?;
      baseline.absorb(&frame)?;
    }
    _ = indicator.set_low();

    if self.frames > 0 {
      info!("calibrated over {} sweeps", self.frames);
      for (tx, row) in baseline.rows() {
        debug!("baseline {}: {:?}", tx, row);
      }
    }

    Ok(baseline)
  }
}

impl Default for Calibrator {
  fn default() -> Self {
    Self::new(DEFAULT_CALIBRATION_FRAMES)
  }
}

/// Two sweeps on, two sweeps off.
const fn blink(frame: u16) -> PinState {
  if frame % 4 < 2 {
    PinState::High
  } else {
    PinState::Low
  }
}

/// Stand-in for boards without a status LED.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl ErrorType for NoIndicator {
  type Error = Infallible;
}

impl OutputPin for NoIndicator {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}
