use core::fmt;

use crate::calibrate::DEFAULT_CALIBRATION_FRAMES;
use crate::{packet, MAX_LINES};

mod grid;
mod output;

pub use grid::*;
pub use output::*;

/// Number of wireless data endpoints exposed by the reference receiver.
pub const DEFAULT_ENDPOINTS: u8 = 6;

/// Complete pipeline configuration, consumed once by [`crate::TouchGrid::new`].
///
/// The multiplexer address-line count is not part of this value: it is the
/// `LINES` parameter of the [`crate::Mux`] handed to the pipeline, and the
/// configured transmit rows are checked against it at construction.
///
/// # Example
/// ```no_run
/// use touchgrid::{Config, EndpointPolicy, Framing, Grid, Mode, Resolution};
///
/// let config = Config::default()
///   .with_grid(Grid::new(16, [0, 1, 2, 3, 4, 5, 6, 7]))
///   .with_resolution(Resolution::new(10))
///   .with_mode(Mode::ImmediateTransmit(Framing::Packets(EndpointPolicy::Matched)));
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  pub grid: Grid,
  pub resolution: Resolution,
  pub mode: Mode,
  /// Sweeps folded into the baseline during setup. Zero skips calibration.
  pub calibration_frames: u16,
  /// Endpoints available to [`Framing::Packets`].
  pub endpoints: u8,
}

impl Config {
  pub const fn new(grid: Grid, resolution: Resolution, mode: Mode, calibration_frames: u16, endpoints: u8) -> Self {
    Self { grid, resolution, mode, calibration_frames, endpoints }
  }

  pub const fn with_grid(mut self, grid: Grid) -> Self {
    self.grid = grid;
    self
  }

  pub const fn with_resolution(mut self, resolution: Resolution) -> Self {
    self.resolution = resolution;
    self
  }

  pub const fn with_mode(mut self, mode: Mode) -> Self {
    self.mode = mode;
    self
  }

  pub const fn with_calibration_frames(mut self, frames: u16) -> Self {
    self.calibration_frames = frames;
    self
  }

  pub const fn with_endpoints(mut self, endpoints: u8) -> Self {
    self.endpoints = endpoints;
    self
  }

  /// Check the configuration against a multiplexer with `lines` address lines.
  pub fn validate(&self, lines: usize) -> Result<(), ConfigError> {
    let dims = self.grid.dimensions();
    dims.validate()?;

    if lines > MAX_LINES {
      return Err(ConfigError::TooManyLines { lines, max: MAX_LINES });
    }
    if dims.tx > 1 << lines {
      return Err(ConfigError::TxExceedsAddressSpace { tx: dims.tx, lines });
    }

    if let Mode::ImmediateTransmit(Framing::Packets(policy)) = self.mode {
      packet::check_budget(dims, self.resolution.field_width(), policy, self.endpoints)?;
    }

    Ok(())
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new(
      Grid::default(),
      Resolution::default(),
      Mode::ContinuousCapture,
      DEFAULT_CALIBRATION_FRAMES,
      DEFAULT_ENDPOINTS,
    )
  }
}

/// Reasons a configuration or a buffer shape is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
  /// The grid has no transmit rows or no receive columns.
  NoChannels,
  TooManyTx { tx: usize, max: usize },
  TooManyRx { rx: usize, max: usize },
  /// The multiplexer has more address lines than a channel index spans.
  TooManyLines { lines: usize, max: usize },
  /// More transmit rows than the multiplexer can address.
  TxExceedsAddressSpace { tx: usize, lines: usize },
  /// The last flush would go to an endpoint that does not exist.
  EndpointBudget { needed: usize, available: usize },
  /// A packet could hold more bytes than the transport accepts.
  PacketCapacity { needed: usize, capacity: usize },
  /// Continuous capture needs a timeline with at least one slot.
  NoTimeline,
  /// A frame's dimensions do not match the buffer it was handed to.
  ShapeMismatch { expected: Dimensions, actual: Dimensions },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      ConfigError::NoChannels => f.write_str("grid needs at least one tx row and one rx column"),
      ConfigError::TooManyTx { tx, max } => write!(f, "{tx} tx rows exceed the maximum of {max}"),
      ConfigError::TooManyRx { rx, max } => write!(f, "{rx} rx columns exceed the maximum of {max}"),
      ConfigError::TooManyLines { lines, max } => write!(f, "{lines} mux address lines exceed the maximum of {max}"),
      ConfigError::NoTimeline => f.write_str("continuous capture needs a timeline depth of at least one"),
      ConfigError::TxExceedsAddressSpace { tx, lines } => {
        write!(f, "{tx} tx rows cannot be addressed with {lines} mux lines")
      }
      ConfigError::EndpointBudget { needed, available } => {
        write!(f, "packets need {needed} endpoints but only {available} are available")
      }
      ConfigError::PacketCapacity { needed, capacity } => {
        write!(f, "packet needs {needed} bytes but capacity is {capacity}")
      }
      ConfigError::ShapeMismatch { expected, actual } => write!(
        f,
        "frame is {}x{} but buffer expects {}x{}",
        actual.tx, actual.rx, expected.tx, expected.rx
      ),
    }
  }
}
