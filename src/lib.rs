#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `no_std` scan, calibrate and packetize core for multiplexed multi-touch
//! electrode grids.
//!
//! A grid is driven by cycling an analog multiplexer across up to 32 transmit
//! rows and sampling a fixed set of receive columns on each row. This crate
//! owns that loop and what happens around it:
//!
//! - Addressing the multiplexer through up to five `embedded-hal` output pins
//! - Sweeping the grid tx-major into bounds-checked [`Frame`]s
//! - Calibrating a per-cell noise [`Baseline`] (running maximum) at startup
//! - Recording sweeps into a circular [`Timeline`] for an external drain
//! - Packetizing sweeps into 180-byte payloads rotated across transport
//!   endpoints, with an accelerometer/gyroscope sample on the last row
//! - Plain-text line output for a serial console
//!
//! Hardware is reached only through traits: `embedded_hal::digital::OutputPin`
//! for the address lines, [`Converter`] for the ADC, [`Transport`] for
//! outbound data and [`MotionSource`] for the motion sensor ([`Mpu6050`] is
//! provided).
//!
//! ```no_run
//! use embedded_hal::digital::OutputPin;
//! use touchgrid::{Config, Converter, Framing, Mode, NoIndicator, NoMotion, TouchGrid, Transport};
//!
//! fn run<P: OutputPin, A: Converter, T: Transport>(
//!   lines: [P; 5],
//!   adc: A,
//!   mut radio: T,
//! ) -> Result<(), touchgrid::Error<P::Error>> {
//!   let config = Config::default().with_mode(Mode::ImmediateTransmit(Framing::Packets(Default::default())));
//!   let mut grid: TouchGrid<_, _, 5> = TouchGrid::new(lines, adc, config)?;
//!   grid.setup(&mut NoIndicator)?;
//!   loop {
//!     grid.read(&mut radio, &mut NoMotion)?;
//!   }
//! }
//! ```

#[macro_use]
mod fmt;

mod calibrate;
mod config;
mod matrix;
mod motion;
mod mux;
mod packet;
mod scan;
mod serial;
mod timeline;
mod transport;

#[cfg(test)]
mod mock;

use embedded_hal::digital::OutputPin;

pub use calibrate::*;
pub use config::*;
pub use matrix::*;
pub use motion::*;
pub use mux::*;
pub use packet::{flushes_at, Packet, Packetizer, PACKET_CAPACITY};
pub use scan::*;
pub use serial::*;
pub use timeline::*;
pub use transport::*;

/// Errors that can occur while driving the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// A multiplexer address line could not be driven.
  Pin(E),
  /// The configuration or a buffer shape was rejected.
  Config(ConfigError),
}

impl<E> From<ConfigError> for Error<E> {
  fn from(err: ConfigError) -> Self {
    Error::Config(err)
  }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Error::Pin(err) => write!(f, "mux address line error: {err:?}"),
      Error::Config(err) => write!(f, "{err}"),
    }
  }
}

/// What one call to [`TouchGrid::read`] did with its sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cycle {
  /// The sweep was written to this timeline slot.
  Recorded { slot: usize },
  /// The sweep was sent out.
  Transmitted(Delivery),
}

/// Running counters of non-fatal events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
  pub sweeps: u32,
  pub payloads_sent: u32,
  pub send_failures: u32,
  pub truncated_packets: u32,
  pub motion_failures: u32,
}

impl Stats {
  fn absorb(&mut self, delivery: Delivery) {
    self.payloads_sent = self.payloads_sent.wrapping_add(delivery.sent.into());
    self.send_failures = self.send_failures.wrapping_add(delivery.failed.into());
    self.truncated_packets = self.truncated_packets.wrapping_add(delivery.truncated.into());
  }
}

/// The scan pipeline: one multiplexed grid, its baseline, its timeline and
/// its packetizer.
///
/// Call [`TouchGrid::setup`] once, then [`TouchGrid::read`] from the polling
/// loop. Each read performs exactly one sweep and hands it to the configured
/// [`Mode`].
///
/// The timeline is stored inline at `32 × 16 × DEPTH` samples (10 KiB at the
/// default depth). Pipelines that only transmit can set `DEPTH` to 0 to drop
/// it; [`Mode::ContinuousCapture`] then fails with [`ConfigError::NoTimeline`].
pub struct TouchGrid<P, A, const LINES: usize, const DEPTH: usize = DEFAULT_DEPTH> {
  scanner: Scanner<P, A, LINES>,
  config: Config,
  baseline: Baseline,
  timeline: Timeline<DEPTH>,
  packetizer: Packetizer,
  stats: Stats,
}

impl<P, E, A, const LINES: usize, const DEPTH: usize> TouchGrid<P, A, LINES, DEPTH>
where
  P: OutputPin<Error = E>,
  A: Converter,
{
  /// Validate `config` against the `LINES` address lines and build the
  /// pipeline. Nothing is driven until [`TouchGrid::setup`].
  pub fn new(lines: [P; LINES], adc: A, config: Config) -> Result<Self, ConfigError> {
    config.validate(LINES)?;
    if DEPTH == 0 && config.mode == Mode::ContinuousCapture {
      return Err(ConfigError::NoTimeline);
    }
    let dims = config.grid.dimensions();
    let policy = match config.mode {
      Mode::ImmediateTransmit(Framing::Packets(policy)) => policy,
      _ => EndpointPolicy::default(),
    };

    Ok(Self {
      scanner: Scanner::new(Mux::new(lines), adc, config.grid),
      config,
      baseline: Baseline::new(dims)?,
      timeline: Timeline::new(dims)?,
      packetizer: Packetizer::new(policy, config.resolution),
      stats: Stats::default(),
    })
  }

  /// Rewind the timeline and calibrate the baseline over
  /// `config.calibration_frames` sweeps, blinking `indicator` meanwhile.
  pub fn setup<L: OutputPin>(&mut self, indicator: &mut L) -> Result<&Baseline, Error<E>> {
    self.timeline.reset();
    self.baseline = Calibrator::new(self.config.calibration_frames).run(&mut self.scanner, indicator)?;
    info!("grid ready: {} tx x {} rx", self.config.grid.dimensions().tx, self.config.grid.dimensions().rx);
    Ok(&self.baseline)
  }

  /// Write the baseline to a line transport, one row per line.
  pub fn report_baseline<T: Transport>(&mut self, transport: &mut T) -> Delivery {
    let delivery = SerialEmitter.emit_baseline(&self.baseline, transport);
    self.stats.absorb(delivery);
    delivery
  }

  /// One polling iteration: sweep the grid and hand the frame to the
  /// configured mode. `transport` and `motion` are only touched in
  /// [`Mode::ImmediateTransmit`].
  pub fn read<T, M>(&mut self, transport: &mut T, motion: &mut M) -> Result<Cycle, Error<E>>
  where
    T: Transport,
    M: MotionSource,
  {
    let frame = self.scanner.scan()?;
    self.stats.sweeps = self.stats.sweeps.wrapping_add(1);

    match self.config.mode {
      Mode::ContinuousCapture => {
        let slot = self.timeline.record(&frame)?;
        Ok(Cycle::Recorded { slot })
      }
      Mode::ImmediateTransmit(Framing::Packets(_)) => {
        let sample = self.sample_motion(motion);
        let delivery = self.packetizer.emit(&frame, sample, transport);
        self.stats.absorb(delivery);
        Ok(Cycle::Transmitted(delivery))
      }
      Mode::ImmediateTransmit(Framing::Lines) => {
        let delivery = SerialEmitter.emit(&frame, transport);
        self.stats.absorb(delivery);
        Ok(Cycle::Transmitted(delivery))
      }
    }
  }

  fn sample_motion<M: MotionSource>(&mut self, motion: &mut M) -> Option<MotionSample> {
    match motion.sample() {
      Ok(sample) => sample,
      Err(_) => {
        self.stats.motion_failures = self.stats.motion_failures.wrapping_add(1);
        warn!("motion sample unavailable, sending sweep without it");
        None
      }
    }
  }

  pub fn baseline(&self) -> &Baseline {
    &self.baseline
  }

  /// Recorded sweeps and the shared cursor, for the capture drain.
  pub fn timeline(&self) -> &Timeline<DEPTH> {
    &self.timeline
  }

  pub fn stats(&self) -> Stats {
    self.stats
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Hand back the address lines and the converter.
  pub fn release(self) -> ([P; LINES], A) {
    let (mux, adc) = self.scanner.release();
    (mux.release(), adc)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::{Bus, FakeAdc, FakeLed, FakePin, FakeTransport};

  struct BrokenMotion;

  impl MotionSource for BrokenMotion {
    type Error = ();

    fn sample(&mut self) -> Result<Option<MotionSample>, ()> {
      Err(())
    }
  }

  type Source = fn(usize, usize, u8) -> u16;
  type Adc = FakeAdc<Source>;

  fn ramp(sweep: usize, tx: usize, input: u8) -> u16 {
    (sweep * 100 + tx * 10 + input as usize) as u16
  }

  fn grid(config: Config) -> (Bus, TouchGrid<FakePin, Adc, 5>) {
    let bus = Bus::default();
    let cells = config.grid.dimensions().cells();
    let adc: Adc = FakeAdc::new(&bus, cells, ramp as Source);
    let grid = TouchGrid::new(bus.pins::<5>(), adc, config).unwrap();
    (bus, grid)
  }

  fn packets() -> Mode {
    Mode::ImmediateTransmit(Framing::Packets(EndpointPolicy::Matched))
  }

  #[test]
  fn setup_calibrates_and_blinks() {
    let config = Config::default().with_grid(Grid::new(3, [0, 1])).with_calibration_frames(4);
    let (_, mut grid) = grid(config);
    let mut led = FakeLed::default();

    let baseline = grid.setup(&mut led).unwrap();

    // Sweep 3 is the largest ramp step seen.
    assert_eq!(baseline.row(2), Some(&[320, 321][..]));
    assert_eq!(led.states.len(), 5);
  }

  #[test]
  fn capture_mode_records_every_sweep() {
    let config = Config::default().with_grid(Grid::new(2, [0, 1])).with_calibration_frames(0);
    let (_, mut grid) = grid(config);
    grid.setup(&mut NoIndicator).unwrap();
    let mut transport = FakeTransport::default();

    for n in 0..12 {
      let cycle = grid.read(&mut transport, &mut NoMotion).unwrap();
      assert_eq!(cycle, Cycle::Recorded { slot: n % 10 });
    }

    assert!(transport.sent.is_empty());
    assert_eq!(grid.timeline().cursor(), 2);
    assert_eq!(grid.timeline().get(1, 1, 1), Some(ramp(11, 1, 1)));
    assert_eq!(grid.stats().sweeps, 12);
  }

  #[test]
  fn setup_rewinds_the_timeline() {
    let config = Config::default().with_grid(Grid::new(1, [0])).with_calibration_frames(0);
    let (_, mut grid) = grid(config);
    grid.read(&mut FakeTransport::default(), &mut NoMotion).unwrap();
    assert_eq!(grid.timeline().cursor(), 1);

    grid.setup(&mut NoIndicator).unwrap();
    assert_eq!(grid.timeline().cursor(), 0);
  }

  #[test]
  fn packet_mode_appends_motion_to_last_packet() {
    let config = Config::default()
      .with_grid(Grid::new(5, [0]))
      .with_resolution(Resolution::new(8))
      .with_calibration_frames(0)
      .with_mode(packets());
    let (_, mut grid) = grid(config);
    let mut transport = FakeTransport::default();
    let mut motion = StaticMotion(MotionSample::new([1, 2, 3], 36, [4, 5, 6]));

    let cycle = grid.read(&mut transport, &mut motion).unwrap();

    assert_eq!(cycle, Cycle::Transmitted(Delivery { sent: 2, failed: 0, truncated: 0 }));
    assert_eq!(transport.text(0), "0,000:1,010:2,020:3,030:");
    assert_eq!(transport.text(1), "4,040:_1_2_3_4_5_6");
    assert_eq!(grid.timeline().recorded(), 0);
  }

  #[test]
  fn motion_failure_is_not_fatal() {
    let config = Config::default()
      .with_grid(Grid::new(2, [0]))
      .with_resolution(Resolution::new(8))
      .with_calibration_frames(0)
      .with_mode(packets());
    let (_, mut grid) = grid(config);
    let mut transport = FakeTransport::default();

    grid.read(&mut transport, &mut BrokenMotion).unwrap();

    assert_eq!(transport.text(0), "0,000:1,010:");
    assert_eq!(grid.stats().motion_failures, 1);
  }

  #[test]
  fn line_mode_writes_one_line_per_row() {
    let config = Config::default()
      .with_grid(Grid::new(3, [0, 1, 2]))
      .with_calibration_frames(0)
      .with_mode(Mode::ImmediateTransmit(Framing::Lines));
    let (_, mut grid) = grid(config);
    let mut serial = LineWriter::new(heapless::String::<128>::new());

    grid.read(&mut serial, &mut NoMotion).unwrap();

    assert_eq!(serial.writer().as_str(), "0,0,1,2\n1,10,11,12\n2,20,21,22\n");
  }

  #[test]
  fn transport_failures_are_counted() {
    let config = Config::default()
      .with_grid(Grid::new(8, [0]))
      .with_calibration_frames(0)
      .with_mode(packets());
    let (_, mut grid) = grid(config);

    grid.read(&mut Disconnected, &mut NoMotion).unwrap();
    grid.read(&mut Disconnected, &mut NoMotion).unwrap();

    let stats = grid.stats();
    assert_eq!(stats.send_failures, 4);
    assert_eq!(stats.payloads_sent, 0);
  }

  #[test]
  fn baseline_report_goes_out_as_lines() {
    let config = Config::default().with_grid(Grid::new(2, [0, 1])).with_calibration_frames(2);
    let (_, mut grid) = grid(config);
    grid.setup(&mut NoIndicator).unwrap();
    let mut serial = LineWriter::new(heapless::String::<64>::new());

    let delivery = grid.report_baseline(&mut serial);

    assert_eq!(delivery.sent, 2);
    assert_eq!(serial.writer().as_str(), "100,101,\n110,111,\n");
  }

  #[test]
  fn construction_rejects_unaddressable_rows() {
    let bus = Bus::default();
    let adc: Adc = FakeAdc::new(&bus, 1, ramp as Source);
    let config = Config::default().with_grid(Grid::new(5, [0]));
    let result = TouchGrid::<_, _, 2>::new(bus.pins::<2>(), adc, config);
    assert!(matches!(result, Err(ConfigError::TxExceedsAddressSpace { tx: 5, lines: 2 })));
  }

  #[test]
  fn broken_address_line_aborts_the_sweep() {
    let bus = Bus::default();
    let mut lines = bus.pins::<5>();
    lines[0] = FakePin::broken(&bus, 0);
    let adc: Adc = FakeAdc::new(&bus, 2, ramp as Source);
    let config = Config::default().with_grid(Grid::new(2, [0])).with_calibration_frames(0);
    let mut grid: TouchGrid<_, _, 5> = TouchGrid::new(lines, adc, config).unwrap();

    let err = grid.read(&mut FakeTransport::default(), &mut NoMotion).unwrap_err();

    assert_eq!(err, Error::Pin(embedded_hal::digital::ErrorKind::Other));
    assert_eq!(grid.timeline().recorded(), 0);
    let config_err = Error::<()>::Config(ConfigError::NoChannels);
    assert_eq!(std::format!("{config_err}"), "grid needs at least one tx row and one rx column");
  }

  #[test]
  fn construction_rejects_extra_address_lines() {
    let bus = Bus::default();
    let adc: Adc = FakeAdc::new(&bus, 4, ramp as Source);
    let lines: [FakePin; 6] = core::array::from_fn(|line| FakePin::broken(&bus, line % 5));
    let config = Config::default().with_grid(Grid::new(4, [0]));
    let result = TouchGrid::<_, _, 6>::new(lines, adc, config);
    assert!(matches!(result, Err(ConfigError::TooManyLines { lines: 6, max: 5 })));
  }

  #[test]
  fn transmit_only_pipeline_skips_the_timeline() {
    let bus = Bus::default();
    let config = Config::default()
      .with_grid(Grid::new(2, [0]))
      .with_resolution(Resolution::new(8))
      .with_calibration_frames(0)
      .with_mode(packets());
    let adc: Adc = FakeAdc::new(&bus, 2, ramp as Source);
    let mut grid: TouchGrid<_, _, 5, 0> = TouchGrid::new(bus.pins::<5>(), adc, config).unwrap();
    let mut transport = FakeTransport::default();

    grid.setup(&mut NoIndicator).unwrap();
    grid.read(&mut transport, &mut NoMotion).unwrap();

    assert_eq!(transport.text(0), "0,000:1,010:");
    assert!(core::mem::size_of::<TouchGrid<FakePin, Adc, 5, 0>>() < core::mem::size_of::<Timeline>());

    let (lines, adc) = grid.release();
    let capture = config.with_mode(Mode::ContinuousCapture);
    let result = TouchGrid::<_, _, 5, 0>::new(lines, adc, capture);
    assert!(matches!(result, Err(ConfigError::NoTimeline)));
  }

  #[test]
  fn release_returns_hardware() {
    let (bus, grid) = grid(Config::default().with_grid(Grid::new(1, [3])).with_calibration_frames(0));
    let (mut lines, _) = grid.release();
    lines[4].set_high().unwrap();
    assert_eq!(bus.channel(), 16);
  }
}
