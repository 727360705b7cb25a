use crate::{ConfigError, Dimensions, Frame, MAX_RX, MAX_TX};

/// Sweeps retained by the reference continuous-capture firmware.
pub const DEFAULT_DEPTH: usize = 10;

/// Circular per-cell history of the last `DEPTH` sweeps.
///
/// A single cursor is shared by every cell, so all cells advance in lockstep
/// once per recorded sweep. The cursor always names the next slot to be
/// overwritten; the most recent sweep sits at `(cursor - 1) mod DEPTH`.
/// There is no back-pressure: a reader that falls behind simply loses frames.
///
/// Storage is `32 × 16 × DEPTH` samples regardless of the grid size. A
/// `Timeline<0>` holds nothing and refuses to record.
pub struct Timeline<const DEPTH: usize = DEFAULT_DEPTH> {
  cells: [[[u16; DEPTH]; MAX_RX]; MAX_TX],
  dims: Dimensions,
  cursor: usize,
  recorded: u32,
}

impl<const DEPTH: usize> Timeline<DEPTH> {
  pub fn new(dims: Dimensions) -> Result<Self, ConfigError> {
    dims.validate()?;
    Ok(Self { cells: [[[0; DEPTH]; MAX_RX]; MAX_TX], dims, cursor: 0, recorded: 0 })
  }

  pub const fn dimensions(&self) -> Dimensions {
    self.dims
  }

  pub const fn depth(&self) -> usize {
    DEPTH
  }

  /// Next slot [`Timeline::record`] will write.
  pub const fn cursor(&self) -> usize {
    self.cursor
  }

  /// Slot holding the most recently recorded sweep.
  pub const fn latest_slot(&self) -> usize {
    if DEPTH == 0 {
      0
    } else {
      (self.cursor + DEPTH - 1) % DEPTH
    }
  }

  /// Sweeps recorded since construction or the last reset (saturating).
  pub const fn recorded(&self) -> u32 {
    self.recorded
  }

  /// Store `frame` at the cursor and advance it. Returns the slot written.
  ///
  /// A frame of a different shape is rejected and the cursor stays put.
  pub fn record(&mut self, frame: &Frame) -> Result<usize, ConfigError> {
    if DEPTH == 0 {
      return Err(ConfigError::NoTimeline);
    }
    frame.check_shape(self.dims)?;

    let slot = self.cursor;
    for (tx, row) in frame.rows() {
      for (history, &sample) in self.cells[tx].iter_mut().zip(row) {
        history[slot] = sample;
      }
    }

    self.cursor = (slot + 1) % DEPTH;
    self.recorded = self.recorded.saturating_add(1);
    Ok(slot)
  }

  /// Raw ring of one cell, indexed by slot.
  pub fn cell(&self, tx: usize, rx: usize) -> Option<&[u16; DEPTH]> {
    (tx < self.dims.tx && rx < self.dims.rx).then(|| &self.cells[tx][rx])
  }

  pub fn get(&self, tx: usize, rx: usize, slot: usize) -> Option<u16> {
    self.cell(tx, rx)?.get(slot).copied()
  }

  /// Most recent sample of one cell, if anything was recorded yet.
  pub fn latest(&self, tx: usize, rx: usize) -> Option<u16> {
    if self.recorded == 0 {
      return None;
    }
    self.get(tx, rx, self.latest_slot())
  }

  /// Recorded samples of one cell, oldest first.
  pub fn history(&self, tx: usize, rx: usize) -> Option<impl Iterator<Item = u16> + '_> {
    let ring = self.cell(tx, rx)?;
    let filled = (self.recorded as usize).min(DEPTH);
    let start = if filled == 0 { 0 } else { (self.cursor + DEPTH - filled) % DEPTH };
    Some((0..filled).map(move |i| ring[(start + i) % DEPTH]))
  }

  /// Forget every recorded sweep and rewind the cursor to slot 0.
  pub fn reset(&mut self) {
    self.cells = [[[0; DEPTH]; MAX_RX]; MAX_TX];
    self.cursor = 0;
    self.recorded = 0;
  }
}
