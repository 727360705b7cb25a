use embedded_hal::digital::{OutputPin, PinState};

/// Most address lines a [`Mux`] may drive (32 channels).
pub const MAX_LINES: usize = 5;

/// Address-line levels for `channel`: line `k` is HIGH when bit `k` is set.
///
/// Bits at or above `LINES` are dropped, so `channel` wraps modulo `2^LINES`.
pub fn encode<const LINES: usize>(channel: usize) -> [PinState; LINES] {
  core::array::from_fn(|line| PinState::from((channel >> line) & 1 == 1))
}

/// Analog multiplexer driven through `LINES` binary address lines.
pub struct Mux<P, const LINES: usize> {
  lines: [P; LINES],
}

impl<P, E, const LINES: usize> Mux<P, LINES>
where
  P: OutputPin<Error = E>,
{
  /// Take ownership of the address lines, least significant first.
  pub fn new(lines: [P; LINES]) -> Self {
    assert!(LINES <= MAX_LINES, "maximum 5 mux address lines");
    Self { lines }
  }

  /// Number of channels the lines can address.
  pub const fn channels(&self) -> usize {
    1 << LINES
  }

  /// Route `channel` by driving every address line in order 0..LINES.
  pub fn select(&mut self, channel: usize) -> Result<(), E> {
    for (line, state) in self.lines.iter_mut().zip(encode::<LINES>(channel)) {
      line.set_state(state)?;
    }
    Ok(())
  }

  pub fn release(self) -> [P; LINES] {
    self.lines
  }
}
