/// Rows accumulated into one packet before it is flushed.
pub const ROWS_PER_PACKET: usize = 4;
/// Row stride of the endpoint rotation in the legacy receiver firmware.
pub const LEGACY_ENDPOINT_STRIDE: usize = 5;

/// What [`crate::TouchGrid::read`] does with each sweep. Exactly one mode is
/// active per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
  /// Record every sweep into the circular [`crate::Timeline`] for an external
  /// drain to pick up.
  ContinuousCapture,
  /// Send every sweep out immediately.
  ImmediateTransmit(Framing),
}

/// Wire framing used in [`Mode::ImmediateTransmit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
  /// Row records packed into bounded packets rotated across endpoints.
  Packets(EndpointPolicy),
  /// One plain-text line per row, for a serial console.
  Lines,
}

/// Maps the row that triggered a flush to an endpoint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointPolicy {
  /// `row / 4`: one endpoint per flushed group of rows.
  #[default]
  Matched,
  /// `row / 5`: the endpoint mapping deployed receivers expect. The stride
  /// disagrees with the 4-row flush, so two groups can land on the same
  /// endpoint. Only the mapping is legacy: field padding still follows
  /// [`Resolution::field_width`], and matches the old 3-digit fields only for
  /// converters of 9 bits or fewer.
  Legacy,
}

impl EndpointPolicy {
  pub const fn endpoint(self, row: usize) -> usize {
    match self {
      EndpointPolicy::Matched => row / ROWS_PER_PACKET,
      EndpointPolicy::Legacy => row / LEGACY_ENDPOINT_STRIDE,
    }
  }
}

/// Converter resolution in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resolution(u8);

impl Resolution {
  pub const fn new(bits: u8) -> Self {
    assert!(bits >= 1 && bits <= 16, "resolution must be 1..=16 bits");
    Self(bits)
  }

  pub const fn bits(self) -> u8 {
    self.0
  }

  /// Largest sample the converter can produce.
  pub const fn max_sample(self) -> u16 {
    ((1u32 << self.0) - 1) as u16
  }

  /// Zero-padded width of a sample field in packet records. Never narrower
  /// than three digits, and wide enough for [`Resolution::max_sample`].
  pub const fn field_width(self) -> usize {
    let digits = decimal_digits(self.max_sample() as u32);
    if digits < 3 {
      3
    } else {
      digits
    }
  }
}

impl Default for Resolution {
  fn default() -> Self {
    Self::new(12)
  }
}

pub(crate) const fn decimal_digits(mut value: u32) -> usize {
  let mut digits = 1;
  while value >= 10 {
    value /= 10;
    digits += 1;
  }
  digits
}
