//! Auxiliary motion sensor feeding the last packet of every sweep.

mod mpu6050;

pub use mpu6050::*;

/// One accelerometer / gyroscope reading in raw sensor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionSample {
  pub accel: [i16; 3],
  /// Spare slot; the MPU-6050 reports its die temperature here.
  pub temperature: i16,
  pub gyro: [i16; 3],
}

impl MotionSample {
  pub const fn new(accel: [i16; 3], temperature: i16, gyro: [i16; 3]) -> Self {
    Self { accel, temperature, gyro }
  }

  /// Build from the sensor's register order: accel x/y/z, temperature, gyro x/y/z.
  pub const fn from_raw(raw: [i16; 7]) -> Self {
    Self::new([raw[0], raw[1], raw[2]], raw[3], [raw[4], raw[5], raw[6]])
  }

  pub const fn to_raw(&self) -> [i16; 7] {
    let [ax, ay, az] = self.accel;
    let [gx, gy, gz] = self.gyro;
    [ax, ay, az, self.temperature, gx, gy, gz]
  }
}

/// Source of motion samples.
///
/// `Ok(None)` means no sensor is fitted; the packetizer then leaves the motion
/// suffix off.
pub trait MotionSource {
  type Error;

  fn sample(&mut self) -> Result<Option<MotionSample>, Self::Error>;
}

impl<T: MotionSource + ?Sized> MotionSource for &mut T {
  type Error = T::Error;

  fn sample(&mut self) -> Result<Option<MotionSample>, Self::Error> {
    T::sample(self)
  }
}

/// Boards without a motion sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMotion;

impl MotionSource for NoMotion {
  type Error = core::convert::Infallible;

  fn sample(&mut self) -> Result<Option<MotionSample>, Self::Error> {
    Ok(None)
  }
}

/// Fixed reading, for bench setups and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMotion(pub MotionSample);

impl MotionSource for StaticMotion {
  type Error = core::convert::Infallible;

  fn sample(&mut self) -> Result<Option<MotionSample>, Self::Error> {
    Ok(Some(self.0))
  }
}
