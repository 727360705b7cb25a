use bitfield_struct::bitfield;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use super::{MotionSample, MotionSource};

/// Address with AD0 tied low.
pub const MPU6050_ADDR: u8 = 0x68;
/// Address with AD0 tied high.
pub const MPU6050_ADDR_ALT: u8 = 0x69;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reg {
  AccelXoutH = 0x3B,
  PwrMgmt1 = 0x6B,
  WhoAmI = 0x75,
}

/// Accel (6) + temperature (2) + gyro (6) bytes starting at ACCEL_XOUT_H.
const SAMPLE_LEN: usize = 14;

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct PowerManagement {
  #[bits(3)]
  pub clock: ClockSource,
  pub temp_disable: bool,
  __: bool,
  pub cycle: bool,
  pub sleep: bool,
  pub device_reset: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ClockSource {
  Internal8MHz = 0b000,
  PllGyroX = 0b001,
  PllGyroY = 0b010,
  PllGyroZ = 0b011,
  PllExternal32k = 0b100,
  PllExternal19M = 0b101,
  Reserved = 0b110,
  Stopped = 0b111,
}

impl ClockSource {
  pub const fn into_bits(self) -> u8 {
    self as _
  }

  pub const fn from_bits(bits: u8) -> Self {
    match bits & 0b111 {
      0b000 => Self::Internal8MHz,
      0b001 => Self::PllGyroX,
      0b010 => Self::PllGyroY,
      0b011 => Self::PllGyroZ,
      0b100 => Self::PllExternal32k,
      0b101 => Self::PllExternal19M,
      0b110 => Self::Reserved,
      _ => Self::Stopped,
    }
  }
}

/// InvenSense MPU-6050 six-axis sensor on a blocking I²C bus.
pub struct Mpu6050<I> {
  i2c: I,
  address: u8,
}

impl<I, E> Mpu6050<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  pub fn new(i2c: I) -> Self {
    Self::with_address(i2c, MPU6050_ADDR)
  }

  pub fn with_address(i2c: I, address: u8) -> Self {
    Self { i2c, address }
  }

  /// Clear the sleep bit the sensor powers up with.
  pub fn wake(&mut self) -> Result<(), E> {
    self.set_power(PowerManagement::new())
  }

  pub fn sleep(&mut self) -> Result<(), E> {
    self.set_power(PowerManagement::new().with_sleep(true))
  }

  pub fn power(&mut self) -> Result<PowerManagement, E> {
    let mut buf = [0u8; 1];
    self.read_bytes(Reg::PwrMgmt1, &mut buf)?;
    Ok(PowerManagement::from_bits(buf[0]))
  }

  pub fn set_power(&mut self, power: PowerManagement) -> Result<(), E> {
    self.i2c.write(self.address, &[Reg::PwrMgmt1 as u8, power.into_bits()])
  }

  /// Identity register; reads 0x68 on genuine parts regardless of AD0.
  pub fn who_am_i(&mut self) -> Result<u8, E> {
    let mut buf = [0u8; 1];
    self.read_bytes(Reg::WhoAmI, &mut buf)?;
    Ok(buf[0])
  }

  /// Burst read of the seven big-endian measurement registers.
  pub fn read_raw(&mut self) -> Result<[i16; 7], E> {
    let mut buf = [0u8; SAMPLE_LEN];
    self.read_bytes(Reg::AccelXoutH, &mut buf)?;
    Ok(core::array::from_fn(|i| i16::from_be_bytes([buf[i * 2], buf[i * 2 + 1]])))
  }

  pub fn release(self) -> I {
    self.i2c
  }

  fn read_bytes(&mut self, reg: Reg, buf: &mut [u8]) -> Result<(), E> {
    self.i2c.write_read(self.address, &[reg as u8], buf)
  }
}

impl<I, E> MotionSource for Mpu6050<I>
where
  I: I2c<SevenBitAddress, Error = E>,
{
  type Error = E;

  fn sample(&mut self) -> Result<Option<MotionSample>, E> {
    self.read_raw().map(|raw| Some(MotionSample::from_raw(raw)))
  }
}
