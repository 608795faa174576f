//! ADXL345 3-axis accelerometer over SPI (mode 3).
//!
//! Configured for full-resolution ±16 g, where every range has the same
//! 4 mg/LSB scale.  The chip-select line is owned by the `SpiDevice`.
//!
//! ## Register protocol
//!
//! | Access     | First byte                      |
//! |------------|---------------------------------|
//! | Write      | `reg`                           |
//! | Read       | `0x80 \| reg`                   |
//! | Burst read | `0x80 \| 0x40 \| reg`           |
//!
//! Axis data is six bytes from `DATAX0`, little-endian `i16` per axis.

use embedded_hal::spi::{Operation, SpiDevice};
use log::{info, warn};

use crate::app::ports::AccelerometerPort;
use crate::error::SensorError;
use crate::sensors::Acceleration;

const REG_DEVID: u8 = 0x00;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const READ: u8 = 0x80;
const MULTI_BYTE: u8 = 0x40;

/// Fixed identity register value for every ADXL345.
pub const DEVICE_ID: u8 = 0xE5;

/// FULL_RES | range ±16 g.
const DATA_FORMAT_FULL_RES_16G: u8 = 0x0B;
/// POWER_CTL: Measure bit.
const POWER_MEASURE: u8 = 0x08;
/// POWER_CTL: Sleep bit (measure cleared).
const POWER_SLEEP: u8 = 0x04;

/// Scale factor in full-resolution mode.
const G_PER_LSB: f32 = 0.004;

pub struct Adxl345<SPI> {
    spi: SPI,
    last: Acceleration,
}

impl<SPI: SpiDevice> Adxl345<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            last: Acceleration::default(),
        }
    }

    /// Set the data format, start measuring, then verify the identity
    /// register.  The device is left measuring even on a mismatch.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_DATA_FORMAT, DATA_FORMAT_FULL_RES_16G)?;
        self.write_register(REG_POWER_CTL, POWER_MEASURE)?;

        let found = self.device_id()?;
        if found != DEVICE_ID {
            return Err(SensorError::IdentityMismatch { found });
        }
        Ok(())
    }

    pub fn device_id(&mut self) -> Result<u8, SensorError> {
        let mut id = [0u8; 1];
        self.read_registers(REG_DEVID, &mut id)?;
        Ok(id[0])
    }

    pub fn read_acceleration(&mut self) -> Result<Acceleration, SensorError> {
        let mut raw = [0u8; 6];
        self.read_registers(REG_DATAX0, &mut raw)?;
        Ok(Acceleration {
            x: decode_axis(raw[0], raw[1]),
            y: decode_axis(raw[2], raw[3]),
            z: decode_axis(raw[4], raw[5]),
        })
    }

    /// `true` = sleep, `false` = measure.
    pub fn set_sleep(&mut self, sleep: bool) -> Result<(), SensorError> {
        let value = if sleep { POWER_SLEEP } else { POWER_MEASURE };
        self.write_register(REG_POWER_CTL, value)
    }

    pub fn release(self) -> SPI {
        self.spi
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.spi.write(&[reg, value]).map_err(|_| SensorError::Bus)
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        let mut cmd = READ | reg;
        if buf.len() > 1 {
            cmd |= MULTI_BYTE;
        }
        self.spi
            .transaction(&mut [Operation::Write(&[cmd]), Operation::Read(buf)])
            .map_err(|_| SensorError::Bus)
    }
}

fn decode_axis(lo: u8, hi: u8) -> f32 {
    i16::from_le_bytes([lo, hi]) as f32 * G_PER_LSB
}

impl<SPI: SpiDevice> AccelerometerPort for Adxl345<SPI> {
    fn initialize(&mut self) -> bool {
        match self.init() {
            Ok(()) => {
                info!("ADXL345: initialised (id 0x{:02X})", DEVICE_ID);
                true
            }
            Err(e) => {
                warn!("ADXL345: initialisation failed: {} (expected id 0x{:02X})", e, DEVICE_ID);
                false
            }
        }
    }

    fn read(&mut self) -> Acceleration {
        match self.read_acceleration() {
            Ok(a) => {
                self.last = a;
                a
            }
            Err(e) => {
                warn!("ADXL345: read failed ({}), reusing last sample", e);
                self.last
            }
        }
    }

    fn set_low_power(&mut self, low_power: bool) {
        if let Err(e) = self.set_sleep(low_power) {
            warn!("ADXL345: power mode change failed: {}", e);
        }
    }
}
