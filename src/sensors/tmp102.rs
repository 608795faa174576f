//! TMP102 digital temperature sensor over I2C.
//!
//! 12-bit two's complement reading, 0.0625 °C per LSB, left-justified in
//! the 16-bit temperature register.  Shutdown mode (SD bit in the first
//! configuration byte) stops conversions and leaves the last value readable.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::ThermometerPort;
use crate::error::SensorError;

/// 7-bit bus address with ADD0 tied to ground.
pub const DEFAULT_ADDRESS: u8 = 0x48;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// Continuous conversion, 12-bit, 4 Hz.
const CONFIG_ACTIVE: [u8; 2] = [0x60, 0xA0];
/// Same as active with SD set.
const CONFIG_SHUTDOWN: [u8; 2] = [0x61, 0xA0];

const CELSIUS_PER_LSB: f32 = 0.0625;

pub struct Tmp102<I2C> {
    i2c: I2C,
    address: u8,
    last_c: f32,
}

impl<I2C: I2c> Tmp102<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            // Mid-band until the first successful read.
            last_c: 20.0,
        }
    }

    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<(), SensorError> {
        let cfg = if shutdown { CONFIG_SHUTDOWN } else { CONFIG_ACTIVE };
        self.i2c
            .write(self.address, &[REG_CONFIG, cfg[0], cfg[1]])
            .map_err(|_| SensorError::Bus)
    }

    pub fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_TEMPERATURE], &mut raw)
            .map_err(|_| SensorError::Bus)?;
        Ok(decode_celsius(raw))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

/// Register bytes (MSB first) to degrees Celsius.
pub fn decode_celsius(raw: [u8; 2]) -> f32 {
    // Arithmetic shift keeps the sign of the 12-bit value.
    let counts = i16::from_be_bytes(raw) >> 4;
    counts as f32 * CELSIUS_PER_LSB
}

impl<I2C: I2c> ThermometerPort for Tmp102<I2C> {
    fn configure(&mut self) {
        match self.set_shutdown(false) {
            Ok(()) => info!("TMP102: configured at 0x{:02X}", self.address),
            Err(e) => warn!("TMP102: configuration failed: {}", e),
        }
    }

    fn read(&mut self) -> f32 {
        match self.read_celsius() {
            Ok(c) => {
                self.last_c = c;
                c
            }
            Err(e) => {
                warn!("TMP102: read failed ({}), reusing {:.2} C", e, self.last_c);
                self.last_c
            }
        }
    }

    fn set_low_power(&mut self, low_power: bool) {
        if let Err(e) = self.set_shutdown(low_power) {
            warn!("TMP102: power mode change failed: {}", e);
        }
    }
}
