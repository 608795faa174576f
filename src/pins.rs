//! GPIO / peripheral pin assignments for the LockGuard controller board.
//!
//! Single source of truth: the firmware entry point builds every pin
//! driver from these numbers rather than hard-coding them.

// ---------------------------------------------------------------------------
// Keypad (active-low momentary switches with internal pull-up)
// ---------------------------------------------------------------------------

/// Digit "1" switch.  Also re-locks the locker while unlocked.
pub const SWITCH_ONE_GPIO: i32 = 4;
/// Digit "0" switch.
pub const SWITCH_ZERO_GPIO: i32 = 5;
/// Wake trigger for the sleeping sensors (falling edge).
pub const WAKE_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Feedback outputs (active HIGH)
// ---------------------------------------------------------------------------

pub const LOCKED_LED_GPIO: i32 = 7;
pub const UNLOCKED_LED_GPIO: i32 = 15;
pub const ALERT_LED_GPIO: i32 = 16;
pub const PASSWORD_CORRECT_LED_GPIO: i32 = 17;
pub const PASSWORD_INCORRECT_LED_GPIO: i32 = 18;
/// Piezo buzzer driven through a low-side transistor.
pub const BUZZER_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// SPI bus: ADXL345 accelerometer (mode 3)
// ---------------------------------------------------------------------------

pub const SPI_SCLK_GPIO: i32 = 12;
pub const SPI_MOSI_GPIO: i32 = 11;
pub const SPI_MISO_GPIO: i32 = 13;
pub const ADXL345_CS_GPIO: i32 = 10;
/// ADXL345 supports up to 5 MHz; 2 MHz leaves margin on long leads.
pub const ADXL345_SPI_FREQ_HZ: u32 = 2_000_000;

// ---------------------------------------------------------------------------
// I²C bus: TMP102 temperature sensor
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 1;
pub const I2C_SCL_GPIO: i32 = 2;
pub const I2C_FREQ_HZ: u32 = 100_000;
