//! LockGuard Firmware: Main Entry Point
//!
//! Two execution contexts share the feedback actuator and the lock state:
//!
//! ```text
//! ┌─────────────────────────────── main thread ────────────────────────────┐
//! │  edge_executor::LocalExecutor                                          │
//! │   ┌─────────────┐ ┌─────────────┐   ┌─────────────────┐  ┌───────────┐ │
//! │   │ switch "1"  │ │ switch "0"  │──▶│ PasswordService │─▶│ Feedback  │ │
//! │   │ edge wait   │ │ edge wait   │   │  (Debouncer)    │  │ Actuator  │ │
//! │   └─────────────┘ └─────────────┘   └─────────────────┘  └─────▲─────┘ │
//! └────────────────────────────────────────────────────────────────┼───────┘
//! ┌──────────────────────────── sensor thread ─────────────────────┼───────┐
//! │   ┌─────────────┐   ┌──────────────────┐    SetAlert           │       │
//! │   │ wake edge   │──▶│ SensorSupervisor │───────────────────────┘       │
//! │   │ wait        │   │ ADXL345 · TMP102 │                               │
//! │   └─────────────┘   └──────────────────┘                               │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embassy_time::Instant;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2C0, I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::spi::{SPI2, SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::FromValueType;
use log::{error, info, warn};

use lockguard::adapters::log_sink::LogEventSink;
use lockguard::app::feedback::{FeedbackActuator, FeedbackQueue};
use lockguard::app::password::PasswordService;
use lockguard::app::supervisor::{self, SensorSupervisor, WakeSignal};
use lockguard::config::LockerConfig;
use lockguard::drivers::button::{ButtonSource, Debouncer};
use lockguard::drivers::indicators::GpioIndicators;
use lockguard::fsm::lock::SharedLockState;
use lockguard::pins;
use lockguard::sensors::SensorHub;
use lockguard::sensors::adxl345::Adxl345;
use lockguard::sensors::tmp102::Tmp102;

// ── Shared state ──────────────────────────────────────────────

static LOCK_STATE: SharedLockState = SharedLockState::new();
static FEEDBACK: FeedbackQueue = FeedbackQueue::new();
static WAKE: WakeSignal = WakeSignal::new();

const SENSOR_THREAD_STACK: usize = 8 * 1024;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("LockGuard v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    let peripherals = Peripherals::take()?;

    // ── 3. Sensor thread ──────────────────────────────────────
    let sensor_config = config.clone();
    let spi = peripherals.spi2;
    let i2c = peripherals.i2c0;
    std::thread::Builder::new()
        .name("sensors".into())
        .stack_size(SENSOR_THREAD_STACK)
        .spawn(move || {
            if let Err(e) = run_sensors(&sensor_config, spi, i2c) {
                error!("sensor thread stopped: {e:#}");
            }
        })?;

    // ── 4. Keypad + feedback on this thread ───────────────────
    run_keypad(&config)
}

/// Defaults, unless a valid JSON document was baked in at build time.
fn load_config() -> LockerConfig {
    let Some(json) = option_env!("LOCKER_CONFIG") else {
        return LockerConfig::default();
    };
    match LockerConfig::from_json(json) {
        Ok(config) => {
            info!("Config: build-time override applied");
            config
        }
        Err(e) => {
            warn!("Config: override rejected ({}), using defaults", e);
            LockerConfig::default()
        }
    }
}

// ── Keypad context ────────────────────────────────────────────

fn run_keypad(config: &LockerConfig) -> Result<()> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once here.
    let output = |gpio: i32| -> Result<PinDriver<'static, AnyOutputPin, Output>> {
        Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
    };
    let indicators = GpioIndicators {
        locked: output(pins::LOCKED_LED_GPIO)?,
        unlocked: output(pins::UNLOCKED_LED_GPIO)?,
        alert: output(pins::ALERT_LED_GPIO)?,
        correct: output(pins::PASSWORD_CORRECT_LED_GPIO)?,
        incorrect: output(pins::PASSWORD_INCORRECT_LED_GPIO)?,
        buzzer: output(pins::BUZZER_GPIO)?,
    };
    let switch_one = input_pull_up(pins::SWITCH_ONE_GPIO)?;
    let switch_zero = input_pull_up(pins::SWITCH_ZERO_GPIO)?;

    let debouncer: &'static Debouncer = Box::leak(Box::new(Debouncer::new(config.debounce())));
    let mut actuator = FeedbackActuator::new(indicators);
    let mut password = PasswordService::new(config, &LOCK_STATE);

    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    executor
        .spawn(async move { actuator.run(&FEEDBACK).await })
        .detach();
    executor
        .spawn(async move {
            let mut feedback = &FEEDBACK;
            let mut sink = LogEventSink::new();
            password.run(debouncer, &mut feedback, &mut sink).await
        })
        .detach();
    executor
        .spawn(watch_switch(switch_one, ButtonSource::One, debouncer))
        .detach();
    executor
        .spawn(watch_switch(switch_zero, ButtonSource::Zero, debouncer))
        .detach();

    info!("Keypad task started");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    Ok(())
}

fn input_pull_up(gpio: i32) -> Result<PinDriver<'static, AnyIOPin, Input>> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once.
    let mut pin = PinDriver::input(unsafe { AnyIOPin::new(gpio) })?;
    pin.set_pull(Pull::Up)?;
    Ok(pin)
}

/// Feed every falling edge of one switch into the debouncer.
async fn watch_switch(
    mut pin: PinDriver<'static, AnyIOPin, Input>,
    source: ButtonSource,
    debouncer: &'static Debouncer,
) {
    loop {
        if let Err(e) = pin.wait_for_falling_edge().await {
            warn!("keypad: {:?} edge wait failed: {}", source, e);
            continue;
        }
        debouncer.on_edge(source, Instant::now());
    }
}

// ── Sensor context ────────────────────────────────────────────

fn run_sensors(config: &LockerConfig, spi: SPI2, i2c: I2C0) -> Result<()> {
    // SAFETY: bus pins are claimed only by this thread.
    let spi_driver = SpiDriver::new(
        spi,
        unsafe { AnyOutputPin::new(pins::SPI_SCLK_GPIO) },
        unsafe { AnyOutputPin::new(pins::SPI_MOSI_GPIO) },
        Some(unsafe { AnyIOPin::new(pins::SPI_MISO_GPIO) }),
        &SpiDriverConfig::new(),
    )?;
    let spi_config = SpiConfig::new()
        .baudrate(pins::ADXL345_SPI_FREQ_HZ.Hz())
        .data_mode(embedded_hal::spi::MODE_3);
    let accel_bus = SpiDeviceDriver::new(
        spi_driver,
        Some(unsafe { AnyOutputPin::new(pins::ADXL345_CS_GPIO) }),
        &spi_config,
    )?;

    let i2c_config = I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz());
    let thermo_bus = I2cDriver::new(
        i2c,
        unsafe { AnyIOPin::new(pins::I2C_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C_SCL_GPIO) },
        &i2c_config,
    )?;

    let mut hub = SensorHub::new(Adxl345::new(accel_bus), Tmp102::new(thermo_bus));
    supervisor::bring_up(&mut hub, config)?;

    let wake_pin = input_pull_up(pins::WAKE_GPIO)?;
    let mut supervisor = SensorSupervisor::new(config, &LOCK_STATE);

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor
        .spawn(async move {
            let mut feedback = &FEEDBACK;
            let mut sink = LogEventSink::new();
            supervisor.run(&mut hub, &WAKE, &mut feedback, &mut sink).await
        })
        .detach();
    executor.spawn(watch_wake(wake_pin)).detach();

    info!("Sensor task started");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    Ok(())
}

async fn watch_wake(mut pin: PinDriver<'static, AnyIOPin, Input>) {
    loop {
        match pin.wait_for_falling_edge().await {
            Ok(()) => WAKE.signal(()),
            Err(e) => warn!("wake: edge wait failed: {}", e),
        }
    }
}
