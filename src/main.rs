// PulseWatch - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the shared I2C bus, OLED and RTC (seeded with a fixed date).
//   2. Reset the sensor hub into application mode and configure BPM output.
//      A hub failure is logged with its status code; boot continues.
//   3. Let the algorithm warm up.
//   4. Spawn the sensor and UI tasks and start the 10 ms monitor tick.
//
// The screen stays blank until the button arms the first measurement.

#[cfg(target_os = "espidf")]
fn main() {
    if let Err(e) = firmware::run() {
        firmware::halt(&e);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("pulsewatch firmware must be built for an espidf target; run `cargo test` for the host suite");
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use anyhow::Context;
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::gpio::{PinDriver, Pull};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::timer::EspTaskTimerService;

    use pulsewatch::config::*;
    use pulsewatch::drivers::bus::{self, SharedI2c};
    use pulsewatch::drivers::display::OledDisplay;
    use pulsewatch::drivers::led::{BreathLed, StatusLed};
    use pulsewatch::drivers::max32664::Max32664;
    use pulsewatch::drivers::rtc::{DateTime, Ds1307};
    use pulsewatch::events::StateCell;
    use pulsewatch::input::ButtonEdge;
    use pulsewatch::machine::Machine;
    use pulsewatch::tasks;
    use pulsewatch::tasks::monitor::{Monitor, PanelIo};

    pub fn run() -> anyhow::Result<()> {
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("PulseWatch firmware starting");

        let peripherals = Peripherals::take()?;
        log::info!(
            "Pins: SDA {} SCL {} RSTN {} MFIO {} button {} error LED {} breath LED {}",
            PIN_I2C_SDA,
            PIN_I2C_SCL,
            PIN_HUB_RESET,
            PIN_HUB_MFIO,
            PIN_BUTTON,
            PIN_ERROR_LED,
            PIN_BREATH_LED
        );

        // ---- I2C bus (hub, OLED and RTC) --------------------------------------
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio6, // SDA
            peripherals.pins.gpio7, // SCL
            &i2c_config,
        )?;
        let i2c_bus = bus::leak(i2c);

        // ---- Display and clock ------------------------------------------------
        let mut display = OledDisplay::new(SharedI2c::new(i2c_bus), I2C_ADDR_OLED);
        display.init()?;

        let mut rtc = Ds1307::new(SharedI2c::new(i2c_bus), I2C_ADDR_RTC);
        rtc.init()?;
        let (yy, mo, dd) = RTC_SEED_DATE;
        let (hh, mi, ss) = RTC_SEED_TIME;
        let seed = DateTime::new(yy, mo, dd, hh, mi, ss).context("RTC seed out of range")?;
        rtc.set_datetime(&seed)?;
        log::info!("Clock set to {}", rtc.datetime()?);

        // ---- Sensor hub -------------------------------------------------------
        let reset = PinDriver::output(peripherals.pins.gpio9)?;
        let mfio = PinDriver::input_output_od(peripherals.pins.gpio10)?;
        let mut hub = Max32664::new(SharedI2c::new(i2c_bus), reset, mfio, FreeRtos, I2C_ADDR_SENSOR_HUB);

        let config_status = tasks::sensor::bring_up(&mut hub);
        log::info!("Configuring sensor: status 0x{:02X}", config_status);
        log::info!("Loading up the buffer with data...");
        thread::sleep(Duration::from_millis(SENSOR_WARMUP_MS));

        // ---- Panel I/O --------------------------------------------------------
        let mut button_pin = PinDriver::input(peripherals.pins.gpio3)?;
        button_pin.set_pull(Pull::Up)?;

        let error_led = PinDriver::output(peripherals.pins.gpio4)?;

        let breath_timer = LedcTimerDriver::new(
            peripherals.ledc.timer0,
            &TimerConfig::new().frequency(BREATH_PWM_FREQ_HZ.Hz().into()),
        )?;
        let breath_pwm = LedcDriver::new(peripherals.ledc.channel0, breath_timer, peripherals.pins.gpio5)?;

        // ---- Channels and shared state ----------------------------------------
        let (sample_tx, sample_rx) = mpsc::sync_channel(SAMPLE_QUEUE_DEPTH);
        let (ui_tx, ui_rx) = mpsc::channel();
        let state = Arc::new(StateCell::default());

        // ---- Tasks --------------------------------------------------------------
        let sensor_state = Arc::clone(&state);
        thread::Builder::new()
            .name("sensor".into())
            .stack_size(STACK_SENSOR)
            .spawn(move || tasks::sensor::sensor_task(hub, sensor_state, sample_tx))?;

        thread::Builder::new()
            .name("ui".into())
            .stack_size(STACK_UI)
            .spawn(move || tasks::ui::ui_task(display, rtc, ui_rx))?;

        let io = PanelIo::new(ui_tx, StatusLed::new(error_led), BreathLed::new(breath_pwm));
        let mut monitor = Monitor::new(Machine::new(state), sample_rx, ButtonEdge::new(button_pin), io);

        let timer_service = EspTaskTimerService::new()?;
        let tick_timer = timer_service.timer(move || monitor.on_tick())?;
        tick_timer.every(Duration::from_millis(TICK_PERIOD_MS))?;
        log::info!("Boot complete - press the button to measure");

        // The timer stops when dropped; park here to keep it alive.
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    /// Clock or peripheral bring-up failed: report and stop for good.
    pub fn halt(err: &anyhow::Error) -> ! {
        log::error!("Fatal initialization failure: {:?}", err);
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }
}
