// PulseWatch - Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 3;      // D1/A1 - User button (INPUT_PULLUP, active LOW)
pub const PIN_ERROR_LED: i32 = 4;   // D2/A2 - Error indicator LED
pub const PIN_BREATH_LED: i32 = 5;  // D3/A3 - Breathing exercise LED (LEDC PWM)
pub const PIN_I2C_SDA: i32 = 6;     // D4    - I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5    - I2C clock line
pub const PIN_HUB_RESET: i32 = 9;   // D9    - Sensor hub RSTN
pub const PIN_HUB_MFIO: i32 = 10;   // D10   - Sensor hub MFIO

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_BAUDRATE_KHZ: u32 = 100;
pub const I2C_ADDR_SENSOR_HUB: u8 = 0x55;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_ADDR_RTC: u8 = 0x68;

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024
pub const LINE_SPACING: i32 = 15;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 6144;
pub const STACK_UI: usize = 8192;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
pub const TICK_PERIOD_MS: u64 = 10;                    // state machine tick
pub const TICKS_PER_SECOND: u32 = 100;                 // 1000 / TICK_PERIOD_MS
pub const SENSOR_POLL_INTERVAL_MS: u64 = 40;           // hub FIFO poll cadence
pub const SENSOR_WARMUP_MS: u64 = 4000;                // algorithm output lags configuration
pub const DEBOUNCE_TICKS: u8 = 5;                      // 50 ms of stable level
pub const SAMPLE_QUEUE_DEPTH: usize = 8;               // poll task -> tick mailbox

// ---------------------------------------------------------------------------
// Measurement windows (seconds)
// ---------------------------------------------------------------------------
pub const MAX_MEASURE_TIME: u32 = 30;
pub const EXERCISE_TIME: u32 = 20;
pub const PAUSE_TIME: u32 = 5;

// ---------------------------------------------------------------------------
// Quality gates
// ---------------------------------------------------------------------------
/// Accepted samples a window needs before its averages are trusted.
pub const OPT_MEASURES: u32 = 100;

/// Oxygen readings below this (1 % LSB) are communication glitches, not data.
pub const MIN_MEASURABLE_OXY: u16 = 0x000A;

/// Heart-rate readings below this (0.1 bpm LSB, i.e. 10 bpm) are discarded.
pub const MIN_MEASURABLE_HR: u16 = 0x0064;

/// Averages above 75.0 bpm start the breathing exercise.
pub const HIGH_HR_THRES: u32 = 0x02EE;

/// Normalized half-range at or below which a window is rejected (1.0 = 100 %).
pub const MIN_UNCERT_THRES: f32 = 0.1;

// ---------------------------------------------------------------------------
// Breathing exercise PWM
// ---------------------------------------------------------------------------
pub const BREATH_PWM_FREQ_HZ: u32 = 1000;
pub const BREATH_STEP: u16 = 4;
pub const BREATH_TOP: u16 = 999;

// ---------------------------------------------------------------------------
// Real-time clock seed (written at every boot; no battery-backed time source)
// ---------------------------------------------------------------------------
pub const RTC_SEED_DATE: (u8, u8, u8) = (23, 6, 12); // yy, mm, dd
pub const RTC_SEED_TIME: (u8, u8, u8) = (8, 21, 0);  // hh, mm, ss
