// PulseWatch - Indicator LED Drivers
//
// Error indicator on a plain GPIO and the breathing pacer on a PWM channel.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::config::BREATH_TOP;

pub struct StatusLed<P> {
    pin: P,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            log::warn!("Status LED write failed");
        }
    }
}

/// PWM LED whose brightness follows the breathing wave (0..=`BREATH_TOP`).
pub struct BreathLed<P> {
    pwm: P,
    running: bool,
}

impl<P: SetDutyCycle> BreathLed<P> {
    pub fn new(pwm: P) -> Self {
        let mut led = Self { pwm, running: false };
        led.off();
        led
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
        self.set_level(0);
    }

    /// Scale `level` onto the channel's duty range; ignored while stopped.
    pub fn set_level(&mut self, level: u16) {
        if !self.running {
            return;
        }
        let level = level.min(BREATH_TOP);
        if self.pwm.set_duty_cycle_fraction(level, BREATH_TOP).is_err() {
            log::warn!("Breath LED duty update failed");
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.off();
    }

    fn off(&mut self) {
        if let Err(e) = self.pwm.set_duty_cycle_fully_off() {
            log::warn!("Breath LED switch-off failed: {:?}", e);
        }
    }
}
