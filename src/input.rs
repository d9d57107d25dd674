// PulseWatch - Button Input
//
// Debounced press detection for the arming button.  Sampled once per tick;
// a level must hold for `DEBOUNCE_TICKS` consecutive samples before it counts.

use embedded_hal::digital::InputPin;

use crate::config::DEBOUNCE_TICKS;

pub struct ButtonEdge<P> {
    pin: P,
    // Debounce state
    last_raw: bool,
    stable_for: u8,
    pressed: bool,
}

impl<P: InputPin> ButtonEdge<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last_raw: false,
            stable_for: 0,
            pressed: false,
        }
    }

    /// Sample the pin; returns `true` exactly once per debounced press.
    pub fn poll(&mut self) -> bool {
        // Active LOW with pull-up; a read failure counts as released.
        let raw = self.pin.is_low().unwrap_or(false);

        if raw != self.last_raw {
            self.last_raw = raw;
            self.stable_for = 0;
            return false;
        }
        if self.stable_for < DEBOUNCE_TICKS {
            self.stable_for += 1;
            if self.stable_for < DEBOUNCE_TICKS {
                return false;
            }
        }

        let edge = raw && !self.pressed;
        self.pressed = raw;
        edge
    }
}
