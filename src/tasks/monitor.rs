// PulseWatch - Monitor (tick owner)
//
// Runs on the 10 ms periodic timer.  Each tick it samples the button, drains
// the sample mailbox into the state machine, then advances the machine.
// Display work is forwarded to the UI task; LEDs are driven in place.

use std::sync::mpsc::{Receiver, Sender};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::biometric::BioSample;
use crate::drivers::led::{BreathLed, StatusLed};
use crate::events::{Screen, UiEvent, WindowReport};
use crate::input::ButtonEdge;
use crate::machine::{Machine, MachineIo};

/// Hardware side of the machine: LEDs here, screens and reports to the UI task.
pub struct PanelIo<L, P> {
    ui_tx: Sender<UiEvent>,
    error_led: StatusLed<L>,
    breath: BreathLed<P>,
}

impl<L: OutputPin, P: SetDutyCycle> PanelIo<L, P> {
    pub fn new(ui_tx: Sender<UiEvent>, error_led: StatusLed<L>, breath: BreathLed<P>) -> Self {
        Self {
            ui_tx,
            error_led,
            breath,
        }
    }

    fn send(&self, event: UiEvent) {
        if self.ui_tx.send(event).is_err() {
            log::warn!("UI channel closed, dropping {:?}", event);
        }
    }
}

impl<L: OutputPin, P: SetDutyCycle> MachineIo for PanelIo<L, P> {
    fn show(&mut self, screen: Screen) {
        self.send(UiEvent::Show(screen));
    }

    fn set_error_indicator(&mut self, on: bool) {
        self.error_led.set(on);
    }

    fn start_breathing(&mut self) {
        log::info!("Breath exercise mode");
        self.breath.start();
    }

    fn set_breathing_level(&mut self, level: u16) {
        self.breath.set_level(level);
    }

    fn stop_breathing(&mut self) {
        self.breath.stop();
    }

    fn report(&mut self, report: WindowReport) {
        self.send(UiEvent::Report(report));
    }
}

pub struct Monitor<B, IO> {
    machine: Machine,
    samples: Receiver<BioSample>,
    button: ButtonEdge<B>,
    io: IO,
}

impl<B: InputPin, IO: MachineIo> Monitor<B, IO> {
    pub fn new(machine: Machine, samples: Receiver<BioSample>, button: ButtonEdge<B>, io: IO) -> Self {
        Self {
            machine,
            samples,
            button,
            io,
        }
    }

    pub fn on_tick(&mut self) {
        if self.button.poll() {
            self.machine.arm(&mut self.io);
        }
        while let Ok(sample) = self.samples.try_recv() {
            self.machine.offer_sample(&sample, &mut self.io);
        }
        self.machine.tick(&mut self.io);
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEBOUNCE_TICKS;
    use crate::events::{MachineState, StateCell};
    use crate::machine::tests::Recorder;
    use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};
    use std::sync::mpsc::{channel, sync_channel};
    use std::sync::Arc;

    fn button(levels: &[State]) -> Mock {
        let t: Vec<Transaction> = levels.iter().map(|&s| Transaction::get(s)).collect();
        Mock::new(&t)
    }

    #[test]
    fn press_arms_then_finger_sample_starts_measuring() {
        let presses = DEBOUNCE_TICKS as usize + 1;
        let mut levels = vec![State::Low; presses];
        levels.push(State::Low);
        let mut pin = button(&levels);

        let cell = Arc::new(StateCell::default());
        let (tx, rx) = sync_channel(4);
        let mut monitor = Monitor::new(
            Machine::new(Arc::clone(&cell)),
            rx,
            ButtonEdge::new(pin.clone()),
            Recorder::default(),
        );

        for _ in 0..presses {
            monitor.on_tick();
        }
        assert_eq!(cell.load(), MachineState::Wait);

        tx.send(BioSample { status: 3, ..BioSample::default() }).unwrap();
        monitor.on_tick();
        assert_eq!(monitor.machine().state(), MachineState::Measure);
        assert_eq!(monitor.io.screens, vec![Screen::PlaceFinger, Screen::Measuring]);
        pin.done();
    }

    #[test]
    fn nothing_is_shown_before_the_button_arms() {
        let mut pin = button(&[State::High; 20]);
        let cell = Arc::new(StateCell::default());
        let (tx, rx) = sync_channel(4);
        let mut monitor = Monitor::new(
            Machine::new(Arc::clone(&cell)),
            rx,
            ButtonEdge::new(pin.clone()),
            Recorder::default(),
        );

        tx.send(BioSample { status: 3, ..BioSample::default() }).unwrap();
        for _ in 0..20 {
            monitor.on_tick();
        }
        assert_eq!(cell.load(), MachineState::Idle);
        assert!(monitor.io.screens.is_empty());
        pin.done();
    }

    #[test]
    fn panel_forwards_screens_and_drives_leds() {
        let mut led_pin = Mock::new(&[Transaction::set(State::High)]);
        let (ui_tx, ui_rx) = channel();
        let mut panel = PanelIo::new(
            ui_tx,
            StatusLed::new(led_pin.clone()),
            BreathLed::new(NullPwm),
        );

        panel.show(Screen::Exercise);
        panel.set_error_indicator(true);
        panel.start_breathing();
        panel.set_breathing_level(500);
        panel.stop_breathing();

        assert_eq!(ui_rx.try_recv().unwrap(), UiEvent::Show(Screen::Exercise));
        assert!(ui_rx.try_recv().is_err());
        led_pin.done();
    }

    struct NullPwm;

    impl embedded_hal::pwm::ErrorType for NullPwm {
        type Error = core::convert::Infallible;
    }

    impl SetDutyCycle for NullPwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }
        fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}
