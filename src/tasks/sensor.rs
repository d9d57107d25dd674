// PulseWatch - Sensor Task
//
// Polls the sensor hub FIFO every `SENSOR_POLL_INTERVAL_MS` while the machine
// is waiting for a finger or measuring, and hands each sample to the tick
// side through a bounded mailbox.

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use crate::biometric::BioSample;
use crate::config::*;
use crate::drivers::max32664::commands::AlgoMode;
use crate::drivers::max32664::Max32664;
use crate::events::StateCell;

/// Start the hub and configure BPM output.  Failures are logged and the
/// configuration status code (0x00 on success) is returned; boot carries on
/// either way and later reads surface as zero samples.
pub fn bring_up<I2C, E, RST, MFIO, D>(hub: &mut Max32664<I2C, RST, MFIO, D>) -> u8
where
    I2C: I2c<Error = E>,
    E: Debug,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    match hub.begin() {
        Ok(mode) => log::info!("Sensor hub ready ({:?})", mode),
        Err(e) => log::error!("Sensor hub did not start: {} (code 0x{:02X})", e, e.code()),
    }
    match hub.read_sensor_hub_version() {
        Ok(v) => log::info!("Sensor hub firmware {}", v),
        Err(e) => log::warn!("Sensor hub version unavailable (code 0x{:02X})", e.code()),
    }
    match hub.config_bpm(AlgoMode::ModeOne) {
        Ok(()) => {
            log::info!("Sensor configured correctly");
            0x00
        }
        Err(e) => {
            log::error!("Error during configuration with status code 0x{:02X}", e.code());
            e.code()
        }
    }
}

pub fn sensor_task<I2C, E, RST, MFIO, D>(
    mut hub: Max32664<I2C, RST, MFIO, D>,
    state: Arc<StateCell>,
    samples: SyncSender<BioSample>,
) where
    I2C: I2c<Error = E>,
    E: Debug,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    log::info!("Sensor task started");

    let interval = Duration::from_millis(SENSOR_POLL_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        if poll_once(&mut hub, &state, &samples).is_break() {
            log::warn!("Sample mailbox closed - exiting sensor task");
            return;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

/// One poll period.  Breaks only when the receiving side is gone.
pub fn poll_once<I2C, E, RST, MFIO, D>(
    hub: &mut Max32664<I2C, RST, MFIO, D>,
    state: &StateCell,
    samples: &SyncSender<BioSample>,
) -> ControlFlow<()>
where
    I2C: I2c<Error = E>,
    E: Debug,
    RST: OutputPin,
    MFIO: InputPin + OutputPin,
    D: DelayNs,
{
    if !state.load().wants_samples() {
        return ControlFlow::Continue(());
    }

    let sample = match hub.read_bpm() {
        Ok(sample) => sample,
        Err(e) => {
            log::warn!("Sensor hub read failed (0x{:02X}): {}", e.code(), e);
            BioSample::default()
        }
    };

    match samples.try_send(sample) {
        Ok(()) => ControlFlow::Continue(()),
        Err(TrySendError::Full(_)) => {
            log::debug!("Sample mailbox full, dropping sample");
            ControlFlow::Continue(())
        }
        Err(TrySendError::Disconnected(_)) => ControlFlow::Break(()),
    }
}
