// PulseWatch - UI Task
//
// Owns the OLED and the RTC.  Blocks on the UI channel, renders screens and
// writes window reports to the log with a wall-clock stamp.

use std::fmt::Debug;
use std::sync::mpsc::Receiver;

use embedded_hal::i2c::I2c;

use crate::drivers::display::TextDisplay;
use crate::drivers::rtc::Ds1307;
use crate::events::{UiEvent, Verdict, WindowReport};
use crate::screen;

pub fn ui_task<D, I2C>(mut display: D, mut rtc: Ds1307<I2C>, ui_rx: Receiver<UiEvent>)
where
    D: TextDisplay,
    D::Error: Debug,
    I2C: I2c,
{
    log::info!("UI task started");

    // Blocks until the monitor drops its sender.
    for event in ui_rx.iter() {
        handle_event(&mut display, &mut rtc, &event);
    }
    log::warn!("UI channel closed - exiting UI task");
}

fn handle_event<D, I2C>(display: &mut D, rtc: &mut Ds1307<I2C>, event: &UiEvent)
where
    D: TextDisplay,
    D::Error: Debug,
    I2C: I2c,
{
    match event {
        UiEvent::Show(s) => {
            if let Err(e) = screen::render(display, s) {
                log::error!("Display error: {:?}", e);
            }
        }
        UiEvent::Report(report) => {
            let stamp = match rtc.datetime() {
                Ok(now) => now.to_string(),
                Err(e) => {
                    log::warn!("RTC read failed: {:?}", e);
                    "--".to_string()
                }
            };
            log::info!("Report [{}]", stamp);
            for line in report_lines(report) {
                log::info!("{}", line);
            }
        }
    }
}

/// Human-readable summary of one measurement window.
pub fn report_lines(report: &WindowReport) -> Vec<String> {
    let outcome = match report.verdict {
        Verdict::Discard => "discard",
        _ => "accept",
    };
    let mut lines = vec![format!(
        "obtained {}/{} good samples -> {}",
        report.accepted, report.target, outcome
    )];

    if let Some(avg) = report.averages {
        lines.push(format!(
            "Hr: {}, Ox: {}, Conf: {}",
            avg.heart_rate, avg.oxygen, avg.confidence
        ));
    }
    if let Some((hr, ox)) = report.uncertainty {
        lines.push(format!("Uncertainty hr {:.3}, ox {:.3}", hr, ox));
    }
    match report.verdict {
        Verdict::Unreliable => lines.push("spread too small -> invalid".to_string()),
        Verdict::Exercise => lines.push("Breath exercise mode".to_string()),
        Verdict::Discard | Verdict::Accept => {}
    }
    lines
}
