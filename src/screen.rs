// PulseWatch - Screen layouts

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;

use crate::config::LINE_SPACING;
use crate::drivers::display::TextDisplay;
use crate::events::Screen;

impl Screen {
    /// Text lines, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::PlaceFinger => vec!["Put finger".into(), "on sensors".into()],
            Self::Measuring => vec!["Measuring".into()],
            Self::InvalidMeasure => vec!["Invalid measure".into(), "Repeat".into()],
            Self::Exercise => vec!["Exercise mode".into()],
            Self::Result(avg) => vec![
                format!("Hr: {} bpm", avg.heart_rate),
                format!("Ox: {} perc", avg.oxygen),
                format!("Cf: {} perc", avg.confidence),
            ],
        }
    }
}

/// Clear, draw each line `LINE_SPACING` pixels below the previous one, flip.
pub fn render<D: TextDisplay>(display: &mut D, screen: &Screen) -> Result<(), D::Error> {
    display.clear();
    for (row, line) in screen.lines().iter().enumerate() {
        display.set_cursor(0, row as i32 * LINE_SPACING);
        display.write_text(line, &FONT_6X10, BinaryColor::On);
    }
    display.set_cursor(0, 0);
    display.present()
}
