// PulseWatch - heart-rate / SpO2 monitor firmware library
//
// Everything here is target-independent; `main.rs` wires it to ESP-IDF.

pub mod aggregate;
pub mod biometric;
pub mod breath;
pub mod config;
pub mod drivers;
pub mod events;
pub mod input;
pub mod machine;
pub mod screen;
pub mod tasks;
