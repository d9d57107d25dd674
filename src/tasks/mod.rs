pub mod monitor;
pub mod sensor;
pub mod ui;
