pub mod bus;
pub mod display;
pub mod led;
pub mod max32664;
pub mod rtc;
