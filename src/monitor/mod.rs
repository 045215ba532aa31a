#[cfg(windows)]
mod enumerate;
mod types;

#[cfg(windows)]
pub use enumerate::{enumerate_monitors, primary_monitor};
pub use types::MonitorInfo;
