//! pi-temp-humid: temperature/humidity logging and display for Raspberry Pi
//!
//! This library provides the pieces behind the `pi-temp-humid` binary:
//! - Sensor drivers (simulated, modern character-device GPIO, legacy sysfs)
//!   with an ordered fallback chain
//! - An append-only SQLite reading store with time-based pruning
//! - A bounded in-memory series and pan/zoom viewport for charting
//! - The GTK4 dashboard (chart + fullscreen idle clock)

pub mod config;
pub mod core;
pub mod sensor;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use config::Settings;
pub use core::{BoundedSeries, TimeViewport};
pub use sensor::{DriverPreference, Measurement, SensorKind};
pub use storage::Reading;
