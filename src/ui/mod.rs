//! GTK4 user interface: dashboard window, chart and clock rendering

mod chart;
mod clock;
mod main_window;

pub use chart::{render_chart, ChartStyle, Color};
pub use clock::{render_clock, ClockStyle};
pub use main_window::build_ui;
