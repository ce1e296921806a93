//! Chart data model: bounded series and the pan/zoom viewport

mod series;
mod viewport;

pub use series::{BoundedSeries, SeriesPoint};
pub use viewport::{TimeViewport, WindowUnit};
