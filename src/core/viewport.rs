//! Pan/zoom transforms for the chart's time axis
//!
//! A viewport is the visible `[start, end]` range in epoch milliseconds.
//! Pixel deltas convert to time deltas through
//! `ms_per_pixel = (end - start) / plot_width_px`. The range never
//! reaches before epoch zero or past "now"; clamping preserves the span.

/// Unit choices for the window selector. A month is a fixed 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl WindowUnit {
    pub const ALL: [WindowUnit; 6] = [
        WindowUnit::Seconds,
        WindowUnit::Minutes,
        WindowUnit::Hours,
        WindowUnit::Days,
        WindowUnit::Weeks,
        WindowUnit::Months,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WindowUnit::Seconds => "Seconds",
            WindowUnit::Minutes => "Minutes",
            WindowUnit::Hours => "Hours",
            WindowUnit::Days => "Days",
            WindowUnit::Weeks => "Weeks",
            WindowUnit::Months => "Months",
        }
    }

    pub fn millis(&self) -> i64 {
        let seconds: i64 = match self {
            WindowUnit::Seconds => 1,
            WindowUnit::Minutes => 60,
            WindowUnit::Hours => 3600,
            WindowUnit::Days => 86_400,
            WindowUnit::Weeks => 604_800,
            WindowUnit::Months => 2_592_000,
        };
        seconds * 1000
    }
}

/// Visible time range of the chart, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeViewport {
    start_ms: i64,
    end_ms: i64,
}

impl TimeViewport {
    /// A window of `window_ms` ending at `now_ms`.
    pub fn ending_now(window_ms: i64, now_ms: i64) -> Self {
        let end_ms = now_ms.max(1);
        Self {
            start_ms: (end_ms - window_ms.max(1)).max(0),
            end_ms,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub fn span_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn ms_per_pixel(&self, plot_width_px: f64) -> f64 {
        if plot_width_px <= 0.0 {
            return 0.0;
        }
        self.span_ms() as f64 / plot_width_px
    }

    /// Map a timestamp to a horizontal pixel position.
    pub fn x_for(&self, ts_ms: i64, plot_width_px: f64) -> f64 {
        let span = self.span_ms().max(1) as f64;
        (ts_ms - self.start_ms) as f64 / span * plot_width_px
    }

    /// Shift the window by a pixel delta; positive pans toward later
    /// times. No-op when the plot has no width.
    pub fn pan_by_pixels(&mut self, dx_px: f64, plot_width_px: f64, now_ms: i64) {
        if plot_width_px <= 0.0 {
            return;
        }
        let delta = (dx_px * self.ms_per_pixel(plot_width_px)) as i64;
        self.start_ms += delta;
        self.end_ms += delta;
        self.clamp(now_ms);
    }

    /// Zoom by `factor` (>1 zooms in) keeping the timestamp under pixel
    /// `px` at the same relative position.
    pub fn zoom_at(&mut self, factor: f64, px: f64, plot_width_px: f64, now_ms: i64) {
        if plot_width_px <= 0.0 || factor <= 0.0 {
            return;
        }
        let rel = (px / plot_width_px).clamp(0.0, 1.0);
        let span = self.span_ms() as f64;
        let center = self.start_ms as f64 + span * rel;
        let half = (span / 2.0 / factor).max(1.0);
        self.start_ms = (center - half) as i64;
        self.end_ms = (center + half) as i64;
        self.clamp(now_ms);
    }

    /// Snap back to the configured window ending now.
    pub fn reset(&mut self, window_ms: i64, now_ms: i64) {
        *self = Self::ending_now(window_ms, now_ms);
    }

    fn clamp(&mut self, now_ms: i64) {
        let span = self.span_ms().max(1);
        if self.end_ms > now_ms {
            self.end_ms = now_ms;
            self.start_ms = (self.end_ms - span).max(0);
        }
        if self.start_ms < 0 {
            self.start_ms = 0;
            self.end_ms = span.min(now_ms.max(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK_MS: i64 = 7 * 24 * 3600 * 1000;

    #[test]
    fn ms_per_pixel_matches_definition() {
        let v = TimeViewport::ending_now(WEEK_MS, WEEK_MS * 2);
        assert_eq!(v.ms_per_pixel(800.0), WEEK_MS as f64 / 800.0);
    }

    #[test]
    fn pan_shifts_by_pixel_delta() {
        let now = WEEK_MS * 4;
        let mut v = TimeViewport::ending_now(WEEK_MS, now - WEEK_MS);
        let before = (v.start_ms(), v.end_ms());
        v.pan_by_pixels(-100.0, 1000.0, now);
        let expected = (WEEK_MS as f64 / 1000.0 * 100.0) as i64;
        assert_eq!(v.start_ms(), before.0 - expected);
        assert_eq!(v.end_ms(), before.1 - expected);
    }

    #[test]
    fn pan_clamps_at_now_preserving_span() {
        let now = WEEK_MS * 2;
        let mut v = TimeViewport::ending_now(WEEK_MS, now - 1000);
        v.pan_by_pixels(1_000_000.0, 100.0, now);
        assert_eq!(v.end_ms(), now);
        assert_eq!(v.span_ms(), WEEK_MS);
    }

    #[test]
    fn pan_clamps_at_epoch_preserving_span() {
        let now = WEEK_MS * 2;
        let mut v = TimeViewport::ending_now(WEEK_MS, now);
        v.pan_by_pixels(-1_000_000.0, 1.0, now);
        assert_eq!(v.start_ms(), 0);
        assert_eq!(v.span_ms(), WEEK_MS);
    }

    #[test]
    fn zoom_in_halves_the_span() {
        let now = WEEK_MS * 4;
        let mut v = TimeViewport::ending_now(WEEK_MS, now - WEEK_MS);
        v.zoom_at(2.0, 400.0, 800.0, now);
        assert_eq!(v.span_ms(), WEEK_MS / 2);
    }

    #[test]
    fn zoom_at_left_edge_recenters_on_start() {
        let now = WEEK_MS * 4;
        let mut v = TimeViewport::ending_now(WEEK_MS, now - WEEK_MS);
        let start = v.start_ms();
        v.zoom_at(2.0, 0.0, 800.0, now);
        // Pointer at the left edge: the zoom recenters on the old start,
        // so the new window begins half the new span before it.
        assert_eq!(v.start_ms(), start - WEEK_MS / 4);
    }

    #[test]
    fn zoom_out_clamps_to_now() {
        let now = WEEK_MS;
        let mut v = TimeViewport::ending_now(WEEK_MS / 2, now);
        v.zoom_at(0.5, 400.0, 800.0, now);
        assert!(v.end_ms() <= now);
        assert!(v.start_ms() >= 0);
    }

    #[test]
    fn reset_restores_window_ending_now() {
        let now = WEEK_MS * 3;
        let mut v = TimeViewport::ending_now(WEEK_MS, now - WEEK_MS);
        v.pan_by_pixels(-500.0, 800.0, now);
        v.reset(WEEK_MS, now);
        assert_eq!(v.end_ms(), now);
        assert_eq!(v.span_ms(), WEEK_MS);
    }

    #[test]
    fn month_unit_is_thirty_days() {
        assert_eq!(WindowUnit::Months.millis(), 30 * 86_400 * 1000);
    }

    #[test]
    fn unit_selector_spans_seconds_to_months() {
        assert_eq!(WindowUnit::ALL.first(), Some(&WindowUnit::Seconds));
        assert_eq!(WindowUnit::ALL.last(), Some(&WindowUnit::Months));
        assert_eq!(WindowUnit::Seconds.millis(), 1000);
        // Multipliers strictly increase along the selector.
        assert!(WindowUnit::ALL.windows(2).all(|w| w[0].millis() < w[1].millis()));
    }
}
