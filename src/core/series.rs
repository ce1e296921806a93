//! Bounded in-memory time series
//!
//! FIFO-trimmed on two axes: a hard point-count cap and a rolling time
//! window relative to the newest point. Points arrive in timestamp order
//! (one poll loop, one writer), so eviction only ever pops from the front.

use std::collections::VecDeque;

/// One charted sample: milliseconds since the Unix epoch plus a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub ts_ms: i64,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct BoundedSeries {
    points: VecDeque<SeriesPoint>,
    max_points: usize,
    window_ms: i64,
}

impl BoundedSeries {
    pub fn new(max_points: usize, window_ms: i64) -> Self {
        Self {
            points: VecDeque::new(),
            max_points: max_points.max(1),
            window_ms: window_ms.max(1),
        }
    }

    pub fn push(&mut self, ts_ms: i64, value: f64) {
        self.points.push_back(SeriesPoint { ts_ms, value });
        self.trim();
    }

    /// Change the rolling window and re-trim against the newest point.
    pub fn set_window_ms(&mut self, window_ms: i64) {
        self.window_ms = window_ms.max(1);
        self.trim();
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<SeriesPoint> {
        self.points.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    fn trim(&mut self) {
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
        if let Some(newest) = self.points.back().map(|p| p.ts_ms) {
            let cutoff = newest - self.window_ms;
            while self.points.front().is_some_and(|p| p.ts_ms < cutoff) {
                self.points.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_point_count_fifo() {
        let mut s = BoundedSeries::new(3, i64::MAX / 2);
        for i in 0..5 {
            s.push(i, i as f64);
        }
        assert_eq!(s.len(), 3);
        let values: Vec<f64> = s.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn evicts_points_outside_the_rolling_window() {
        let mut s = BoundedSeries::new(100, 1000);
        s.push(0, 1.0);
        s.push(500, 2.0);
        s.push(1600, 3.0); // pushes the window past t=0 and t=500
        let stamps: Vec<i64> = s.iter().map(|p| p.ts_ms).collect();
        assert_eq!(stamps, vec![1600]);
    }

    #[test]
    fn point_exactly_at_window_edge_is_kept() {
        let mut s = BoundedSeries::new(100, 1000);
        s.push(0, 1.0);
        s.push(1000, 2.0);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn shrinking_the_window_re_trims() {
        let mut s = BoundedSeries::new(100, 10_000);
        s.push(0, 1.0);
        s.push(5000, 2.0);
        s.push(9000, 3.0);
        s.set_window_ms(1000);
        let stamps: Vec<i64> = s.iter().map(|p| p.ts_ms).collect();
        assert_eq!(stamps, vec![9000]);
    }

    #[test]
    fn timestamps_stay_non_decreasing_after_eviction() {
        let mut s = BoundedSeries::new(4, 100_000);
        for i in 0..50 {
            s.push(i * 10, 0.0);
        }
        let stamps: Vec<i64> = s.iter().map(|p| p.ts_ms).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(s.latest().unwrap().ts_ms, 490);
    }
}
