//! Simulated sensor for machines without a DHT attached

use rand::Rng;

use super::Measurement;

/// Draw a plausible indoor sample: 20-30 C, 30-80 % RH.
pub(super) fn read() -> Measurement {
    let mut rng = rand::thread_rng();
    Measurement::new(
        rng.gen_range(20.0..=30.0),
        rng.gen_range(30.0..=80.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_values_stay_in_range() {
        for _ in 0..1000 {
            let m = read();
            assert!((20.0..=30.0).contains(&m.temperature_c), "{}", m.temperature_c);
            assert!((30.0..=80.0).contains(&m.humidity), "{}", m.humidity);
            // One-decimal precision: scaling by 10 must give an integer.
            assert_eq!(m.temperature_c * 10.0, (m.temperature_c * 10.0).round());
            assert_eq!(m.humidity * 10.0, (m.humidity * 10.0).round());
        }
    }
}
