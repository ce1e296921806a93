//! Sensor reading with driver selection and fallback
//!
//! A read resolves an ordered chain of drivers and tries each until one
//! yields data: simulated (only when explicitly requested), the modern
//! character-device GPIO driver, then the legacy sysfs driver. Retry
//! policies intentionally differ per driver: the modern driver retries a
//! few times with a short pause, the legacy driver brings its own
//! `read_retry` primitive.

mod cdev;
mod protocol;
mod simulated;
mod sysfs;

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

/// Supported DHT-class sensors. `AM2302` is the wired DHT22 and parses to
/// the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Dht11,
    Dht22,
}

impl SensorKind {
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Dht11 => "DHT11",
            SensorKind::Dht22 => "DHT22",
        }
    }
}

impl FromStr for SensorKind {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DHT11" => Ok(SensorKind::Dht11),
            "DHT22" | "AM2302" => Ok(SensorKind::Dht22),
            other => Err(SensorError::UnsupportedSensor(other.to_string())),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Driver selection override, normally sourced from `PI_TEMP_DHT_DRIVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverPreference {
    /// Modern driver first, legacy as fallback.
    #[default]
    Auto,
    /// Modern character-device driver only.
    Modern,
    /// Legacy sysfs driver only.
    Legacy,
    /// Simulated values, no hardware access.
    Simulated,
}

impl DriverPreference {
    /// Parse a preference string; unknown values fall back to `Auto`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cdev" | "modern" | "adafruit" => DriverPreference::Modern,
            "sysfs" | "legacy" => DriverPreference::Legacy,
            "sim" | "simulate" | "simulated" => DriverPreference::Simulated,
            _ => DriverPreference::Auto,
        }
    }
}

/// Identifies which driver produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverId {
    Simulated,
    Cdev,
    Sysfs,
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverId::Simulated => "simulated",
            DriverId::Cdev => "cdev",
            DriverId::Sysfs => "sysfs",
        };
        f.write_str(name)
    }
}

/// One temperature/humidity sample, both values rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f64,
    pub humidity: f64,
}

impl Measurement {
    pub fn new(temperature_c: f64, humidity: f64) -> Self {
        Self {
            temperature_c: round1(temperature_c),
            humidity: round1(humidity),
        }
    }

    /// Temperature in Fahrenheit, rounded to one decimal.
    pub fn temperature_f(&self) -> f64 {
        round1(self.temperature_c * 9.0 / 5.0 + 32.0)
    }
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no DHT driver available: no usable GPIO interface found")]
    DriverUnavailable,
    #[error("sensor returned no data")]
    NoData,
    #[error("unsupported sensor type: {0}")]
    UnsupportedSensor(String),
    #[error("gpio failure: {0}")]
    Gpio(String),
}

/// A successful read plus the driver that produced it.
#[derive(Debug, Clone, Copy)]
pub struct ReadOutcome {
    pub measurement: Measurement,
    pub driver: DriverId,
}

fn driver_chain(pref: DriverPreference) -> &'static [DriverId] {
    match pref {
        DriverPreference::Simulated => &[DriverId::Simulated],
        DriverPreference::Modern => &[DriverId::Cdev],
        DriverPreference::Legacy => &[DriverId::Sysfs],
        DriverPreference::Auto => &[DriverId::Cdev, DriverId::Sysfs],
    }
}

/// Read from the first driver in the chain that yields data.
///
/// Returns the last driver's error when the whole chain is exhausted;
/// `NoData` from a later driver outranks `DriverUnavailable` from an
/// earlier one so the caller sees the most informative failure.
pub fn read(
    kind: SensorKind,
    pin: u32,
    pref: DriverPreference,
) -> Result<ReadOutcome, SensorError> {
    let mut last_err = SensorError::DriverUnavailable;
    for &driver in driver_chain(pref) {
        debug!("trying {driver} driver for {kind} on pin {pin}");
        let result = match driver {
            DriverId::Simulated => Ok(simulated::read()),
            DriverId::Cdev => cdev::read(kind, pin),
            DriverId::Sysfs => sysfs::read_retry(kind, pin),
        };
        match result {
            Ok(measurement) => {
                debug!("{driver} driver produced {measurement:?}");
                return Ok(ReadOutcome {
                    measurement,
                    driver,
                });
            }
            Err(err) => {
                warn!("{driver} driver failed on pin {pin}: {err}");
                if !matches!(err, SensorError::DriverUnavailable)
                    || matches!(last_err, SensorError::DriverUnavailable)
                {
                    last_err = err;
                }
            }
        }
    }
    Err(last_err)
}

/// Convenience wrapper: always simulated.
pub fn read_simulated() -> Measurement {
    simulated::read()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_kind_parses_aliases() {
        assert_eq!("am2302".parse::<SensorKind>().unwrap(), SensorKind::Dht22);
        assert_eq!("DHT22".parse::<SensorKind>().unwrap(), SensorKind::Dht22);
        assert_eq!(" dht11 ".parse::<SensorKind>().unwrap(), SensorKind::Dht11);
    }

    #[test]
    fn sensor_kind_rejects_unknown() {
        let err = "BME280".parse::<SensorKind>().unwrap_err();
        assert!(matches!(err, SensorError::UnsupportedSensor(s) if s == "BME280"));
    }

    #[test]
    fn driver_preference_parsing() {
        assert_eq!(DriverPreference::parse("cdev"), DriverPreference::Modern);
        assert_eq!(DriverPreference::parse("legacy"), DriverPreference::Legacy);
        assert_eq!(DriverPreference::parse("sim"), DriverPreference::Simulated);
        assert_eq!(DriverPreference::parse("auto"), DriverPreference::Auto);
        assert_eq!(DriverPreference::parse("garbage"), DriverPreference::Auto);
    }

    #[test]
    fn simulated_preference_never_touches_hardware() {
        // A read with the simulated preference must succeed on any machine.
        let outcome = read(SensorKind::Dht22, 4, DriverPreference::Simulated).unwrap();
        assert_eq!(outcome.driver, DriverId::Simulated);
    }

    #[test]
    fn measurement_rounds_to_one_decimal() {
        let m = Measurement::new(21.34999, 45.2501);
        assert_eq!(m.temperature_c, 21.3);
        assert_eq!(m.humidity, 45.3);
    }

    #[test]
    fn fahrenheit_conversion_rounds() {
        let m = Measurement::new(21.3, 45.2);
        assert_eq!(m.temperature_f(), 70.3);
    }

    #[test]
    fn chain_order_matches_preference() {
        assert_eq!(
            driver_chain(DriverPreference::Auto),
            &[DriverId::Cdev, DriverId::Sysfs]
        );
        assert_eq!(
            driver_chain(DriverPreference::Simulated),
            &[DriverId::Simulated]
        );
    }
}
