//! DHT single-wire protocol: pulse sampling and frame decoding
//!
//! After the host releases the line, the sensor answers with an 80us low /
//! 80us high handshake and then 40 data bits. Every bit starts with a
//! ~50us low; the following high is ~27us for a 0 and ~70us for a 1. The
//! fifth byte is a checksum over the first four.

use std::time::{Duration, Instant};

use super::{Measurement, SensorError, SensorKind};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(2);
const BIT_TIMEOUT: Duration = Duration::from_millis(1);

/// High-pulse length separating a 0 bit from a 1 bit.
const ONE_THRESHOLD: Duration = Duration::from_micros(48);

/// Busy-wait until the line reaches `want`, returning how long it took.
fn wait_for(
    level: &mut impl FnMut() -> Result<bool, SensorError>,
    want: bool,
    timeout: Duration,
) -> Result<Duration, SensorError> {
    let start = Instant::now();
    loop {
        if level()? == want {
            return Ok(start.elapsed());
        }
        if start.elapsed() > timeout {
            return Err(SensorError::NoData);
        }
    }
}

/// Sample the 40-bit data frame from a line-level closure.
///
/// The closure reads the current line level; it is polled in a tight loop,
/// so it must not sleep.
pub(super) fn read_frame(
    mut level: impl FnMut() -> Result<bool, SensorError>,
) -> Result<[u8; 5], SensorError> {
    // Sensor response handshake: low, high, then low again before bit 0.
    wait_for(&mut level, false, HANDSHAKE_TIMEOUT)?;
    wait_for(&mut level, true, HANDSHAKE_TIMEOUT)?;
    wait_for(&mut level, false, HANDSHAKE_TIMEOUT)?;

    let mut frame = [0u8; 5];
    for bit in 0..40 {
        wait_for(&mut level, true, BIT_TIMEOUT)?;
        let high = wait_for(&mut level, false, BIT_TIMEOUT)?;
        if high > ONE_THRESHOLD {
            frame[bit / 8] |= 1 << (7 - (bit % 8));
        }
    }
    Ok(frame)
}

/// Decode a 5-byte frame into a measurement, verifying the checksum and
/// the sensor's plausible ranges (humidity 0-100 %, temperature -40-80 C).
pub(super) fn decode(kind: SensorKind, frame: [u8; 5]) -> Result<Measurement, SensorError> {
    let sum = frame[0]
        .wrapping_add(frame[1])
        .wrapping_add(frame[2])
        .wrapping_add(frame[3]);
    if sum != frame[4] {
        return Err(SensorError::NoData);
    }

    let (temperature_c, humidity) = match kind {
        SensorKind::Dht11 => (
            f64::from(frame[2]) + f64::from(frame[3]) / 10.0,
            f64::from(frame[0]) + f64::from(frame[1]) / 10.0,
        ),
        SensorKind::Dht22 => {
            let humidity = f64::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
            let raw_t = u16::from_be_bytes([frame[2], frame[3]]);
            let mut temperature = f64::from(raw_t & 0x7fff) / 10.0;
            if raw_t & 0x8000 != 0 {
                temperature = -temperature;
            }
            (temperature, humidity)
        }
    };

    if !(0.0..=100.0).contains(&humidity) || !(-40.0..=80.0).contains(&temperature_c) {
        return Err(SensorError::NoData);
    }
    Ok(Measurement::new(temperature_c, humidity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(mut frame: [u8; 5]) -> [u8; 5] {
        frame[4] = frame[0]
            .wrapping_add(frame[1])
            .wrapping_add(frame[2])
            .wrapping_add(frame[3]);
        frame
    }

    #[test]
    fn decodes_dht22_frame() {
        // 45.2 % RH, 21.3 C
        let frame = with_checksum([0x01, 0xc4, 0x00, 0xd5, 0]);
        let m = decode(SensorKind::Dht22, frame).unwrap();
        assert_eq!(m.humidity, 45.2);
        assert_eq!(m.temperature_c, 21.3);
    }

    #[test]
    fn decodes_dht22_negative_temperature() {
        // -10.5 C with the sign bit set
        let raw_t = 0x8000u16 | 105;
        let [t_hi, t_lo] = raw_t.to_be_bytes();
        let frame = with_checksum([0x01, 0x90, t_hi, t_lo, 0]);
        let m = decode(SensorKind::Dht22, frame).unwrap();
        assert_eq!(m.temperature_c, -10.5);
    }

    #[test]
    fn decodes_dht11_frame() {
        let frame = with_checksum([55, 0, 24, 0, 0]);
        let m = decode(SensorKind::Dht11, frame).unwrap();
        assert_eq!(m.humidity, 55.0);
        assert_eq!(m.temperature_c, 24.0);
    }

    #[test]
    fn rejects_bad_checksum() {
        let frame = [0x01, 0xc4, 0x00, 0xd5, 0xff];
        assert!(matches!(
            decode(SensorKind::Dht22, frame),
            Err(SensorError::NoData)
        ));
    }

    #[test]
    fn rejects_implausible_humidity() {
        // 600.0 % RH passes the checksum but not the range check.
        let frame = with_checksum([0x17, 0x70, 0x00, 0xd5, 0]);
        assert!(matches!(
            decode(SensorKind::Dht22, frame),
            Err(SensorError::NoData)
        ));
    }

    #[test]
    fn frame_read_times_out_on_stuck_line() {
        let result = read_frame(|| Ok(true));
        assert!(matches!(result, Err(SensorError::NoData)));
    }
}
