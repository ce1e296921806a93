//! Legacy DHT driver over the sysfs GPIO interface
//!
//! Fallback for kernels or containers where the GPIO character device is
//! not usable. Unlike the modern driver this one carries its own retry
//! primitive, `read_retry`, with the legacy binding's policy of fifteen
//! attempts two seconds apart.

use std::thread;
use std::time::Duration;

use log::debug;
use sysfs_gpio::{Direction, Pin};

use super::{protocol, Measurement, SensorError, SensorKind};

const RETRY_ATTEMPTS: u32 = 15;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Exported sysfs pin, unexported again on drop so the GPIO is released
/// on every exit path.
struct ExportedPin(Pin);

impl ExportedPin {
    fn new(pin: u32) -> Result<Self, SensorError> {
        let pin = Pin::new(u64::from(pin));
        pin.export().map_err(|_| SensorError::DriverUnavailable)?;
        Ok(Self(pin))
    }
}

impl Drop for ExportedPin {
    fn drop(&mut self) {
        let _ = self.0.unexport();
    }
}

fn read_once(kind: SensorKind, pin: &Pin) -> Result<Measurement, SensorError> {
    // Start signal: drive low, then switch to input to release the line.
    pin.set_direction(Direction::Low)
        .map_err(|e| SensorError::Gpio(e.to_string()))?;
    let low_time = match kind {
        SensorKind::Dht11 => Duration::from_millis(18),
        SensorKind::Dht22 => Duration::from_millis(2),
    };
    thread::sleep(low_time);
    pin.set_direction(Direction::In)
        .map_err(|e| SensorError::Gpio(e.to_string()))?;

    let frame = protocol::read_frame(|| {
        pin.get_value()
            .map(|v| v != 0)
            .map_err(|e| SensorError::Gpio(e.to_string()))
    })?;
    protocol::decode(kind, frame)
}

/// The legacy binding's retry primitive: keep trying until a read decodes
/// or the attempts run out.
pub(super) fn read_retry(kind: SensorKind, pin: u32) -> Result<Measurement, SensorError> {
    let exported = ExportedPin::new(pin)?;
    let mut last = SensorError::NoData;
    for attempt in 0..RETRY_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(RETRY_PAUSE);
        }
        match read_once(kind, &exported.0) {
            Ok(m) => return Ok(m),
            Err(err) => {
                debug!("sysfs attempt {}/{RETRY_ATTEMPTS} failed: {err}", attempt + 1);
                last = err;
            }
        }
    }
    Err(last)
}
