//! Modern DHT driver over the character-device GPIO interface
//!
//! The GPIO line is requested per read and released when the request
//! handle drops, so no line reservation outlives a read attempt, error
//! paths included. The device may need a warmup, so a read makes up to
//! five attempts with a one second pause between them.

use std::thread;
use std::time::Duration;

use gpio_cdev::{Chip, LineRequestFlags};
use log::debug;

use super::{protocol, Measurement, SensorError, SensorKind};

const GPIO_CHIP: &str = "/dev/gpiochip0";
const CONSUMER: &str = "pi-temp-humid";

const READ_ATTEMPTS: u32 = 5;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Host start signal: hold the line low long enough for the sensor to
/// notice. The DHT11 wants ~18ms; the DHT22 is happy with ~1ms but
/// tolerates more.
fn start_signal(kind: SensorKind) -> Duration {
    match kind {
        SensorKind::Dht11 => Duration::from_millis(18),
        SensorKind::Dht22 => Duration::from_millis(2),
    }
}

/// An opened GPIO chip plus the line offset for the sensor's data pin.
struct DhtDevice {
    chip: Chip,
    offset: u32,
}

impl DhtDevice {
    fn open(pin: u32) -> Result<Self, SensorError> {
        let chip = Chip::new(GPIO_CHIP).map_err(|_| SensorError::DriverUnavailable)?;
        Ok(Self { chip, offset: pin })
    }

    fn read_once(&mut self, kind: SensorKind) -> Result<Measurement, SensorError> {
        let line = self
            .chip
            .get_line(self.offset)
            .map_err(|e| SensorError::Gpio(e.to_string()))?;

        // Start signal: drive low, then release by re-requesting as input.
        let output = line
            .request(LineRequestFlags::OUTPUT, 0, CONSUMER)
            .map_err(|e| SensorError::Gpio(e.to_string()))?;
        output
            .set_value(0)
            .map_err(|e| SensorError::Gpio(e.to_string()))?;
        thread::sleep(start_signal(kind));
        drop(output);

        let input = line
            .request(LineRequestFlags::INPUT, 0, CONSUMER)
            .map_err(|e| SensorError::Gpio(e.to_string()))?;
        let frame = protocol::read_frame(|| {
            input
                .get_value()
                .map(|v| v != 0)
                .map_err(|e| SensorError::Gpio(e.to_string()))
        })?;
        protocol::decode(kind, frame)
    }
}

/// Read with the modern driver: open the device, attempt up to five reads
/// with a one second pause, give up with the last error.
pub(super) fn read(kind: SensorKind, pin: u32) -> Result<Measurement, SensorError> {
    let mut device = DhtDevice::open(pin)?;
    let mut last = SensorError::NoData;
    for attempt in 0..READ_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(RETRY_PAUSE);
        }
        match device.read_once(kind) {
            Ok(m) => return Ok(m),
            Err(err) => {
                debug!("cdev attempt {}/{READ_ATTEMPTS} failed: {err}", attempt + 1);
                last = err;
            }
        }
    }
    Err(last)
}
