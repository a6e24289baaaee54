//! Time-driven sensor simulation for tests.
//!
//! [`SimBus`] is both the data line and the timing source, so every delay the
//! engine requests advances the simulated clock. After the host releases the
//! line, the sensor side replays a waveform of `(level, duration)` segments;
//! past its end the pull-up keeps the line high.

use core::convert::Infallible;
use std::{cell::RefCell, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::{
    line::{DataLine, Level, PinMode, SwitchDirection},
    timing::{MicroClock, Microseconds, TimingSource},
};

/// Sensor response low/high phases.
pub const ACK_US: u32 = 80;
/// Low separator before every data bit.
pub const SEPARATOR_US: u32 = 50;
/// High pulse width of a 0 bit.
pub const ZERO_US: u32 = 27;
/// High pulse width of a 1 bit.
pub const ONE_US: u32 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Mode(PinMode, u32),
    Drive(Level, u32),
}

#[derive(Default)]
struct Wire {
    now: u32,
    mode: Option<PinMode>,
    driven: Option<Level>,
    released_at: Option<u32>,
    waveform: Vec<(Level, u32)>,
    events: Vec<Event>,
}

impl Wire {
    fn sensor_level(&self, released_at: u32) -> Level {
        let mut t = self.now - released_at;
        for &(level, duration) in &self.waveform {
            if t < duration {
                return level;
            }
            t -= duration;
        }
        Level::High
    }
}

#[derive(Clone, Default)]
pub struct SimBus(Rc<RefCell<Wire>>);

impl SimBus {
    pub fn new(waveform: Vec<(Level, u32)>) -> Self {
        let bus = Self::default();
        bus.0.borrow_mut().waveform = waveform;
        bus
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }
}

impl DataLine for SimBus {
    type Error = Infallible;

    fn set_mode(&mut self, mode: PinMode) -> Result<(), Infallible> {
        let mut wire = self.0.borrow_mut();
        let now = wire.now;
        wire.mode = Some(mode);
        wire.released_at = match mode {
            PinMode::Input => Some(now),
            PinMode::Output => None,
        };
        wire.events.push(Event::Mode(mode, now));
        Ok(())
    }

    fn set_level(&mut self, level: Level) -> Result<(), Infallible> {
        let mut wire = self.0.borrow_mut();
        let now = wire.now;
        wire.driven = Some(level);
        wire.events.push(Event::Drive(level, now));
        Ok(())
    }

    fn read_level(&mut self) -> Result<Level, Infallible> {
        let wire = self.0.borrow();
        match (wire.mode, wire.released_at) {
            (Some(PinMode::Input), Some(released_at)) => Ok(wire.sensor_level(released_at)),
            _ => Ok(wire.driven.unwrap_or(Level::High)),
        }
    }
}

impl TimingSource for SimBus {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().now += us;
    }

    fn now(&mut self) -> Microseconds {
        Microseconds(self.0.borrow().now)
    }
}

impl DelayNs for SimBus {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now += ns.div_ceil(1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().now += us;
    }
}

/// The simulated clock, read without advancing it.
pub struct SimClock(pub SimBus);

impl MicroClock for SimClock {
    fn now(&self) -> Microseconds {
        Microseconds(self.0.0.borrow().now)
    }
}

/// The simulated line seen as an `embedded-hal` pin that switches direction.
pub struct SimPin(pub SimBus);

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.read_level()? == Level::High)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.read_level()? == Level::Low)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_level(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_level(Level::High)
    }
}

impl SwitchDirection for SimPin {
    fn make_input(&mut self) -> Result<(), Infallible> {
        self.0.set_mode(PinMode::Input)
    }

    fn make_output(&mut self) -> Result<(), Infallible> {
        self.0.set_mode(PinMode::Output)
    }
}

/// Builds the waveform of a well-behaved sensor sending `bytes`.
pub fn sensor_waveform(bytes: [u8; 5]) -> Vec<(Level, u32)> {
    sensor_waveform_with(bytes, |bit| if bit { ONE_US } else { ZERO_US })
}

/// Like [`sensor_waveform`], with the high pulse width chosen per bit.
pub fn sensor_waveform_with(bytes: [u8; 5], pulse: impl Fn(bool) -> u32) -> Vec<(Level, u32)> {
    // The sensor reacts 20us after the release
    let mut waveform = vec![
        (Level::High, 20),
        (Level::Low, ACK_US),
        (Level::High, ACK_US),
    ];
    for byte in bytes {
        for i in 0..8 {
            let bit = (byte >> (7 - i)) & 1 == 1;
            waveform.push((Level::Low, SEPARATOR_US));
            waveform.push((Level::High, pulse(bit)));
        }
    }
    // Trailing low before the line goes idle
    waveform.push((Level::Low, SEPARATOR_US));
    waveform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ClockTiming, DirectionalLine, DhtError, FrameEncoding, ProtocolEngine, Reading,
        SensorHandle, SensorVariant,
    };

    fn read(bus: &SimBus, variant: SensorVariant) -> Result<Reading, DhtError<Infallible>> {
        let mut handle = SensorHandle::new(bus.clone(), variant);
        ProtocolEngine::new(bus.clone()).read_sensor(&mut handle)
    }

    #[test]
    fn test_dht22_frame() {
        let bus = SimBus::new(sensor_waveform([0x01, 0x90, 0x00, 0xF6, 0x87]));

        assert_eq!(
            read(&bus, SensorVariant::Dht22).unwrap(),
            Reading {
                relative_humidity: 40.0,
                temperature: 24.6,
            }
        );
    }

    #[test]
    fn test_dht11_decodes_tenths_by_default() {
        // 1000 and 300 tenths, checksum 0x03 + 0xE8 + 0x01 + 0x2C = 0x18
        let bus = SimBus::new(sensor_waveform([0x03, 0xE8, 0x01, 0x2C, 0x18]));

        assert_eq!(
            read(&bus, SensorVariant::Dht11).unwrap(),
            Reading {
                relative_humidity: 100.0,
                temperature: 30.0,
            }
        );
    }

    #[test]
    fn test_dht11_integral_decimal_frame() {
        let bus = SimBus::new(sensor_waveform([0x32, 0x00, 0x15, 0x05, 0x4C]));
        let mut handle = SensorHandle::new(bus.clone(), SensorVariant::Dht11)
            .with_encoding(FrameEncoding::IntegralDecimal);

        let reading = ProtocolEngine::new(bus.clone())
            .read_sensor(&mut handle)
            .unwrap();

        assert_eq!(
            reading,
            Reading {
                relative_humidity: 50.0,
                temperature: 21.5,
            }
        );
    }

    #[test]
    fn test_read_with_clock_timing() {
        let bus = SimBus::new(sensor_waveform([0x01, 0x90, 0x00, 0xF6, 0x87]));
        let mut handle = SensorHandle::new(bus.clone(), SensorVariant::Dht22);
        let mut engine = ProtocolEngine::new(ClockTiming::new(bus.clone(), SimClock(bus.clone())));

        assert_eq!(
            engine.read_sensor(&mut handle).unwrap(),
            Reading {
                relative_humidity: 40.0,
                temperature: 24.6,
            }
        );
    }

    #[test]
    fn test_clock_timing_absent_sensor() {
        let bus = SimBus::new(Vec::new());
        let mut handle = SensorHandle::new(bus.clone(), SensorVariant::Dht22);
        let mut engine = ProtocolEngine::new(ClockTiming::new(bus.clone(), SimClock(bus.clone())));

        assert_eq!(
            engine.read_sensor(&mut handle).unwrap_err(),
            DhtError::NoResponse
        );
    }

    #[test]
    fn test_read_through_directional_line() {
        let bus = SimBus::new(sensor_waveform([0x02, 0x2B, 0x00, 0xF6, 0x23]));
        let mut handle = SensorHandle::new(
            DirectionalLine::new(SimPin(bus.clone())),
            SensorVariant::Dht22,
        );
        let mut engine = ProtocolEngine::new(bus.clone());

        assert_eq!(
            engine.read_sensor(&mut handle).unwrap(),
            Reading {
                relative_humidity: 55.5,
                temperature: 24.6,
            }
        );
        assert_eq!(
            bus.events(),
            [
                Event::Mode(PinMode::Output, 0),
                Event::Drive(Level::Low, 0),
                Event::Drive(Level::High, 1_500),
                Event::Mode(PinMode::Input, 1_520),
            ]
        );
    }

    #[test]
    fn test_checksum_mismatch_keeps_previous_reading() {
        let good = SimBus::new(sensor_waveform([0x32, 0x00, 0x15, 0x05, 0x4C]));
        let bad = SimBus::new(sensor_waveform([0x32, 0x00, 0x15, 0x05, 0x4D]));

        let mut last = read(&good, SensorVariant::Dht11).ok();
        let before = last;

        match read(&bad, SensorVariant::Dht11) {
            Ok(reading) => last = Some(reading),
            Err(err) => assert_eq!(err, DhtError::ChecksumMismatch),
        }

        assert!(last.is_some());
        assert_eq!(last, before);
    }

    #[test]
    fn test_absent_sensor() {
        let bus = SimBus::new(Vec::new());

        assert_eq!(
            read(&bus, SensorVariant::Dht22).unwrap_err(),
            DhtError::NoResponse
        );
    }

    #[test]
    fn test_acknowledgment_too_long() {
        let bus = SimBus::new(vec![(Level::High, 20), (Level::Low, 500)]);

        assert_eq!(
            read(&bus, SensorVariant::Dht22).unwrap_err(),
            DhtError::NoResponse
        );
    }

    #[test]
    fn test_sensor_stops_mid_frame() {
        let mut waveform = sensor_waveform([0x01, 0x90, 0x00, 0xF6, 0x87]);
        // Ack phases plus 10 bits, then the line is held low
        waveform.truncate(3 + 2 * 10);
        waveform.push((Level::Low, 10_000));
        let bus = SimBus::new(waveform);

        assert_eq!(
            read(&bus, SensorVariant::Dht22).unwrap_err(),
            DhtError::Timeout
        );
    }

    #[test]
    fn test_start_signal_ordering() {
        let bus = SimBus::new(sensor_waveform([0x32, 0x00, 0x15, 0x05, 0x4C]));
        read(&bus, SensorVariant::Dht11).unwrap();

        assert_eq!(
            bus.events(),
            [
                Event::Mode(PinMode::Output, 0),
                Event::Drive(Level::Low, 0),
                Event::Drive(Level::High, 18_000),
                Event::Mode(PinMode::Input, 18_020),
            ]
        );
    }

    #[test]
    fn test_dht22_hold_time() {
        let bus = SimBus::new(sensor_waveform([0x01, 0x90, 0x00, 0xF6, 0x87]));
        read(&bus, SensorVariant::Dht22).unwrap();

        assert_eq!(bus.events()[2], Event::Drive(Level::High, 1_500));
    }

    #[test]
    fn test_repeated_reads_match() {
        let bus = SimBus::new(sensor_waveform([0x02, 0x2B, 0x00, 0xF6, 0x23]));
        let mut handle = SensorHandle::new(bus.clone(), SensorVariant::Dht22);
        let mut engine = ProtocolEngine::new(bus.clone());

        let first = engine.read_sensor(&mut handle).unwrap();
        let second = engine.read_sensor(&mut handle).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.relative_humidity, 55.5);
    }
}
