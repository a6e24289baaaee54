use crate::{
    error::DhtError,
    frame::{FRAME_LEN, RawFrame, Reading},
    handle::{SensorHandle, SensorVariant},
    line::{DataLine, Level, PinMode},
    timing::{Microseconds, TimingSource},
};

/// Maximum time to wait (in microseconds) for the line to change state.
///
/// Used to detect timeouts when waiting for the sensor to respond.
const TIMEOUT_US: u32 = 100;

/// Delay between two samples while waiting for a state change.
const POLL_INTERVAL_US: u32 = 1;

/// Host "ready" pulse after the start signal.
const READY_PULSE_US: u32 = 20;

/// By now the sensor must have pulled the line low.
const RESPONSE_SAMPLE_US: u32 = 40;

/// Length of the sensor's acknowledgment low phase.
const ACK_LOW_US: u32 = 80;

/// Sample point after a bit's rising edge, between the ~26-28us (0) and
/// ~70us (1) high pulses.
const BIT_SAMPLE_US: u32 = 40;

/// Drives the single-wire protocol for any [`SensorHandle`].
///
/// One read blocks the caller for the start signal (1.5 ms or 18 ms depending
/// on the variant) plus roughly 5 ms of frame transfer. The engine keeps no
/// per-read state, so a failed read leaves nothing behind.
pub struct ProtocolEngine<T> {
    timing: T,
}

impl<T: TimingSource> ProtocolEngine<T> {
    /// Creates a new protocol engine.
    ///
    /// # Arguments
    ///
    /// * `timing` - Delay and elapsed-time provider, see [`crate::timing`].
    pub fn new(timing: T) -> Self {
        Self { timing }
    }

    /// Returns the timing provider.
    pub fn release(self) -> T {
        self.timing
    }

    /// Reads a temperature and humidity measurement from the sensor.
    ///
    /// This method performs the complete communication sequence:
    /// sending a start signal, checking the sensor's acknowledgment,
    /// reading 5 bytes, validating the checksum, and decoding the result.
    ///
    /// Reads against the same handle must not overlap, and successive reads
    /// should be spaced by [`SensorVariant::min_sampling_interval_ms`].
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError)` if a communication or checksum error occurs.
    pub fn read_sensor<L: DataLine>(
        &mut self,
        handle: &mut SensorHandle<L>,
    ) -> Result<Reading, DhtError<L::Error>> {
        let variant = handle.variant();
        let encoding = handle.encoding();
        let line = handle.line_mut();

        self.check_response(line, variant)?;

        let mut data = [0; FRAME_LEN];
        for b in data.iter_mut() {
            *b = self.read_byte(line)?;
        }

        let frame = RawFrame::from(data);
        debug!(
            "{} frame {} {} {} {} {}",
            variant.name(),
            data[0],
            data[1],
            data[2],
            data[3],
            data[4]
        );
        frame.into_reading(encoding)
    }

    /// Sends the start signal and checks the sensor's acknowledgment.
    ///
    /// The line is held low for the variant's hold time, raised for 20us and
    /// released. The sensor must pull it low within 40us and raise it again
    /// after its 80us low phase. In every case the line is then followed
    /// back to low, where the first data bit begins.
    fn check_response<L: DataLine>(
        &mut self,
        line: &mut L,
        variant: SensorVariant,
    ) -> Result<(), DhtError<L::Error>> {
        trace!("{} start signal", variant.name());

        // MCU sends start request
        line.set_mode(PinMode::Output)?;
        line.set_level(Level::Low)?;
        self.timing.delay_us(variant.hold_time_us());
        line.set_level(Level::High)?;
        self.timing.delay_us(READY_PULSE_US);
        line.set_mode(PinMode::Input)?;
        self.timing.delay_us(RESPONSE_SAMPLE_US);

        // Sensor acknowledges with 80us low followed by 80us high
        let acknowledged = if line.read_level()? == Level::Low {
            self.timing.delay_us(ACK_LOW_US);
            line.read_level()? == Level::High
        } else {
            false
        };

        let idle = self.wait_for_low(line);

        if !acknowledged {
            warn!("{} did not acknowledge the start signal", variant.name());
            return match idle {
                Err(DhtError::PinError(err)) => Err(DhtError::PinError(err)),
                _ => Err(DhtError::NoResponse),
            };
        }

        idle
    }

    /// Reads one byte (8 bits, most significant first) from the sensor.
    ///
    /// # Returns
    ///
    /// * `Ok(u8)` with the read byte
    /// * `Err(DhtError)` on communication failure
    fn read_byte<L: DataLine>(&mut self, line: &mut L) -> Result<u8, DhtError<L::Error>> {
        let mut byte: u8 = 0;

        for i in 0..8 {
            let bit_mask = 1 << (7 - i);
            if self.read_bit(line)? {
                byte |= bit_mask;
            }
        }

        Ok(byte)
    }

    /// Reads a single bit from the sensor.
    ///
    /// The bit is determined by the duration of the high pulse that follows
    /// the sensor's ~50us low separator. The bit is 1 only if the line is
    /// still high 40us after the rising edge; a pulse that ends exactly at the
    /// sample instant reads as 0.
    fn read_bit<L: DataLine>(&mut self, line: &mut L) -> Result<bool, DhtError<L::Error>> {
        // Wait for the end of the low separator
        self.wait_for_high(line)?;

        // Delay 40us, then sample pin
        self.timing.delay_us(BIT_SAMPLE_US);

        // If it is still High, then the bit value is 1
        let bit_is_one = line.read_level()? == Level::High;
        self.wait_for_low(line)?;

        Ok(bit_is_one)
    }

    /// Waits until the data line goes high or times out.
    fn wait_for_high<L: DataLine>(&mut self, line: &mut L) -> Result<(), DhtError<L::Error>> {
        self.wait_for_level(line, Level::High)
    }

    /// Waits until the data line goes low or times out.
    fn wait_for_low<L: DataLine>(&mut self, line: &mut L) -> Result<(), DhtError<L::Error>> {
        self.wait_for_level(line, Level::Low)
    }

    /// Polls the line until it reads `level` or [`TIMEOUT_US`] has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::Timeout` if the timeout is exceeded
    fn wait_for_level<L: DataLine>(
        &mut self,
        line: &mut L,
        level: Level,
    ) -> Result<(), DhtError<L::Error>> {
        let mark = self.timing.now();
        loop {
            if line.read_level()? == level {
                return Ok(());
            }
            self.timing.delay_us(POLL_INTERVAL_US);
            if self.timing.elapsed_since(mark) >= Microseconds(TIMEOUT_US) {
                debug!("line did not change within {} us", TIMEOUT_US);
                return Err(DhtError::Timeout);
            }
        }
    }
}
