//! The 40-bit data frame and its conversion to physical units.

use crate::error::DhtError;

/// Number of bytes the sensor sends per read.
pub const FRAME_LEN: usize = 5;

/// How the four data bytes map to physical units.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameEncoding {
    /// Each quantity is a 16-bit unsigned count of tenths.
    #[default]
    Tenths,
    /// Like [`FrameEncoding::Tenths`], but bit 7 of the temperature high byte
    /// is a sign flag and the remaining 15 bits the magnitude (AM2302 datasheet).
    SignedTenths,
    /// High byte is the integral part, low byte the tenths, as some DHT11
    /// datasheets describe it.
    IntegralDecimal,
}

/// Reading returned by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

/// One decoded frame, in wire order.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub humidity_high: u8,
    pub humidity_low: u8,
    pub temp_high: u8,
    pub temp_low: u8,
    pub checksum: u8,
}

impl From<[u8; FRAME_LEN]> for RawFrame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        let [humidity_high, humidity_low, temp_high, temp_low, checksum] = bytes;
        Self {
            humidity_high,
            humidity_low,
            temp_high,
            temp_low,
            checksum,
        }
    }
}

impl RawFrame {
    /// The frame bytes in wire order.
    pub fn bytes(&self) -> [u8; FRAME_LEN] {
        [
            self.humidity_high,
            self.humidity_low,
            self.temp_high,
            self.temp_low,
            self.checksum,
        ]
    }

    /// Truncated 8-bit sum of the four data bytes.
    pub fn calculated_checksum(&self) -> u8 {
        self.bytes()[..4]
            .iter()
            .fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    /// Whether the transmitted checksum matches the data bytes.
    pub fn is_valid(&self) -> bool {
        self.calculated_checksum() == self.checksum
    }

    /// Validates the frame and converts it into a [`Reading`].
    pub fn into_reading<E>(self, encoding: FrameEncoding) -> Result<Reading, DhtError<E>> {
        if !self.is_valid() {
            warn!(
                "checksum mismatch: received {}, calculated {}",
                self.checksum,
                self.calculated_checksum()
            );
            return Err(DhtError::ChecksumMismatch);
        }

        let (relative_humidity, temperature) = match encoding {
            FrameEncoding::Tenths => (
                tenths(self.humidity_high, self.humidity_low),
                tenths(self.temp_high, self.temp_low),
            ),
            FrameEncoding::SignedTenths => {
                let is_temp_negative = (self.temp_high >> 7) != 0;
                let temp_high = self.temp_high & 0b0111_1111;
                let magnitude = tenths(temp_high, self.temp_low);
                let temperature = if is_temp_negative { -magnitude } else { magnitude };
                (tenths(self.humidity_high, self.humidity_low), temperature)
            }
            FrameEncoding::IntegralDecimal => (
                self.humidity_high as f32 + self.humidity_low as f32 / 10.0,
                self.temp_high as f32 + self.temp_low as f32 / 10.0,
            ),
        };

        Ok(Reading {
            temperature,
            relative_humidity,
        })
    }
}

fn tenths(high: u8, low: u8) -> f32 {
    u16::from_be_bytes([high, low]) as f32 / 10.0
}
