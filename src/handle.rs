use crate::frame::FrameEncoding;

/// Supported sensor variants.
///
/// Both speak the same frame format and differ in how long the host must hold
/// the line low to wake them.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorVariant {
    /// DHT11: needs an 18 ms start pulse.
    Dht11,
    /// DHT22 / AM2302: needs at least 1 ms, 1.5 ms is used for margin.
    Dht22,
}

impl SensorVariant {
    /// How long the host holds the line low to request a reading.
    pub const fn hold_time_us(self) -> u32 {
        match self {
            Self::Dht11 => 18_000,
            Self::Dht22 => 1_500,
        }
    }

    /// Shortest interval between two reads that still yields fresh data.
    ///
    /// The driver does not enforce this; periodic pollers should.
    pub const fn min_sampling_interval_ms(self) -> u32 {
        match self {
            Self::Dht11 => 1_000,
            Self::Dht22 => 2_000,
        }
    }

    /// Short name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dht11 => "DHT11",
            Self::Dht22 => "DHT22",
        }
    }
}

/// One physical sensor: its data line and variant.
///
/// The variant and frame encoding are fixed once the handle is built. The
/// line is only borrowed by [`ProtocolEngine`](crate::ProtocolEngine) for the
/// duration of a read.
pub struct SensorHandle<L> {
    line: L,
    variant: SensorVariant,
    encoding: FrameEncoding,
}

impl<L> SensorHandle<L> {
    /// Binds a data line to a sensor variant.
    ///
    /// # Arguments
    ///
    /// * `line` - The data line backend, see [`crate::line`].
    /// * `variant` - Which sensor is wired to the line.
    pub fn new(line: L, variant: SensorVariant) -> Self {
        Self {
            line,
            variant,
            encoding: FrameEncoding::default(),
        }
    }

    /// Overrides the default [`FrameEncoding::Tenths`] decoding.
    pub fn with_encoding(self, encoding: FrameEncoding) -> Self {
        Self { encoding, ..self }
    }

    /// Which sensor is wired to the line.
    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// How frames from this sensor are decoded.
    pub fn encoding(&self) -> FrameEncoding {
        self.encoding
    }

    /// Returns the data line.
    pub fn release(self) -> L {
        self.line
    }

    pub(crate) fn line_mut(&mut self) -> &mut L {
        &mut self.line
    }
}
