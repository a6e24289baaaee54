//! Data line access.
//!
//! The protocol engine only talks to the bus through [`DataLine`]. Two backends
//! are provided and the caller picks one when building a
//! [`SensorHandle`](crate::SensorHandle):
//!
//! * [`OpenDrainLine`] for pins configured as open-drain outputs that can also
//!   be read back. Switching to input simply releases the line.
//! * [`DirectionalLine`] for pins whose direction is switched at run time,
//!   e.g. flexible/dynamic pin types offered by most HALs.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Direction of the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// The sensor drives the line; the host only samples it.
    Input,
    /// The host drives the line.
    Output,
}

/// Electrical level of the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Released or driven high.
    High,
    /// Pulled low.
    Low,
}

/// A bidirectional single-wire data line.
pub trait DataLine {
    /// Error raised by the underlying GPIO.
    type Error;

    /// Switches the line direction.
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error>;

    /// Drives the line. Only meaningful in [`PinMode::Output`].
    fn set_level(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Samples the instantaneous line level.
    fn read_level(&mut self) -> Result<Level, Self::Error>;
}

impl<L: DataLine + ?Sized> DataLine for &mut L {
    type Error = L::Error;

    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error> {
        (**self).set_mode(mode)
    }

    fn set_level(&mut self, level: Level) -> Result<(), Self::Error> {
        (**self).set_level(level)
    }

    fn read_level(&mut self) -> Result<Level, Self::Error> {
        (**self).read_level()
    }
}

/// Pins that can change direction at run time.
pub trait SwitchDirection: ErrorType {
    /// Reconfigures the pin as a floating input.
    fn make_input(&mut self) -> Result<(), Self::Error>;

    /// Reconfigures the pin as a push-pull output.
    fn make_output(&mut self) -> Result<(), Self::Error>;
}

/// Open-drain backend.
///
/// The pin stays an output the whole time. Releasing it (driving high) lets the
/// pull-up hold the line idle so the sensor can pull it low.
pub struct OpenDrainLine<P> {
    pin: P,
}

impl<P> OpenDrainLine<P> {
    /// Wraps an open-drain pin.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P, E> DataLine for OpenDrainLine<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = E;

    fn set_mode(&mut self, mode: PinMode) -> Result<(), E> {
        match mode {
            PinMode::Input => self.pin.set_high(),
            PinMode::Output => Ok(()),
        }
    }

    fn set_level(&mut self, level: Level) -> Result<(), E> {
        write_level(&mut self.pin, level)
    }

    fn read_level(&mut self) -> Result<Level, E> {
        sample(&mut self.pin)
    }
}

/// Direction-switching backend.
pub struct DirectionalLine<P> {
    pin: P,
}

impl<P> DirectionalLine<P> {
    /// Wraps a pin whose direction can be switched.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P, E> DataLine for DirectionalLine<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E> + SwitchDirection,
{
    type Error = E;

    fn set_mode(&mut self, mode: PinMode) -> Result<(), E> {
        match mode {
            PinMode::Input => self.pin.make_input(),
            PinMode::Output => self.pin.make_output(),
        }
    }

    fn set_level(&mut self, level: Level) -> Result<(), E> {
        write_level(&mut self.pin, level)
    }

    fn read_level(&mut self) -> Result<Level, E> {
        sample(&mut self.pin)
    }
}

fn write_level<P: OutputPin>(pin: &mut P, level: Level) -> Result<(), P::Error> {
    match level {
        Level::High => pin.set_high(),
        Level::Low => pin.set_low(),
    }
}

fn sample<P: InputPin>(pin: &mut P) -> Result<Level, P::Error> {
    if pin.is_high()? {
        Ok(Level::High)
    } else {
        Ok(Level::Low)
    }
}
