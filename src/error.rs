use core::fmt;

/// Possible errors from the DHTxx driver.
///
/// A failed read never touches a [`Reading`](crate::Reading) the caller already
/// holds, so every variant is recoverable.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor did not acknowledge the start signal.
    NoResponse,
    /// Timed out waiting for a pin state change.
    Timeout,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Returns `true` when an immediate retry is reasonable.
    ///
    /// `NoResponse` points at a missing or unpowered sensor, so callers
    /// should back off instead.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ChecksumMismatch)
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => f.write_str("sensor did not acknowledge the start signal"),
            Self::Timeout => f.write_str("timed out waiting for the data line"),
            Self::ChecksumMismatch => f.write_str("frame checksum mismatch"),
            Self::PinError(err) => write!(f, "GPIO error: {err:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}
