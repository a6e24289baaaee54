//! Microsecond timing used for protocol delays and wait deadlines.

use embedded_hal::delay::DelayNs;

/// A number of microseconds.
///
/// Used both as a duration and as a point on a free-running counter. Counter
/// values may wrap; [`Microseconds::since`] accounts for that.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Microseconds(pub u32);

impl Microseconds {
    /// Time elapsed from `earlier` to `self`, tolerating one counter wrap.
    pub const fn since(self, earlier: Microseconds) -> Microseconds {
        Microseconds(self.0.wrapping_sub(earlier.0))
    }
}

/// A microsecond clock, typically a free-running hardware timer.
pub trait MicroClock {
    /// Current counter value. Allowed to wrap.
    fn now(&self) -> Microseconds;
}

/// Blocking delays plus elapsed-time measurement.
pub trait TimingSource {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Returns a marker for later use with [`TimingSource::elapsed_since`].
    fn now(&mut self) -> Microseconds;

    /// Time elapsed since `mark` was taken.
    fn elapsed_since(&mut self, mark: Microseconds) -> Microseconds {
        self.now().since(mark)
    }
}

impl<T: TimingSource + ?Sized> TimingSource for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn now(&mut self) -> Microseconds {
        (**self).now()
    }

    fn elapsed_since(&mut self, mark: Microseconds) -> Microseconds {
        (**self).elapsed_since(mark)
    }
}

/// Timing built from a delay provider alone.
///
/// Elapsed time is the sum of requested delays. Time spent outside the delays
/// (pin reads, loop overhead) is not counted, so deadlines measured this way
/// only ever run long, never short.
pub struct DelayTiming<D> {
    delay: D,
    elapsed: u32,
}

impl<D: DelayNs> DelayTiming<D> {
    /// Wraps a delay provider.
    pub fn new(delay: D) -> Self {
        Self { delay, elapsed: 0 }
    }

    /// Returns the wrapped delay provider.
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> TimingSource for DelayTiming<D> {
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
        self.elapsed = self.elapsed.wrapping_add(us);
    }

    fn now(&mut self) -> Microseconds {
        Microseconds(self.elapsed)
    }
}

/// Timing backed by a delay provider and a free-running clock.
pub struct ClockTiming<D, C> {
    delay: D,
    clock: C,
}

impl<D: DelayNs, C: MicroClock> ClockTiming<D, C> {
    /// Combines a delay provider with a clock.
    pub fn new(delay: D, clock: C) -> Self {
        Self { delay, clock }
    }

    /// Returns the wrapped delay provider and clock.
    pub fn release(self) -> (D, C) {
        (self.delay, self.clock)
    }
}

impl<D: DelayNs, C: MicroClock> TimingSource for ClockTiming<D, C> {
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn now(&mut self) -> Microseconds {
        self.clock.now()
    }
}
