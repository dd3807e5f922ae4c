//! Buffered accessor: read-after-write consistency over a slow device image.
//!
//! A device does not expose a written value in its readable image until its next refresh,
//! so a read right after a write can return the old value. [`BufferedAccessor`] remembers
//! the last written value and serves it for `delay` after the write; once the delay has
//! passed, reads go to the device again. A zero delay makes it behave exactly like the
//! wrapped [`VariableAccessor`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::trace;

use crate::accessor::{AccessMode, NetVar, VariableAccessor};
use crate::descriptor::{VarIndex, VariableDescriptor};
use crate::error::{Error, Result};
use crate::port::DeviceAccessPort;
use crate::value::Value;

/// Source of the current time for buffer expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    Stopped,
    At(Instant),
    /// The interval does not fit in an `Instant`.
    Never,
}

/// One-shot deadline timer.
#[derive(Debug, Clone, Copy)]
pub struct DelayTimer {
    interval: Duration,
    deadline: Deadline,
}

impl DelayTimer {
    pub fn new(interval: Duration) -> Self {
        DelayTimer {
            interval,
            deadline: Deadline::Stopped,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Arm the timer. An interval too large to add to `now` never expires.
    pub fn start(&mut self, now: Instant) {
        self.deadline = match now.checked_add(self.interval) {
            Some(at) => Deadline::At(at),
            None => Deadline::Never,
        };
    }

    pub fn stop(&mut self) {
        self.deadline = Deadline::Stopped;
    }

    pub fn started(&self) -> bool {
        self.deadline != Deadline::Stopped
    }

    /// Started and `now` is still before the deadline.
    pub fn is_running(&self, now: Instant) -> bool {
        match self.deadline {
            Deadline::Stopped => false,
            Deadline::At(at) => now < at,
            Deadline::Never => true,
        }
    }
}

/// A [`VariableAccessor`] that serves its last written value for a while.
pub struct BufferedAccessor<P> {
    inner: VariableAccessor<P>,
    buffer: Option<Value>,
    timer: DelayTimer,
    clock: Rc<dyn Clock>,
}

impl<P: fmt::Debug> fmt::Debug for BufferedAccessor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedAccessor")
            .field("inner", &self.inner)
            .field("buffer", &self.buffer)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl<P: DeviceAccessPort> BufferedAccessor<P> {
    pub fn new(inner: VariableAccessor<P>, delay: Duration) -> Self {
        BufferedAccessor {
            inner,
            buffer: None,
            timer: DelayTimer::new(delay),
            clock: Rc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn delay(&self) -> Duration {
        self.timer.interval()
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.timer.set_interval(delay);
    }

    pub fn inner(&self) -> &VariableAccessor<P> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut VariableAccessor<P> {
        &mut self.inner
    }

    pub fn into_inner(self) -> VariableAccessor<P> {
        self.inner
    }

    /// True while reads are served from the buffer.
    pub fn is_buffering(&self) -> bool {
        self.buffer.is_some() && self.timer.is_running(self.clock.now())
    }

    pub fn get(&self) -> Result<Value> {
        if self.timer.is_running(self.clock.now()) {
            if let Some(value) = self.buffer {
                trace!("get {} -> {} (buffered)", self.inner.descriptor(), value);
                return Ok(value);
            }
        }
        self.inner.get()
    }

    /// Write through to the device, then buffer the written value and restart the timer.
    ///
    /// On error nothing is buffered.
    pub fn set(&mut self, value: Value) -> Result<()> {
        let written = self.inner.write(value)?;
        self.buffer = Some(written);
        self.timer.start(self.clock.now());
        Ok(())
    }

    /// Forget the buffered value; used when the device connection is re-established.
    pub fn reset(&mut self) {
        self.buffer = None;
        self.timer.stop();
    }

    /// Write `value` only if the device does not already hold it.
    ///
    /// Returns `Ok(true)` if the value was already as desired and `Ok(false)` if a write was
    /// issued. Only meaningful without buffering, since a buffered read could hide a value
    /// the device has since overridden; a non-zero delay fails with
    /// [`Error::BufferedGuaranteedSet`].
    pub fn guaranteed_set(&mut self, value: Value) -> Result<bool> {
        if !self.delay().is_zero() {
            return Err(Error::BufferedGuaranteedSet {
                delay: self.delay(),
            });
        }
        let desired = self
            .inner
            .codec()
            .coerce(self.inner.descriptor().type_tag(), &value)?;
        if self.get()? == desired {
            return Ok(true);
        }
        self.set(desired)?;
        Ok(false)
    }

    pub fn descriptor(&self) -> &VariableDescriptor {
        self.inner.descriptor()
    }

    pub fn mode(&self) -> AccessMode {
        self.inner.mode()
    }
}

impl<P: DeviceAccessPort> NetVar for BufferedAccessor<P> {
    fn get(&self) -> Result<Value> {
        BufferedAccessor::get(self)
    }

    fn set(&mut self, value: Value) -> Result<()> {
        BufferedAccessor::set(self, value)
    }

    fn descriptor(&self) -> &VariableDescriptor {
        self.inner.descriptor()
    }

    fn mode(&self) -> AccessMode {
        self.inner.mode()
    }

    fn set_index(&mut self, index: VarIndex) {
        self.inner.set_index(index);
    }
}
