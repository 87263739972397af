//! Compute-once values
//!
//! [`LazyValue`] wraps an expensive producer (typically a metadata
//! extraction) and evaluates it at most once successfully. The locking
//! strategy is picked at construction and carried in the type:
//!
//! - [`Locked`]: concurrent first callers serialize on a mutex, exactly one
//!   of them runs the producer, and all of them see the published value.
//! - [`Unlocked`]: no synchronization at all. The value is `!Sync`, so the
//!   compiler keeps it on one thread.
//!
//! A failing producer is not cached; the next [`LazyValue::get`] retries.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

mod sealed {
    pub trait Sealed {}
}

/// How a [`LazyValue`] guards its compute-and-publish step.
pub trait Strategy<T>: sealed::Sealed {
    /// Storage for the published value.
    type Cell;

    /// Whether evaluation is guarded by a mutex.
    const USES_MUTEX: bool;

    #[doc(hidden)]
    fn new_cell() -> Self::Cell;

    #[doc(hidden)]
    fn peek(cell: &Self::Cell) -> Option<&T>;

    #[doc(hidden)]
    fn get_or_try_init<'a, E, F>(cell: &'a Self::Cell, init: F) -> Result<&'a T, E>
    where
        F: FnOnce() -> Result<T, E>;
}

/// Mutex-guarded evaluation, safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

/// Unsynchronized evaluation for single-threaded holders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlocked;

impl sealed::Sealed for Locked {}
impl sealed::Sealed for Unlocked {}

/// Value cell used by [`Locked`].
pub struct LockedCell<T> {
    value: once_cell::sync::OnceCell<T>,
    lock: Mutex<()>,
}

impl<T> Strategy<T> for Locked {
    type Cell = LockedCell<T>;

    const USES_MUTEX: bool = true;

    fn new_cell() -> Self::Cell {
        LockedCell {
            value: once_cell::sync::OnceCell::new(),
            lock: Mutex::new(()),
        }
    }

    fn peek(cell: &Self::Cell) -> Option<&T> {
        cell.value.get()
    }

    fn get_or_try_init<'a, E, F>(cell: &'a Self::Cell, init: F) -> Result<&'a T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = cell.value.get() {
            return Ok(value);
        }

        // A producer that panicked poisons the lock; the slot is still
        // empty in that case, so it is safe to keep going.
        let _guard = cell.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = cell.value.get() {
            return Ok(value);
        }

        let value = init()?;
        Ok(cell.value.get_or_init(|| value))
    }
}

impl<T> Strategy<T> for Unlocked {
    type Cell = once_cell::unsync::OnceCell<T>;

    const USES_MUTEX: bool = false;

    fn new_cell() -> Self::Cell {
        once_cell::unsync::OnceCell::new()
    }

    fn peek(cell: &Self::Cell) -> Option<&T> {
        cell.get()
    }

    fn get_or_try_init<'a, E, F>(cell: &'a Self::Cell, init: F) -> Result<&'a T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        cell.get_or_try_init(init)
    }
}

/// A value computed on first successful access and cached afterwards.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use gitstamp::util::LazyValue;
///
/// let lazy = LazyValue::locked(|| Ok::<_, Infallible>(6 * 7));
/// assert!(!lazy.has_succeeded());
/// assert_eq!(*lazy.get().unwrap(), 42);
/// assert!(lazy.has_succeeded());
/// assert_eq!(lazy.value(), Some(&42));
/// ```
pub struct LazyValue<T, F, S: Strategy<T> = Locked> {
    producer: F,
    cell: S::Cell,
    _marker: PhantomData<(S, fn() -> T)>,
}

impl<T, F> LazyValue<T, F, Locked> {
    /// Create a value whose first evaluation is guarded by a mutex.
    pub fn locked(producer: F) -> Self {
        Self {
            producer,
            cell: Locked::new_cell(),
            _marker: PhantomData,
        }
    }
}

impl<T, F> LazyValue<T, F, Unlocked> {
    /// Create a value with no synchronization around evaluation.
    pub fn unlocked(producer: F) -> Self {
        Self {
            producer,
            cell: Unlocked::new_cell(),
            _marker: PhantomData,
        }
    }
}

impl<T, F, S: Strategy<T>> LazyValue<T, F, S> {
    /// Get the value, running the producer if no evaluation has succeeded yet.
    ///
    /// Producer errors are returned to the caller and nothing is cached.
    pub fn get<E>(&self) -> Result<&T, E>
    where
        F: Fn() -> Result<T, E>,
    {
        S::get_or_try_init(&self.cell, || {
            trace!(locked = S::USES_MUTEX, "evaluating lazy value");
            (self.producer)()
        })
    }

    /// Whether an evaluation has succeeded. Never reverts once true.
    pub fn has_succeeded(&self) -> bool {
        S::peek(&self.cell).is_some()
    }

    /// Peek at the cached value without forcing evaluation.
    pub fn value(&self) -> Option<&T> {
        S::peek(&self.cell)
    }

    /// Whether this value was built with the mutex-guarded strategy.
    pub fn uses_mutex(&self) -> bool {
        S::USES_MUTEX
    }
}

impl<T: fmt::Debug, F, S: Strategy<T>> fmt::Debug for LazyValue<T, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("value", &self.value())
            .field("use_mutex", &S::USES_MUTEX)
            .finish()
    }
}
