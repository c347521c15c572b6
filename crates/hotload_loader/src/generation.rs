//! The loader's generation marker.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// An opaque token identifying one state of the loader.
///
/// Every visible change (a unit defined or removed, a reload) moves the
/// loader to a new generation that has never been observed before. Holders
/// of derived lookups compare generations and recompute on mismatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic source of [`Generation`]s.
#[derive(Debug, Default)]
pub(crate) struct GenerationCounter(AtomicU64);

impl GenerationCounter {
    pub(crate) fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn bump(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }
}
