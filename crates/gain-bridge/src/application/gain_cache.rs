//! Most recently observed gains for each control loop.
//!
//! # Locking
//!
//! Each loop has its own `tokio::sync::RwLock`.  A position broadcast never
//! waits on an attitude broadcast, and a reader always sees a whole
//! [`GainVector`] (never half of an old one and half of a new one) because
//! slots are only ever replaced wholesale.
//!
//! The cache is owned by an `Arc` handed to the relay workers (writers) and
//! to the UI service (reader).  There is no global instance.

use gain_core::{AxisGroup, GainVector};
use tokio::sync::RwLock;

use crate::domain::messages::GainsSnapshot;

/// Cached gains for both loops, zero-initialised.
#[derive(Debug, Default)]
pub struct GainCache {
    position: RwLock<GainVector>,
    attitude: RwLock<GainVector>,
}

impl GainCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, group: AxisGroup) -> &RwLock<GainVector> {
        match group {
            AxisGroup::Position => &self.position,
            AxisGroup::Attitude => &self.attitude,
        }
    }

    /// Returns a copy of the cached gains for `group`.
    pub async fn get(&self, group: AxisGroup) -> GainVector {
        *self.slot(group).read().await
    }

    /// Replaces the cached gains for `group` and returns the previous value.
    pub async fn replace(&self, group: AxisGroup, gains: GainVector) -> GainVector {
        let mut slot = self.slot(group).write().await;
        std::mem::replace(&mut *slot, gains)
    }

    /// Copies both slots.
    ///
    /// The two slots are read one after the other, so a broadcast landing in
    /// between may be reflected in one and not the other.  Each slot on its
    /// own is always consistent.
    pub async fn snapshot(&self) -> GainsSnapshot {
        GainsSnapshot {
            pos: self.get(AxisGroup::Position).await,
            att: self.get(AxisGroup::Attitude).await,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
