//! Sequential marker source

use async_trait::async_trait;
use devnet_core::{Marker, MarkerSource};
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out markers 1, 2, 3, ... after a starting point
#[derive(Debug, Default)]
pub struct SequenceClock {
    last: AtomicU64,
}

impl SequenceClock {
    /// Clock whose first marker is 1
    pub fn new() -> Self {
        Self::starting_after(Marker::GENESIS)
    }

    /// Clock whose first marker follows `marker`
    pub fn starting_after(marker: Marker) -> Self {
        Self {
            last: AtomicU64::new(marker.value()),
        }
    }

    /// Most recently issued marker
    pub fn last(&self) -> Marker {
        Marker::new(self.last.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl MarkerSource for SequenceClock {
    async fn next_marker(&self) -> Marker {
        Marker::new(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
