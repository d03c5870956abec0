// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! # Call Counter
//!
//! The number of calls served by this process, owned by the serving process
//! as a single atomic integer. Increments from concurrent request handlers
//! never race and reads take a consistent snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CallCounter {
    calls: AtomicU64,
}

impl CallCounter {
    pub fn new() -> CallCounter {
        CallCounter::default()
    }

    /// Increments the counter and returns the new value.
    pub fn increment(&self) -> u64 {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}
