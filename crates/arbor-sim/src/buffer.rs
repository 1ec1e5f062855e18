// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Double-buffered vector port with per-swap statistics
//!
//! An [`IoBuffer`] holds two equally sized float vectors. One half is the
//! write side of the current step, the other half is the read side carrying
//! the previous step's output together with a statistics record computed once
//! per swap. Port capabilities hand out access to exactly one of the two
//! roles, so a single writer and any number of readers can operate on the
//! same buffer within a step without observing each other.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arbor_math::normalized_shannon_entropy;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Statistics over the read side of a buffer, refreshed on every swap.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferStats {
    pub sum: f32,
    pub avg: f32,
    pub min: f32,
    pub max: f32,
    /// Normalized Shannon entropy, a proxy for the noise level of the signal.
    pub nse: f32,
}

/// A double-buffered float vector with one writer and many readers.
#[derive(Debug)]
pub struct IoBuffer {
    halves: [RwLock<Vec<f32>>; 2],
    stats: RwLock<BufferStats>,
    write_idx: AtomicUsize,
}

impl IoBuffer {
    /// Create a buffer of fixed `size`; both halves start zeroed, statistics
    /// start at zero.
    pub fn new(size: usize) -> Self {
        Self {
            halves: [RwLock::new(vec![0.0; size]), RwLock::new(vec![0.0; size])],
            stats: RwLock::new(BufferStats::default()),
            write_idx: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.halves[0].read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_idx(&self) -> usize {
        self.write_idx.load(Ordering::Acquire) ^ 1
    }

    /// Current read side.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.halves[self.read_idx()].read()
    }

    /// Current write side.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.halves[self.write_idx.load(Ordering::Acquire)].write()
    }

    /// Statistics of the current read side.
    pub fn stats(&self) -> BufferStats {
        *self.stats.read()
    }

    /// Flip the read/write roles and recompute the read-side statistics.
    ///
    /// Must only be called by the driving environment while no entity is
    /// processing.
    pub fn swap(&self) {
        let new_write = self.read_idx();
        self.write_idx.store(new_write, Ordering::Release);
        self.update_stats();
    }

    fn update_stats(&self) {
        let read_buf = self.read();
        let (sum, min, max) = read_buf
            .iter()
            .fold((0.0f32, f32::MAX, 0.0f32), |(sum, min, max), &val| {
                (sum + val, min.min(val), max.max(val))
            });
        let stats = BufferStats {
            sum,
            avg: sum / read_buf.len() as f32,
            min,
            max,
            nse: normalized_shannon_entropy(&read_buf),
        };
        *self.stats.write() = stats;
    }

    /// Read capability for this buffer. Any number may coexist.
    pub fn input_port(self: &Arc<Self>) -> InputPort {
        InputPort {
            buffer: Arc::clone(self),
        }
    }

    /// Write capability for this buffer.
    ///
    /// At most one entity may hold the write capability of a buffer; the
    /// environment enforces this by handing it out exactly once per wiring.
    pub fn output_port(self: &Arc<Self>) -> OutputPort {
        OutputPort {
            buffer: Arc::clone(self),
        }
    }
}

/// Capability to read a buffer's read side and its statistics.
#[derive(Debug, Clone)]
pub struct InputPort {
    buffer: Arc<IoBuffer>,
}

impl InputPort {
    /// The read slice of the previous step together with its statistics.
    pub fn fetch(&self) -> (RwLockReadGuard<'_, Vec<f32>>, BufferStats) {
        (self.buffer.read(), self.buffer.stats())
    }

    /// Statistics only, without touching the data.
    pub fn stats(&self) -> BufferStats {
        self.buffer.stats()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Capability to write a buffer's write side.
#[derive(Debug)]
pub struct OutputPort {
    buffer: Arc<IoBuffer>,
}

impl OutputPort {
    /// The write slice of the current step.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.buffer.write()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
