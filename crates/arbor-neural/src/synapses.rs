// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Structure-of-arrays synapse store
//!
//! Five parallel arrays describe the synapses of one dendritic branch. The
//! store only ever grows and all lanes are resized and copied together, so
//! the equal-length invariant is kept local to this module.
//!
//! Synapses that listen to the same input dimension form a contiguous run in
//! which only the last entry advances the shared input cursor
//! (`input_inc = 1`). The runs appear in the order of the wired input ports.

/// Index of a dendritic segment in the complete binary tree; the root is 1,
/// children of `i` are `2i` and `2i + 1`. Index 0 is unused.
pub type SegmentId = u16;

/// The synapse state of one dendritic branch.
#[derive(Debug, Clone, Default)]
pub struct SynapseStore {
    /// How established the connection is, in `[0, 1]`.
    pub permanence: Vec<f32>,
    /// IIR estimate of how badly permanence and input agree, in `[0, 1]`.
    pub mismatch: Vec<f32>,
    /// Accumulated adaptation effort, unbounded.
    pub adapt_history: Vec<f32>,
    /// Dendritic segment this synapse sits on.
    pub segment_idx: Vec<SegmentId>,
    /// 1 if this synapse is the last of its input-dimension run.
    pub input_inc: Vec<u8>,
}

impl SynapseStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            permanence: Vec::with_capacity(capacity),
            mismatch: Vec::with_capacity(capacity),
            adapt_history: Vec::with_capacity(capacity),
            segment_idx: Vec::with_capacity(capacity),
            input_inc: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.permanence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permanence.is_empty()
    }

    /// Grow or shrink all five lanes together; new entries are zeroed.
    pub fn resize(&mut self, len: usize) {
        self.permanence.resize(len, 0.0);
        self.mismatch.resize(len, 0.0);
        self.adapt_history.resize(len, 0.0);
        self.segment_idx.resize(len, 0);
        self.input_inc.resize(len, 0);
    }

    /// Copy one synapse over another across all five lanes.
    pub fn copy(&mut self, src: usize, dst: usize) {
        self.permanence[dst] = self.permanence[src];
        self.mismatch[dst] = self.mismatch[src];
        self.adapt_history[dst] = self.adapt_history[src];
        self.segment_idx[dst] = self.segment_idx[src];
        self.input_inc[dst] = self.input_inc[src];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_keeps_lanes_in_step() {
        let mut store = SynapseStore::with_capacity(8);
        store.resize(5);
        assert_eq!(store.len(), 5);
        assert_eq!(store.permanence.len(), 5);
        assert_eq!(store.mismatch.len(), 5);
        assert_eq!(store.adapt_history.len(), 5);
        assert_eq!(store.segment_idx.len(), 5);
        assert_eq!(store.input_inc.len(), 5);
    }

    #[test]
    fn test_copy_moves_every_lane() {
        let mut store = SynapseStore::default();
        store.resize(2);
        store.permanence[0] = 0.7;
        store.mismatch[0] = 0.2;
        store.adapt_history[0] = 3.0;
        store.segment_idx[0] = 5;
        store.input_inc[0] = 1;

        store.copy(0, 1);

        assert_eq!(store.permanence[1], 0.7);
        assert_eq!(store.mismatch[1], 0.2);
        assert_eq!(store.adapt_history[1], 3.0);
        assert_eq!(store.segment_idx[1], 5);
        assert_eq!(store.input_inc[1], 1);
    }
}
