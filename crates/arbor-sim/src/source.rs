// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! External input entity feeding fixed patterns into the simulation
//!
//! A [`VectorSource`] rotates through a set of equally sized patterns,
//! holding each one for a configurable number of steps and overlaying a small
//! uniform noise floor. The noise keeps the entropy statistics of downstream
//! buffers meaningful even for sparse patterns.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::OutputPort;
use crate::entity::{Entity, PartialId};

/// Upper bound of the additive uniform noise floor.
const NOISE_LEVEL: f32 = 0.05;

/// An [`Entity`] producing a rotating sequence of fixed patterns.
pub struct VectorSource {
    id: PartialId,
    patterns: Vec<Vec<f32>>,
    output: Option<OutputPort>,
    cur_epoch: usize,
    cur_idx: usize,
    interval_count: usize,
    change_interval: usize,
    rng: StdRng,
}

impl VectorSource {
    /// Create a source cycling through `patterns`, advancing every
    /// `change_interval` steps. A zero interval blanks the output (noise
    /// only). All patterns must share one length.
    pub fn new(
        id: PartialId,
        patterns: Vec<Vec<f32>>,
        change_interval: usize,
        rnd_seed: u64,
    ) -> Self {
        assert!(!patterns.is_empty(), "vector source needs patterns");
        let len = patterns[0].len();
        assert!(
            patterns.iter().all(|p| p.len() == len),
            "vector source patterns must share one length"
        );
        Self {
            id,
            patterns,
            output: None,
            cur_epoch: 0,
            cur_idx: 0,
            interval_count: 0,
            change_interval,
            rng: StdRng::seed_from_u64(rnd_seed),
        }
    }

    pub fn epoch(&self) -> usize {
        self.cur_epoch
    }

    pub fn pattern_index(&self) -> usize {
        self.cur_idx
    }

    pub fn change_interval(&self) -> usize {
        self.change_interval
    }

    pub fn set_change_interval(&mut self, interval: usize) {
        self.change_interval = interval;
    }
}

impl Entity for VectorSource {
    fn output_id(&self) -> PartialId {
        self.id
    }

    fn output_len(&self) -> usize {
        self.patterns[0].len()
    }

    fn input_ids(&self) -> &[PartialId] {
        &[]
    }

    fn set_output_port(&mut self, port: OutputPort) {
        self.output = Some(port);
    }

    fn process(&mut self) {
        let port = self.output.as_ref().expect("output port not wired");
        let mut out = port.write();

        if self.change_interval > 0 {
            out.copy_from_slice(&self.patterns[self.cur_idx]);
        } else {
            out.fill(0.0);
        }
        for val in out.iter_mut() {
            *val = (*val + self.rng.gen_range(0.0..NOISE_LEVEL)).clamp(0.0, 1.0);
        }

        if self.change_interval > 0 {
            self.interval_count = (self.interval_count + 1) % self.change_interval;
            if self.interval_count == 0 {
                self.cur_idx = (self.cur_idx + 1) % self.patterns.len();
                if self.cur_idx == 0 {
                    self.cur_epoch += 1;
                }
            }
        }
    }

    fn status(&self) -> String {
        format!(
            "vector source | id: {} | epoch: {} | idx: {}",
            self.id, self.cur_epoch, self.cur_idx
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::IoBuffer;
    use std::sync::Arc;

    fn wired_source(patterns: Vec<Vec<f32>>, interval: usize) -> (VectorSource, Arc<IoBuffer>) {
        let mut source = VectorSource::new(3, patterns, interval, 99);
        let buffer = Arc::new(IoBuffer::new(source.output_len()));
        source.set_output_port(buffer.output_port());
        (source, buffer)
    }

    #[test]
    fn test_output_is_pattern_plus_bounded_noise() {
        let (mut source, buffer) = wired_source(vec![vec![0.0, 1.0, 0.5]], 10);
        source.process();
        buffer.swap();

        let read = buffer.read();
        assert!(read[0] >= 0.0 && read[0] < NOISE_LEVEL);
        assert!((read[1] - 1.0).abs() < 1e-6); // clamped at 1
        assert!(read[2] >= 0.5 && read[2] < 0.5 + NOISE_LEVEL);
    }

    #[test]
    fn test_patterns_rotate_after_change_interval() {
        let (mut source, _buffer) = wired_source(vec![vec![0.0; 2], vec![1.0; 2]], 3);
        for _ in 0..3 {
            assert_eq!(source.pattern_index(), 0);
            source.process();
        }
        assert_eq!(source.pattern_index(), 1);
        for _ in 0..3 {
            source.process();
        }
        assert_eq!(source.pattern_index(), 0);
        assert_eq!(source.epoch(), 1);
    }

    #[test]
    fn test_zero_interval_blanks_output() {
        let (mut source, buffer) = wired_source(vec![vec![1.0; 4]], 0);
        source.process();
        buffer.swap();
        assert!(buffer.read().iter().all(|&v| v < NOISE_LEVEL));
        assert_eq!(source.pattern_index(), 0);
    }
}
