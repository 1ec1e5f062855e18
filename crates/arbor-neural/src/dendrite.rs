// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The dendritic branch model
//!
//! A branch owns one synapse per input dimension, distributed over a complete
//! binary tree of dendritic segments. Responses are computed in a single
//! sweep through the synapse store: each synapse adds its input to the
//! activity of its segment, activities are pushed from the root to the
//! leaves, and the strongest leaf path is the branch response.
//!
//! Permanences follow the Numenta notion of synapse permanence: a synapse
//! participates if its permanence exceeds a threshold, and the raw input
//! value is taken in as is. A strongly wired synapse that sees no matching
//! input leaks, reducing its segment's activity. Whether an input counts as
//! "low" is decided stochastically per synapse.
//!
//! Synapses whose permanence keeps disagreeing with the input they observe
//! while their segment is strongly active are considered ambiguous and are
//! eventually cloned onto the two child segments, deepening the tree along
//! the relevant path.

use std::collections::BTreeMap;

use arbor_math::{sigmoid, SigmoidShape};
use arbor_sim::{InputPort, PartialId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use tracing::debug;

use crate::params::DendriteParams;
use crate::synapses::{SegmentId, SynapseStore};

/// Shape of the entropy-driven attenuation of the branch response.
const ATTENUATION_SHAPE: SigmoidShape = SigmoidShape {
    steepness: 0.25,
    transition_point: 0.5,
};

/// One dendritic branch.
pub struct Dendrite {
    params: DendriteParams,
    max_segment_idx: SegmentId,

    synapses: SynapseStore,
    segment_activity: Vec<f32>,
    segment_weights: Vec<f32>,

    primary_learning_rate: f32,
    secondary_learning_rate: f32,
    mismatch_smoothing: f32,
    accumulated_theta_thres: f32,
    min_mismatch_deviation: f32,
    min_mismatch_percentage: f32,
    mismatch_act_thres: f32,
    last_max_inp: f32,

    // Keyed ascending so the sweep order over partial inputs is well-defined.
    inputs: BTreeMap<PartialId, InputPort>,
    rng: StdRng,
}

impl Dendrite {
    /// All synapses start on the root segment with permanences drawn from a
    /// Poisson distribution around the permanence threshold (drawn on a
    /// `[0, 100]` integer scale and mapped back to `[0, 1]`).
    pub fn new(params: DendriteParams) -> Self {
        let max_segment_idx = max_segment_index(params.max_branch_level);
        let mut rng = StdRng::seed_from_u64(params.rnd_seed);

        let mut synapses = SynapseStore::with_capacity(params.input_size * 2);
        synapses.resize(params.input_size);
        let poisson = Poisson::new(f64::from(100.0 * params.permanence_threshold)).ok();
        for i in 0..params.input_size {
            synapses.permanence[i] = match &poisson {
                Some(dist) => (dist.sample(&mut rng) as f32 / 100.0).clamp(0.0, 1.0),
                None => 0.0,
            };
            synapses.segment_idx[i] = 1;
            synapses.input_inc[i] = 1;
        }

        // The binary segment tree lives in flat arrays; index 0 is unused.
        let segment_activity = vec![0.0; max_segment_idx as usize + 1];
        let segment_weights = vec![0.0; max_segment_idx as usize + 1];

        Self {
            primary_learning_rate: params.primary_learning_rate,
            secondary_learning_rate: params.secondary_learning_rate,
            mismatch_smoothing: params.mismatch_smoothing,
            accumulated_theta_thres: params.accumulated_theta_thres,
            min_mismatch_deviation: params.min_mismatch_deviation,
            min_mismatch_percentage: params.min_mismatch_percentage,
            mismatch_act_thres: params.mismatch_act_thres,
            last_max_inp: 0.0,
            inputs: BTreeMap::new(),
            rng,
            params,
            max_segment_idx,
            synapses,
            segment_activity,
            segment_weights,
        }
    }

    pub fn params(&self) -> &DendriteParams {
        &self.params
    }

    pub fn kind(&self) -> crate::params::DendriteKind {
        self.params.kind
    }

    /// Store the read capability if this branch declared interest in `id`.
    pub fn set_input_port(&mut self, id: PartialId, port: InputPort) {
        if self.params.input_ids.contains(&id) {
            self.inputs.insert(id, port);
        }
    }

    /// Response of the branch to the current input: the maximum activity over
    /// all root-to-leaf paths, attenuated by the input noise level and
    /// normalized by the input sum.
    pub fn response(&mut self) -> f32 {
        let Self {
            params,
            max_segment_idx,
            synapses,
            segment_activity,
            inputs,
            rng,
            last_max_inp,
            ..
        } = self;

        segment_activity.fill(0.0);

        // Input-wide sum and max. The sum normalizes the response at the end
        // but is gathered up front to allow an early exit on zero or
        // malformed input; the max feeds the following adaptation pass.
        let mut inp_sum = 0.0f32;
        *last_max_inp = 0.0;
        for port in inputs.values() {
            let stats = port.stats();
            inp_sum += stats.sum;
            *last_max_inp = last_max_inp.max(stats.max);
        }
        if !inp_sum.is_normal() {
            return 0.0;
        }

        let syn_cnt = synapses.len();
        let mut ports = inputs.values();
        let Some(first) = ports.next() else {
            return 0.0;
        };
        let (mut cur_buf, mut cur_stats) = first.fetch();
        let mut pos = 0usize;
        let mut nse = cur_stats.nse;
        let mut leak_limit = cur_stats.max / 2.0;

        for i in 0..syn_cnt {
            // When the current partial input is exhausted the sweep moves on
            // to the next port; statistics, the entropy running-min and the
            // leakage distribution follow.
            if pos == cur_buf.len() {
                let Some(port) = ports.next() else { break };
                let (buf, stats) = port.fetch();
                cur_buf = buf;
                cur_stats = stats;
                pos = 0;
                nse = nse.min(cur_stats.nse);
                leak_limit = cur_stats.max / 2.0;
            }
            let x = cur_buf[pos];

            if synapses.permanence[i] > params.permanence_threshold {
                let seg = synapses.segment_idx[i] as usize;
                segment_activity[seg] += x;

                // Leakage: a wired synapse without matching input carries a
                // cost. "Low" is decided by a uniform draw per synapse.
                let draw = if leak_limit > 0.0 {
                    rng.gen_range(0.0..leak_limit)
                } else {
                    0.0
                };
                if draw > x {
                    let inp_contrib = x / cur_stats.sum;
                    let perm_strength = (synapses.permanence[i] - params.permanence_threshold)
                        / (1.0 - params.permanence_threshold);
                    segment_activity[seg] -= perm_strength * (1.0 - inp_contrib);
                    if segment_activity[seg] < 0.0 {
                        segment_activity[seg] = 0.0;
                    }
                }
            }

            // Only the last synapse of an input-dimension run advances the
            // shared cursor.
            pos += synapses.input_inc[i] as usize;
        }

        // Push activities from the root towards the leaves.
        let leaf_begin = (*max_segment_idx as usize + 1) / 2;
        for si in 1..leaf_begin {
            segment_activity[si * 2] += segment_activity[si];
            segment_activity[si * 2 + 1] += segment_activity[si];
        }

        // Attenuate noise-dominated input and normalize by the input sum.
        // The adaptation pass reads segment_activity afterwards, so the
        // scaling is applied to every leaf, not just the maximum.
        let attenuation = 1.0 - sigmoid((nse - 0.8) / 0.2, ATTENUATION_SHAPE);
        let mut max_activity = 0.0f32;
        for si in leaf_begin..=*max_segment_idx as usize {
            segment_activity[si] = (segment_activity[si] * attenuation / inp_sum).clamp(0.0, 1.0);
            max_activity = max_activity.max(segment_activity[si]);
        }
        max_activity
    }

    /// Adapt the synapses to the current input.
    ///
    /// `max_activity` is the maximum response among all branches of the same
    /// kind on the owning neuron; the leaf that carries it (if it is present
    /// on this branch) learns at the primary rate, every other leaf at the
    /// secondary rate scaled by its relative activity. `weight` scales the
    /// whole update.
    pub fn adapt_synapses(&mut self, max_activity: f32, weight: f32) {
        if !max_activity.is_normal() {
            return;
        }

        let Self {
            params,
            max_segment_idx,
            synapses,
            segment_activity,
            segment_weights,
            inputs,
            primary_learning_rate,
            secondary_learning_rate,
            mismatch_smoothing,
            mismatch_act_thres,
            last_max_inp,
            ..
        } = self;

        // Leaf weights: the first leaf at the maximum response gets the
        // primary rate, the rest scale with their share of the maximum.
        segment_weights.fill(0.0);
        let mut max_response_seen = false;
        let leaf_begin = (*max_segment_idx as usize + 1) / 2;
        for si in leaf_begin..=*max_segment_idx as usize {
            if !max_response_seen && segment_activity[si] + f32::EPSILON >= max_activity {
                max_response_seen = true;
                segment_weights[si] = weight * *primary_learning_rate;
            } else {
                segment_weights[si] =
                    segment_activity[si] * weight * *secondary_learning_rate / max_activity;
            }
        }

        // Bubble weights and activities towards the root, each node taking
        // the maximum of its two children.
        let mut level_start = leaf_begin;
        while level_start > 1 {
            let mut si = level_start;
            while si < level_start * 2 {
                segment_weights[si / 2] = segment_weights[si].max(segment_weights[si + 1]);
                segment_activity[si / 2] = segment_activity[si].max(segment_activity[si + 1]);
                si += 2;
            }
            level_start /= 2;
        }

        let syn_cnt = synapses.len();
        let mut ports = inputs.values();
        let Some(first) = ports.next() else { return };
        let (mut cur_buf, mut cur_stats) = first.fetch();
        let mut pos = 0usize;
        let mut attenuation = 1.0 - sigmoid((cur_stats.nse - 0.8) / 0.2, SigmoidShape::default());

        for i in 0..syn_cnt {
            if pos == cur_buf.len() {
                let Some(port) = ports.next() else { break };
                let (buf, stats) = port.fetch();
                cur_buf = buf;
                cur_stats = stats;
                pos = 0;
                attenuation = 1.0 - sigmoid((cur_stats.nse - 0.8) / 0.2, SigmoidShape::default());
            }
            let x = cur_buf[pos];
            let seg = synapses.segment_idx[i] as usize;

            // Learn strongly when the input sits near either end of its
            // range and the partial input is not noise.
            let high_thres = cur_stats.avg / 2.0 + f32::EPSILON;
            let deviation = if x > high_thres {
                (x - high_thres) / (1.0 - high_thres)
            } else {
                (high_thres - x) / high_thres
            };
            let theta = (segment_weights[seg] * deviation * attenuation).clamp(0.0, 1.0);

            synapses.permanence[i] = (synapses.permanence[i] * (1.0 - theta)
                + if x > high_thres { theta } else { 0.0 })
            .clamp(0.0, 1.0);
            synapses.adapt_history[i] += theta;

            // Mismatch bookkeeping for the branching decision, an IIR filter
            // emphasizing recent evidence. Only collected while the segment
            // itself responds strongly.
            let act_ratio = segment_activity[seg] / max_activity;
            if act_ratio >= *mismatch_act_thres {
                let inp_ratio = x / *last_max_inp;
                let mut mismatch = if synapses.permanence[i] > params.permanence_threshold {
                    1.0 - inp_ratio
                } else {
                    inp_ratio
                };
                mismatch *= act_ratio;
                synapses.mismatch[i] =
                    synapses.mismatch[i] * (1.0 - *mismatch_smoothing) + mismatch * *mismatch_smoothing;
            }

            pos += synapses.input_inc[i] as usize;
        }
    }

    /// Structural growth: clone every ambiguous synapse onto the two child
    /// segments of its current segment.
    ///
    /// A synapse is ambiguous once it has accumulated enough adaptation
    /// effort, its mismatch stands out against the branch-wide mismatch
    /// distribution, and it is not yet on a leaf segment. Nothing happens
    /// unless a minimum fraction of the input size qualifies.
    pub fn adapt_branches(&mut self) {
        let syn_cnt = self.synapses.len();
        if syn_cnt == 0 {
            return;
        }

        let syn_cnt_f = syn_cnt as f32;
        let mm_avg = self.synapses.mismatch.iter().sum::<f32>() / syn_cnt_f;
        // Kept as the mean squared deviation and scaled like a deviation; the
        // 1/N floor guards against degenerate distributions.
        let mm_std = self
            .synapses
            .mismatch
            .iter()
            .map(|&mm| (mm_avg - mm).powi(2))
            .sum::<f32>()
            / syn_cnt_f;
        let mm_thres =
            mm_avg + mm_std * self.min_mismatch_deviation + 1.0 / self.params.input_size as f32;

        let theta_thres = self.accumulated_theta_thres;
        let max_seg = self.max_segment_idx as u32;
        let is_ambiguous = |synapses: &SynapseStore, i: usize| {
            synapses.adapt_history[i] >= theta_thres
                && synapses.mismatch[i] >= mm_thres
                && (synapses.segment_idx[i] as u32) * 2 + 1 <= max_seg
        };

        let grow_cnt = (0..syn_cnt)
            .filter(|&i| is_ambiguous(&self.synapses, i))
            .count();
        if (grow_cnt as f32) < self.params.input_size as f32 * self.min_mismatch_percentage {
            return;
        }

        // Grow the store and fill from the back, copying settled synapses and
        // splitting ambiguous ones in place. The count above keeps this to a
        // single resize of the whole SoA.
        self.synapses.resize(syn_cnt + grow_cnt);
        let mut src = syn_cnt as isize - 1;
        let mut dst = (syn_cnt + grow_cnt) as isize - 1;
        while dst > src {
            self.synapses.copy(src as usize, dst as usize);
            dst -= 1;
            if !is_ambiguous(&self.synapses, src as usize) {
                src -= 1;
                continue;
            }

            // Clone: the pair descends to the child segments, learning
            // history and mismatch start over, permanences get wiggled so the
            // two copies can diverge.
            let lower = dst as usize;
            self.synapses.copy(src as usize, lower);
            let old_segment = self.synapses.segment_idx[lower];
            self.synapses.segment_idx[lower] = old_segment * 2;
            self.synapses.segment_idx[lower + 1] = old_segment * 2 + 1;
            self.synapses.adapt_history[lower] = 0.0;
            self.synapses.adapt_history[lower + 1] = 0.0;
            self.synapses.mismatch[lower] = 0.0;
            self.synapses.mismatch[lower + 1] = 0.0;
            let old_perm = self.synapses.permanence[lower];
            self.synapses.permanence[lower] =
                (old_perm + self.rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
            self.synapses.permanence[lower + 1] =
                (old_perm + self.rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
            // Only the last synapse of the (now larger) input run may advance
            // the shared cursor.
            self.synapses.input_inc[lower] = 0;

            dst -= 1;
            src -= 1;
        }

        debug!(
            grown = grow_cnt,
            synapse_count = self.synapses.len(),
            "dendritic branch grown"
        );
    }

    /// One-hot mask over the segment tree marking the live leaves: segments
    /// carrying synapses whose path is not continued by a deeper segment.
    pub fn leaf_mask(&self) -> Vec<u8> {
        let mut mask = vec![0u8; self.max_segment_idx as usize + 1];
        for &seg in &self.synapses.segment_idx {
            mask[seg as usize] = 1;
        }

        // Clear the ancestors of every occupied segment, bottom level first.
        let mut level = (self.max_segment_idx as usize + 1) / 2;
        while level > 1 {
            for si in level..level * 2 {
                if mask[si] == 1 {
                    let mut lower = si;
                    while lower > 0 {
                        lower /= 2;
                        mask[lower] = 0;
                    }
                }
            }
            level /= 2;
        }
        mask
    }

    /// Number of live leaves, i.e. distinct representations on this branch.
    pub fn representation_count(&self) -> SegmentId {
        self.leaf_mask().iter().filter(|&&m| m == 1).count() as SegmentId
    }

    /// Permanences of all synapses on the root-to-leaf path of the `idx`-th
    /// live leaf in tree order.
    pub fn representation(&self, idx: SegmentId) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.params.input_size);
        let mut mask = self.leaf_mask();

        // Locate the requested leaf.
        let mut remaining = idx as usize + 1;
        let mut leaf = 0usize;
        for (si, &m) in mask.iter().enumerate() {
            remaining -= m as usize;
            if remaining == 0 {
                leaf = si;
                break;
            }
        }

        // Re-mark only the root-to-leaf path.
        mask.fill(0);
        mask[leaf] = 1;
        let mut si = leaf;
        while si > 1 {
            si /= 2;
            mask[si] = 1;
        }

        for i in 0..self.synapses.len() {
            if mask[self.synapses.segment_idx[i] as usize] == 1 {
                result.push(self.synapses.permanence[i]);
            }
        }
        result
    }

    pub fn representation_size(&self) -> usize {
        self.params.input_size
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    pub fn synapses(&self) -> &SynapseStore {
        &self.synapses
    }

    #[cfg(test)]
    pub(crate) fn synapses_mut(&mut self) -> &mut SynapseStore {
        &mut self.synapses
    }

    pub fn max_segment_idx(&self) -> SegmentId {
        self.max_segment_idx
    }

    pub fn input_size(&self) -> usize {
        self.params.input_size
    }

    // Runtime parameterization.

    pub fn set_primary_learning_rate(&mut self, rate: f32) {
        self.primary_learning_rate = rate;
    }

    pub fn set_secondary_learning_rate(&mut self, rate: f32) {
        self.secondary_learning_rate = rate;
    }

    pub fn set_mismatch_smoothing(&mut self, weight: f32) {
        self.mismatch_smoothing = weight;
    }

    pub fn set_accumulated_theta_thres(&mut self, thres: f32) {
        self.accumulated_theta_thres = thres;
    }

    pub fn set_min_mismatch_deviation(&mut self, factor: f32) {
        self.min_mismatch_deviation = factor;
    }

    pub fn set_min_mismatch_percentage(&mut self, percentage: f32) {
        self.min_mismatch_percentage = percentage;
    }

    pub fn primary_learning_rate(&self) -> f32 {
        self.primary_learning_rate
    }

    pub fn secondary_learning_rate(&self) -> f32 {
        self.secondary_learning_rate
    }

    pub fn mismatch_smoothing(&self) -> f32 {
        self.mismatch_smoothing
    }

    pub fn accumulated_theta_thres(&self) -> f32 {
        self.accumulated_theta_thres
    }

    pub fn min_mismatch_deviation(&self) -> f32 {
        self.min_mismatch_deviation
    }

    pub fn min_mismatch_percentage(&self) -> f32 {
        self.min_mismatch_percentage
    }
}

/// Highest segment index of a complete binary tree with the given depth.
const fn max_segment_index(max_branch_level: u8) -> SegmentId {
    (1 << (max_branch_level as u16 + 1)) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DendriteKind;
    use arbor_sim::IoBuffer;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn branch_params(
        input_size: usize,
        input_ids: &[PartialId],
        max_branch_level: u8,
    ) -> DendriteParams {
        DendriteParams {
            kind: DendriteKind::Proximal,
            input_size,
            input_ids: BTreeSet::from_iter(input_ids.iter().copied()),
            permanence_threshold: 0.3,
            max_branch_level,
            rnd_seed: 42,
            primary_learning_rate: 0.01,
            secondary_learning_rate: 0.0001,
            mismatch_smoothing: 0.001,
            accumulated_theta_thres: 2.0,
            min_mismatch_deviation: 1.0,
            min_mismatch_percentage: 0.002,
            mismatch_act_thres: 0.8,
        }
    }

    fn publish(buffer: &Arc<IoBuffer>, values: &[f32]) {
        buffer.write().copy_from_slice(values);
        buffer.swap();
    }

    fn wire(dendrite: &mut Dendrite, id: PartialId, size: usize) -> Arc<IoBuffer> {
        let buffer = Arc::new(IoBuffer::new(size));
        dendrite.set_input_port(id, buffer.input_port());
        buffer
    }

    #[test]
    fn test_new_branch_starts_on_root_segment() {
        let dendrite = Dendrite::new(branch_params(16, &[0], 2));
        assert_eq!(dendrite.synapse_count(), 16);
        assert_eq!(dendrite.max_segment_idx(), 7);
        assert!(dendrite.synapses().segment_idx.iter().all(|&s| s == 1));
        assert!(dendrite.synapses().input_inc.iter().all(|&i| i == 1));
        assert!(dendrite
            .synapses()
            .permanence
            .iter()
            .all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_undeclared_input_ids_are_ignored() {
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 0));
        let buffer = Arc::new(IoBuffer::new(4));
        dendrite.set_input_port(5, buffer.input_port());
        publish(&buffer, &[1.0, 1.0, 1.0, 1.0]);
        // Nothing wired, so the input sum degenerates and the response is 0.
        assert_eq!(dendrite.response(), 0.0);
    }

    #[test]
    fn test_response_of_saturated_input() {
        // Four wired synapses on a single segment, uniform input. The raw
        // path activity equals the input sum, so the response reduces to the
        // entropy attenuation factor.
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 0));
        dendrite.synapses.permanence.fill(0.9);
        let buffer = wire(&mut dendrite, 0, 4);
        publish(&buffer, &[1.0, 1.0, 1.0, 1.0]);

        let nse = buffer.stats().nse;
        let expected = 1.0 - sigmoid((nse - 0.8) / 0.2, ATTENUATION_SHAPE);
        let response = dendrite.response();
        assert!(
            (response - expected).abs() < 1e-5,
            "response {response} vs expected {expected}"
        );
    }

    #[test]
    fn test_zero_input_yields_zero_response() {
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 0));
        dendrite.synapses.permanence.fill(0.9);
        let buffer = wire(&mut dendrite, 0, 4);
        publish(&buffer, &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(dendrite.response(), 0.0);
    }

    #[test]
    fn test_adaptation_moves_permanences_towards_input() {
        // Two partial inputs of two dimensions each; active dimensions must
        // strengthen, silent dimensions must weaken.
        let mut dendrite = Dendrite::new(branch_params(4, &[0, 1], 1));
        dendrite.synapses.permanence.fill(0.5);
        let buffer_a = wire(&mut dendrite, 0, 2);
        let buffer_b = wire(&mut dendrite, 1, 2);
        publish(&buffer_a, &[1.0, 0.0]);
        publish(&buffer_b, &[0.0, 1.0]);

        let max_activity = dendrite.response();
        assert!(max_activity.is_normal());
        dendrite.adapt_synapses(max_activity, 1.0);

        let perms = &dendrite.synapses().permanence;
        assert!(perms[0] > 0.5, "active input must strengthen: {}", perms[0]);
        assert!(perms[3] > 0.5, "active input must strengthen: {}", perms[3]);
        assert!(perms[1] < 0.5, "silent input must weaken: {}", perms[1]);
        assert!(perms[2] < 0.5, "silent input must weaken: {}", perms[2]);
        assert!(dendrite
            .synapses()
            .adapt_history
            .iter()
            .all(|&h| h > 0.0));
    }

    #[test]
    fn test_degenerate_max_activity_skips_adaptation() {
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 1));
        dendrite.synapses.permanence.fill(0.5);
        let buffer = wire(&mut dendrite, 0, 4);
        publish(&buffer, &[1.0, 0.0, 0.0, 1.0]);
        dendrite.response();

        let before = dendrite.synapses().permanence.clone();
        dendrite.adapt_synapses(0.0, 1.0);
        dendrite.adapt_synapses(f32::NAN, 1.0);
        assert_eq!(dendrite.synapses().permanence, before);
    }

    #[test]
    fn test_branching_splits_ambiguous_synapse() {
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 1));
        dendrite.synapses.adapt_history[1] = 10.0;
        dendrite.synapses.mismatch[1] = 1.0;

        dendrite.adapt_branches();

        let synapses = dendrite.synapses();
        assert_eq!(synapses.len(), 5);
        assert_eq!(synapses.segment_idx, vec![1, 2, 3, 1, 1]);
        assert_eq!(synapses.input_inc, vec![1, 0, 1, 1, 1]);
        // The clone pair starts over.
        assert_eq!(synapses.adapt_history[1], 0.0);
        assert_eq!(synapses.adapt_history[2], 0.0);
        assert_eq!(synapses.mismatch[1], 0.0);
        assert_eq!(synapses.mismatch[2], 0.0);
        assert!(synapses.permanence.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_branching_preserves_input_runs() {
        let mut dendrite = Dendrite::new(branch_params(8, &[0], 2));
        let inc_sum: u32 = dendrite.synapses().input_inc.iter().map(|&i| u32::from(i)).sum();
        for i in 0..4 {
            dendrite.synapses.adapt_history[i] = 10.0;
            dendrite.synapses.mismatch[i] = 1.0;
        }

        dendrite.adapt_branches();

        let synapses = dendrite.synapses();
        assert_eq!(synapses.len(), 12);
        // One cursor advance per input dimension, before and after growth.
        let grown_inc_sum: u32 = synapses.input_inc.iter().map(|&i| u32::from(i)).sum();
        assert_eq!(grown_inc_sum, inc_sum);
        assert!(synapses
            .segment_idx
            .iter()
            .all(|&s| s >= 1 && s <= dendrite.max_segment_idx()));
    }

    #[test]
    fn test_full_mismatch_percentage_blocks_branching() {
        // With a required fraction of 1.0 the spread-based threshold always
        // excludes enough synapses, so the store never grows.
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 1));
        dendrite.set_min_mismatch_percentage(1.0);

        dendrite.synapses.adapt_history.fill(10.0);
        dendrite.synapses.mismatch.fill(1.0);
        dendrite.adapt_branches();
        assert_eq!(dendrite.synapse_count(), 4);

        dendrite.synapses.mismatch.copy_from_slice(&[1.0, 1.0, 0.0, 0.0]);
        dendrite.adapt_branches();
        assert_eq!(dendrite.synapse_count(), 4);
    }

    #[test]
    fn test_leaf_mask_and_representations() {
        let mut dendrite = Dendrite::new(branch_params(4, &[0], 1));
        // Everything on the root: a single representation.
        assert_eq!(dendrite.leaf_mask(), vec![0, 1, 0, 0]);
        assert_eq!(dendrite.representation_count(), 1);
        assert_eq!(dendrite.representation(0).len(), 4);

        // Splitting one synapse yields two leaves, each path carrying the
        // three root synapses plus one clone.
        dendrite.synapses.adapt_history[0] = 10.0;
        dendrite.synapses.mismatch[0] = 1.0;
        dendrite.adapt_branches();
        assert_eq!(dendrite.leaf_mask(), vec![0, 0, 1, 1]);
        assert_eq!(dendrite.representation_count(), 2);
        assert_eq!(dendrite.representation(0).len(), 4);
        assert_eq!(dendrite.representation(1).len(), 4);
    }

    #[test]
    fn test_learning_loop_keeps_invariants() {
        let mut dendrite = Dendrite::new(branch_params(6, &[0, 1], 2));
        let buffer_a = wire(&mut dendrite, 0, 4);
        let buffer_b = wire(&mut dendrite, 1, 2);

        let mut prev_len = dendrite.synapse_count();
        for step in 0..600 {
            let phase = step % 3;
            publish(
                &buffer_a,
                &[
                    if phase == 0 { 0.9 } else { 0.05 },
                    0.1,
                    if phase == 1 { 0.8 } else { 0.02 },
                    0.3,
                ],
            );
            publish(&buffer_b, &[0.6, if phase == 2 { 0.9 } else { 0.01 }]);

            let max_activity = dendrite.response();
            dendrite.adapt_synapses(max_activity, 1.0);
            if step % 50 == 0 {
                dendrite.adapt_branches();
            }

            let synapses = dendrite.synapses();
            let len = synapses.len();
            assert!(len >= prev_len, "the store never shrinks");
            prev_len = len;
            assert_eq!(synapses.permanence.len(), len);
            assert_eq!(synapses.mismatch.len(), len);
            assert_eq!(synapses.adapt_history.len(), len);
            assert_eq!(synapses.segment_idx.len(), len);
            assert_eq!(synapses.input_inc.len(), len);
            assert!(synapses.permanence.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert!(synapses.mismatch.iter().all(|&m| (0.0..=1.0).contains(&m)));
            assert!(synapses.adapt_history.iter().all(|&h| h >= 0.0));
            assert!(synapses
                .segment_idx
                .iter()
                .all(|&s| s >= 1 && s <= dendrite.max_segment_idx()));
            assert!(synapses.input_inc.iter().all(|&i| i <= 1));
            let inc_sum: usize = synapses.input_inc.iter().map(|&i| i as usize).sum();
            assert_eq!(inc_sum, 6, "one cursor advance per input dimension");
        }
    }
}
