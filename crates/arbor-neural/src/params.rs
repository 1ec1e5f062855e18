// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameter schemas for dendrites, neurons and groups
//!
//! All schemas are plain data and serde-enabled so hosts can keep their
//! wiring configuration in JSON or TOML. Values given in the field docs are
//! working defaults, see [`crate::config`] for a canonical set.

use std::collections::BTreeSet;

use arbor_math::SigmoidShape;
use arbor_sim::PartialId;
use serde::{Deserialize, Serialize};

/// The modelled dendrite types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DendriteKind {
    /// Contextual input; gates the proximal response multiplicatively.
    Apical,
    /// Driving input.
    Proximal,
}

pub(crate) const DENDRITE_KIND_COUNT: usize = 2;

impl DendriteKind {
    pub(crate) fn index(self) -> usize {
        match self {
            DendriteKind::Apical => 0,
            DendriteKind::Proximal => 1,
        }
    }
}

/// Construction parameters of a single dendritic branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DendriteParams {
    pub kind: DendriteKind,
    /// Number of synapses at construction, one per input dimension.
    pub input_size: usize,
    /// Output ids of the buffers this branch listens to, ascending.
    pub input_ids: BTreeSet<PartialId>,
    /// Permanence above which a synapse participates in the response (~0.3).
    pub permanence_threshold: f32,
    /// Depth of the dendritic segment tree (~2-3).
    pub max_branch_level: u8,
    pub rnd_seed: u64,
    /// Adaptation step of the winning leaf (~0.01).
    pub primary_learning_rate: f32,
    /// Adaptation step of all other leaves (~0.0001).
    pub secondary_learning_rate: f32,
    /// IIR coefficient of the mismatch estimate (~0.001).
    pub mismatch_smoothing: f32,
    /// Adaptation effort a synapse must accumulate before it may branch (~2.0).
    pub accumulated_theta_thres: f32,
    /// Scale of the mismatch spread in the branching threshold (~1.0).
    pub min_mismatch_deviation: f32,
    /// Fraction of the input size that must be ambiguous before any branching
    /// happens (~0.002).
    pub min_mismatch_percentage: f32,
    /// Relative segment activity above which mismatch evidence is collected
    /// (~0.8).
    pub mismatch_act_thres: f32,
}

/// Activity window in which a neuron learns: the bump
/// `min(sigmoid(x, rise), 1 - sigmoid(x, fall))` suppresses adaptation at
/// both extremes of the activity range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearningWindow {
    pub rise: SigmoidShape,
    pub fall: SigmoidShape,
}

/// Construction parameters of a neuron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronParams {
    pub dendrite_params: Vec<DendriteParams>,
    /// Inputs between two structural-growth reviews (~5000).
    pub branch_interval: usize,
    pub activity_learning_window: LearningWindow,
    pub rnd_seed: u64,
}

/// Construction parameters of a neuron group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupParams {
    /// Output id of the group, unique across the environment.
    pub id: PartialId,
    pub random_seed: u64,
    pub neuron_params: Vec<NeuronParams>,
    /// Competition sharpness within the group (~5-10).
    pub local_inhibition_strength: f32,
    /// Scale of the population-wide secondary update (~1e-4 to 1e-2).
    pub common_learning_rate: f32,
    /// Filter reducing adaptation of already strongly tuned neurons.
    pub weight_filter: SigmoidShape,
    /// Lower bound of the stochastic winner threshold, relative to the
    /// maximum activity (~0.8).
    pub stochastic_win_thres: f32,
}
