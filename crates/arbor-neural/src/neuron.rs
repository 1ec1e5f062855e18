// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The neuron model
//!
//! A neuron holds a set of typed dendritic branches. The apical response
//! gates the proximal response multiplicatively; a neuron without apical
//! branches behaves as if fully gated open. Adaptation is weighted by a bump
//! filter over the neuron's own activity, so neurons that barely responded or
//! are already saturated learn little.

use arbor_math::sigmoid;
use arbor_sim::{InputPort, PartialId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dendrite::Dendrite;
use crate::params::{DendriteKind, LearningWindow, NeuronParams, DENDRITE_KIND_COUNT};
use crate::synapses::SegmentId;

pub struct Neuron {
    params: NeuronParams,

    /// Position within the owning group, assigned by the group.
    pub id: usize,

    dendrites: Vec<Dendrite>,
    neuron_activity: f32,
    kind_activity: [f32; DENDRITE_KIND_COUNT],
    input_count: usize,
    branch_interval: usize,
    activity_learning_window: LearningWindow,
    rng: StdRng,
}

impl Neuron {
    pub fn new(params: NeuronParams) -> Self {
        let dendrites = params
            .dendrite_params
            .iter()
            .cloned()
            .map(Dendrite::new)
            .collect();
        Self {
            id: 0,
            dendrites,
            neuron_activity: 0.0,
            kind_activity: [0.0; DENDRITE_KIND_COUNT],
            input_count: 0,
            branch_interval: params.branch_interval,
            activity_learning_window: params.activity_learning_window,
            rng: StdRng::seed_from_u64(params.rnd_seed),
            params,
        }
    }

    pub fn params(&self) -> &NeuronParams {
        &self.params
    }

    /// Hand an input capability down to every interested dendrite.
    pub fn set_input_port(&mut self, id: PartialId, port: &InputPort) {
        for dendrite in &mut self.dendrites {
            dendrite.set_input_port(id, port.clone());
        }
    }

    /// Response of the neuron to the current input.
    ///
    /// Keeps the maximum response per dendrite kind for the adaptation that
    /// follows; the returned activity is the apical-gated proximal maximum
    /// plus 1% to 5% of noise.
    pub fn response(&mut self) -> f32 {
        let apical = DendriteKind::Apical.index();
        let proximal = DendriteKind::Proximal.index();

        self.neuron_activity = 0.0;
        // -1 marks "no apical branch present".
        self.kind_activity[apical] = -1.0;
        self.kind_activity[proximal] = 0.0;

        for dendrite in &mut self.dendrites {
            let ki = dendrite.kind().index();
            let response = dendrite.response();
            self.kind_activity[ki] = self.kind_activity[ki].max(response);
        }

        if self.kind_activity[apical] < 0.0 {
            self.kind_activity[apical] = 1.0;
        }
        self.kind_activity[apical] = self.kind_activity[apical].clamp(0.0, 1.0);
        self.kind_activity[proximal] = self.kind_activity[proximal].clamp(0.0, 1.0);

        self.neuron_activity = (self.kind_activity[apical] * self.kind_activity[proximal]
            + self.rng.gen_range(0.01..0.05))
        .clamp(0.0, 1.0);
        self.neuron_activity
    }

    /// Adapt all dendrites to the most recent input.
    ///
    /// Each dendrite receives the maximum activity among branches of its own
    /// kind so it can tell whether it carried the winning path. Every
    /// `branch_interval` inputs the dendrites additionally review their
    /// structure.
    pub fn adapt(&mut self, weight: f32) {
        let window = self.activity_learning_window;
        let synapse_weight = weight
            * sigmoid(self.neuron_activity, window.rise)
                .min(1.0 - sigmoid(self.neuron_activity, window.fall));

        for dendrite in &mut self.dendrites {
            let kind_max = self.kind_activity[dendrite.kind().index()];
            dendrite.adapt_synapses(kind_max, synapse_weight);
        }

        self.input_count += 1;
        if self.input_count % self.branch_interval != 0 {
            return;
        }
        for dendrite in &mut self.dendrites {
            dendrite.adapt_branches();
        }
    }

    // Runtime parameterization.

    pub fn set_branch_interval(&mut self, interval: usize) {
        self.branch_interval = interval;
    }

    pub fn set_activity_learning_window(&mut self, window: LearningWindow) {
        self.activity_learning_window = window;
    }

    pub fn branch_interval(&self) -> usize {
        self.branch_interval
    }

    pub fn activity_learning_window(&self) -> LearningWindow {
        self.activity_learning_window
    }

    // Introspection.

    pub fn representation_count(&self) -> SegmentId {
        self.dendrites
            .iter()
            .map(|d| d.representation_count())
            .sum()
    }

    pub fn dendrite(&self, idx: usize) -> &Dendrite {
        &self.dendrites[idx]
    }

    #[cfg(test)]
    pub(crate) fn dendrite_mut(&mut self, idx: usize) -> &mut Dendrite {
        &mut self.dendrites[idx]
    }

    pub fn dendrite_count(&self) -> usize {
        self.dendrites.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.dendrites.iter().map(|d| d.synapse_count()).sum()
    }
}
