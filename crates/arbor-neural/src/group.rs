// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The neuron group
//!
//! A group owns its neurons and implements the [`Entity`] contract, so it can
//! be wired into the simulation environment purely by port ids. One step of a
//! group computes all neuron responses in parallel, applies local inhibition,
//! reinforces a stochastically chosen primary winner, and then nudges the
//! whole population by a small secondary update.

use std::collections::BTreeSet;

use arbor_math::{local_inhibition, sigmoid, SigmoidShape};
use arbor_sim::{Entity, InputPort, OutputPort, PartialId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::neuron::Neuron;
use crate::params::GroupParams;
use crate::synapses::SegmentId;

pub struct NeuronGroup {
    params: GroupParams,

    // Ascending union of all input ids required by the dendrites.
    input_ids: Vec<PartialId>,

    neurons: Vec<Neuron>,
    output: Option<OutputPort>,

    local_inhibition_strength: f32,
    common_learning_rate: f32,
    weight_filter: SigmoidShape,
    stochastic_win_thres: f32,

    rng: StdRng,
}

impl NeuronGroup {
    pub fn new(params: GroupParams) -> Self {
        let mut ids = BTreeSet::new();
        let mut neurons = Vec::with_capacity(params.neuron_params.len());
        for (idx, neuron_params) in params.neuron_params.iter().enumerate() {
            for dendrite_params in &neuron_params.dendrite_params {
                ids.extend(dendrite_params.input_ids.iter().copied());
            }
            let mut neuron = Neuron::new(neuron_params.clone());
            neuron.id = idx;
            neurons.push(neuron);
        }

        Self {
            local_inhibition_strength: params.local_inhibition_strength,
            common_learning_rate: params.common_learning_rate,
            weight_filter: params.weight_filter,
            stochastic_win_thres: params.stochastic_win_thres,
            rng: StdRng::seed_from_u64(params.random_seed),
            input_ids: ids.into_iter().collect(),
            neurons,
            output: None,
            params,
        }
    }

    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    // Runtime parameterization.

    pub fn set_local_inhibition_strength(&mut self, strength: f32) {
        self.local_inhibition_strength = strength;
    }

    pub fn set_common_learning_rate(&mut self, rate: f32) {
        self.common_learning_rate = rate;
    }

    pub fn set_weight_filter(&mut self, filter: SigmoidShape) {
        self.weight_filter = filter;
    }

    pub fn set_stochastic_win_thres(&mut self, thres: f32) {
        self.stochastic_win_thres = thres;
    }

    pub fn local_inhibition_strength(&self) -> f32 {
        self.local_inhibition_strength
    }

    pub fn common_learning_rate(&self) -> f32 {
        self.common_learning_rate
    }

    pub fn weight_filter(&self) -> SigmoidShape {
        self.weight_filter
    }

    pub fn stochastic_win_thres(&self) -> f32 {
        self.stochastic_win_thres
    }

    // Introspection.

    pub fn neuron(&self, idx: usize) -> &Neuron {
        &self.neurons[idx]
    }

    #[cfg(test)]
    pub(crate) fn neuron_mut(&mut self, idx: usize) -> &mut Neuron {
        &mut self.neurons[idx]
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn max_representation_count(&self) -> SegmentId {
        self.neurons
            .iter()
            .map(|n| n.representation_count())
            .max()
            .unwrap_or(0)
    }

    pub fn representation_count(&self) -> usize {
        self.neurons
            .iter()
            .map(|n| n.representation_count() as usize)
            .sum()
    }

    pub fn synapse_count(&self) -> usize {
        self.neurons.iter().map(|n| n.synapse_count()).sum()
    }

    pub fn max_mismatch(&self) -> f32 {
        let mut result = 0.0f32;
        for neuron in &self.neurons {
            for di in 0..neuron.dendrite_count() {
                for &mm in &neuron.dendrite(di).synapses().mismatch {
                    result = result.max(mm);
                }
            }
        }
        result
    }

    pub fn avg_mismatch(&self) -> f32 {
        let mut sum = 0.0f32;
        let mut cnt = 0.0f32;
        for neuron in &self.neurons {
            for di in 0..neuron.dendrite_count() {
                let mismatch = &neuron.dendrite(di).synapses().mismatch;
                sum += mismatch.iter().sum::<f32>();
                cnt += mismatch.len() as f32;
            }
        }
        sum / cnt
    }

    pub fn max_acc_theta(&self) -> f32 {
        let mut result = 0.0f32;
        for neuron in &self.neurons {
            for di in 0..neuron.dendrite_count() {
                for &theta in &neuron.dendrite(di).synapses().adapt_history {
                    result = result.max(theta);
                }
            }
        }
        result
    }

    pub fn avg_acc_theta(&self) -> f32 {
        let mut sum = 0.0f32;
        // Starts at one synapse so an empty group stays finite.
        let mut cnt = 1.0f32;
        for neuron in &self.neurons {
            for di in 0..neuron.dendrite_count() {
                let history = &neuron.dendrite(di).synapses().adapt_history;
                sum += history.iter().sum::<f32>();
                cnt += history.len() as f32;
            }
        }
        sum / cnt
    }
}

impl Entity for NeuronGroup {
    fn output_id(&self) -> PartialId {
        self.params.id
    }

    fn output_len(&self) -> usize {
        self.neurons.len()
    }

    fn input_ids(&self) -> &[PartialId] {
        &self.input_ids
    }

    fn set_output_port(&mut self, port: OutputPort) {
        self.output = Some(port);
    }

    fn set_input_port(&mut self, id: PartialId, port: InputPort) {
        for neuron in &mut self.neurons {
            neuron.set_input_port(id, &port);
        }
    }

    fn process(&mut self) {
        let port = self.output.as_ref().expect("output port not wired");
        let mut out_guard = port.write();
        let out = &mut out_guard[..];
        debug_assert_eq!(out.len(), self.neurons.len());

        // Parallel response pass; neuron ids map 1:1 onto output slots.
        self.neurons
            .par_iter_mut()
            .zip(out.par_iter_mut())
            .for_each(|(neuron, slot)| {
                *slot = neuron.response();
            });

        local_inhibition(out, self.local_inhibition_strength);

        // Primary winner: a stochastic threshold below the maximum activity,
        // claimed by the first neuron at or above it. The weight filter makes
        // adaptation strongest for inputs that are not yet well represented.
        let max_act = out.iter().fold(0.0f32, |a, &b| a.max(b));
        let low = max_act * self.stochastic_win_thres;
        let win_act = if max_act > low {
            self.rng.gen_range(low..max_act)
        } else {
            low
        };
        for (idx, &activity) in out.iter().enumerate() {
            if activity + f32::EPSILON >= win_act {
                let weight = sigmoid(1.0 - activity, self.weight_filter);
                self.neurons[idx].adapt(weight);
                break;
            }
        }

        // Secondary update: everyone adapts a little, scaled inversely by the
        // own share of the group activity.
        let act_sum: f32 = out.iter().sum();
        let weight_filter = self.weight_filter;
        let common_learning_rate = self.common_learning_rate;
        let activities: &[f32] = out;
        self.neurons.par_iter_mut().for_each(|neuron| {
            let weight = sigmoid(1.0 - activities[neuron.id] / act_sum, weight_filter);
            neuron.adapt(weight * common_learning_rate);
        });
    }

    fn status(&self) -> String {
        format!(
            "neuron group | id: {}\n | neurons: {} | representations: {} | synapses: {} \
             | max mm: {:.6} | avg mm: {:.6} | max at: {:.6} | avg at: {:.6}",
            self.output_id(),
            self.neuron_count(),
            self.representation_count(),
            self.synapse_count(),
            self.max_mismatch(),
            self.avg_mismatch(),
            self.max_acc_theta(),
            self.avg_acc_theta(),
        )
    }
}
