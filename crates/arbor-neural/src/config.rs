// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Canonical group configuration
//!
//! [`basic_group_params`] builds a group of identical neurons with working
//! defaults for all learning hyperparameters. Hosts typically start from this
//! and tune individual fields, or deserialize a full [`GroupParams`] instead.

use std::collections::BTreeSet;

use arbor_math::SigmoidShape;
use arbor_sim::PartialId;

use crate::params::{
    DendriteKind, DendriteParams, GroupParams, LearningWindow, NeuronParams,
};

/// Dendritic branches per neuron.
const DENDRITES_PER_NEURON: usize = 3;

/// Group of `neuron_cnt` identical neurons, each with three proximal branches
/// listening to `input_ids` over `input_size` total input dimensions. Seeds
/// are assigned consecutively starting at `rnd_seed`, so two groups built
/// from different base seeds never share a PRNG stream.
pub fn basic_group_params(
    id: PartialId,
    neuron_cnt: usize,
    input_size: usize,
    input_ids: &BTreeSet<PartialId>,
    rnd_seed: u64,
) -> GroupParams {
    let mut seed = rnd_seed;
    let mut next_seed = move || {
        let current = seed;
        seed += 1;
        current
    };

    let random_seed = next_seed();
    let neuron_params = (0..neuron_cnt)
        .map(|_| NeuronParams {
            rnd_seed: next_seed(),
            branch_interval: 5000,
            activity_learning_window: LearningWindow {
                rise: SigmoidShape {
                    steepness: 0.6,
                    transition_point: 0.33,
                },
                fall: SigmoidShape {
                    steepness: 0.6,
                    transition_point: 0.66,
                },
            },
            dendrite_params: (0..DENDRITES_PER_NEURON)
                .map(|_| DendriteParams {
                    kind: DendriteKind::Proximal,
                    input_size,
                    input_ids: input_ids.clone(),
                    permanence_threshold: 0.3,
                    max_branch_level: 2,
                    rnd_seed: next_seed(),
                    primary_learning_rate: 0.01,
                    secondary_learning_rate: 0.0001,
                    mismatch_smoothing: 0.001,
                    accumulated_theta_thres: 2.0,
                    min_mismatch_deviation: 1.0,
                    min_mismatch_percentage: 0.002,
                    mismatch_act_thres: 0.8,
                })
                .collect(),
        })
        .collect();

    GroupParams {
        id,
        random_seed,
        neuron_params,
        local_inhibition_strength: 5.0,
        common_learning_rate: 0.0001,
        weight_filter: SigmoidShape {
            steepness: 0.5,
            transition_point: 0.33,
        },
        stochastic_win_thres: 0.8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_params_shape() {
        let params = basic_group_params(3, 10, 64, &BTreeSet::from([0, 2]), 100);
        assert_eq!(params.id, 3);
        assert_eq!(params.neuron_params.len(), 10);
        for neuron_params in &params.neuron_params {
            assert_eq!(neuron_params.dendrite_params.len(), DENDRITES_PER_NEURON);
            for dendrite_params in &neuron_params.dendrite_params {
                assert_eq!(dendrite_params.input_size, 64);
                assert_eq!(
                    dendrite_params.input_ids,
                    BTreeSet::from([0, 2])
                );
            }
        }
    }

    #[test]
    fn test_seeds_are_unique_per_component() {
        let params = basic_group_params(0, 4, 8, &BTreeSet::from([0]), 500);
        let mut seeds = vec![params.random_seed];
        for neuron_params in &params.neuron_params {
            seeds.push(neuron_params.rnd_seed);
            for dendrite_params in &neuron_params.dendrite_params {
                seeds.push(dendrite_params.rnd_seed);
            }
        }
        let unique: std::collections::BTreeSet<_> = seeds.iter().copied().collect();
        assert_eq!(unique.len(), seeds.len());
    }
}
