// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The arbor learning engine
//!
//! Neuron groups build sparse competing representations of their inputs.
//! Every neuron aggregates a set of dendritic branches; every branch holds a
//! structure-of-arrays synapse store distributed over a complete binary tree
//! of dendritic segments that deepens along ambiguous input patterns.
//!
//! A group implements the [`arbor_sim::Entity`] contract, so groups and
//! external sources can be wired into arbitrary, possibly cyclic graphs
//! driven by the lock-step environment.

pub mod config;
pub mod dendrite;
pub mod group;
pub mod neuron;
pub mod params;
pub mod synapses;

pub use config::basic_group_params;
pub use dendrite::Dendrite;
pub use group::NeuronGroup;
pub use neuron::Neuron;
pub use params::{DendriteKind, DendriteParams, GroupParams, LearningWindow, NeuronParams};
pub use synapses::{SegmentId, SynapseStore};
