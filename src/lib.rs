// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # arbor - sparse competing representations over lock-step simulation
//!
//! Arbor is an unsupervised representation-learning engine. Groups of neurons
//! consume time-varying input vectors produced by other groups or by external
//! sources, build sparse competing representations on growing dendritic trees,
//! and expose their activities as outputs that other groups may consume.
//! Wiring between entities is by integer port id and may contain cycles; a
//! double-buffered simulation environment advances everything one discrete
//! step at a time.
//!
//! ## Crates
//!
//! - **arbor-math**: sigmoid shaping, normalized Shannon entropy, local
//!   inhibition and related vector utilities
//! - **arbor-sim**: double-buffered IO ports, the entity contract and the
//!   lock-step simulation environment
//! - **arbor-neural**: dendritic branches, neurons and neuron groups
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arbor::prelude::*;
//! use std::collections::BTreeSet;
//!
//! let mut env = Environment::new();
//!
//! // An external source feeding port 0, one group learning from it on port 1.
//! let patterns = vec![vec![1.0; 16], vec![0.0; 16]];
//! env.add(VectorSource::new(0, patterns, 15, 7));
//! env.add(NeuronGroup::new(basic_group_params(
//!     1,
//!     50,
//!     16,
//!     &BTreeSet::from([0]),
//!     1025,
//! )));
//!
//! env.init_io_buffers();
//! loop {
//!     env.process();
//!     env.swap_io();
//! }
//! ```

pub use arbor_math as math;
pub use arbor_neural as neural;
pub use arbor_sim as sim;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::math::{local_inhibition, normalized_shannon_entropy, sigmoid, SigmoidShape};
    pub use crate::neural::{
        basic_group_params, Dendrite, DendriteKind, DendriteParams, GroupParams, LearningWindow,
        Neuron, NeuronGroup, NeuronParams,
    };
    pub use crate::sim::{
        BufferStats, Entity, Environment, InputPort, IoBuffer, OutputPort, PartialId, VectorSource,
    };
}
