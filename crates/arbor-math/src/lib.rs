// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Numeric building blocks for the arbor engine
//!
//! Small, allocation-free helpers shared across the simulation substrate and
//! the learning engine: sigmoid shaping, normalized Shannon entropy as a
//! noise-level proxy, entropy-aware local inhibition, and a couple of
//! in-place vector transforms.

pub mod entropy;
pub mod inhibition;
pub mod sigmoid;
pub mod vector_ops;

pub use entropy::normalized_shannon_entropy;
pub use inhibition::local_inhibition;
pub use sigmoid::{sigmoid, SigmoidShape};
pub use vector_ops::{normalize, softmax};
