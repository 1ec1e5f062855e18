// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation substrate for the arbor engine
//!
//! Entities are wired to each other purely by integer port ids. Every entity
//! owns exactly one output buffer and may read any number of input buffers.
//! Buffers are double-buffered: within a step all entities read the previous
//! step's outputs and write the next ones, and at swap time the roles flip.
//! This is what makes arbitrary (cyclic) wiring graphs well-defined.

pub mod buffer;
pub mod entity;
pub mod env;
pub mod source;

pub use buffer::{BufferStats, InputPort, IoBuffer, OutputPort};
pub use entity::{Entity, PartialId};
pub use env::{Environment, WiringError};
pub use source::VectorSource;
