// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The contract every simulated entity implements

use crate::buffer::{InputPort, OutputPort};

/// Identifier of an output port, unique across an environment.
pub type PartialId = usize;

/// A simulated entity: one output port, any number of input ports, and a
/// `process` step driven by the environment.
///
/// Entities never reference each other directly; all coupling goes through
/// integer port ids resolved by the environment at wiring time.
pub trait Entity: Send {
    /// Id under which this entity's output buffer is registered.
    fn output_id(&self) -> PartialId;

    /// Length of the output vector this entity produces.
    fn output_len(&self) -> usize;

    /// Sorted, deduplicated ids of all input ports this entity requires.
    fn input_ids(&self) -> &[PartialId];

    /// Receive the write capability for the own output buffer.
    fn set_output_port(&mut self, _port: OutputPort) {}

    /// Receive the read capability for one of the declared input ids.
    fn set_input_port(&mut self, _id: PartialId, _port: InputPort) {}

    /// Compute one step: read the previous step's inputs, write the own
    /// output. Must not assume any peer has processed yet within this step.
    fn process(&mut self);

    /// Human-readable status line for hosts and logs.
    fn status(&self) -> String {
        String::new()
    }
}
