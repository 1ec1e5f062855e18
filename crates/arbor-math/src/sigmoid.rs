// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameterized sigmoid used for learning-rate filters and attenuation

use serde::{Deserialize, Serialize};

/// Shape of a [`sigmoid`] curve.
///
/// `steepness` close to 1 approaches a hard step; `transition_point` shifts
/// the inflection along the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidShape {
    pub steepness: f32,
    pub transition_point: f32,
}

impl Default for SigmoidShape {
    fn default() -> Self {
        Self {
            steepness: 0.5,
            transition_point: 0.5,
        }
    }
}

/// Sigmoid with adjustable steepness and transition point.
///
/// Evaluates to exactly 0.5 at `shape.transition_point`.
pub fn sigmoid(x: f32, shape: SigmoidShape) -> f32 {
    let step_size = 1.0 - shape.steepness.powf(0.1);
    let starting_point = -shape.transition_point / step_size;
    1.0 / (1.0 + (-(x / step_size + starting_point)).exp())
}
