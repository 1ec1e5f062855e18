// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-place vector transforms

/// Numerically stable in-place softmax with inverse temperature `beta`.
///
/// Zero-fills the vector if the exponential sum degenerates.
pub fn softmax(vec: &mut [f32], beta: f32) {
    if vec.is_empty() {
        return;
    }
    let max_val = vec.iter().fold(0.0f32, |a, &b| a.max(b));
    for val in vec.iter_mut() {
        *val -= max_val;
    }
    let mut sum = 0.0f32;
    for val in vec.iter_mut() {
        *val = (*val * beta).exp();
        sum += *val;
    }
    if sum.is_normal() {
        for val in vec.iter_mut() {
            *val /= sum;
        }
    } else {
        vec.fill(0.0);
    }
}

/// In-place min-max normalization to `[0, 1]`.
///
/// Zero-fills the vector when the value range collapses.
pub fn normalize(vec: &mut [f32]) {
    if vec.is_empty() {
        return;
    }
    let max_val = vec.iter().fold(0.0f32, |a, &b| a.max(b));
    let min_val = vec.iter().fold(max_val, |a, &b| a.min(b));
    if max_val - min_val <= f32::EPSILON {
        vec.fill(0.0);
        return;
    }
    for val in vec.iter_mut() {
        *val = (*val - min_val) / (max_val - min_val);
    }
}
