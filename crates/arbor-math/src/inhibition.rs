// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Local inhibition within a population of activities
//!
//! Strong signals suppress weak signals, and semi-strong signals stand up
//! better to the suppression than weak ones. The effective strength is
//! modulated by the entropy of the activity vector: the noisier the
//! population response, the weaker the inhibition.

use crate::entropy::normalized_shannon_entropy;
use crate::sigmoid::{sigmoid, SigmoidShape};

/// In-place local inhibition over an activity vector.
///
/// Every element is scaled by its ratio to the maximum, raised to
/// `1 + (strength - 1) * a` where `a` attenuates toward 0 on high-entropy
/// (noise-dominated) vectors, then clamped to `[0, 1]`. No-op on empty
/// vectors and whenever the maximum is not a normal number.
pub fn local_inhibition(vec: &mut [f32], strength: f32) {
    if vec.is_empty() {
        return;
    }
    let max_val = vec.iter().fold(0.0f32, |a, &b| a.max(b));
    if !max_val.is_normal() {
        return;
    }
    let nse_fact = 1.0
        - sigmoid(
            (normalized_shannon_entropy(vec) - 0.8) / 0.2,
            SigmoidShape::default(),
        );
    for val in vec.iter_mut() {
        let max_ratio = *val / max_val;
        *val = (*val * max_ratio.powf(1.0 + (strength - 1.0) * nse_fact)).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_zero_are_untouched() {
        local_inhibition(&mut [], 5.0);

        let mut zeros = [0.0f32; 4];
        local_inhibition(&mut zeros, 5.0);
        assert_eq!(zeros, [0.0; 4]);
    }

    #[test]
    fn test_ties_are_preserved() {
        // Equal activities have ratio 1 to the maximum and survive untouched
        // regardless of the inhibition strength.
        let mut vec = [0.5f32; 10];
        local_inhibition(&mut vec, 5.0);
        for &v in &vec {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_maximum_survives() {
        let mut vec = [0.1, 0.9, 0.3, 0.5];
        local_inhibition(&mut vec, 8.0);
        assert!((vec[1] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_non_maximum_never_grows() {
        let original = [0.1f32, 0.9, 0.3, 0.5];
        for strength in [1.0f32, 2.0, 5.0, 10.0] {
            let mut vec = original;
            local_inhibition(&mut vec, strength);
            for (before, after) in original.iter().zip(vec.iter()) {
                assert!(after <= before);
            }
        }
    }

    #[test]
    fn test_stronger_inhibition_suppresses_more() {
        let original = [0.2f32, 1.0, 0.6, 0.4];
        let mut weak = original;
        let mut strong = original;
        local_inhibition(&mut weak, 2.0);
        local_inhibition(&mut strong, 10.0);
        for (w, s) in weak.iter().zip(strong.iter()) {
            assert!(s <= w);
        }
    }
}
