//! Randomized convergence of a category toward its target on-count
//!
//! Each call moves a category straight to its desired on-count by flipping
//! a uniformly chosen subset of the fixtures that are in the wrong state.
//! Candidates are drawn by partially shuffling the candidate list, so every
//! call finishes in a number of steps bounded by the category size.
//!
//! The desired count is the target rounded down or up, picked by a biased
//! coin on every call. Over many ticks this keeps the average on-count
//! close to the exact target instead of drifting in one rounding direction.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::lights::LightVector;

/// Probability of rounding the desired on-count up
pub const DEFAULT_CEIL_PROBABILITY: f64 = 0.5;

/// Outcome of one convergence call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Convergence {
    /// Fixtures switched from off to on
    pub switched_on: usize,
    /// Fixtures switched from on to off
    pub switched_off: usize,
    /// Fixtures on after the call
    pub on_count: usize,
    /// Fixtures in the category
    pub total: usize,
}

impl Convergence {
    pub const fn is_unchanged(&self) -> bool {
        self.switched_on == 0 && self.switched_off == 0
    }

    /// Realized on percentage, 0 for an empty category
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.on_count as f32 * 100.0 / self.total as f32
    }
}

/// Moves a category's on-count toward a target percentage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceToggler {
    ceil_probability: f64,
}

impl Default for ConvergenceToggler {
    fn default() -> Self {
        Self {
            ceil_probability: DEFAULT_CEIL_PROBABILITY,
        }
    }
}

impl ConvergenceToggler {
    /// Create a toggler that rounds up with probability `ceil_probability`
    pub fn new(ceil_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&ceil_probability) {
            return Err(Error::InvalidInput(format!(
                "ceil probability {ceil_probability} is outside 0..=1"
            )));
        }
        Ok(Self { ceil_probability })
    }

    pub const fn ceil_probability(&self) -> f64 {
        self.ceil_probability
    }

    /// Desired on-count of a category of `total` fixtures
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn desired_on<R: Rng + ?Sized>(
        &self,
        total: usize,
        target_percent: f32,
        rng: &mut R,
    ) -> usize {
        let exact = f64::from(target_percent.clamp(0.0, 100.0)) / 100.0 * total as f64;
        let rounded = if rng.random_bool(self.ceil_probability) {
            libm::ceil(exact)
        } else {
            libm::floor(exact)
        };
        (rounded as usize).min(total)
    }

    /// Converge the fixtures at `indices` toward `target_percent`
    ///
    /// Only fixtures listed in `indices` are touched. The vector is left
    /// unchanged when the desired on-count already matches, when `indices`
    /// is empty, and when an error is returned.
    pub fn converge<R: Rng + ?Sized>(
        &self,
        vector: &mut LightVector,
        indices: &[usize],
        target_percent: f32,
        rng: &mut R,
    ) -> Result<Convergence> {
        if !target_percent.is_finite() {
            return Err(Error::InvalidInput(format!(
                "target percentage {target_percent} is not finite"
            )));
        }
        check_indices(vector, indices)?;

        let total = indices.len();
        if total == 0 {
            return Ok(Convergence::default());
        }

        let current_on = vector.count_on_in(indices);
        let desired_on = self.desired_on(total, target_percent, rng);

        let mut result = Convergence {
            total,
            on_count: current_on,
            ..Convergence::default()
        };
        if desired_on > current_on {
            result.switched_on = flip_random(vector, indices, false, desired_on - current_on, rng);
        } else if desired_on < current_on {
            result.switched_off = flip_random(vector, indices, true, current_on - desired_on, rng);
        }
        result.on_count = current_on + result.switched_on - result.switched_off;

        Ok(result)
    }
}

/// Reject indices outside the vector and indices listed twice
fn check_indices(vector: &LightVector, indices: &[usize]) -> Result<()> {
    let mut seen = vec![false; vector.len()];
    for &index in indices {
        let Some(slot) = seen.get_mut(index) else {
            return Err(Error::InvalidInput(format!(
                "fixture {index} is outside a chain of {}",
                vector.len()
            )));
        };
        if *slot {
            return Err(Error::InvalidInput(format!("fixture {index} is listed twice")));
        }
        *slot = true;
    }
    Ok(())
}

/// Flip up to `amount` fixtures currently in state `from`
///
/// Returns the number of fixtures flipped.
fn flip_random<R: Rng + ?Sized>(
    vector: &mut LightVector,
    indices: &[usize],
    from: bool,
    amount: usize,
    rng: &mut R,
) -> usize {
    let mut candidates: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&index| vector.get(index) == Some(from))
        .collect();
    let amount = amount.min(candidates.len());

    let (picked, _) = candidates.partial_shuffle(rng, amount);
    for &index in picked.iter() {
        vector.set(index, !from);
    }
    amount
}
