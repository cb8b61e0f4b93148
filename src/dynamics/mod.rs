//! The seam to the industrial dynamics simulator (IDS).
//!
//! The environment never simulates anything itself. It drives some [`Dynamics`]
//! implementation and reshapes what comes back.

use std::collections::HashMap;

use crate::env::base::Result;

pub mod socket;

/// Full simulator state, keyed by the simulator's short field names.
pub type MarkovState = HashMap<String, f64>;

pub trait Dynamics {
    /// Applies `[delta_velocity, delta_gain, delta_shift]` and returns the reward.
    fn step(&mut self, action: [f64; 3]) -> Result<f64>;

    fn markov_state(&mut self) -> Result<MarkovState>;

    /// Passes a seed on to the simulator. Simulators that draw from the
    /// process-wide rng are already seeded and can ignore this.
    fn seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

impl<D: Dynamics + ?Sized> Dynamics for Box<D> {
    fn step(&mut self, action: [f64; 3]) -> Result<f64> {
        (**self).step(action)
    }

    fn markov_state(&mut self) -> Result<MarkovState> {
        (**self).markov_state()
    }

    fn seed(&mut self, seed: u64) -> Result<()> {
        (**self).seed(seed)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Builds fresh simulator instances. Resetting an environment means
/// throwing its simulator away and creating a new one.
pub trait DynamicsFactory {
    type Output: Dynamics;

    fn create(&mut self) -> Result<Self::Output>;
}

impl<F, D> DynamicsFactory for F
where
    F: FnMut() -> Result<D>,
    D: Dynamics,
{
    type Output = D;

    fn create(&mut self) -> Result<D> {
        self()
    }
}
