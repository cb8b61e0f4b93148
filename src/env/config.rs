use burn::config::Config;

use super::base::{self, EnvError};

#[derive(Config, Debug)]
pub struct IndustrialBenchmarkConfig {
    /// Path to a simulation `.properties` file. Only the simulator's built-in
    /// defaults are supported, so anything other than `None` is rejected.
    pub sim_props_file: Option<String>,
    /// Initial seed. Defaults to the current unix time.
    pub seed: Option<u64>,
    /// Truncate episodes after this many steps.
    pub max_episode_steps: Option<usize>,
    /// Actions are deltas in `[-action_bound, action_bound]`.
    #[config(default = 1.0)]
    pub action_bound: f32,
}

impl IndustrialBenchmarkConfig {
    pub fn validate(&self) -> base::Result<()> {
        if let Some(path) = &self.sim_props_file {
            return Err(EnvError::UnsupportedPropertiesFile(path.clone()));
        }

        if !(self.action_bound.is_finite() && self.action_bound > 0.0) {
            return Err(EnvError::Init(format!(
                "action_bound must be positive and finite, got {}",
                self.action_bound
            )));
        }

        if self.max_episode_steps == Some(0) {
            return Err(EnvError::Init("max_episode_steps must be at least 1".into()));
        }

        Ok(())
    }
}
