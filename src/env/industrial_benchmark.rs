use crate::{
    common::{
        seeding::{entropy_seed, seed_global, time_seed},
        spaces::{BoxSpace, NamedSpace, Space},
    },
    dynamics::{Dynamics, DynamicsFactory, MarkovState},
    env::{
        base::{Env, EnvError, EnvObservation, ResetOptions, Result, RewardRange},
        config::IndustrialBenchmarkConfig,
        names::{self, ACTION_NAMES, FIELDS, N_FIELDS, RANDOM_SEED},
        wrappers::TimeLimitWrapper,
    },
};

pub const REWARD_RANGE: RewardRange = RewardRange {
    low: -6500.0,
    high: 0.0,
};

pub const ACTION_SPACE_NAME: &str = "ActionDelta";
pub const OBSERVATION_SPACE_NAME: &str = "MarkovState";

/// Gym-style view of the industrial benchmark.
///
/// Actions are `[delta_velocity, delta_gain, delta_shift]`. Observations are the
/// simulator's Markov state renamed to long names and laid out in
/// [`names::FIELDS`] order, with the env's current seed in the `RandomSeed` slot.
/// That slot is an `f32`, so seeds above 2^24 come back rounded; unix-time seeds
/// land on a multiple of 128. Use [`Self::current_seed`] for the exact value.
/// Episodes never terminate; wrap in a [`TimeLimitWrapper`] to bound them.
pub struct IndustrialBenchmarkEnv<F: DynamicsFactory> {
    factory: F,
    dynamics: F::Output,
    current_seed: u64,
    action_space: NamedSpace<BoxSpace<Vec<f32>>>,
    obs_space: NamedSpace<BoxSpace<Vec<f32>>>,
}

impl<F: DynamicsFactory> IndustrialBenchmarkEnv<F> {
    pub fn new(config: IndustrialBenchmarkConfig, mut factory: F) -> Result<Self> {
        config.validate()?;

        let dynamics = factory.create()?;

        let bound = config.action_bound;
        let action_space = NamedSpace::new(
            ACTION_SPACE_NAME,
            BoxSpace::from((vec![-bound; ACTION_NAMES.len()], vec![bound; ACTION_NAMES.len()])),
        );
        let obs_space = NamedSpace::new(
            OBSERVATION_SPACE_NAME,
            BoxSpace::from(names::observation_bounds()),
        );

        let mut env = Self {
            factory,
            dynamics,
            current_seed: 0,
            action_space,
            obs_space,
        };
        env.seed(Some(config.seed.unwrap_or_else(time_seed)));

        Ok(env)
    }

    pub fn current_seed(&self) -> u64 {
        self.current_seed
    }

    pub fn dynamics(&self) -> &F::Output {
        &self.dynamics
    }

    pub fn action_names(&self) -> [&'static str; 3] {
        ACTION_NAMES
    }

    /// One single-dimension space per action component, labelled with its name.
    pub fn named_action_spaces(&self) -> Vec<NamedSpace<BoxSpace<Vec<f32>>>> {
        let inner = self.action_space.space();

        ACTION_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                NamedSpace::new(
                    *name,
                    BoxSpace::from((vec![inner.low()[i]], vec![inner.high()[i]])),
                )
            })
            .collect()
    }

    /// Reshapes a Markov state into the observation vector.
    fn observe(&mut self) -> Result<Vec<f32>> {
        let state = self.dynamics.markov_state()?;

        reshape(&state, self.current_seed)
    }
}

/// Pairs each observation value with its long name.
pub fn named_observation(obs: &[f32]) -> Vec<(&'static str, f32)> {
    names::observation_names().zip(obs.iter().copied()).collect()
}

fn reshape(state: &MarkovState, seed: u64) -> Result<Vec<f32>> {
    let mut obs = Vec::with_capacity(N_FIELDS);

    for field in FIELDS.iter() {
        let value = if field.long == RANDOM_SEED {
            // whatever the simulator says, the seed is ours
            seed as f32
        } else {
            *state
                .get(field.short)
                .ok_or_else(|| EnvError::MissingStateField(field.short.to_string()))?
                as f32
        };
        obs.push(value);
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        let hidden: Vec<&String> = state
            .keys()
            .filter(|k| names::short_to_long(k).is_none())
            .collect();
        tracing::trace!(?hidden, "dropping fields without a public name");
    }

    Ok(obs)
}

impl<F: DynamicsFactory> Env<Vec<f32>, Vec<f32>> for IndustrialBenchmarkEnv<F> {
    fn step(&mut self, action: &Vec<f32>) -> Result<EnvObservation<Vec<f32>>> {
        if action.len() != ACTION_NAMES.len() {
            return Err(EnvError::InvalidAction {
                expected: ACTION_NAMES.len(),
                actual: action.len(),
            });
        }

        let internal = [action[0] as f64, action[1] as f64, action[2] as f64];
        let reward = self.dynamics.step(internal)?;
        tracing::trace!(?internal, reward, "step");

        Ok(EnvObservation {
            obs: self.observe()?,
            reward: reward as f32,
            terminated: false,
            truncated: false,
            info: Default::default(),
        })
    }

    fn reset(&mut self, seed: Option<u64>, options: Option<ResetOptions>) -> Result<Vec<f32>> {
        if options.is_some() {
            tracing::warn!("passing options to IndustrialBenchmarkEnv, but options are not supported");
        }

        // single-client bridges only accept the next simulator once the old one is gone
        self.dynamics.close();
        self.dynamics = self.factory.create()?;

        if let Some(seed) = seed {
            self.seed(Some(seed));
        }
        tracing::debug!(seed = self.current_seed, "reset simulator");

        self.observe()
    }

    fn seed(&mut self, seed: Option<u64>) -> Vec<u64> {
        let seed = seed.unwrap_or_else(entropy_seed);

        self.current_seed = seed;
        seed_global(seed);
        if let Err(e) = self.dynamics.seed(seed) {
            tracing::warn!(error = %e, "simulator rejected seed");
        }
        tracing::debug!(seed, "seeded");

        vec![seed]
    }

    fn action_space(&self) -> Box<dyn Space<Vec<f32>>> {
        Box::new(self.action_space.clone())
    }

    fn observation_space(&self) -> Box<dyn Space<Vec<f32>>> {
        Box::new(self.obs_space.clone())
    }

    fn reward_range(&self) -> RewardRange {
        REWARD_RANGE
    }

    fn render(&self) {}

    fn renderable(&self) -> bool {
        false
    }

    fn close(&mut self) {
        self.dynamics.close()
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, Vec<f32>> {
        self
    }
}

pub fn make_industrial_benchmark<F>(
    config: IndustrialBenchmarkConfig,
    factory: F,
) -> Result<Box<dyn Env<Vec<f32>, Vec<f32>>>>
where
    F: DynamicsFactory + 'static,
    F::Output: 'static,
{
    let max_steps = config.max_episode_steps;
    let env = IndustrialBenchmarkEnv::new(config, factory)?;

    Ok(match max_steps {
        Some(s) => Box::new(TimeLimitWrapper::new(Box::new(env), s)),
        None => Box::new(env),
    })
}
