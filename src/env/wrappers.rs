use super::base::{Env, EnvObservation, ResetOptions, Result, RewardRange};
use crate::common::spaces::Space;

/// Truncates episodes after `max_steps` steps.
///
/// The industrial benchmark never terminates on its own, so this is the only
/// way an episode of it ends.
pub struct TimeLimitWrapper<O, A> {
    env: Box<dyn Env<O, A>>,
    max_steps: usize,
    curr_steps: usize,
}

impl<O, A> TimeLimitWrapper<O, A> {
    pub fn new(env: Box<dyn Env<O, A>>, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            curr_steps: 0,
        }
    }
}

impl<O, A> Env<O, A> for TimeLimitWrapper<O, A> {
    fn step(&mut self, action: &A) -> Result<EnvObservation<O>> {
        let mut step_result = self.env.step(action)?;

        self.curr_steps += 1;
        step_result.truncated |= self.curr_steps >= self.max_steps;

        Ok(step_result)
    }

    fn reset(&mut self, seed: Option<u64>, options: Option<ResetOptions>) -> Result<O> {
        self.curr_steps = 0;

        self.env.reset(seed, options)
    }

    fn seed(&mut self, seed: Option<u64>) -> Vec<u64> {
        self.env.seed(seed)
    }

    fn action_space(&self) -> Box<dyn Space<A>> {
        self.env.action_space()
    }

    fn observation_space(&self) -> Box<dyn Space<O>> {
        self.env.observation_space()
    }

    fn reward_range(&self) -> RewardRange {
        self.env.reward_range()
    }

    fn render(&self) {
        self.env.render()
    }

    fn renderable(&self) -> bool {
        self.env.renderable()
    }

    fn close(&mut self) {
        self.env.close()
    }

    fn unwrapped(&self) -> &dyn Env<O, A> {
        self.env.unwrapped()
    }
}
