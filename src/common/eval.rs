use burn::config::Config;
use core::fmt::Debug;

use crate::{
    common::utils::mean,
    env::base::{self, Env},
};

#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub mean_len: f32,
    pub mean_reward: f32,
}

#[derive(Config, Debug)]
pub struct EvalConfig {
    #[config(default = 10)]
    pub n_eval_episodes: usize,
    /// Episodes are cut here even if the env never truncates.
    #[config(default = 1000)]
    pub max_episode_steps: usize,
    #[config(default = false)]
    pub print_obs: bool,
    #[config(default = false)]
    pub print_action: bool,
    #[config(default = false)]
    pub print_reward: bool,
}

/// Runs `cfg.n_eval_episodes` episodes of `policy` and averages return and length.
pub fn evaluate_policy<O, A, P>(
    policy: &mut P,
    env: &mut dyn Env<O, A>,
    cfg: &EvalConfig,
) -> base::Result<EvalResult>
where
    O: Clone + Debug,
    A: Clone + Debug,
    P: FnMut(&O) -> A,
{
    let mut episode_rewards = Vec::with_capacity(cfg.n_eval_episodes);
    let mut episode_lengths = Vec::with_capacity(cfg.n_eval_episodes);

    tracing::debug!(episodes = cfg.n_eval_episodes, "starting evaluation");

    for _ in 0..cfg.n_eval_episodes {
        let mut state = env.reset(None, None)?;
        let mut running_reward = 0.0;
        let mut ep_len = 0;

        loop {
            if cfg.print_obs {
                println!("state: {:?}", state);
            }

            let action = policy(&state);

            if cfg.print_action {
                println!("action: {:?}", action);
            }

            let step_sample = env.step(&action)?;
            running_reward += step_sample.reward;
            ep_len += 1;

            if cfg.print_reward {
                println!("reward: {:?}", step_sample.reward);
            }

            if step_sample.terminated | step_sample.truncated | (ep_len >= cfg.max_episode_steps) {
                break;
            }

            state = step_sample.obs;
        }

        episode_rewards.push(running_reward);
        episode_lengths.push(ep_len as f32);
    }

    Ok(EvalResult {
        mean_len: mean(&episode_lengths),
        mean_reward: mean(&episode_rewards),
    })
}
