extern crate industrial_benchmark_env;

use std::path::PathBuf;

use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    config::Config,
    tensor::{backend::Backend, Distribution, Int, Tensor, TensorData},
};
use indicatif::{ProgressIterator, ProgressStyle};
use industrial_benchmark_env::{
    common::{
        eval::{evaluate_policy, EvalConfig},
        logger::{CsvLogger, LogData, LogItem, Logger},
        to_tensor::{FromTensorF, ToTensorF},
        utils::{mean, std_dev, top_k_indices},
    },
    dynamics::socket::{SocketDynamicsFactory, DEFAULT_ADDR},
    env::{
        config::IndustrialBenchmarkConfig,
        industrial_benchmark::make_industrial_benchmark,
        names::{self, N_FIELDS, RANDOM_SEED},
    },
};
use tracing_subscriber::EnvFilter;

type B = NdArray;

const N_ACTIONS: usize = 3;
const N_PARAMS: usize = N_FIELDS * N_ACTIONS + N_ACTIONS;

#[derive(Config, Debug)]
struct CemConfig {
    #[config(default = 50)]
    batch_size: usize,
    #[config(default = 0.05)]
    elite_frac: f64,
    #[config(default = 20)]
    n_generations: usize,
    #[config(default = 100)]
    episode_steps: usize,
    #[config(default = 0.5)]
    init_std: f64,
    /// Added to the elite std every generation.
    #[config(default = 0.01)]
    extra_std: f64,
    #[config(default = 123)]
    seed: u64,
}

/// Linear policy `tanh(W x + b)` over the scaled observation. The seed slot is
/// zeroed since it carries no information about the plant.
fn act(params: &[f32], obs: &[f32], device: &NdArrayDevice) -> Vec<f32> {
    let seed_idx = names::index_of(RANDOM_SEED).unwrap_or(usize::MAX);
    let x: Vec<f32> = obs
        .iter()
        .enumerate()
        .map(|(i, v)| if i == seed_idx { 0.0 } else { v / 100.0 })
        .collect();

    let w: Tensor<B, 2> = params[..N_FIELDS * N_ACTIONS]
        .chunks(N_ACTIONS)
        .map(<[f32]>::to_vec)
        .collect::<Vec<_>>()
        .to_tensor(device);
    let b: Tensor<B, 1> = params[N_FIELDS * N_ACTIONS..].to_vec().to_tensor(device);
    let x: Tensor<B, 1> = x.to_tensor(device);

    let out: Tensor<B, 1> = x
        .unsqueeze::<2>()
        .matmul(w)
        .add(b.unsqueeze::<2>())
        .tanh()
        .squeeze(0);

    Vec::<f32>::from_tensor(out)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let cfg = CemConfig::new();
    let device = NdArrayDevice::default();

    B::seed(cfg.seed);

    let env_cfg = IndustrialBenchmarkConfig::new()
        .with_seed(Some(cfg.seed))
        .with_max_episode_steps(Some(cfg.episode_steps));
    let mut env = make_industrial_benchmark(env_cfg, SocketDynamicsFactory::new(addr))?;

    let mut logger = CsvLogger::new(
        PathBuf::from("logs/cem_industrial_benchmark/log_cem.csv"),
        false,
        true,
    );
    if let Err(err) = logger.check_can_log(true) {
        anyhow::bail!("Error setting up logger: {err}");
    }

    let n_elite = ((cfg.batch_size as f64 * cfg.elite_frac).ceil() as usize).max(1);
    let eval_cfg = EvalConfig::new()
        .with_n_eval_episodes(1)
        .with_max_episode_steps(cfg.episode_steps);

    let mut mean_params: Tensor<B, 1> = Tensor::zeros([N_PARAMS], &device);
    let mut std_params: Tensor<B, 1> = Tensor::ones([N_PARAMS], &device).mul_scalar(cfg.init_std);
    let mut best: (f32, Vec<f32>) = (f32::NEG_INFINITY, vec![0.0; N_PARAMS]);

    let style = ProgressStyle::default_bar()
        .template("{pos:>7}/{len:7} {bar} [{elapsed_precise}], eta: [{eta}]")?;

    for generation in (0..cfg.n_generations).progress_with_style(style) {
        let noise: Tensor<B, 2> = Tensor::random(
            [cfg.batch_size, N_PARAMS],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let population = noise
            .mul(std_params.clone().unsqueeze::<2>())
            .add(mean_params.clone().unsqueeze::<2>());
        let candidates = Vec::<Vec<f32>>::from_tensor(population.clone());

        let mut returns = Vec::with_capacity(cfg.batch_size);
        for params in &candidates {
            let mut policy = |obs: &Vec<f32>| act(params, obs, &device);
            returns.push(evaluate_policy(&mut policy, env.as_mut(), &eval_cfg)?.mean_reward);
        }

        let elite = top_k_indices(&returns, n_elite);
        if returns[elite[0]] > best.0 {
            best = (returns[elite[0]], candidates[elite[0]].clone());
        }

        let elite_idx: Tensor<B, 1, Int> = Tensor::from_data(
            TensorData::new(elite.iter().map(|&i| i as i64).collect::<Vec<_>>(), [n_elite])
                .convert::<<B as Backend>::IntElem>(),
            &device,
        );
        let elite_params = population.select(0, elite_idx);
        mean_params = elite_params.clone().mean_dim(0).squeeze(0);
        std_params = if n_elite > 1 {
            elite_params.var(0).sqrt().squeeze(0).add_scalar(cfg.extra_std)
        } else {
            std_params.mul_scalar(0.9).add_scalar(cfg.extra_std)
        };

        let elite_returns: Vec<f32> = elite.iter().map(|&i| returns[i]).collect();
        logger.log(
            LogItem::default()
                .push("generation".to_string(), LogData::Int(generation as i32))
                .push("mean_return".to_string(), LogData::Float(mean(&returns)))
                .push("std_return".to_string(), LogData::Float(std_dev(&returns)))
                .push("elite_mean_return".to_string(), LogData::Float(mean(&elite_returns)))
                .push("best_return".to_string(), LogData::Float(best.0)),
        );
    }

    // keep the best parameters around, like saving model weights
    std::fs::write(
        "logs/cem_industrial_benchmark/cem_params.json",
        serde_json::to_string_pretty(&best.1)?,
    )?;

    // evaluate the best policy for 5 episodes
    let mut policy = |obs: &Vec<f32>| act(&best.1, obs, &device);
    let res = evaluate_policy(
        &mut policy,
        env.as_mut(),
        &EvalConfig::new()
            .with_n_eval_episodes(5)
            .with_max_episode_steps(cfg.episode_steps),
    )?;

    let mut final_item = LogItem::default()
        .push("generation".to_string(), LogData::Int(cfg.n_generations as i32))
        .push("best_return".to_string(), LogData::Float(best.0));
    final_item.combine(res.into());
    logger.log(final_item);

    logger.print_last();
    if let Err(err) = logger.dump() {
        anyhow::bail!("failed to dump logs: {err}");
    }

    env.close();

    Ok(())
}
