extern crate industrial_benchmark_env;

use industrial_benchmark_env::{
    dynamics::socket::{SocketDynamicsFactory, DEFAULT_ADDR},
    env::{
        base::Env,
        config::IndustrialBenchmarkConfig,
        industrial_benchmark::{named_observation, IndustrialBenchmarkEnv},
        names,
    },
};
use tracing_subscriber::EnvFilter;

// Needs an IDS bridge listening, e.g. `python3 ids-sock-bridge/ids_server.py`.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    // only the simulator's defaults are supported, so no properties file here
    let mut env = IndustrialBenchmarkEnv::new(
        IndustrialBenchmarkConfig::new(),
        SocketDynamicsFactory::new(addr),
    )?;

    println!("\nreward_range:\n{:?}", env.reward_range());

    println!("\naction_space:");
    for space in env.named_action_spaces() {
        println!("\t{space}");
    }
    println!("\tsample: {:?}", env.action_space().sample());

    println!("\nobservation_space:");
    println!("\t{:?}", names::observation_names().collect::<Vec<_>>());
    println!("\tsample: {:?}", env.observation_space().sample());

    let action = vec![0.1, 0.1, 0.1];

    let res = env.step(&action)?;
    println!("\nobservation (len: {}):", res.obs.len());
    for (name, value) in named_observation(&res.obs) {
        println!("\t{name}: {value}");
    }
    println!("\nreward:\n{}", res.reward);
    println!("\nterminated:\n{}", res.terminated);
    println!("\ninfo:\n{:?}", res.info);

    env.step(&action)?;

    env.seed(Some(12345));
    env.step(&action)?;

    env.seed(Some(123456));
    env.reset(None, None)?;
    let res = env.step(&action)?;
    println!("\nafter reseed and reset, reward: {}", res.reward);

    env.close();

    Ok(())
}
