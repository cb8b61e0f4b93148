use std::collections::HashMap;

use thiserror::Error;

use crate::common::{logger::LogData, spaces::Space};

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("simulation properties files are not supported (got {0:?})")]
    UnsupportedPropertiesFile(String),

    #[error("invalid action: expected {expected} components, got {actual}")]
    InvalidAction { expected: usize, actual: usize },

    #[error("markov state is missing field {0:?}")]
    MissingStateField(String),

    /// The simulator itself reported a failure.
    #[error("simulator error: {0}")]
    Simulator(String),

    /// The simulator answered with something we could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("failed to initialise environment: {0}")]
    Init(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnvError>;

#[derive(Debug, Clone)]
pub enum InfoData<O> {
    String(String),
    Float(f32),
    Int(i32),
    Obs(O),
    InfoDict(Info<O>),
}

pub type ResetOptions = HashMap<String, LogData>;
pub type Info<O> = HashMap<String, InfoData<O>>;

#[derive(Clone, Debug)]
pub struct EnvObservation<O> {
    pub obs: O,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info<O>,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct RewardRange {
    pub low: f32,
    pub high: f32,
}

pub trait Env<O, A> {
    fn step(&mut self, action: &A) -> Result<EnvObservation<O>>;
    fn reset(&mut self, seed: Option<u64>, options: Option<ResetOptions>) -> Result<O>;
    /// Seeds the environment, drawing a fresh seed when `None`.
    /// Returns the seeds actually used.
    fn seed(&mut self, seed: Option<u64>) -> Vec<u64>;
    fn action_space(&self) -> Box<dyn Space<A>>;
    fn observation_space(&self) -> Box<dyn Space<O>>;
    fn reward_range(&self) -> RewardRange;
    fn render(&self);
    fn renderable(&self) -> bool;
    fn close(&mut self);
    fn unwrapped(&self) -> &dyn Env<O, A>;
}
