pub mod base;
pub mod config;
pub mod industrial_benchmark;
pub mod names;
pub mod wrappers;
