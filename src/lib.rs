pub mod common;
pub mod dynamics;
pub mod env;
