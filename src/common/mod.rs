pub mod eval;
pub mod logger;
pub mod seeding;
pub mod spaces;
pub mod to_tensor;
pub mod utils;
