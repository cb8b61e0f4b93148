//! The process-wide random number generator.
//!
//! Spaces sample from it and simulators running in this process draw from it, so
//! reseeding it is the only seeding an environment performs. There is no per-instance
//! stream and no determinism guarantee across threads.

use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, Rng, SeedableRng};

pub static GLOBAL_RNG: LazyLock<Mutex<StdRng>> =
    LazyLock::new(|| Mutex::new(StdRng::seed_from_u64(1234)));

fn lock_rng() -> MutexGuard<'static, StdRng> {
    // a panic while sampling leaves the rng itself intact
    GLOBAL_RNG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn seed_global(seed: u64) {
    *lock_rng() = StdRng::seed_from_u64(seed);
}

pub fn with_global_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    f(&mut lock_rng())
}

/// A fresh seed drawn from OS entropy, independent of [`GLOBAL_RNG`].
pub fn entropy_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Seconds since the unix epoch.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
