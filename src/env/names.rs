//! Field names of the industrial benchmark.
//!
//! The simulator keys its Markov state by short names (`p`, `f`, `cost`, ...).
//! Agents see long names (`SetPoint`, `Fatigue`, `RewardTotal`, ...). [`FIELDS`]
//! is the single source for both directions and for the observation order.

use std::collections::HashMap;
use std::sync::LazyLock;

// action components
pub const DELTA_VELOCITY: &str = "DeltaVelocity";
pub const DELTA_GAIN: &str = "DeltaGain";
pub const DELTA_SHIFT: &str = "DeltaShift";

pub const ACTION_NAMES: [&str; 3] = [DELTA_VELOCITY, DELTA_GAIN, DELTA_SHIFT];

// observable state
pub const SET_POINT: &str = "SetPoint";
pub const FATIGUE: &str = "Fatigue";
pub const FATIGUE_BASE: &str = "FatigueBase";
pub const REWARD_TOTAL: &str = "RewardTotal";
pub const OPERATIONAL_COSTS_CONV: &str = "OperationalCostsConv";
pub const ACTION_VELOCITY: &str = "Velocity";
pub const ACTION_GAIN: &str = "Gain";
pub const ACTION_SHIFT: &str = "Shift";
pub const CONSUMPTION: &str = "Consumption";
pub const MIS_CALIBRATION: &str = "MisCalibration";
pub const EFFECTIVE_ACTION_GAIN_BETA: &str = "EffectiveActionGainBeta";
pub const EFFECTIVE_ACTION_VELOCITY_ALPHA: &str = "EffectiveActionVelocityAlpha";
pub const RANDOM_SEED: &str = "RandomSeed";
pub const MIS_CALIBRATION_DOMAIN: &str = "MisCalibrationDomain";
pub const MIS_CALIBRATION_SYSTEM_RESPONSE: &str = "MisCalibrationSystemResponse";
pub const MIS_CALIBRATION_PHI_IDX: &str = "MisCalibrationPhiIdx";
pub const CURRENT_OPERATIONAL_COST: &str = "CurrentOperationalCost";

/// One observable field: its public name, the simulator's name for it, and
/// nominal bounds used to build the observation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub long: &'static str,
    pub short: &'static str,
    pub low: f32,
    pub high: f32,
}

const fn field(long: &'static str, short: &'static str, low: f32, high: f32) -> Field {
    Field {
        long,
        short,
        low,
        high,
    }
}

const INF: f32 = f32::INFINITY;

pub const N_FIELDS: usize = 17;

/// Observable fields in observation order.
pub const FIELDS: [Field; N_FIELDS] = [
    field(SET_POINT, "p", 0.0, 100.0),
    field(FATIGUE, "f", -INF, INF),
    field(FATIGUE_BASE, "fb", -INF, INF),
    field(REWARD_TOTAL, "cost", -INF, INF),
    field(OPERATIONAL_COSTS_CONV, "oc", -INF, INF),
    field(ACTION_VELOCITY, "v", 0.0, 100.0),
    field(ACTION_GAIN, "g", 0.0, 100.0),
    field(ACTION_SHIFT, "s", 0.0, 100.0),
    field(CONSUMPTION, "c", -INF, INF),
    field(MIS_CALIBRATION, "MC", -INF, INF),
    field(EFFECTIVE_ACTION_GAIN_BETA, "ge", -INF, INF),
    field(EFFECTIVE_ACTION_VELOCITY_ALPHA, "ve", -INF, INF),
    field(RANDOM_SEED, "seed", 0.0, INF),
    field(MIS_CALIBRATION_DOMAIN, "gs_domain", -1.0, 1.0),
    field(MIS_CALIBRATION_SYSTEM_RESPONSE, "gs_sys_response", -1.0, 1.0),
    field(MIS_CALIBRATION_PHI_IDX, "gs_phi_idx", -INF, INF),
    field(CURRENT_OPERATIONAL_COST, "coc", -INF, INF),
];

pub static LONG_TO_SHORT: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| FIELDS.iter().map(|f| (f.long, f.short)).collect());

pub static SHORT_TO_LONG: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| LONG_TO_SHORT.iter().map(|(&l, &s)| (s, l)).collect());

pub fn long_to_short(long: &str) -> Option<&'static str> {
    LONG_TO_SHORT.get(long).copied()
}

pub fn short_to_long(short: &str) -> Option<&'static str> {
    SHORT_TO_LONG.get(short).copied()
}

/// Position of a long name in the observation vector.
pub fn index_of(long: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.long == long)
}

pub fn observation_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.long)
}

pub fn observation_bounds() -> (Vec<f32>, Vec<f32>) {
    FIELDS.iter().map(|f| (f.low, f.high)).unzip()
}
