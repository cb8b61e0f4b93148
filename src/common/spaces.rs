use std::fmt;

use dyn_clone::DynClone;
use rand::Rng;
use rand_distr::{Exp1, StandardNormal};

use super::seeding::{seed_global, with_global_rng};

/// Defines a space in which a action, observation, or other may exist
pub trait Space<T: Clone>: DynClone {
    /// tests whether the sample is contained within the space
    fn contains(&self, sample: &T) -> bool;

    /// randomly samples from the space
    fn sample(&mut self) -> T;

    /// returns some semantic representation of the space of
    /// the space, to be used for initialising models
    fn shape(&self) -> T;

    /// Reseeds the sampler. Every space draws from the process-wide rng,
    /// so this reseeds that.
    fn seed(&mut self, seed: u64) {
        seed_global(seed);
    }
}

dyn_clone::clone_trait_object!(<T> Space<T> where T: Clone);

/// Defines a Discrete Space.
///
/// A Discrete space is a space on `usize` where samples
/// are drawn uniformly from `[0, n)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrete {
    /// The upper bound on the space
    n: usize,
}

impl From<usize> for Discrete {
    fn from(value: usize) -> Self {
        Self { n: value }
    }
}

impl Space<usize> for Discrete {
    fn contains(&self, sample: &usize) -> bool {
        *sample < self.n
    }

    fn sample(&mut self) -> usize {
        with_global_rng(|rng| rng.gen_range(0..self.n))
    }

    fn shape(&self) -> usize {
        self.n
    }
}

/// Defines a `BoxSpace<T>`.
///
/// A `BoxSpace` is an n-dimensional container on
/// some generic `T`, where `T` is classically some
/// form of number. Bounds may be infinite, in which case
/// sampling follows gym: normal for unbounded dimensions,
/// a shifted exponential for half-bounded ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace<T> {
    /// The lower bound on the space
    low: T,

    /// The upper bound on the space
    high: T,
}

impl From<(Vec<f32>, Vec<f32>)> for BoxSpace<Vec<f32>> {
    fn from(value: (Vec<f32>, Vec<f32>)) -> Self {
        assert_eq!(
            value.0.len(),
            value.1.len(),
            "low and high must have the same length"
        );

        Self {
            low: value.0,
            high: value.1,
        }
    }
}

fn sample_dim<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    match (low.is_finite(), high.is_finite()) {
        (true, true) => rng.gen_range(low..=high),
        (true, false) => low + rng.sample::<f32, _>(Exp1),
        (false, true) => high - rng.sample::<f32, _>(Exp1),
        (false, false) => rng.sample(StandardNormal),
    }
}

impl Space<Vec<f32>> for BoxSpace<Vec<f32>> {
    fn contains(&self, sample: &Vec<f32>) -> bool {
        if sample.len() != self.low.len() {
            return false;
        }

        sample
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&s, &l), &h)| l <= s && s <= h)
    }

    fn sample(&mut self) -> Vec<f32> {
        with_global_rng(|rng| {
            self.low
                .iter()
                .zip(self.high.iter())
                .map(|(&l, &h)| sample_dim(rng, l, h))
                .collect()
        })
    }

    fn shape(&self) -> Vec<f32> {
        self.low.clone()
    }
}

impl BoxSpace<Vec<f32>> {
    pub fn low(&self) -> &Vec<f32> {
        &self.low
    }

    pub fn high(&self) -> &Vec<f32> {
        &self.high
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }
}

/// A space carrying a label. Every space operation goes to the inner space.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSpace<S> {
    name: String,
    space: S,
}

impl<S> NamedSpace<S> {
    pub fn new(name: impl Into<String>, space: S) -> Self {
        Self {
            name: name.into(),
            space,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &S {
        &self.space
    }
}

impl<T: Clone, S: Space<T> + Clone> Space<T> for NamedSpace<S> {
    fn contains(&self, sample: &T) -> bool {
        self.space.contains(sample)
    }

    fn sample(&mut self) -> T {
        self.space.sample()
    }

    fn shape(&self) -> T {
        self.space.shape()
    }

    fn seed(&mut self, seed: u64) {
        self.space.seed(seed)
    }
}

impl<S: fmt::Debug> fmt::Display for NamedSpace<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedSpace(name={}, space={:?})", self.name, self.space)
    }
}

#[cfg(test)]
mod test {
    use crate::common::spaces::{BoxSpace, Discrete, NamedSpace, Space};

    #[test]
    fn test_discrete_space() {
        let mut space = Discrete::from(2);

        assert_eq!(space.shape(), 2);
        assert!(space.contains(&0));
        assert!(space.contains(&1));
        assert!(!space.contains(&2));

        let sample = space.sample();
        assert!((sample == 0) | (sample == 1))
    }

    #[test]
    fn test_box_f32_space() {
        let low = vec![0.0, -0.1, 0.1];
        let high = vec![1.0, 1.1, 0.9];

        let mut space = BoxSpace::from((low, high));

        assert_eq!(space.shape().len(), 3);

        assert!(space.contains(&vec![0.0, 1.1, 0.3]));
        assert!(!space.contains(&vec![30.0, 1.1, 0.3]));
        assert!(!space.contains(&vec![0.0, 1.1]));

        let sample = space.sample();
        assert!(sample.len() == 3);
        assert!(space.contains(&sample));
    }

    #[test]
    fn test_box_unbounded_sampling() {
        let low = vec![f32::NEG_INFINITY, 5.0, f32::NEG_INFINITY];
        let high = vec![f32::INFINITY, f32::INFINITY, -5.0];
        let mut space = BoxSpace::from((low, high));

        for _ in 0..100 {
            let s = space.sample();
            assert!(s[0].is_finite());
            assert!(s[1] >= 5.0);
            assert!(s[2] <= -5.0);
            assert!(space.contains(&s));
        }
    }

    #[test]
    #[should_panic]
    fn test_box_mismatched_bounds() {
        let _ = BoxSpace::from((vec![0.0, 0.0], vec![1.0]));
    }

    #[test]
    fn test_named_space_delegates() {
        let inner = BoxSpace::from((vec![-1.0, -1.0], vec![1.0, 1.0]));
        let mut named = NamedSpace::new("dimension_xy", inner.clone());

        assert_eq!(named.name(), "dimension_xy");
        assert_eq!(named.space(), &inner);
        assert_eq!(named.shape(), inner.shape());
        assert!(named.contains(&vec![0.5, -0.5]));
        assert!(!named.contains(&vec![2.0, 0.0]));

        let s = named.sample();
        assert!(inner.contains(&s));
    }

    #[test]
    fn test_named_space_display_and_eq() {
        let a = NamedSpace::new("n", Discrete::from(3));
        let b = NamedSpace::new("n", Discrete::from(3));
        let c = NamedSpace::new("m", Discrete::from(3));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "NamedSpace(name=n, space=Discrete { n: 3 })");
    }

    #[test]
    fn test_boxed_space_clones() {
        let space: Box<dyn Space<usize>> = Box::new(NamedSpace::new("d", Discrete::from(4)));
        let cloned = space.clone();

        assert_eq!(cloned.shape(), 4);
    }
}
