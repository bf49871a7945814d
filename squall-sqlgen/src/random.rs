use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Helper for the RNG-related tasks the samplers need.
///
/// All sampling methods take deterministically-ordered slices so that a
/// fixed seed always reproduces the same decisions.
#[derive(Debug)]
pub struct Randomizer {
    rng: StdRng,
}

impl Randomizer {
    /// Creates a randomizer from the given seed, or from OS entropy when
    /// no seed is provided.
    pub fn new(seed: Option<u64>) -> Randomizer {
        Randomizer {
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }

    /// Returns `true` with probability `p`.
    ///
    /// `p` is validated by the sampler configs before it ever gets here.
    pub fn flip(&mut self, p: f64) -> bool {
        debug_assert!((0.0..=1.0).contains(&p));
        self.rng.gen::<f64>() < p
    }

    /// A uniformly random integer from the closed interval `[low, high]`.
    pub fn rand_range_inclusive(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..=high)
    }

    /// Chooses one element uniformly at random.
    ///
    /// Panics if `items` is empty; callers check emptiness first.
    pub fn choose_one<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.gen_range(0..items.len())]
    }

    /// Chooses one element with the given discrete distribution.
    ///
    /// Panics if the weights are not a valid distribution; sampler configs
    /// validate them at construction.
    pub fn choose_one_weighted<'a, T>(&mut self, items: &'a [T], weights: &[f64]) -> &'a T {
        debug_assert_eq!(items.len(), weights.len());
        let dist = WeightedIndex::new(weights).expect("weights form a valid distribution");
        &items[dist.sample(&mut self.rng)]
    }

    /// Chooses `size` elements uniformly at random without replacement,
    /// in draw order.
    ///
    /// Panics if `size > items.len()`.
    pub fn choose<'a, T>(&mut self, items: &'a [T], size: usize) -> Vec<&'a T> {
        rand::seq::index::sample(&mut self.rng, items.len(), size)
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }

    /// Chooses `size` elements without replacement with the given discrete
    /// distribution, in draw order.
    ///
    /// Panics if `size > items.len()` or if the weights are not a valid
    /// distribution.
    pub fn choose_weighted<'a, T>(
        &mut self,
        items: &'a [T],
        size: usize,
        weights: &[f64],
    ) -> Vec<&'a T> {
        debug_assert_eq!(items.len(), weights.len());
        debug_assert!(size <= items.len());

        let mut remaining_indexes: Vec<usize> = (0..items.len()).collect();
        let mut remaining_weights: Vec<f64> = weights.to_vec();
        let mut chosen = Vec::with_capacity(size);

        for _ in 0..size {
            let dist = WeightedIndex::new(&remaining_weights)
                .expect("weights form a valid distribution");
            let position = dist.sample(&mut self.rng);
            chosen.push(&items[remaining_indexes[position]]);
            remaining_indexes.remove(position);
            remaining_weights.remove(position);
        }

        chosen
    }
}
