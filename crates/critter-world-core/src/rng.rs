use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Exponential Luce choice: index `i` is drawn with probability proportional
/// to `exp(exploitation * values[i])`.
///
/// Weights are shifted by the maximum value before exponentiation so large
/// products cannot overflow. Falls back to a uniform draw when the weights are
/// unusable (non-finite inputs). `values` must not be empty.
pub fn luce_choice<R: Rng + ?Sized>(values: &[f64], exploitation: f64, rng: &mut R) -> usize {
    assert!(!values.is_empty(), "luce_choice needs at least one option");
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = values
        .iter()
        .map(|&v| (exploitation * (v - max)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return rng.random_range(0..values.len());
    }

    let mut threshold = rng.random::<f64>() * total;
    for (idx, &w) in weights.iter().enumerate() {
        if threshold < w {
            return idx;
        }
        threshold -= w;
    }
    // Rounding can leave a sliver past the last bucket; give it to the last
    // option that carries weight.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_exploitation_is_roughly_uniform() {
        let mut rng = create_rng(7);
        let mut counts = [0usize; 4];
        for _ in 0..40_000 {
            counts[luce_choice(&[5.0, -3.0, 0.0, 100.0], 0.0, &mut rng)] += 1;
        }
        for c in counts {
            assert!((9_000..11_000).contains(&c), "counts {counts:?}");
        }
    }

    #[test]
    fn higher_value_is_preferred() {
        let mut rng = create_rng(11);
        let mut best = 0usize;
        for _ in 0..10_000 {
            if luce_choice(&[0.0, 1.0], 2.0, &mut rng) == 1 {
                best += 1;
            }
        }
        // exp(2) / (1 + exp(2)) ~= 0.88
        assert!((8_500..9_100).contains(&best), "best {best}");
    }

    #[test]
    fn huge_products_do_not_overflow() {
        let mut rng = create_rng(3);
        for _ in 0..100 {
            assert_eq!(luce_choice(&[1e300, -1e300, 0.0], 1e10, &mut rng), 0);
        }
    }

    #[test]
    fn extreme_gap_is_deterministic() {
        let mut rng = create_rng(5);
        for _ in 0..1000 {
            assert_eq!(luce_choice(&[0.0, 0.0, 0.0, 100.0], 10.0, &mut rng), 3);
        }
    }

    #[test]
    fn non_finite_values_fall_back_to_uniform() {
        let mut rng = create_rng(9);
        let idx = luce_choice(&[f64::NAN, 1.0], 1.0, &mut rng);
        assert!(idx < 2);
    }

    #[test]
    fn same_seed_same_choices() {
        let mut a = create_rng(42);
        let mut b = create_rng(42);
        let qs = [0.3, -0.2, 0.9, 0.1];
        for _ in 0..100 {
            assert_eq!(luce_choice(&qs, 1.5, &mut a), luce_choice(&qs, 1.5, &mut b));
        }
    }

    proptest! {
        #[test]
        fn choice_is_always_a_valid_index(
            values in proptest::collection::vec(-1e6f64..1e6, 1..8),
            exploitation in 0.0f64..100.0,
            seed in any::<u64>(),
        ) {
            let mut rng = create_rng(seed);
            for _ in 0..16 {
                let idx = luce_choice(&values, exploitation, &mut rng);
                prop_assert!(idx < values.len(), "{idx} out of {}", values.len());
            }
        }
    }
}
