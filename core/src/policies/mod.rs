//! Concrete routing policies exercising the [`Policy`](crate::traits::Policy)
//! boundary: a static shortest-path baseline, Q-routing, policy-gradient
//! hybrids and backpressure scheduling.

use rand::rngs::StdRng;
use rand::Rng;

pub mod backpressure;
pub mod hybrid;
pub mod ma_hybrid;
pub mod qroute;
pub mod shortest;

pub use backpressure::Backpressure;
pub use hybrid::HybridQ;
pub use ma_hybrid::MaHybridQ;
pub use qroute::QRoute;
pub use shortest::Shortest;

/// Softmax over a preference vector. Shifted by the maximum for numeric
/// stability; the result sums to one.
pub fn softmax(theta: &[f64]) -> Vec<f64> {
    let max = theta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = theta.iter().map(|t| (t - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Gradient of `log softmax(theta)[action]` with respect to `theta`.
pub fn softmax_gradient(theta: &[f64], action: usize) -> Vec<f64> {
    let mut grad: Vec<f64> = softmax(theta).into_iter().map(|p| -p).collect();
    grad[action] += 1.0;
    grad
}

/// Sample an index with probability proportional to `softmax(theta)`.
pub fn softmax_sample(theta: &[f64], rng: &mut StdRng) -> usize {
    let probs = softmax(theta);
    let roll: f64 = rng.gen();
    let mut acc = 0.0;
    for (i, p) in probs.iter().enumerate() {
        acc += p;
        if roll < acc {
            return i;
        }
    }
    probs.len() - 1
}

/// Uniformly pick one of the indices achieving the maximum value, using the
/// run's single generator so tie-breaks replay deterministically.
pub fn argmax_random_tie(values: &[f64], rng: &mut StdRng) -> usize {
    let mut best = f64::NEG_INFINITY;
    let mut candidates: Vec<usize> = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v > best {
            best = v;
            candidates.clear();
            candidates.push(i);
        } else if v == best {
            candidates.push(i);
        }
    }
    candidates[rng.gen_range(0..candidates.len())]
}
