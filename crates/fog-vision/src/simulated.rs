use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

/// Display range the placeholder metrics are drawn from.
pub const SIMULATED_RANGE: (f64, f64) = (0.89, 0.98);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub iou: f64,
}

/// Source of the dashboard's performance numbers.
///
/// The seam exists so a real evaluator can replace the mock provider without
/// touching rendering or session code.
pub trait PerformanceSource {
    fn sample(&mut self) -> PerformanceMetrics;
}

/// Mock provider: independent uniform draws in [0.89, 0.98].
///
/// These are demo stand-in values with no relationship to actual detection
/// quality; there is no ground truth to evaluate against.
#[derive(Debug, Clone)]
pub struct SimulatedPerformance {
    rng: StdRng,
}

impl SimulatedPerformance {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl PerformanceSource for SimulatedPerformance {
    fn sample(&mut self) -> PerformanceMetrics {
        let (lo, hi) = SIMULATED_RANGE;
        let mut draw = || self.rng.gen_range(lo..=hi);
        PerformanceMetrics {
            accuracy: draw(),
            precision: draw(),
            recall: draw(),
            f1_score: draw(),
            iou: draw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        let mut src = SimulatedPerformance::seeded(7);
        for _ in 0..200 {
            let m = src.sample();
            for v in [m.accuracy, m.precision, m.recall, m.f1_score, m.iou] {
                assert!((SIMULATED_RANGE.0..=SIMULATED_RANGE.1).contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn draws_are_independent_per_field() {
        let mut src = SimulatedPerformance::seeded(7);
        let m = src.sample();
        // Five independent draws are overwhelmingly unlikely to collide.
        assert!(m.accuracy != m.precision || m.recall != m.iou);
    }

    #[test]
    fn seeded_source_is_deterministic() {
        let a = SimulatedPerformance::seeded(42).sample();
        let b = SimulatedPerformance::seeded(42).sample();
        assert_eq!(a, b);
    }
}
