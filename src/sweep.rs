use crate::experiment::run_collateral_shock;
use crate::params::SystemParameters;

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// A parameter to sweep over.
#[derive(Debug, Clone)]
pub struct SweepParam {
    pub name: String,
    pub values: Vec<f64>,
}

impl SweepParam {
    /// Evenly spaced grid over [min, max].
    pub fn linspace(name: &str, min: f64, max: f64, n: usize) -> Self {
        let values = if n <= 1 {
            vec![min]
        } else {
            (0..n)
                .map(|i| min + (max - min) * i as f64 / (n - 1) as f64)
                .collect()
        };
        SweepParam {
            name: name.to_string(),
            values,
        }
    }
}

/// Aggregated Monte Carlo statistics for one parameter combination.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub params: Vec<(String, f64)>,
    /// Fraction of trials whose price crossed the collapse threshold
    pub collapse_probability: f64,
    /// Mean time-to-collapse over collapsing trials (0.0 when none collapsed)
    pub mean_time_to_collapse: f64,
    pub mean_max_drawdown: f64,
    pub mean_peg_deviation: f64,
}

/// Engine that estimates collapse-probability surfaces over a parameter
/// grid. Cells run in parallel; the trials inside a cell are a strictly
/// sequential fold, matching the step-to-step dependency of the core.
pub struct SweepEngine {
    pub base: SystemParameters,
    pub n_steps: usize,
    pub trials: usize,
    pub seed: u64,
    /// Draw range for randomized collateral shock magnitude
    pub shock_range: (f64, f64),
    /// Draw range for randomized shock tick
    pub shock_tick_range: (usize, usize),
    /// Show an indicatif progress bar while sweeping (CLI use; off in tests)
    pub progress: bool,
}

impl SweepEngine {
    pub fn new(base: SystemParameters, n_steps: usize, trials: usize, seed: u64) -> Self {
        SweepEngine {
            base,
            n_steps,
            trials,
            seed,
            shock_range: (-0.5, -0.2),
            shock_tick_range: (50, 150),
            progress: false,
        }
    }

    /// Generate all parameter combinations (cartesian product).
    fn cartesian_product(params: &[SweepParam]) -> Vec<Vec<(String, f64)>> {
        if params.is_empty() {
            return vec![vec![]];
        }

        let rest = Self::cartesian_product(&params[1..]);
        let mut result = Vec::new();

        for val in &params[0].values {
            for combo in &rest {
                let mut new_combo = vec![(params[0].name.clone(), *val)];
                new_combo.extend(combo.iter().cloned());
                result.push(new_combo);
            }
        }
        result
    }

    /// Evaluate one parameter combination over `trials` randomized shocks.
    ///
    /// Trial t draws its shock magnitude and tick from a generator seeded
    /// with `seed + t`, so every cell faces the identical shock sequence and
    /// cells differ only by their parameters.
    fn evaluate_cell(&self, combo: &[(String, f64)]) -> SweepResult {
        // Copy-then-override: un-swept fields keep the caller's base values.
        let mut params = self.base.clone();
        for (name, val) in combo {
            params.set(name, *val);
        }

        let mut collapses = 0usize;
        let mut ttc_sum = 0.0;
        let mut drawdown_sum = 0.0;
        let mut deviation_sum = 0.0;

        for trial in 0..self.trials {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(trial as u64));
            let (lo, hi) = self.shock_range;
            let shock_magnitude = rng.gen_range(lo..hi);
            let (tick_lo, tick_hi) = self.shock_tick_range;
            let shock_tick = rng.gen_range(tick_lo..tick_hi);

            let result = run_collateral_shock(shock_magnitude, shock_tick, &params, self.n_steps);

            if let Some(ttc) = result.time_to_collapse {
                collapses += 1;
                ttc_sum += ttc;
            }
            drawdown_sum += result.max_drawdown;
            deviation_sum += result.peg_deviation_integral;
        }

        SweepResult {
            params: combo.to_vec(),
            collapse_probability: collapses as f64 / self.trials as f64,
            // Guarded denominator: zero collapsing trials must not divide by zero
            mean_time_to_collapse: ttc_sum / collapses.max(1) as f64,
            mean_max_drawdown: drawdown_sum / self.trials as f64,
            mean_peg_deviation: deviation_sum / self.trials as f64,
        }
    }

    /// Run the full grid. Results come back in grid order (cartesian product
    /// order of the given params), independent of scheduling.
    pub fn run_grid(&self, params: &[SweepParam]) -> Vec<SweepResult> {
        let combos = Self::cartesian_product(params);

        let bar = if self.progress {
            Some(ProgressBar::new(combos.len() as u64))
        } else {
            None
        };

        let results: Vec<SweepResult> = combos
            .par_iter()
            .map(|combo| {
                let result = self.evaluate_cell(combo);
                if let Some(bar) = &bar {
                    bar.inc(1);
                }
                result
            })
            .collect();

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }
        results
    }

    /// Order results safest-first: ascending collapse probability, ties
    /// broken by mean peg deviation.
    pub fn sort_results(results: &mut [SweepResult]) {
        results.sort_by(|a, b| {
            (a.collapse_probability, a.mean_peg_deviation)
                .partial_cmp(&(b.collapse_probability, b.mean_peg_deviation))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
