use crate::experiment::{apply_shock_noise, run_with_shocks, ExperimentResult};
use crate::params::SystemParameters;

/// Identifier for each named stress scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScenarioId {
    SteadyState = 1,
    CollateralCrash = 2,
    LiquidityRugPull = 3,
    CombinedStress = 4,
    SlowBleed = 5,
}

impl ScenarioId {
    pub fn all() -> Vec<ScenarioId> {
        use ScenarioId::*;
        vec![
            SteadyState,
            CollateralCrash,
            LiquidityRugPull,
            CombinedStress,
            SlowBleed,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SteadyState => "steady_state",
            Self::CollateralCrash => "collateral_crash",
            Self::LiquidityRugPull => "liquidity_rug_pull",
            Self::CombinedStress => "combined_stress",
            Self::SlowBleed => "slow_bleed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SteadyState => "No shocks, baseline peg behavior",
            Self::CollateralCrash => "Sudden 40% collateral drop",
            Self::LiquidityRugPull => "90% of market liquidity withdrawn at once",
            Self::CombinedStress => "Collateral drop followed by a liquidity dry-up",
            Self::SlowBleed => "Collateral eroding 1% per tick for 50 ticks",
        }
    }
}

/// Build the per-tick (collateral, liquidity) shock schedules for a scenario.
pub fn shock_schedule(id: ScenarioId, n_steps: usize) -> (Vec<f64>, Vec<f64>) {
    let mut collateral = vec![0.0; n_steps];
    let mut liquidity = vec![0.0; n_steps];
    let early = n_steps / 10;

    match id {
        ScenarioId::SteadyState => {}
        ScenarioId::CollateralCrash => {
            if early < n_steps {
                collateral[early] = -0.4;
            }
        }
        ScenarioId::LiquidityRugPull => {
            if early < n_steps {
                liquidity[early] = -0.9;
            }
        }
        ScenarioId::CombinedStress => {
            let second = n_steps / 5;
            if early < n_steps {
                collateral[early] = -0.3;
            }
            if second < n_steps {
                liquidity[second] = -0.5;
            }
        }
        ScenarioId::SlowBleed => {
            for t in early..(early + 50).min(n_steps) {
                collateral[t] = -0.01;
            }
        }
    }

    (collateral, liquidity)
}

/// Build and run a complete stress scenario. `noise_sigma > 0` adds seeded
/// Normal jitter to both shock schedules; the seed is threaded explicitly so
/// two runs with the same inputs are identical.
pub fn run_scenario(
    id: ScenarioId,
    params: &SystemParameters,
    n_steps: usize,
    noise_sigma: f64,
    seed: u64,
) -> ExperimentResult {
    let (mut collateral_shocks, mut liquidity_shocks) = shock_schedule(id, n_steps);
    if noise_sigma > 0.0 {
        apply_shock_noise(&mut collateral_shocks, noise_sigma, seed);
        apply_shock_noise(&mut liquidity_shocks, noise_sigma, seed.wrapping_add(1));
    }
    run_with_shocks(params, &collateral_shocks, &liquidity_shocks)
}
