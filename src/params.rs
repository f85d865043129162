use serde::{Deserialize, Serialize};

/// Configuration for the stablecoin economy. Constructed once per
/// experiment and never mutated during a run; sweep drivers clone a base
/// bundle and override individual fields so un-swept fields are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParameters {
    /// Minting response to price above peg (fraction of supply per unit deviation)
    pub mint_coefficient: f64,
    /// Burning response to price below peg
    pub burn_coefficient: f64,
    /// Sensitivity of demand to price deviation
    pub demand_elasticity: f64,

    // Initial conditions
    pub initial_supply: f64,
    pub initial_price: f64,
    pub initial_collateral: f64,
    pub initial_liquidity: f64,
    pub initial_demand: f64,

    /// Nominal time-step size; scales the reported time axis, not the update math
    pub dt: f64,
    /// Base seed for shock randomization in drivers; the core consumes no randomness
    pub random_seed: u64,

    /// Price below which the system counts as collapsed
    pub collapse_price_threshold: f64,
    /// Price a collapsed system must regain to count as recovered
    pub recovery_price_threshold: f64,
}

impl Default for SystemParameters {
    fn default() -> Self {
        SystemParameters {
            mint_coefficient: 0.1,
            burn_coefficient: 0.1,
            demand_elasticity: 0.5,
            initial_supply: 1e6,
            initial_price: 1.0,
            initial_collateral: 1.5e6,
            initial_liquidity: 1e6,
            initial_demand: 1e6,
            dt: 0.1,
            random_seed: 42,
            collapse_price_threshold: 0.5,
            recovery_price_threshold: 0.95,
        }
    }
}

impl SystemParameters {
    /// Override a numeric field by name. Returns false for unknown names.
    /// Used by the sweep engine so parameter grids can be declared as
    /// (name, values) pairs.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "mint_coefficient" => self.mint_coefficient = value,
            "burn_coefficient" => self.burn_coefficient = value,
            "demand_elasticity" => self.demand_elasticity = value,
            "initial_supply" => self.initial_supply = value,
            "initial_price" => self.initial_price = value,
            "initial_collateral" => self.initial_collateral = value,
            "initial_liquidity" => self.initial_liquidity = value,
            "initial_demand" => self.initial_demand = value,
            "dt" => self.dt = value,
            "collapse_price_threshold" => self.collapse_price_threshold = value,
            "recovery_price_threshold" => self.recovery_price_threshold = value,
            _ => return false,
        }
        true
    }
}
