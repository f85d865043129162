/// Death-spiral dynamics: one-tick state transitions for an algorithmic
/// stablecoin economy.
///
/// The five update rules are pure functions over f64 state; `simulate_step`
/// composes them in a fixed order so that each later rule sees the
/// already-updated values of earlier ones. That ordering is what couples the
/// feedback loops (reflexive collateral crash -> liquidity flight -> demand
/// panic -> burn failure -> price collapse).
///
/// The core is total: no rule returns an error for any finite input, and
/// every rule clamps its own result into a physically sensible range.
use crate::params::SystemParameters;

/// The five economic quantities at a given tick. All non-negative;
/// price is bounded below by 0.001 after every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemState {
    /// Outstanding stablecoin units
    pub supply: f64,
    /// Market price of one unit, pegged at 1.0
    pub price: f64,
    /// Value of backing assets
    pub collateral: f64,
    /// Market depth available to absorb trades
    pub liquidity: f64,
    /// Aggregate demand driving the clearing price
    pub demand: f64,
}

impl SystemState {
    /// Starting state from the configured initial conditions.
    pub fn initial(params: &SystemParameters) -> Self {
        SystemState {
            supply: params.initial_supply,
            price: params.initial_price,
            collateral: params.initial_collateral,
            liquidity: params.initial_liquidity,
            demand: params.initial_demand,
        }
    }
}

/// Collateral ratio, with supply == 0 treated as fully collateralized.
fn collateral_ratio(collateral: f64, supply: f64) -> f64 {
    if supply > 0.0 {
        collateral / supply
    } else {
        1.0
    }
}

/// Apply an exogenous fractional shock to collateral, then the reflexive
/// crash: a de-pegged stablecoin drags its own backing down (LUNA-UST
/// style), scaled by how far price sits below 0.9.
pub fn update_collateral(collateral: f64, price: f64, shock: f64) -> f64 {
    let mut c = collateral * (1.0 + shock);

    if price < 0.9 {
        let depeg_severity = (0.9 - price) / 0.9;
        c *= 1.0 - depeg_severity * 0.2;
    }

    c.max(0.0)
}

/// Liquidity flees crisis. A small positive drift rewards a stable peg;
/// instability, undercollateralization, and an already-drained pool each
/// subtract flow. The bank-run term is self-reinforcing: low liquidity
/// begets further flight. The exogenous shock applies after the organic
/// flow; the 1% floor holds regardless (a residual market always remains).
pub fn update_liquidity(
    liquidity: f64,
    price: f64,
    supply: f64,
    collateral: f64,
    shock: f64,
    params: &SystemParameters,
) -> f64 {
    let ratio = collateral_ratio(collateral, supply);
    let deviation = (price - 1.0).abs();

    let base_flow = 0.02 * (1.0 - deviation);

    let instability_penalty = if deviation > 0.05 {
        -0.15 * deviation
    } else {
        0.0
    };

    let cr_penalty = if ratio < 1.0 { -0.2 * (1.0 - ratio) } else { 0.0 };

    let liquidity_ratio = if params.initial_liquidity > 0.0 {
        liquidity / params.initial_liquidity
    } else {
        1.0
    };
    let bank_run_penalty = if liquidity_ratio < 0.5 {
        -0.25 * (0.5 - liquidity_ratio)
    } else {
        0.0
    };

    let total_flow = base_flow + instability_penalty + cr_penalty + bank_run_penalty;
    let l = liquidity * (1.0 + total_flow) * (1.0 + shock);

    l.max(params.initial_liquidity * 0.01)
}

/// Demand with panic tipping points. Elastic response to price deviation,
/// plus strictly-negative panic terms: undercollateralization, deep de-peg,
/// and thin liquidity each destroy demand, with discontinuous extra
/// penalties once the collateral ratio or price falls through 0.7.
pub fn update_demand(
    demand: f64,
    price: f64,
    supply: f64,
    collateral: f64,
    liquidity: f64,
    params: &SystemParameters,
) -> f64 {
    let ratio = collateral_ratio(collateral, supply);
    let liquidity_ratio = if params.initial_liquidity > 0.0 {
        liquidity / params.initial_liquidity
    } else {
        1.0
    };

    let price_effect = -params.demand_elasticity * (price - 1.0);

    let mut panic_factor = 0.0;

    if ratio < 1.0 {
        let deficit = 1.0 - ratio;
        panic_factor -= 0.5 * deficit.powf(1.5);
        if ratio < 0.7 {
            panic_factor -= 0.3;
        }
    }

    if price < 0.9 {
        let price_panic = (0.9 - price) / 0.9;
        panic_factor -= 0.4 * price_panic.powf(1.5);
        if price < 0.7 {
            panic_factor -= 0.25;
        }
    }

    if liquidity_ratio < 0.3 {
        panic_factor -= 0.5 * (0.3 - liquidity_ratio) / 0.3;
    }

    let total_change = (price_effect + panic_factor) * demand;
    (demand + total_change).max(params.initial_demand * 0.01)
}

/// Mint above peg, burn below. Minting is liquidity-constrained (capped at
/// 10% of current liquidity). Burning is the defense mechanism, and it is
/// built to fail under stress: effectiveness collapses quadratically with
/// the collateral deficit, takes a falling-knife penalty below price 0.8,
/// and scales with remaining liquidity. Burn capped at 10% of supply.
pub fn update_supply(
    supply: f64,
    price: f64,
    liquidity: f64,
    collateral: f64,
    params: &SystemParameters,
) -> f64 {
    let price_deviation = price - 1.0;
    let ratio = collateral_ratio(collateral, supply);

    if price_deviation > 0.0 {
        let delta_mint = params.mint_coefficient * price_deviation * supply;
        supply + delta_mint.min(liquidity * 0.1)
    } else {
        let mut delta_burn = params.burn_coefficient * price_deviation.abs() * supply;

        let mut effectiveness = if ratio < 1.0 {
            (ratio * ratio).max(0.01)
        } else {
            1.0
        };

        if price < 0.8 {
            effectiveness *= (price / 0.8).powi(2);
        }

        let liquidity_effectiveness = if params.initial_liquidity > 0.0 {
            (liquidity / params.initial_liquidity).min(1.0)
        } else {
            1.0
        };
        effectiveness *= liquidity_effectiveness;

        delta_burn *= effectiveness;
        supply - delta_burn.min(supply * 0.1)
    }
}

/// Market-clearing price with solvency impact. Base price is demand/supply;
/// once the system is known undercollateralized the market prices the coin
/// toward its liquidation value (the collateral ratio) with a panic weight
/// of (1 - ratio)^1.5. Thin liquidity adds quadratic slippage. Floor 0.001
/// so downstream divisions stay defined.
pub fn update_price(
    supply: f64,
    demand: f64,
    liquidity: f64,
    collateral: f64,
    params: &SystemParameters,
) -> f64 {
    if supply <= 0.0 {
        return 1.0;
    }

    let base_price = demand / supply;
    let ratio = collateral / supply;

    let mut price = if ratio < 1.0 {
        let panic_awareness = (1.0 - ratio).powf(1.5);
        base_price * (1.0 - panic_awareness) + ratio * panic_awareness
    } else {
        base_price
    };

    let liquidity_ratio = if params.initial_liquidity > 0.0 {
        liquidity / params.initial_liquidity
    } else {
        1.0
    };
    if liquidity_ratio < 0.5 {
        price *= (liquidity_ratio / 0.5).powi(2);
    }

    price.max(0.001)
}

/// Advance the full state by one tick.
///
/// Order matters: collateral first (the shock and reflexive crash feed every
/// later rule), then liquidity, then demand, then supply, then price. Every
/// rule reads the pre-step price; collateral, liquidity, demand, and supply
/// flow downstream already updated. Deterministic for given inputs — shocks
/// and any randomness behind them belong to the caller.
pub fn simulate_step(
    state: SystemState,
    params: &SystemParameters,
    collateral_shock: f64,
    liquidity_shock: f64,
) -> SystemState {
    let collateral = update_collateral(state.collateral, state.price, collateral_shock);
    let liquidity = update_liquidity(
        state.liquidity,
        state.price,
        state.supply,
        collateral,
        liquidity_shock,
        params,
    );
    let demand = update_demand(
        state.demand,
        state.price,
        state.supply,
        collateral,
        liquidity,
        params,
    );
    let supply = update_supply(state.supply, state.price, liquidity, collateral, params);
    let price = update_price(supply, demand, liquidity, collateral, params);

    SystemState {
        supply,
        price,
        collateral,
        liquidity,
        demand,
    }
}
