use crate::experiment::ExperimentResult;
use crate::params::SystemParameters;
use crate::sweep::SweepResult;

use serde::Serialize;
use std::path::Path;

/// Scalar summary of a run, serialized to JSON alongside the time series.
#[derive(Debug, Serialize)]
pub struct ExperimentSummary {
    pub n_steps: usize,
    pub peg_deviation_integral: f64,
    /// None serializes as null: the run never collapsed
    pub time_to_collapse: Option<f64>,
    pub max_drawdown: f64,
    pub collapsed: bool,
    pub recovered: bool,
    pub min_price: f64,
    pub final_price: f64,
}

impl ExperimentSummary {
    pub fn from_result(result: &ExperimentResult) -> Self {
        ExperimentSummary {
            n_steps: result.time.len(),
            peg_deviation_integral: result.peg_deviation_integral,
            time_to_collapse: result.time_to_collapse,
            max_drawdown: result.max_drawdown,
            collapsed: result.collapsed(),
            recovered: result.recovered,
            min_price: result.min_price(),
            final_price: result.final_price(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Export the five state series to CSV.
pub fn save_timeseries_csv(
    result: &ExperimentResult,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["time", "supply", "price", "collateral", "liquidity", "demand"])?;

    for i in 0..result.time.len() {
        wtr.write_record(&[
            format!("{:.4}", result.time[i]),
            format!("{:.2}", result.supply[i]),
            format!("{:.6}", result.price[i]),
            format!("{:.2}", result.collateral[i]),
            format!("{:.2}", result.liquidity[i]),
            format!("{:.2}", result.demand[i]),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the scalar summary to JSON.
pub fn save_summary_json(
    result: &ExperimentResult,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent(path)?;
    let summary = ExperimentSummary::from_result(result);
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Save the parameter bundle to TOML.
pub fn save_params_toml(
    params: &SystemParameters,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent(path)?;
    let toml = toml::to_string_pretty(params)?;
    std::fs::write(path, toml)?;
    Ok(())
}

/// Save sweep results to CSV: one row per grid cell, swept parameters first.
pub fn save_sweep_csv(
    results: &[SweepResult],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;

    if let Some(first) = results.first() {
        let mut header: Vec<String> = first.params.iter().map(|(n, _)| n.clone()).collect();
        header.extend(
            [
                "collapse_probability",
                "mean_time_to_collapse",
                "mean_max_drawdown",
                "mean_peg_deviation",
            ]
            .map(String::from),
        );
        wtr.write_record(&header)?;
    }

    for r in results {
        let mut row: Vec<String> = r.params.iter().map(|(_, v)| format!("{:.6}", v)).collect();
        row.push(format!("{:.4}", r.collapse_probability));
        row.push(format!("{:.4}", r.mean_time_to_collapse));
        row.push(format!("{:.6}", r.mean_max_drawdown));
        row.push(format!("{:.6}", r.mean_peg_deviation));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Save all artifacts for a run into a directory:
/// timeseries.csv, summary.json, params.toml.
pub fn save_all(
    result: &ExperimentResult,
    params: &SystemParameters,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output_dir)?;

    save_timeseries_csv(result, &output_dir.join("timeseries.csv"))?;
    save_summary_json(result, &output_dir.join("summary.json"))?;
    save_params_toml(params, &output_dir.join("params.toml"))?;

    Ok(())
}
