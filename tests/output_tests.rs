use depeg_sim::experiment::run_collateral_shock;
use depeg_sim::output::{
    save_all, save_summary_json, save_sweep_csv, save_timeseries_csv, ExperimentSummary,
};
use depeg_sim::params::SystemParameters;
use depeg_sim::sweep::{SweepEngine, SweepParam};

use std::path::PathBuf;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("depeg-sim-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn summary_reflects_run_metrics() {
    let params = SystemParameters::default();
    let result = run_collateral_shock(-0.5, 0, &params, 150);
    let summary = ExperimentSummary::from_result(&result);

    assert_eq!(summary.n_steps, 150);
    assert!(summary.collapsed);
    assert!(!summary.recovered);
    assert!(summary.time_to_collapse.is_some());
    assert!(summary.min_price <= summary.final_price);
}

#[test]
fn timeseries_csv_has_header_and_rows() {
    let params = SystemParameters::default();
    let result = run_collateral_shock(-0.3, 5, &params, 20);
    let dir = temp_dir("timeseries");
    let path = dir.join("timeseries.csv");

    save_timeseries_csv(&result, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "time,supply,price,collateral,liquidity,demand"
    );
    assert_eq!(lines.count(), 20);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn summary_json_is_valid_and_nullable() {
    let params = SystemParameters::default();
    let result = run_collateral_shock(0.0, 0, &params, 50);
    let dir = temp_dir("summary");
    let path = dir.join("summary.json");

    save_summary_json(&result, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    // Never collapsed: time_to_collapse serializes as null
    assert!(value["time_to_collapse"].is_null());
    assert_eq!(value["collapsed"], serde_json::json!(false));
    assert_eq!(value["n_steps"], serde_json::json!(50));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn save_all_writes_the_bundle() {
    let params = SystemParameters::default();
    let result = run_collateral_shock(-0.4, 10, &params, 100);
    let dir = temp_dir("bundle");

    save_all(&result, &params, &dir).unwrap();

    assert!(dir.join("timeseries.csv").exists());
    assert!(dir.join("summary.json").exists());
    assert!(dir.join("params.toml").exists());

    // The params artifact round-trips through toml
    let text = std::fs::read_to_string(dir.join("params.toml")).unwrap();
    let back: SystemParameters = toml::from_str(&text).unwrap();
    assert_eq!(back, params);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn sweep_csv_lists_params_then_aggregates() {
    let engine = SweepEngine::new(SystemParameters::default(), 150, 2, 42);
    let results = engine.run_grid(&[
        SweepParam::linspace("demand_elasticity", 0.1, 1.0, 2),
        SweepParam::linspace("mint_coefficient", 0.05, 0.2, 2),
    ]);

    let dir = temp_dir("sweep");
    let path = dir.join("sweep_results.csv");
    save_sweep_csv(&results, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "demand_elasticity,mint_coefficient,collapse_probability,\
         mean_time_to_collapse,mean_max_drawdown,mean_peg_deviation"
    );
    assert_eq!(lines.count(), 4);

    std::fs::remove_dir_all(&dir).unwrap();
}
