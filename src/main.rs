use clap::{Parser, Subcommand};
use std::path::PathBuf;

use depeg_sim::experiment::{run_collateral_shock, run_liquidity_crisis};
use depeg_sim::output;
use depeg_sim::params::SystemParameters;
use depeg_sim::report;
use depeg_sim::scenarios::{self, ScenarioId};
use depeg_sim::sweep::{SweepEngine, SweepParam};

#[derive(Parser)]
#[command(name = "depeg-sim", about = "Algorithmic stablecoin death-spiral simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named stress scenario (1-5, or 0 for all)
    Stress {
        /// Scenario ID (1-5) or 0 for all
        #[arg(long)]
        id: u8,

        /// Number of simulation steps
        #[arg(long, default_value = "1000")]
        steps: usize,

        /// Std-dev of per-tick shock noise (0 = deterministic schedule)
        #[arg(long, default_value = "0.0")]
        noise_sigma: f64,

        /// Random seed for shock noise
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory
        #[arg(long, default_value = "output/stress")]
        output_dir: String,

        /// Optional TOML file with parameter overrides
        #[arg(long)]
        config: Option<String>,
    },

    /// Run a single shock experiment
    Shock {
        /// Fractional shock magnitude (e.g. -0.4 for a 40% drop)
        #[arg(long, default_value = "-0.4", allow_hyphen_values = true)]
        magnitude: f64,

        /// Tick at which the shock lands
        #[arg(long, default_value = "100")]
        tick: usize,

        /// Number of simulation steps
        #[arg(long, default_value = "1000")]
        steps: usize,

        /// Shock liquidity instead of collateral
        #[arg(long)]
        liquidity: bool,

        /// Output directory
        #[arg(long, default_value = "output/shock")]
        output_dir: String,

        /// Optional TOML file with parameter overrides
        #[arg(long)]
        config: Option<String>,
    },

    /// Run a Monte Carlo parameter sweep
    Sweep {
        /// Parameter range as name=min:max (repeatable)
        #[arg(long = "param", required = true)]
        params: Vec<String>,

        /// Grid points per parameter
        #[arg(long, default_value = "10")]
        grid: usize,

        /// Randomized shock trials per grid cell
        #[arg(long, default_value = "10")]
        trials: usize,

        /// Number of simulation steps per trial
        #[arg(long, default_value = "500")]
        steps: usize,

        /// Random seed for shock draws
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory
        #[arg(long, default_value = "output/sweep")]
        output_dir: String,

        /// Optional TOML file with base parameter overrides
        #[arg(long)]
        config: Option<String>,
    },
}

fn load_params(config: Option<&str>) -> Result<SystemParameters, Box<dyn std::error::Error>> {
    match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        }
        None => Ok(SystemParameters::default()),
    }
}

fn id_to_scenario(id: u8) -> Option<ScenarioId> {
    match id {
        1 => Some(ScenarioId::SteadyState),
        2 => Some(ScenarioId::CollateralCrash),
        3 => Some(ScenarioId::LiquidityRugPull),
        4 => Some(ScenarioId::CombinedStress),
        5 => Some(ScenarioId::SlowBleed),
        _ => None,
    }
}

fn run_stress_scenario(
    sid: ScenarioId,
    params: &SystemParameters,
    steps: usize,
    noise_sigma: f64,
    seed: u64,
    output_dir: &str,
) {
    println!(
        "  [{:>2}] {} — {}",
        sid as u8,
        sid.name(),
        sid.description()
    );

    let result = scenarios::run_scenario(sid, params, steps, noise_sigma, seed);

    let dir = PathBuf::from(output_dir).join(sid.name());
    if let Err(e) = output::save_all(&result, params, &dir) {
        eprintln!("       Error saving artifacts: {}", e);
    }

    let html = report::generate_report(&result, params, sid.name());
    let html_path = PathBuf::from(output_dir).join(format!("{}.html", sid.name()));
    if let Err(e) = report::save_report(&html, &html_path) {
        eprintln!("       Error saving report: {}", e);
    }

    let assessment = report::evaluate_run(&result, params);
    println!(
        "       [{}] steps={}, peg_dev={:.4}, drawdown={:.4}, final_price={:.4} -> {}",
        assessment.verdict.label(),
        result.time.len(),
        result.peg_deviation_integral,
        result.max_drawdown,
        result.final_price(),
        dir.display()
    );
}

/// Parse "name=min:max" into a linspace sweep parameter.
fn parse_sweep_param(spec: &str, grid: usize) -> Result<SweepParam, String> {
    let (name, range) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected name=min:max, got '{}'", spec))?;
    let (min, max) = range
        .split_once(':')
        .ok_or_else(|| format!("expected name=min:max, got '{}'", spec))?;
    let min: f64 = min
        .parse()
        .map_err(|_| format!("invalid number '{}' in '{}'", min, spec))?;
    let max: f64 = max
        .parse()
        .map_err(|_| format!("invalid number '{}' in '{}'", max, spec))?;

    let mut probe = SystemParameters::default();
    if !probe.set(name, min) {
        return Err(format!("unknown parameter '{}'", name));
    }

    Ok(SweepParam::linspace(name, min, max, grid))
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stress {
            id,
            steps,
            noise_sigma,
            seed,
            output_dir,
            config,
        } => {
            let params = match load_params(config.as_deref()) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return;
                }
            };

            if id == 0 {
                println!("Running all stress scenarios ({} steps each):", steps);
                for sid in ScenarioId::all() {
                    run_stress_scenario(sid, &params, steps, noise_sigma, seed, &output_dir);
                }
            } else {
                match id_to_scenario(id) {
                    Some(sid) => {
                        println!("Running stress scenario ({} steps):", steps);
                        run_stress_scenario(sid, &params, steps, noise_sigma, seed, &output_dir);
                    }
                    None => eprintln!("Invalid scenario ID: {} (must be 1-5)", id),
                }
            }
        }

        Commands::Shock {
            magnitude,
            tick,
            steps,
            liquidity,
            output_dir,
            config,
        } => {
            let params = match load_params(config.as_deref()) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return;
                }
            };

            let kind = if liquidity { "liquidity" } else { "collateral" };
            println!(
                "Running {} shock: magnitude={:.2} at tick {} over {} steps",
                kind, magnitude, tick, steps
            );

            let result = if liquidity {
                run_liquidity_crisis(magnitude, tick, &params, steps)
            } else {
                run_collateral_shock(magnitude, tick, &params, steps)
            };

            println!("Peg Deviation Integral: {:.4}", result.peg_deviation_integral);
            match result.time_to_collapse {
                Some(t) => println!("Time to Collapse: {:.2}", t),
                None => println!("Time to Collapse: never"),
            }
            println!("Max Drawdown: {:.4}", result.max_drawdown);
            println!("Recovered: {}", result.recovered);

            let dir = PathBuf::from(&output_dir);
            match output::save_all(&result, &params, &dir) {
                Ok(()) => println!("Saved artifacts to {}", dir.display()),
                Err(e) => eprintln!("Error saving artifacts: {}", e),
            }

            let html = report::generate_report(&result, &params, &format!("{}_shock", kind));
            match report::save_report(&html, &dir.join("report.html")) {
                Ok(()) => {}
                Err(e) => eprintln!("Error saving report: {}", e),
            }
        }

        Commands::Sweep {
            params: param_specs,
            grid,
            trials,
            steps,
            seed,
            output_dir,
            config,
        } => {
            let base = match load_params(config.as_deref()) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return;
                }
            };

            let mut sweep_params = Vec::new();
            for spec in &param_specs {
                match parse_sweep_param(spec, grid) {
                    Ok(p) => sweep_params.push(p),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return;
                    }
                }
            }

            let cells: usize = sweep_params.iter().map(|p| p.values.len()).product();
            println!(
                "Sweeping {} cells × {} trials ({} steps each)...",
                cells, trials, steps
            );

            let mut engine = SweepEngine::new(base, steps, trials, seed);
            engine.progress = true;
            let mut results = engine.run_grid(&sweep_params);
            SweepEngine::sort_results(&mut results);

            let out_path = PathBuf::from(&output_dir).join("sweep_results.csv");
            match output::save_sweep_csv(&results, &out_path) {
                Ok(()) => println!("Saved sweep results to {}", out_path.display()),
                Err(e) => eprintln!("Error saving results: {}", e),
            }

            println!("\nSafest configurations:");
            for (i, r) in results.iter().take(3).enumerate() {
                let params_str: Vec<String> = r
                    .params
                    .iter()
                    .map(|(n, v)| format!("{}={:.4}", n, v))
                    .collect();
                println!(
                    "  #{}: collapse_prob={:.3}, peg_dev={:.4} [{}]",
                    i + 1,
                    r.collapse_probability,
                    r.mean_peg_deviation,
                    params_str.join(", ")
                );
            }
        }
    }
}
