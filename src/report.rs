use crate::experiment::ExperimentResult;
use crate::output::ExperimentSummary;
use crate::params::SystemParameters;

use std::path::Path;

/// Overall verdict for a completed run.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Peg held throughout
    Stable,
    /// Meaningful de-peg without crossing the collapse threshold,
    /// or a collapse that later recovered
    Depegged,
    /// Crossed the collapse threshold and never recovered
    Collapsed,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Depegged => "DEPEGGED",
            Self::Collapsed => "COLLAPSED",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Depegged => "depegged",
            Self::Collapsed => "collapsed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CriterionResult {
    pub name: String,
    pub passed: bool,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct RunAssessment {
    pub verdict: Verdict,
    pub criteria: Vec<CriterionResult>,
}

const MAX_ACCEPTABLE_DRAWDOWN: f64 = 0.1;
const MAX_ACCEPTABLE_MEAN_DEVIATION: f64 = 0.02;

/// Time-averaged |price - 1| over the run; 0.0 for runs too short to span
/// any time.
fn mean_peg_deviation(result: &ExperimentResult) -> f64 {
    let duration = match (result.time.first(), result.time.last()) {
        (Some(first), Some(last)) if last > first => last - first,
        _ => return 0.0,
    };
    result.peg_deviation_integral / duration
}

/// Evaluate a finished run against the configured thresholds.
pub fn evaluate_run(result: &ExperimentResult, params: &SystemParameters) -> RunAssessment {
    let mut criteria = Vec::new();

    let collapsed = result.collapsed();
    criteria.push(CriterionResult {
        name: "no_collapse".to_string(),
        passed: !collapsed,
        details: match result.time_to_collapse {
            Some(t) => format!(
                "price crossed {:.2} at t={:.1}",
                params.collapse_price_threshold, t
            ),
            None => format!("price never crossed {:.2}", params.collapse_price_threshold),
        },
    });

    criteria.push(CriterionResult {
        name: "recovered".to_string(),
        passed: result.recovered,
        details: if collapsed {
            format!(
                "post-collapse price {} {:.2}",
                if result.recovered {
                    "regained"
                } else {
                    "never regained"
                },
                params.recovery_price_threshold
            )
        } else {
            "not applicable (never collapsed)".to_string()
        },
    });

    criteria.push(CriterionResult {
        name: "drawdown".to_string(),
        passed: result.max_drawdown <= MAX_ACCEPTABLE_DRAWDOWN,
        details: format!(
            "max drawdown {:.4} (limit {:.2})",
            result.max_drawdown, MAX_ACCEPTABLE_DRAWDOWN
        ),
    });

    let mean_deviation = mean_peg_deviation(result);
    criteria.push(CriterionResult {
        name: "mean_deviation".to_string(),
        passed: mean_deviation <= MAX_ACCEPTABLE_MEAN_DEVIATION,
        details: format!(
            "mean peg deviation {:.4} (limit {:.2})",
            mean_deviation, MAX_ACCEPTABLE_MEAN_DEVIATION
        ),
    });

    let verdict = if collapsed && !result.recovered {
        Verdict::Collapsed
    } else if collapsed
        || result.max_drawdown > MAX_ACCEPTABLE_DRAWDOWN
        || mean_deviation > MAX_ACCEPTABLE_MEAN_DEVIATION
    {
        Verdict::Depegged
    } else {
        Verdict::Stable
    };

    RunAssessment { verdict, criteria }
}

/// Render a small static HTML report for a run.
pub fn generate_report(
    result: &ExperimentResult,
    params: &SystemParameters,
    title: &str,
) -> String {
    let assessment = evaluate_run(result, params);
    let summary = ExperimentSummary::from_result(result);

    let mut criteria_rows = String::new();
    for c in &assessment.criteria {
        criteria_rows.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            c.name,
            if c.passed { "pass" } else { "fail" },
            if c.passed { "PASS" } else { "FAIL" },
            c.details
        ));
    }

    let ttc = match summary.time_to_collapse {
        Some(t) => format!("{:.2}", t),
        None => "—".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: monospace; margin: 2em; }}
table {{ border-collapse: collapse; margin: 1em 0; }}
td, th {{ border: 1px solid #999; padding: 4px 10px; text-align: left; }}
.verdict {{ font-size: 1.4em; font-weight: bold; }}
.stable, .pass {{ color: #2a7a2a; }}
.depegged {{ color: #b8860b; }}
.collapsed, .fail {{ color: #b22222; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="verdict {css}">{label}</p>
<h2>Metrics</h2>
<table>
<tr><th>steps</th><td>{steps}</td></tr>
<tr><th>peg deviation integral</th><td>{pdi:.4}</td></tr>
<tr><th>time to collapse</th><td>{ttc}</td></tr>
<tr><th>max drawdown</th><td>{dd:.4}</td></tr>
<tr><th>min price</th><td>{minp:.4}</td></tr>
<tr><th>final price</th><td>{finp:.4}</td></tr>
<tr><th>recovered</th><td>{rec}</td></tr>
</table>
<h2>Criteria</h2>
<table>
<tr><th>criterion</th><th>result</th><th>details</th></tr>
{criteria_rows}
</table>
</body>
</html>
"#,
        title = title,
        css = assessment.verdict.css_class(),
        label = assessment.verdict.label(),
        steps = summary.n_steps,
        pdi = summary.peg_deviation_integral,
        ttc = ttc,
        dd = summary.max_drawdown,
        minp = summary.min_price,
        finp = summary.final_price,
        rec = summary.recovered,
        criteria_rows = criteria_rows,
    )
}

/// Write an HTML report to disk, creating parent directories as needed.
pub fn save_report(html: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}
