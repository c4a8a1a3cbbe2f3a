//! Report rendering for the CLI frontend.
//!
//! Writes an [`Evaluation`] either as an aligned text table or as JSON.

use std::fmt::Write as _;
use std::io::Write;

use clap::ValueEnum;

use crate::engine::Evaluation;
use crate::error::{PowerTreeError, Result};
use crate::tree::PowerTree;

/// Output format of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable tables
    Text,
    /// Machine-readable JSON
    Json,
}

/// Write the evaluation of `tree` to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    tree: &PowerTree,
    evaluation: &Evaluation,
    format: ReportFormat,
) -> Result<()> {
    let rendered = match format {
        ReportFormat::Text => render_text(tree, evaluation),
        ReportFormat::Json => render_json(evaluation)?,
    };
    out.write_all(rendered.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| PowerTreeError::ReportError {
            message: e.to_string(),
        })
}

/// Render the evaluation as pretty-printed JSON.
pub fn render_json(evaluation: &Evaluation) -> Result<String> {
    let mut json = serde_json::to_string_pretty(evaluation)?;
    json.push('\n');
    Ok(json)
}

/// Render the evaluation as text tables.
pub fn render_text(tree: &PowerTree, evaluation: &Evaluation) -> String {
    let mut s = String::new();

    let _ = writeln!(
        s,
        "{:<16} {:<7} {:>9} {:>9} {:>10} {:>10} {:>9} {:>9} {:>9} {:>7}  {}",
        "STAGE", "TYPE", "VIN[V]", "VOUT[V]", "IIN[A]", "IOUT[A]", "PIN[W]", "POUT[W]", "PDISS[W]", "EFF",
        "STATUS"
    );
    for (id, state) in &evaluation.states {
        let kind = tree
            .stage(id)
            .map(|s| s.stage_type().as_str())
            .unwrap_or("?");
        let status = if state.is_resolved() {
            "ok".to_string()
        } else if state.is_blocked() {
            "blocked".to_string()
        } else {
            state
                .unresolved_cause()
                .map(|c| format!("unresolved ({c})"))
                .unwrap_or_default()
        };
        let _ = writeln!(
            s,
            "{:<16} {:<7} {:>9} {:>9} {:>10} {:>10} {:>9} {:>9} {:>9} {:>7}  {}",
            id.as_str(),
            kind,
            cell(state.vin, 3),
            cell(state.vout, 3),
            cell(state.iin, 4),
            cell(state.iout, 4),
            cell(state.pin, 3),
            cell(state.pout, 3),
            cell(state.pdiss, 3),
            percent(state.efficiency_actual),
            status
        );
    }

    if !evaluation.summaries.is_empty() {
        let _ = writeln!(s);
        for summary in &evaluation.summaries {
            let _ = writeln!(
                s,
                "{}: {} W supplied, {} W to loads, {} W dissipated, efficiency {} ({} loads, depth {})",
                summary.source,
                cell(summary.source_power, 3),
                cell(summary.load_power, 3),
                cell(summary.dissipation, 3),
                percent(summary.efficiency),
                summary.loads,
                summary.depth
            );
        }
    }

    let _ = writeln!(s);
    if evaluation.diagnostics.is_empty() {
        let _ = writeln!(s, "No diagnostics.");
    } else {
        for diagnostic in &evaluation.diagnostics {
            let _ = writeln!(s, "{diagnostic}");
        }
    }
    s
}

fn cell(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::stage::{LdoParams, LoadParams, SourceParams, Stage};

    fn scenario() -> PowerTree {
        let mut tree = PowerTree::new();
        tree.add_node(Stage::source("vbat", SourceParams::new(12.0, 2.0)))
            .unwrap();
        tree.add_node(Stage::ldo("ldo", LdoParams::new(5.0, 1.0)))
            .unwrap();
        tree.add_node(Stage::load("mcu", LoadParams::current(1.5)))
            .unwrap();
        tree.connect(&"vbat".into(), &"ldo".into()).unwrap();
        tree.connect(&"ldo".into(), &"mcu".into()).unwrap();
        tree
    }

    #[test]
    fn test_text_report() {
        let tree = scenario();
        let text = render_text(&tree, &evaluate(&tree));
        assert!(text.contains("STAGE"));
        assert!(text.contains("vbat"));
        assert!(text.contains("1.5000"));
        assert!(text.contains("IOUT_EXCEEDS_MAX"));
    }

    #[test]
    fn test_json_report() {
        let tree = scenario();
        let json = render_json(&evaluate(&tree)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["states"]["ldo"]["iout"], 1.5);
        assert_eq!(value["states"]["ldo"]["resolution"]["status"], "resolved");
        assert_eq!(value["diagnostics"][0]["code"], "IOUT_EXCEEDS_MAX");
        assert_eq!(value["diagnostics"][0]["severity"], "ERROR");
    }

    #[test]
    fn test_write_report() {
        let tree = scenario();
        let mut buffer = Vec::new();
        write_report(&mut buffer, &tree, &evaluate(&tree), ReportFormat::Text).unwrap();
        assert!(!buffer.is_empty());
    }
}
