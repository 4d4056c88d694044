use std::io::Write as _;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use culls_contracts::{CULLS_REPORT_SCHEMA_VERSION, TIMING_LABEL};

use crate::cull::CullOutcome;

#[derive(Debug)]
pub struct Reporter {
    pub json: bool,
    pub quiet: bool,
}

impl Reporter {
    pub fn progress(&self, msg: &str) {
        if self.json || self.quiet {
            return;
        }
        eprintln!("{msg}");
    }

    pub fn finish(&self, report: &CullReport, elapsed: Duration) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stdout = std::io::stdout().lock();
        if self.json {
            let mut bytes = serde_json::to_vec(report)?;
            bytes.push(b'\n');
            stdout.write_all(&bytes)?;
        } else {
            stdout.write_all(render_removed_fields(&report.removed_fields).as_bytes())?;
            writeln!(stdout, "{}", render_timing(elapsed))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CullReport {
    pub schema_version: &'static str,
    pub ok: bool,
    pub path: String,
    pub removed_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pruned_scripts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub preserved_fields: Vec<String>,
    pub elapsed_ms: f64,
}

impl CullReport {
    pub fn new(
        path: String,
        outcome: CullOutcome,
        preserved_fields: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        let mut removed_fields = outcome.removed_fields;
        removed_fields.sort_unstable();
        Self {
            schema_version: CULLS_REPORT_SCHEMA_VERSION,
            ok: true,
            path,
            removed_fields,
            pruned_scripts: outcome.pruned_scripts,
            preserved_fields,
            elapsed_ms: millis(elapsed),
        }
    }
}

/// Header, one `- <field>` line per field in the given order, then a blank
/// line. Empty when nothing was removed.
pub fn render_removed_fields(fields: &[String]) -> String {
    if fields.is_empty() {
        return String::new();
    }

    let mut out = String::from("Removed package.json fields:\n");
    for field in fields {
        out.push_str("- ");
        out.push_str(field);
        out.push('\n');
    }
    out.push('\n');
    out
}

pub fn render_timing(elapsed: Duration) -> String {
    format!("{TIMING_LABEL}: {:.3}ms", millis(elapsed))
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
