use std::collections::BTreeMap;

use serde::Serialize;

use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::http::dispatch::BatchReport;

/// Final run report at the presentation boundary. Outcome keys are already
/// rendered (`Response 200`, `Response timeout`); status codes are three
/// digits, so the string order matches the numeric one and failure kinds
/// sort after them.
#[derive(Debug, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) target: String,
    pub(crate) requested: u64,
    pub(crate) completed: u64,
    pub(crate) cancelled: bool,
    pub(crate) elapsed_ms: u64,
    pub(crate) responses: BTreeMap<String, u64>,
}

impl RunSummary {
    pub(crate) fn from_report(
        target: &str,
        requested: u64,
        cancelled: bool,
        report: &BatchReport,
    ) -> Self {
        let responses = report
            .tally
            .iter()
            .map(|(outcome, count)| (outcome.to_string(), count))
            .collect();
        let elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX);
        Self {
            target: target.to_owned(),
            requested,
            completed: report.completed,
            cancelled,
            elapsed_ms,
            responses,
        }
    }

    /// Text rendering, one line per entry. Shared by the headless report
    /// and the results panel.
    pub(crate) fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Target: {}", self.target),
            format!("Requests: {}", self.requested),
            format!("Completed: {}", self.completed),
        ];
        if self.cancelled {
            lines.push("Cancelled: yes".to_owned());
        }
        for (outcome, count) in &self.responses {
            lines.push(format!("{}: {}", outcome, count));
        }
        lines.push(format!(
            "Elapsed: {}.{:02}s",
            self.elapsed_ms / 1000,
            self.elapsed_ms % 1000 / 10
        ));
        lines
    }
}

pub(crate) fn print_summary(summary: &RunSummary, output: OutputFormat) -> AppResult<()> {
    match output {
        OutputFormat::Text => {
            for line in summary.lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(summary)?;
            println!("{}", rendered);
        }
    }
    Ok(())
}
