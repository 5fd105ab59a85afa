use crate::app::summary::RunSummary;
use crate::progress::FINAL_PERCENT;

/// What the interactive loop is currently showing.
pub(crate) enum RunPhase {
    Running,
    Finished(RunSummary),
    /// Cancelled; the partial summary arrives a moment after the signal.
    Cancelled(Option<RunSummary>),
}

pub(crate) struct UiModel {
    pub(crate) target: String,
    pub(crate) requested: u64,
    pub(crate) percent: u8,
    pub(crate) phase: RunPhase,
    pub(crate) no_color: bool,
}

impl UiModel {
    pub(crate) const fn new(target: String, requested: u64, no_color: bool) -> Self {
        Self {
            target,
            requested,
            percent: 0,
            phase: RunPhase::Running,
            no_color,
        }
    }

    /// Gauge value. Pinned to the final percent once the run finished; a
    /// cancelled run keeps its last partial value.
    pub(crate) const fn gauge_percent(&self) -> u8 {
        match self.phase {
            RunPhase::Finished(_) => FINAL_PERCENT,
            RunPhase::Running | RunPhase::Cancelled(_) => {
                if self.percent > FINAL_PERCENT {
                    FINAL_PERCENT
                } else {
                    self.percent
                }
            }
        }
    }

    pub(crate) fn status_line(&self) -> String {
        let state = match self.phase {
            RunPhase::Running => "Running",
            RunPhase::Finished(_) => "Finished",
            RunPhase::Cancelled(_) => "Cancelled",
        };
        format!(
            "{}: {} requests -> {}",
            state, self.requested, self.target
        )
    }

    pub(crate) fn result_lines(&self) -> Vec<String> {
        match &self.phase {
            RunPhase::Running => vec!["Waiting for results...".to_owned()],
            RunPhase::Finished(summary) | RunPhase::Cancelled(Some(summary)) => summary.lines(),
            RunPhase::Cancelled(None) => {
                vec!["Cancelled; waiting for partial results...".to_owned()]
            }
        }
    }

    pub(crate) const fn footer_line(&self) -> &'static str {
        match self.phase {
            RunPhase::Running => "Enter: cancel | q/Esc: quit",
            RunPhase::Finished(_) | RunPhase::Cancelled(_) => "Enter: restart | q/Esc: quit",
        }
    }
}
