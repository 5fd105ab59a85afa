use super::model::{RunPhase, UiModel};
use super::render::{Ui, UiActions};
use crate::app::summary::RunSummary;
use crate::error::{AppError, AppResult};
use crate::http::dispatch::BatchReport;
use crate::http::outcome::{FailureKind, Outcome, Tally};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::time::Duration;

fn sample_summary(cancelled: bool) -> RunSummary {
    let mut tally = Tally::default();
    tally.record(Outcome::Status(200));
    tally.record(Outcome::Failed(FailureKind::Timeout));
    let report = BatchReport {
        tally,
        completed: 2,
        elapsed: Duration::from_millis(450),
    };
    RunSummary::from_report("http://example.com/", 5, cancelled, &report)
}

#[test]
fn ui_render_does_not_panic_in_any_phase() -> AppResult<()> {
    let backend = TestBackend::new(80, 24);
    let mut terminal = match Terminal::new(backend) {
        Ok(term) => term,
        Err(err) => {
            return Err(AppError::validation(format!(
                "Failed to create TestBackend terminal: {}",
                err
            )));
        }
    };

    let mut model = UiModel::new("http://example.com/".to_owned(), 5, false);
    Ui::render(&mut terminal, &model);

    model.percent = 40;
    model.phase = RunPhase::Cancelled(None);
    Ui::render(&mut terminal, &model);

    model.phase = RunPhase::Cancelled(Some(sample_summary(true)));
    Ui::render(&mut terminal, &model);

    model.phase = RunPhase::Finished(sample_summary(false));
    Ui::render(&mut terminal, &model);

    let mut plain = UiModel::new("http://example.com/".to_owned(), 5, true);
    plain.percent = 100;
    Ui::render(&mut terminal, &plain);

    Ok(())
}

#[test]
fn gauge_pins_to_final_percent_when_finished() -> AppResult<()> {
    let mut model = UiModel::new("http://example.com/".to_owned(), 5, false);
    model.percent = 40;
    if model.gauge_percent() != 40 {
        return Err(AppError::validation("Running gauge must track percent"));
    }

    model.phase = RunPhase::Finished(sample_summary(false));
    if model.gauge_percent() != 100 {
        return Err(AppError::validation("Finished gauge must pin to 100"));
    }

    model.phase = RunPhase::Cancelled(None);
    if model.gauge_percent() != 40 {
        return Err(AppError::validation(
            "Cancelled gauge must keep the partial percent",
        ));
    }
    Ok(())
}

#[test]
fn result_lines_follow_the_phase() -> AppResult<()> {
    let mut model = UiModel::new("http://example.com/".to_owned(), 5, false);
    if model.result_lines() != vec!["Waiting for results...".to_owned()] {
        return Err(AppError::validation("Running phase shows a placeholder"));
    }

    model.phase = RunPhase::Cancelled(None);
    let pending_lines = model.result_lines();
    if pending_lines.len() != 1
        || !pending_lines.iter().any(|line| line.contains("Cancelled"))
    {
        return Err(AppError::validation(
            "Pending cancellation shows a cancelled placeholder",
        ));
    }

    model.phase = RunPhase::Finished(sample_summary(false));
    let final_lines = model.result_lines();
    if !final_lines.iter().any(|line| line == "Response 200: 1") {
        return Err(AppError::validation(format!(
            "Finished phase must show the tally: {:?}",
            final_lines
        )));
    }
    if !final_lines.iter().any(|line| line == "Response timeout: 1") {
        return Err(AppError::validation(format!(
            "Finished phase must show failure outcomes: {:?}",
            final_lines
        )));
    }
    Ok(())
}
