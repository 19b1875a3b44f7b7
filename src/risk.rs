use tracing::debug;

use crate::config::RuleConfig;
use crate::models::{
    format_number, round2, AdherenceStatus, AdherenceSummary, ExamsSummary, RiskScore,
    VitalsSummary,
};

struct Tally {
    value: f64,
    reasons: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            value: 0.0,
            reasons: Vec::new(),
        }
    }

    fn add(&mut self, points: f64, reason: impl FnOnce() -> String) {
        if points <= 0.0 {
            return;
        }
        self.value += points;
        self.reasons
            .push(format!("{} (+{})", reason(), format_number(points)));
    }
}

// Reasons: adherence, vital flags in channel order, each overdue exam, pending backlog.
pub fn score_patient(
    adherence: &AdherenceSummary,
    vitals: &VitalsSummary,
    exams: &ExamsSummary,
    config: &RuleConfig,
) -> RiskScore {
    let mut tally = Tally::new();

    let adherence_points = match adherence.status {
        AdherenceStatus::Good => 0.0,
        AdherenceStatus::Medium => config.adherence.medium_weight,
        AdherenceStatus::Bad => config.adherence.bad_weight,
    };
    tally.add(adherence_points, || {
        format!(
            "Adherence {}: {:.2}% of doses taken over {} days",
            adherence.status.as_str(),
            adherence.adherence_rate_percent,
            adherence.window_days
        )
    });

    for flag in &vitals.flags {
        let points = config.vitals.flag_points(flag.flag, flag.severity);
        tally.add(points, || {
            format!(
                "{}: {} {} ({} severity)",
                flag.flag.describe(),
                flag.observed_value,
                flag.flag.channel().unit(),
                flag.severity.as_str()
            )
        });
    }

    for exam in &exams.overdue {
        tally.add(config.exams.overdue_weight, || {
            format!("{} overdue by {} days", exam.exam_type, exam.days_overdue)
        });
    }

    if exams.pending_count > config.exams.pending_threshold {
        tally.add(config.exams.pending_weight, || {
            format!(
                "{} pending exams, more than {}",
                exams.pending_count, config.exams.pending_threshold
            )
        });
    }

    let value = round2(tally.value.clamp(0.0, 100.0));
    let level = config.levels.level_for(value);
    debug!(value, level = level.as_str(), "risk scored");

    RiskScore {
        value,
        level,
        reasons: tally.reasons,
    }
}
