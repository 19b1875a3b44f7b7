use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{window_start, ExamRules};
use crate::models::{ExamDigest, ExamRecord, ExamStatus, ExamsSummary, OverdueExam};

const RESULT_EXCERPT_CHARS: usize = 120;

pub fn analyze_exams(exams: &[ExamRecord], rules: &ExamRules, now: DateTime<Utc>) -> ExamsSummary {
    let overdue_cutoff = window_start(now, rules.overdue_days);
    let mut pending_count = 0usize;
    let mut completed_count = 0usize;
    let mut overdue = Vec::new();

    for exam in exams {
        if exam.status == ExamStatus::Completed {
            completed_count += 1;
        }
        if exam.status.is_pending() {
            pending_count += 1;
        }
        if let Some(days_overdue) = days_overdue(exam, overdue_cutoff, now) {
            overdue.push(OverdueExam {
                id: exam.id,
                exam_type: exam.exam_type.clone(),
                days_overdue,
            });
        }
    }
    overdue.sort_by(|a, b| {
        b.days_overdue
            .cmp(&a.days_overdue)
            .then_with(|| a.id.cmp(&b.id))
    });
    let overdue_count = overdue.len();

    let mut recent: Vec<&ExamRecord> = exams.iter().collect();
    // Exams without any timestamp sort last; ties fall back to id for a stable digest.
    recent.sort_by(|a, b| {
        b.sort_key()
            .cmp(&a.sort_key())
            .then_with(|| a.id.cmp(&b.id))
    });

    let recent_digest = recent
        .into_iter()
        .take(rules.digest_size)
        .map(|exam| digest(exam, overdue_cutoff, now))
        .collect();

    debug!(pending_count, overdue_count, completed_count, "exams analyzed");

    ExamsSummary {
        recent_digest,
        pending_count,
        overdue_count,
        completed_count,
        overdue,
    }
}

fn days_overdue(exam: &ExamRecord, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    if !exam.status.is_pending() {
        return None;
    }
    exam.scheduled_at
        .filter(|scheduled_at| *scheduled_at < cutoff)
        .map(|scheduled_at| now.signed_duration_since(scheduled_at).num_days())
}

fn digest(exam: &ExamRecord, overdue_cutoff: DateTime<Utc>, now: DateTime<Utc>) -> ExamDigest {
    ExamDigest {
        id: exam.id,
        exam_type: exam.exam_type.clone(),
        status: exam.status,
        scheduled_at: exam.scheduled_at,
        completed_at: exam.completed_at,
        result_at: exam.result_at,
        result_excerpt: exam.result_text.as_deref().map(excerpt),
        days_overdue: days_overdue(exam, overdue_cutoff, now),
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= RESULT_EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(RESULT_EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}
