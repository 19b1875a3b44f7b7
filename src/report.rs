use std::fmt::Write;

use crate::models::{ExamDigest, PatientSummary, VitalChannel};

pub fn build_report(summary: &PatientSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Patient Risk Summary");
    let _ = writeln!(
        output,
        "Patient {} (generated {})",
        summary.patient_id,
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk");
    let _ = writeln!(
        output,
        "Score {:.2} ({})",
        summary.risk.value,
        summary.risk.level.as_str()
    );

    if summary.risk.reasons.is_empty() {
        let _ = writeln!(output, "No contributing factors.");
    } else {
        for reason in summary.risk.reasons.iter() {
            let _ = writeln!(output, "- {reason}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    for (index, recommendation) in summary.recommendations.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", index + 1, recommendation);
    }

    let adherence = &summary.adherence;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Medication Adherence");
    let _ = writeln!(
        output,
        "{:.2}% over the last {} days ({})",
        adherence.adherence_rate_percent,
        adherence.window_days,
        adherence.status.as_str()
    );
    let _ = writeln!(
        output,
        "- {} doses scheduled: {} taken, {} late, {} missed",
        adherence.total_events, adherence.taken, adherence.late, adherence.missed
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Vitals");

    if summary.vitals.latest_by_channel.is_empty() {
        let _ = writeln!(output, "No vitals recorded for this window.");
    } else {
        for channel in VitalChannel::ALL {
            if let Some(latest) = summary.vitals.latest(channel) {
                let _ = writeln!(
                    output,
                    "- {}: {} {} on {}",
                    channel.label(),
                    latest.value,
                    channel.unit(),
                    latest.recorded_at.format("%Y-%m-%d")
                );
            }
        }
    }

    if !summary.vitals.flags.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Flags");
        for flag in summary.vitals.flags.iter() {
            let _ = writeln!(
                output,
                "- {} {} (threshold {}, {} severity, {} readings)",
                flag.flag.describe(),
                flag.observed_value,
                flag.threshold,
                flag.severity.as_str(),
                flag.readings
            );
        }
    }

    let exams = &summary.exams;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Exams");
    let _ = writeln!(
        output,
        "{} pending ({} overdue), {} completed",
        exams.pending_count, exams.overdue_count, exams.completed_count
    );

    if exams.recent_digest.is_empty() {
        let _ = writeln!(output, "No exams on record.");
    } else {
        for exam in exams.recent_digest.iter() {
            let _ = writeln!(output, "- {}", digest_line(exam));
        }
    }

    output
}

fn digest_line(exam: &ExamDigest) -> String {
    let date = exam
        .completed_at
        .or(exam.scheduled_at)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());

    let mut line = format!("{} ({}) {date}", exam.exam_type, exam.status.as_str());
    if let Some(days) = exam.days_overdue {
        let _ = write!(line, ", {days} days overdue");
    }
    if let Some(excerpt) = &exam.result_excerpt {
        let _ = write!(line, ": {excerpt}");
    }
    line
}
