use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{window_start, AdherenceRules};
use crate::models::{round2, AdherenceStatus, AdherenceSummary, ReminderEvent, ReminderStatus};

// A window without events reports 100% and good.
pub fn analyze_adherence(
    events: &[ReminderEvent],
    rules: &AdherenceRules,
    now: DateTime<Utc>,
) -> AdherenceSummary {
    let cutoff = window_start(now, rules.window_days);
    let mut total_events = 0usize;
    let mut taken = 0usize;
    let mut late = 0usize;
    let mut missed = 0usize;

    for event in events {
        if event.scheduled_at < cutoff || event.scheduled_at > now {
            continue;
        }

        total_events += 1;
        match event.status {
            ReminderStatus::Taken => taken += 1,
            ReminderStatus::Late => late += 1,
            ReminderStatus::Missed => missed += 1,
            ReminderStatus::Pending | ReminderStatus::Skipped => {}
        }
    }

    let adherence_rate_percent = if total_events == 0 {
        100.0
    } else {
        round2((taken + late) as f64 / total_events as f64 * 100.0)
    };

    let status = classify_rate(adherence_rate_percent, rules);
    debug!(
        total_events,
        adherence_rate_percent,
        status = status.as_str(),
        "adherence analyzed"
    );

    AdherenceSummary {
        window_days: rules.window_days,
        total_events,
        taken,
        late,
        missed,
        adherence_rate_percent,
        status,
    }
}

pub fn classify_rate(rate: f64, rules: &AdherenceRules) -> AdherenceStatus {
    if rate >= rules.good_threshold {
        AdherenceStatus::Good
    } else if rate >= rules.medium_threshold {
        AdherenceStatus::Medium
    } else {
        AdherenceStatus::Bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn sample_event(days_ago: i64, status: ReminderStatus) -> ReminderEvent {
        let scheduled_at = now() - Duration::days(days_ago);
        ReminderEvent {
            id: Uuid::new_v4(),
            patient_id: Uuid::nil(),
            medication_id: Uuid::nil(),
            scheduled_at,
            status,
            taken_at: matches!(status, ReminderStatus::Taken | ReminderStatus::Late)
                .then_some(scheduled_at),
        }
    }

    fn events_with_rate(taken: usize, total: usize) -> Vec<ReminderEvent> {
        (0..total)
            .map(|i| {
                let status = if i < taken {
                    ReminderStatus::Taken
                } else {
                    ReminderStatus::Missed
                };
                sample_event((i % 20) as i64, status)
            })
            .collect()
    }

    #[test]
    fn empty_history_counts_as_good() {
        let summary = analyze_adherence(&[], &AdherenceRules::default(), now());
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.adherence_rate_percent, 100.0);
        assert_eq!(summary.status, AdherenceStatus::Good);
        assert_eq!(summary.window_days, 30);
    }

    #[test]
    fn status_follows_rate_tiers() {
        let rules = AdherenceRules::default();
        let cases = [
            (95, AdherenceStatus::Good),
            (90, AdherenceStatus::Good),
            (80, AdherenceStatus::Medium),
            (75, AdherenceStatus::Medium),
            (60, AdherenceStatus::Bad),
        ];

        for (taken, expected) in cases {
            let summary = analyze_adherence(&events_with_rate(taken, 100), &rules, now());
            assert_eq!(summary.adherence_rate_percent, taken as f64);
            assert_eq!(summary.status, expected, "rate {taken}");
        }
    }

    #[test]
    fn late_doses_count_as_adherent() {
        let events = vec![
            sample_event(1, ReminderStatus::Taken),
            sample_event(2, ReminderStatus::Late),
            sample_event(3, ReminderStatus::Missed),
        ];
        let summary = analyze_adherence(&events, &AdherenceRules::default(), now());
        assert_eq!(summary.taken, 1);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.adherence_rate_percent, 66.67);
        assert_eq!(summary.status, AdherenceStatus::Bad);
    }

    #[test]
    fn pending_and_skipped_count_toward_total_only() {
        let events = vec![
            sample_event(1, ReminderStatus::Taken),
            sample_event(1, ReminderStatus::Skipped),
            sample_event(0, ReminderStatus::Pending),
        ];
        let summary = analyze_adherence(&events, &AdherenceRules::default(), now());
        assert_eq!(summary.total_events, 3);
        assert!(summary.taken + summary.late + summary.missed <= summary.total_events);
        assert_eq!(summary.adherence_rate_percent, 33.33);
    }

    #[test]
    fn ignores_events_outside_window() {
        let events = vec![
            sample_event(2, ReminderStatus::Taken),
            sample_event(45, ReminderStatus::Missed),
            sample_event(-3, ReminderStatus::Pending),
        ];
        let summary = analyze_adherence(&events, &AdherenceRules::default(), now());
        assert_eq!(summary.total_events, 1);
        assert_eq!(summary.status, AdherenceStatus::Good);
    }
}
