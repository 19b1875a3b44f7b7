use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use patient_risk::input::load_csv_records;
use patient_risk::models::{VitalChannel, VitalFlagKind};
use patient_risk::RiskEngine;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write csv");
    path
}

#[test]
fn loads_csv_files_into_one_patient_bundle() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let patient_id = Uuid::new_v4();
    let other_patient = Uuid::new_v4();

    let reminders = write(
        &tmp,
        "reminders.csv",
        "\
id,patient_id,medication_id,scheduled_at,status,taken_at
,,8f3a6c1e-2b4d-4e5f-9a7b-1c2d3e4f5a6b,2026-03-10T08:00:00Z,taken,2026-03-10T08:05:00Z
,,8f3a6c1e-2b4d-4e5f-9a7b-1c2d3e4f5a6b,2026-03-11T08:00:00Z,missed,
",
    );
    let vitals = write(
        &tmp,
        "vitals.csv",
        &format!(
            "\
id,patient_id,channel,raw_value,systolic,diastolic,numeric_value,recorded_at
,,blood_pressure,145/92,,,,2026-03-14T08:00:00Z
,,blood_pressure,,150,,,2026-03-14T09:00:00Z
,,oxygen_saturation,not-a-number,,,,2026-03-14T09:30:00Z
,{other_patient},glucose,65,,,65,2026-03-14T10:00:00Z
"
        ),
    );
    let exams = write(
        &tmp,
        "exams.csv",
        "\
id,patient_id,exam_type,status,scheduled_at,completed_at,result_at,result_text,created_at
,,Lipid panel,scheduled,2026-02-03T09:00:00Z,,,,
",
    );

    let records = load_csv_records(
        patient_id,
        Some(reminders.as_path()),
        Some(vitals.as_path()),
        Some(exams.as_path()),
    )
    .expect("csv records");

    assert_eq!(records.patient_id, patient_id);
    assert_eq!(records.reminders.len(), 2);
    assert_eq!(records.vitals.len(), 4);
    assert_eq!(records.exams.len(), 1);

    let malformed = records
        .vitals
        .iter()
        .filter(|vital| vital.reading().is_none())
        .count();
    assert_eq!(malformed, 2);
    assert_eq!(records.vitals[2].channel, VitalChannel::OxygenSaturation);

    assert!(records
        .reminders
        .iter()
        .all(|event| event.patient_id == patient_id));
    assert!(records.exams.iter().all(|exam| exam.patient_id == patient_id));
    assert_eq!(records.vitals[0].patient_id, patient_id);
    assert_eq!(records.vitals[3].patient_id, other_patient);

    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    assert!(RiskEngine::default().summarize(&records, now).is_err());

    let mut own = records.clone();
    own.vitals.pop();
    let summary = RiskEngine::default().summarize(&own, now).expect("summary");
    assert!(!summary.vitals.has_flag(VitalFlagKind::PressureHigh));
    assert_eq!(summary.exams.overdue_count, 1);
}

#[test]
fn missing_files_are_reported_and_absent_sources_are_empty() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let patient_id = Uuid::new_v4();

    let records = load_csv_records(patient_id, None, None, None).expect("empty bundle");
    assert!(records.reminders.is_empty());
    assert!(records.vitals.is_empty());
    assert!(records.exams.is_empty());

    let missing = tmp.path().join("missing.csv");
    let err = load_csv_records(patient_id, None, Some(missing.as_path()), None).unwrap_err();
    assert!(err.to_string().contains("failed to open"));
}
