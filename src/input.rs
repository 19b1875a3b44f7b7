use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    ExamRecord, ExamStatus, PatientRecords, ReminderEvent, ReminderStatus, VitalChannel,
    VitalMeasurement,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CsvLoad<T> {
    pub records: Vec<T>,
    pub malformed: usize,
}

pub fn load_bundle(path: &Path) -> anyhow::Result<PatientRecords> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: PatientRecords = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid patient bundle", path.display()))?;
    info!(
        reminders = records.reminders.len(),
        vitals = records.vitals.len(),
        exams = records.exams.len(),
        "loaded patient bundle"
    );
    Ok(records)
}

pub fn load_csv_records(
    patient_id: Uuid,
    reminders: Option<&Path>,
    vitals: Option<&Path>,
    exams: Option<&Path>,
) -> anyhow::Result<PatientRecords> {
    let mut records = PatientRecords::new(patient_id);

    if let Some(path) = reminders {
        let reader = open(path)?;
        records.reminders = read_reminders(reader, patient_id)
            .with_context(|| format!("failed to import reminders from {}", path.display()))?;
    }

    if let Some(path) = vitals {
        let reader = open(path)?;
        let load = read_vitals(reader, patient_id)
            .with_context(|| format!("failed to import vitals from {}", path.display()))?;
        if load.malformed > 0 {
            warn!(
                malformed = load.malformed,
                path = %path.display(),
                "vital rows lack the values their channel needs and will be skipped"
            );
        }
        records.vitals = load.records;
    }

    if let Some(path) = exams {
        let reader = open(path)?;
        records.exams = read_exams(reader, patient_id)
            .with_context(|| format!("failed to import exams from {}", path.display()))?;
    }

    info!(
        reminders = records.reminders.len(),
        vitals = records.vitals.len(),
        exams = records.exams.len(),
        "loaded csv records"
    );
    Ok(records)
}

fn open(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

pub fn read_reminders<R: Read>(reader: R, patient_id: Uuid) -> anyhow::Result<Vec<ReminderEvent>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        patient_id: Option<Uuid>,
        medication_id: Uuid,
        scheduled_at: DateTime<Utc>,
        status: ReminderStatus,
        taken_at: Option<DateTime<Utc>>,
    }

    let mut reader = csv::Reader::from_reader(reader);
    let mut events = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid reminder row {}", line + 1))?;
        events.push(ReminderEvent {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            patient_id: row.patient_id.unwrap_or(patient_id),
            medication_id: row.medication_id,
            scheduled_at: row.scheduled_at,
            status: row.status,
            taken_at: row.taken_at,
        });
    }

    Ok(events)
}

pub fn read_vitals<R: Read>(
    reader: R,
    patient_id: Uuid,
) -> anyhow::Result<CsvLoad<VitalMeasurement>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        patient_id: Option<Uuid>,
        channel: VitalChannel,
        raw_value: Option<String>,
        systolic: Option<f64>,
        diastolic: Option<f64>,
        numeric_value: Option<f64>,
        recorded_at: DateTime<Utc>,
    }

    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    let mut malformed = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid vital row {}", line + 1))?;
        let measurement = VitalMeasurement {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            patient_id: row.patient_id.unwrap_or(patient_id),
            channel: row.channel,
            raw_value: row.raw_value.unwrap_or_default(),
            systolic: row.systolic,
            diastolic: row.diastolic,
            numeric_value: row.numeric_value,
            recorded_at: row.recorded_at,
        };

        if measurement.reading().is_none() {
            warn!(
                row = line + 1,
                id = %measurement.id,
                channel = ?measurement.channel,
                "malformed vital row"
            );
            malformed += 1;
        }
        records.push(measurement);
    }

    Ok(CsvLoad { records, malformed })
}

pub fn read_exams<R: Read>(reader: R, patient_id: Uuid) -> anyhow::Result<Vec<ExamRecord>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        patient_id: Option<Uuid>,
        exam_type: String,
        status: ExamStatus,
        scheduled_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        result_at: Option<DateTime<Utc>>,
        result_text: Option<String>,
        created_at: Option<DateTime<Utc>>,
    }

    let mut reader = csv::Reader::from_reader(reader);
    let mut exams = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid exam row {}", line + 1))?;
        exams.push(ExamRecord {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            patient_id: row.patient_id.unwrap_or(patient_id),
            exam_type: row.exam_type,
            status: row.status,
            scheduled_at: row.scheduled_at,
            completed_at: row.completed_at,
            result_at: row.result_at,
            result_text: row.result_text.filter(|text| !text.trim().is_empty()),
            created_at: row.created_at,
        });
    }

    Ok(exams)
}
