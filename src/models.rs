use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Taken,
    Late,
    Missed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medication_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: ReminderStatus,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalChannel {
    BloodPressure,
    HeartRate,
    Temperature,
    Glucose,
    Weight,
    OxygenSaturation,
}

impl VitalChannel {
    pub const ALL: [VitalChannel; 6] = [
        VitalChannel::BloodPressure,
        VitalChannel::HeartRate,
        VitalChannel::Temperature,
        VitalChannel::Glucose,
        VitalChannel::Weight,
        VitalChannel::OxygenSaturation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VitalChannel::BloodPressure => "Blood pressure",
            VitalChannel::HeartRate => "Heart rate",
            VitalChannel::Temperature => "Temperature",
            VitalChannel::Glucose => "Glucose",
            VitalChannel::Weight => "Weight",
            VitalChannel::OxygenSaturation => "Oxygen saturation",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalChannel::BloodPressure => "mmHg",
            VitalChannel::HeartRate => "bpm",
            VitalChannel::Temperature => "°C",
            VitalChannel::Glucose => "mg/dL",
            VitalChannel::Weight => "kg",
            VitalChannel::OxygenSaturation => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalMeasurement {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub channel: VitalChannel,
    #[serde(default)]
    pub raw_value: String,
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VitalReading {
    Pressure { systolic: f64, diastolic: f64 },
    Scalar(f64),
}

impl VitalMeasurement {
    /// Returns the typed reading, falling back to `raw_value` when the typed
    /// fields are missing. `None` means the record is malformed for its channel.
    pub fn reading(&self) -> Option<VitalReading> {
        match self.channel {
            VitalChannel::BloodPressure => {
                let (systolic, diastolic) = match (self.systolic, self.diastolic) {
                    (Some(systolic), Some(diastolic)) => (systolic, diastolic),
                    _ => parse_pressure(&self.raw_value)?,
                };
                if !systolic.is_finite() || !diastolic.is_finite() {
                    return None;
                }
                Some(VitalReading::Pressure {
                    systolic,
                    diastolic,
                })
            }
            _ => {
                let value = match self.numeric_value {
                    Some(value) => value,
                    None => self.raw_value.trim().parse::<f64>().ok()?,
                };
                value.is_finite().then_some(VitalReading::Scalar(value))
            }
        }
    }
}

fn parse_pressure(raw: &str) -> Option<(f64, f64)> {
    let (systolic, diastolic) = raw.split_once('/')?;
    let systolic = systolic.trim().parse::<f64>().ok()?;
    let diastolic = diastolic.trim().parse::<f64>().ok()?;
    Some((systolic, diastolic))
}

impl std::fmt::Display for VitalReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VitalReading::Pressure {
                systolic,
                diastolic,
            } => write!(f, "{}/{}", format_number(*systolic), format_number(*diastolic)),
            VitalReading::Scalar(value) => write!(f, "{}", format_number(*value)),
        }
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Scheduled,
    Completed,
    PendingResults,
    Cancelled,
}

impl ExamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamStatus::Scheduled => "scheduled",
            ExamStatus::Completed => "completed",
            ExamStatus::PendingResults => "pending_results",
            ExamStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, ExamStatus::Scheduled | ExamStatus::PendingResults)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub exam_type: String,
    pub status: ExamStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExamRecord {
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.scheduled_at).or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecords {
    pub patient_id: Uuid,
    #[serde(default)]
    pub reminders: Vec<ReminderEvent>,
    #[serde(default)]
    pub vitals: Vec<VitalMeasurement>,
    #[serde(default)]
    pub exams: Vec<ExamRecord>,
}

impl PatientRecords {
    pub fn new(patient_id: Uuid) -> Self {
        Self {
            patient_id,
            reminders: Vec::new(),
            vitals: Vec::new(),
            exams: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceStatus {
    Good,
    Medium,
    Bad,
}

impl AdherenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdherenceStatus::Good => "good",
            AdherenceStatus::Medium => "medium",
            AdherenceStatus::Bad => "bad",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceSummary {
    pub window_days: u32,
    pub total_events: usize,
    pub taken: usize,
    pub late: usize,
    pub missed: usize,
    pub adherence_rate_percent: f64,
    pub status: AdherenceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VitalFlagKind {
    PressureHigh,
    PressureLow,
    HeartRateHigh,
    HeartRateLow,
    TemperatureHigh,
    TemperatureLow,
    GlucoseHigh,
    GlucoseLow,
    OxygenLow,
}

impl VitalFlagKind {
    pub fn channel(self) -> VitalChannel {
        match self {
            VitalFlagKind::PressureHigh | VitalFlagKind::PressureLow => VitalChannel::BloodPressure,
            VitalFlagKind::HeartRateHigh | VitalFlagKind::HeartRateLow => VitalChannel::HeartRate,
            VitalFlagKind::TemperatureHigh | VitalFlagKind::TemperatureLow => {
                VitalChannel::Temperature
            }
            VitalFlagKind::GlucoseHigh | VitalFlagKind::GlucoseLow => VitalChannel::Glucose,
            VitalFlagKind::OxygenLow => VitalChannel::OxygenSaturation,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            VitalFlagKind::PressureHigh => "High blood pressure",
            VitalFlagKind::PressureLow => "Low blood pressure",
            VitalFlagKind::HeartRateHigh => "Elevated heart rate",
            VitalFlagKind::HeartRateLow => "Low heart rate",
            VitalFlagKind::TemperatureHigh => "Fever",
            VitalFlagKind::TemperatureLow => "Low body temperature",
            VitalFlagKind::GlucoseHigh => "High glucose",
            VitalFlagKind::GlucoseLow => "Low glucose",
            VitalFlagKind::OxygenLow => "Low oxygen saturation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalFlag {
    pub flag: VitalFlagKind,
    pub observed_value: String,
    pub threshold: String,
    pub severity: Severity,
    pub readings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestVital {
    pub channel: VitalChannel,
    pub value: String,
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VitalsSummary {
    pub latest_by_channel: Vec<LatestVital>,
    pub flags: Vec<VitalFlag>,
}

impl VitalsSummary {
    pub fn latest(&self, channel: VitalChannel) -> Option<&LatestVital> {
        self.latest_by_channel
            .iter()
            .find(|latest| latest.channel == channel)
    }

    pub fn has_flag(&self, kind: VitalFlagKind) -> bool {
        self.flags.iter().any(|flag| flag.flag == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamDigest {
    pub id: Uuid,
    pub exam_type: String,
    pub status: ExamStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_excerpt: Option<String>,
    #[serde(default)]
    pub days_overdue: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueExam {
    pub id: Uuid,
    pub exam_type: String,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExamsSummary {
    pub recent_digest: Vec<ExamDigest>,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub completed_count: usize,
    /// Every overdue exam, most overdue first. Its length is `overdue_count`.
    #[serde(default)]
    pub overdue: Vec<OverdueExam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub value: f64,
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub adherence: AdherenceSummary,
    pub vitals: VitalsSummary,
    pub exams: ExamsSummary,
    pub risk: RiskScore,
    pub recommendations: Vec<String>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn measurement(channel: VitalChannel, raw: &str) -> VitalMeasurement {
        VitalMeasurement {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            channel,
            raw_value: raw.to_string(),
            systolic: None,
            diastolic: None,
            numeric_value: None,
            recorded_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn pressure_reading_falls_back_to_raw_value() {
        let vital = measurement(VitalChannel::BloodPressure, "142 / 90");
        assert_eq!(
            vital.reading(),
            Some(VitalReading::Pressure {
                systolic: 142.0,
                diastolic: 90.0
            })
        );
    }

    #[test]
    fn typed_fields_win_over_raw_value() {
        let mut vital = measurement(VitalChannel::Glucose, "999");
        vital.numeric_value = Some(110.0);
        assert_eq!(vital.reading(), Some(VitalReading::Scalar(110.0)));
    }

    #[test]
    fn malformed_pressure_has_no_reading() {
        let mut vital = measurement(VitalChannel::BloodPressure, "high");
        vital.systolic = Some(150.0);
        assert_eq!(vital.reading(), None);
    }

    #[test]
    fn readings_display_compactly() {
        let pressure = VitalReading::Pressure {
            systolic: 145.0,
            diastolic: 92.0,
        };
        assert_eq!(pressure.to_string(), "145/92");
        assert_eq!(VitalReading::Scalar(37.8).to_string(), "37.8");
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
