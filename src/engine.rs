use chrono::{DateTime, Utc};
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::adherence::analyze_adherence;
use crate::config::RuleConfig;
use crate::error::{ConfigError, EngineError};
use crate::exams::analyze_exams;
use crate::models::{PatientRecords, PatientSummary};
use crate::recommend::{recommend, RecommendationContext};
use crate::risk::score_patient;
use crate::vitals::analyze_vitals;

#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RuleConfig,
}

impl RiskEngine {
    pub fn new(config: RuleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn summarize_now(&self, records: &PatientRecords) -> Result<PatientSummary, EngineError> {
        self.summarize(records, Utc::now())
    }

    /// Summarizes `records` as of `now`. Identical inputs give identical output.
    pub fn summarize(
        &self,
        records: &PatientRecords,
        now: DateTime<Utc>,
    ) -> Result<PatientSummary, EngineError> {
        let span = info_span!("summarize", patient_id = %records.patient_id);
        let _guard = span.enter();

        check_ownership(records)?;

        let adherence = analyze_adherence(&records.reminders, &self.config.adherence, now);
        let vitals = analyze_vitals(&records.vitals, &self.config.vitals, now);
        let exams = analyze_exams(&records.exams, &self.config.exams, now);
        let risk = score_patient(&adherence, &vitals, &exams, &self.config);
        let recommendations = recommend(&RecommendationContext {
            adherence: &adherence,
            vitals: &vitals,
            exams: &exams,
            risk: &risk,
            config: &self.config,
        });

        debug!(
            score = risk.value,
            level = risk.level.as_str(),
            recommendations = recommendations.len(),
            "summary assembled"
        );

        Ok(PatientSummary {
            patient_id: records.patient_id,
            generated_at: now,
            adherence,
            vitals,
            exams,
            risk,
            recommendations,
        })
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self {
            config: RuleConfig::default(),
        }
    }
}

fn check_ownership(records: &PatientRecords) -> Result<(), EngineError> {
    let expected = records.patient_id;
    let foreign = |kind: &'static str, record_id: Uuid, found: Uuid| {
        (found != expected).then_some(EngineError::ForeignRecord {
            kind,
            record_id,
            expected,
            found,
        })
    };

    let first_foreign = records
        .reminders
        .iter()
        .find_map(|event| foreign("reminder", event.id, event.patient_id))
        .or_else(|| {
            records
                .vitals
                .iter()
                .find_map(|vital| foreign("vital", vital.id, vital.patient_id))
        })
        .or_else(|| {
            records
                .exams
                .iter()
                .find_map(|exam| foreign("exam", exam.id, exam.patient_id))
        });

    match first_foreign {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
