use crate::config::RuleConfig;
use crate::models::{
    format_number, AdherenceStatus, AdherenceSummary, ExamsSummary, RiskLevel, RiskScore,
    Severity, VitalChannel, VitalFlag, VitalFlagKind, VitalsSummary,
};

pub const STABLE_MESSAGE: &str = "Patient is stable. Continue routine follow-up.";

pub struct RecommendationContext<'a> {
    pub adherence: &'a AdherenceSummary,
    pub vitals: &'a VitalsSummary,
    pub exams: &'a ExamsSummary,
    pub risk: &'a RiskScore,
    pub config: &'a RuleConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    PoorAdherence,
    PartialAdherence,
    Flag(VitalFlagKind),
    OverdueExams,
    PendingExams,
    HighRisk,
    ModerateRisk,
}

/// Evaluation order is output order.
const RULES: [Rule; 15] = [
    Rule::PoorAdherence,
    Rule::PartialAdherence,
    Rule::Flag(VitalFlagKind::PressureHigh),
    Rule::Flag(VitalFlagKind::PressureLow),
    Rule::Flag(VitalFlagKind::HeartRateHigh),
    Rule::Flag(VitalFlagKind::HeartRateLow),
    Rule::Flag(VitalFlagKind::TemperatureHigh),
    Rule::Flag(VitalFlagKind::TemperatureLow),
    Rule::Flag(VitalFlagKind::GlucoseHigh),
    Rule::Flag(VitalFlagKind::GlucoseLow),
    Rule::Flag(VitalFlagKind::OxygenLow),
    Rule::OverdueExams,
    Rule::PendingExams,
    Rule::HighRisk,
    Rule::ModerateRisk,
];

impl Rule {
    fn evaluate(self, ctx: &RecommendationContext<'_>) -> Option<String> {
        let rate = ctx.adherence.adherence_rate_percent;
        let score = format_number(ctx.risk.value);
        match self {
            Rule::PoorAdherence if ctx.adherence.status == AdherenceStatus::Bad => Some(format!(
                "Medication adherence is low ({rate:.2}%). Review barriers to taking medication and consider reminders or a simpler regimen."
            )),
            Rule::PartialAdherence if ctx.adherence.status == AdherenceStatus::Medium => {
                Some(format!(
                    "Medication adherence is moderate ({rate:.2}%). Reinforce the dosing schedule with the patient."
                ))
            }
            Rule::Flag(kind) => ctx
                .vitals
                .flags
                .iter()
                .find(|flag| flag.flag == kind)
                .map(flag_message),
            Rule::OverdueExams if ctx.exams.overdue_count > 0 => Some(format!(
                "{} overdue exam(s). Reschedule them as soon as possible.",
                ctx.exams.overdue_count
            )),
            Rule::PendingExams if ctx.exams.pending_count > ctx.config.exams.pending_threshold => {
                Some(format!(
                    "{} exams pending. Follow up on scheduling and outstanding results.",
                    ctx.exams.pending_count
                ))
            }
            Rule::HighRisk if ctx.risk.level == RiskLevel::High => Some(format!(
                "Overall risk is high (score {score}). Schedule a clinical review within the next few days."
            )),
            Rule::ModerateRisk if ctx.risk.level == RiskLevel::Moderate => Some(format!(
                "Overall risk is moderate (score {score}). Increase monitoring and review at the next visit."
            )),
            _ => None,
        }
    }
}

pub fn recommend(ctx: &RecommendationContext<'_>) -> Vec<String> {
    let mut recommendations: Vec<String> =
        RULES.iter().filter_map(|rule| rule.evaluate(ctx)).collect();

    if recommendations.is_empty() {
        recommendations.push(STABLE_MESSAGE.to_string());
    }

    recommendations
}

fn is_urgent(flag: &VitalFlag) -> bool {
    flag.severity == Severity::High
        && matches!(
            flag.flag.channel(),
            VitalChannel::BloodPressure | VitalChannel::Glucose | VitalChannel::OxygenSaturation
        )
}

fn flag_message(flag: &VitalFlag) -> String {
    let value = &flag.observed_value;
    let readings = flag.readings;
    let body = match flag.flag {
        VitalFlagKind::PressureHigh => format!(
            "Blood pressure elevated ({value} mmHg, {readings} readings). Review antihypertensive therapy and recheck within a week."
        ),
        VitalFlagKind::PressureLow => format!(
            "Blood pressure low ({value} mmHg, {readings} readings). Check for dizziness, dehydration or over-treatment."
        ),
        VitalFlagKind::HeartRateHigh => format!(
            "Heart rate elevated ({value} bpm). Recheck at rest and assess for fever, pain or arrhythmia."
        ),
        VitalFlagKind::HeartRateLow => format!(
            "Heart rate low ({value} bpm). Review rate-limiting medications."
        ),
        VitalFlagKind::TemperatureHigh => format!(
            "Fever recorded ({value} °C). Assess for infection."
        ),
        VitalFlagKind::TemperatureLow => format!(
            "Low body temperature recorded ({value} °C). Recheck and assess for exposure."
        ),
        VitalFlagKind::GlucoseHigh => format!(
            "Glucose elevated ({value} mg/dL, {readings} readings). Review the diabetes management plan."
        ),
        VitalFlagKind::GlucoseLow => format!(
            "Hypoglycemia recorded ({value} mg/dL). Review glucose-lowering doses and confirm the patient knows how to treat lows."
        ),
        VitalFlagKind::OxygenLow => format!(
            "Oxygen saturation low ({value}%). Evaluate respiratory status."
        ),
    };

    if is_urgent(flag) {
        format!("URGENT: {body}")
    } else {
        body
    }
}
