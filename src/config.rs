use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::models::{RiskLevel, Severity, VitalFlagKind};

pub const MAX_WINDOW_DAYS: u32 = 36_500;

pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn crosses(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => value >= threshold,
            Direction::Below => value <= threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Direction::Above => ">=",
            Direction::Below => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScaling {
    BySeverity,
    Fixed,
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityTier {
    pub threshold: f64,
    pub severity: Severity,
}

const fn tier(threshold: f64, severity: Severity) -> SeverityTier {
    SeverityTier {
        threshold,
        severity,
    }
}

pub fn classify(tiers: &[SeverityTier], direction: Direction, value: f64) -> Severity {
    tiers
        .iter()
        .find(|tier| direction.crosses(value, tier.threshold))
        .map(|tier| tier.severity)
        .unwrap_or(Severity::Low)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalarBand {
    pub threshold: f64,
    pub min_readings: usize,
    pub tiers: Vec<SeverityTier>,
    pub weight: f64,
    pub scaling: WeightScaling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PressureBand {
    pub systolic: f64,
    pub diastolic: f64,
    pub min_readings: usize,
    pub systolic_tiers: Vec<SeverityTier>,
    pub diastolic_tiers: Vec<SeverityTier>,
    pub weight: f64,
    pub scaling: WeightScaling,
}

impl PressureBand {
    pub fn crosses(&self, direction: Direction, systolic: f64, diastolic: f64) -> bool {
        direction.crosses(systolic, self.systolic) || direction.crosses(diastolic, self.diastolic)
    }

    pub fn severity(&self, direction: Direction, systolic: f64, diastolic: f64) -> Severity {
        classify(&self.systolic_tiers, direction, systolic)
            .max(classify(&self.diastolic_tiers, direction, diastolic))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdherenceRules {
    pub window_days: u32,
    pub good_threshold: f64,
    pub medium_threshold: f64,
    pub bad_weight: f64,
    pub medium_weight: f64,
}

impl Default for AdherenceRules {
    fn default() -> Self {
        Self {
            window_days: 30,
            good_threshold: 90.0,
            medium_threshold: 75.0,
            bad_weight: 25.0,
            medium_weight: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VitalRules {
    pub window_days: u32,
    pub pressure_high: PressureBand,
    pub pressure_low: PressureBand,
    pub heart_rate_high: ScalarBand,
    pub heart_rate_low: ScalarBand,
    pub temperature_high: ScalarBand,
    pub temperature_low: ScalarBand,
    pub glucose_high: ScalarBand,
    pub glucose_low: ScalarBand,
    pub oxygen_low: ScalarBand,
    pub high_severity_multiplier: f64,
    pub elevated_multiplier: f64,
}

impl Default for VitalRules {
    fn default() -> Self {
        use Severity::{High, Medium};

        Self {
            window_days: 7,
            pressure_high: PressureBand {
                systolic: 140.0,
                diastolic: 90.0,
                min_readings: 2,
                systolic_tiers: vec![tier(160.0, High), tier(150.0, Medium)],
                diastolic_tiers: vec![tier(100.0, High), tier(95.0, Medium)],
                weight: 20.0,
                scaling: WeightScaling::BySeverity,
            },
            pressure_low: PressureBand {
                systolic: 90.0,
                diastolic: 60.0,
                min_readings: 2,
                systolic_tiers: vec![tier(80.0, High), tier(85.0, Medium)],
                diastolic_tiers: vec![tier(50.0, High), tier(55.0, Medium)],
                weight: 15.0,
                scaling: WeightScaling::BySeverity,
            },
            heart_rate_high: ScalarBand {
                threshold: 100.0,
                min_readings: 1,
                tiers: vec![tier(130.0, High), tier(120.0, Medium)],
                weight: 10.0,
                scaling: WeightScaling::Fixed,
            },
            heart_rate_low: ScalarBand {
                threshold: 50.0,
                min_readings: 1,
                tiers: vec![tier(40.0, High), tier(45.0, Medium)],
                weight: 10.0,
                scaling: WeightScaling::Fixed,
            },
            temperature_high: ScalarBand {
                threshold: 38.0,
                min_readings: 1,
                tiers: vec![tier(39.5, High), tier(39.0, Medium)],
                weight: 10.0,
                scaling: WeightScaling::Fixed,
            },
            temperature_low: ScalarBand {
                threshold: 35.0,
                min_readings: 1,
                tiers: vec![tier(34.0, High), tier(34.5, Medium)],
                weight: 10.0,
                scaling: WeightScaling::Fixed,
            },
            glucose_high: ScalarBand {
                threshold: 180.0,
                min_readings: 2,
                tiers: vec![tier(300.0, High), tier(250.0, Medium)],
                weight: 15.0,
                scaling: WeightScaling::BySeverity,
            },
            glucose_low: ScalarBand {
                threshold: 70.0,
                min_readings: 1,
                tiers: vec![tier(54.0, High), tier(60.0, Medium)],
                weight: 20.0,
                scaling: WeightScaling::Elevated,
            },
            oxygen_low: ScalarBand {
                threshold: 92.0,
                min_readings: 1,
                tiers: vec![tier(88.0, High), tier(90.0, Medium)],
                weight: 20.0,
                scaling: WeightScaling::BySeverity,
            },
            high_severity_multiplier: 1.5,
            elevated_multiplier: 1.5,
        }
    }
}

impl VitalRules {
    pub fn weighting(&self, kind: VitalFlagKind) -> (f64, WeightScaling) {
        match kind {
            VitalFlagKind::PressureHigh => (self.pressure_high.weight, self.pressure_high.scaling),
            VitalFlagKind::PressureLow => (self.pressure_low.weight, self.pressure_low.scaling),
            VitalFlagKind::HeartRateHigh => {
                (self.heart_rate_high.weight, self.heart_rate_high.scaling)
            }
            VitalFlagKind::HeartRateLow => (self.heart_rate_low.weight, self.heart_rate_low.scaling),
            VitalFlagKind::TemperatureHigh => {
                (self.temperature_high.weight, self.temperature_high.scaling)
            }
            VitalFlagKind::TemperatureLow => {
                (self.temperature_low.weight, self.temperature_low.scaling)
            }
            VitalFlagKind::GlucoseHigh => (self.glucose_high.weight, self.glucose_high.scaling),
            VitalFlagKind::GlucoseLow => (self.glucose_low.weight, self.glucose_low.scaling),
            VitalFlagKind::OxygenLow => (self.oxygen_low.weight, self.oxygen_low.scaling),
        }
    }

    pub fn flag_points(&self, kind: VitalFlagKind, severity: Severity) -> f64 {
        let (weight, scaling) = self.weighting(kind);
        match scaling {
            WeightScaling::BySeverity if severity == Severity::High => {
                weight * self.high_severity_multiplier
            }
            WeightScaling::BySeverity | WeightScaling::Fixed => weight,
            WeightScaling::Elevated => weight * self.elevated_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExamRules {
    pub overdue_days: u32,
    pub digest_size: usize,
    pub pending_threshold: usize,
    pub overdue_weight: f64,
    pub pending_weight: f64,
}

impl Default for ExamRules {
    fn default() -> Self {
        Self {
            overdue_days: 30,
            digest_size: 5,
            pending_threshold: 3,
            overdue_weight: 15.0,
            pending_weight: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskLevels {
    pub low_max: f64,
    pub moderate_max: f64,
}

impl Default for RiskLevels {
    fn default() -> Self {
        Self {
            low_max: 29.0,
            moderate_max: 59.0,
        }
    }
}

impl RiskLevels {
    pub fn level_for(&self, value: f64) -> RiskLevel {
        if value <= self.low_max {
            RiskLevel::Low
        } else if value <= self.moderate_max {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    pub adherence: AdherenceRules,
    pub vitals: VitalRules,
    pub exams: ExamRules,
    pub levels: RiskLevels,
}

impl RuleConfig {
    /// Builds a configuration from the defaults with `overrides` merged in field by field.
    pub fn with_overrides(overrides: Value) -> Result<Self, ConfigError> {
        let mut base =
            serde_json::to_value(Self::default()).map_err(|err| ConfigError::Parse(err.to_string()))?;
        merge(&mut base, overrides);
        let config: Self =
            serde_json::from_value(base).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let overrides: Value =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::with_overrides(overrides)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let adherence = &self.adherence;
        check_window("adherence.window_days", adherence.window_days)?;
        check_percent("adherence.good_threshold", adherence.good_threshold)?;
        check_percent("adherence.medium_threshold", adherence.medium_threshold)?;
        if adherence.good_threshold < adherence.medium_threshold {
            return Err(ConfigError::AdherenceThresholds {
                good: adherence.good_threshold,
                medium: adherence.medium_threshold,
            });
        }
        check_weight("adherence.bad_weight", adherence.bad_weight)?;
        check_weight("adherence.medium_weight", adherence.medium_weight)?;

        let vitals = &self.vitals;
        check_window("vitals.window_days", vitals.window_days)?;
        check_pressure("vitals.pressure_high", &vitals.pressure_high, Direction::Above)?;
        check_pressure("vitals.pressure_low", &vitals.pressure_low, Direction::Below)?;
        if vitals.pressure_low.systolic >= vitals.pressure_high.systolic
            || vitals.pressure_low.diastolic >= vitals.pressure_high.diastolic
        {
            return Err(ConfigError::OverlappingBands {
                field: "vitals.pressure",
            });
        }

        let scalar_pairs = [
            (
                "vitals.heart_rate",
                &vitals.heart_rate_high,
                &vitals.heart_rate_low,
            ),
            (
                "vitals.temperature",
                &vitals.temperature_high,
                &vitals.temperature_low,
            ),
            ("vitals.glucose", &vitals.glucose_high, &vitals.glucose_low),
        ];
        for (field, high, low) in scalar_pairs {
            check_scalar(field, high, Direction::Above)?;
            check_scalar(field, low, Direction::Below)?;
            if low.threshold >= high.threshold {
                return Err(ConfigError::OverlappingBands { field });
            }
        }
        check_scalar("vitals.oxygen_low", &vitals.oxygen_low, Direction::Below)?;
        check_weight(
            "vitals.high_severity_multiplier",
            vitals.high_severity_multiplier,
        )?;
        check_weight("vitals.elevated_multiplier", vitals.elevated_multiplier)?;

        let exams = &self.exams;
        check_window("exams.overdue_days", exams.overdue_days)?;
        check_weight("exams.overdue_weight", exams.overdue_weight)?;
        check_weight("exams.pending_weight", exams.pending_weight)?;

        let levels = &self.levels;
        let ordered = levels.low_max >= 0.0
            && levels.low_max < levels.moderate_max
            && levels.moderate_max < 100.0;
        if !ordered {
            return Err(ConfigError::LevelBoundaries {
                low_max: levels.low_max,
                moderate_max: levels.moderate_max,
            });
        }

        Ok(())
    }
}

fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn check_window(field: &'static str, days: u32) -> Result<(), ConfigError> {
    if days == 0 {
        return Err(ConfigError::EmptyWindow { field });
    }
    if days > MAX_WINDOW_DAYS {
        return Err(ConfigError::WindowTooLong {
            field,
            days,
            max: MAX_WINDOW_DAYS,
        });
    }
    Ok(())
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::PercentOutOfRange { field, value });
    }
    Ok(())
}

fn check_weight(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::NegativeWeight { field, value });
    }
    Ok(())
}

fn check_tiers(
    field: &'static str,
    tiers: &[SeverityTier],
    base: f64,
    direction: Direction,
) -> Result<(), ConfigError> {
    let beyond_base = tiers
        .iter()
        .all(|tier| direction.crosses(tier.threshold, base));
    let ordered = tiers.windows(2).all(|pair| {
        direction.crosses(pair[0].threshold, pair[1].threshold)
            && pair[0].severity > pair[1].severity
    });
    if !beyond_base || !ordered {
        return Err(ConfigError::TierOrder { field });
    }
    Ok(())
}

fn check_scalar(
    field: &'static str,
    band: &ScalarBand,
    direction: Direction,
) -> Result<(), ConfigError> {
    if band.min_readings == 0 {
        return Err(ConfigError::ZeroConfirmation { field });
    }
    check_weight(field, band.weight)?;
    check_tiers(field, &band.tiers, band.threshold, direction)
}

fn check_pressure(
    field: &'static str,
    band: &PressureBand,
    direction: Direction,
) -> Result<(), ConfigError> {
    if band.min_readings == 0 {
        return Err(ConfigError::ZeroConfirmation { field });
    }
    check_weight(field, band.weight)?;
    check_tiers(field, &band.systolic_tiers, band.systolic, direction)?;
    check_tiers(field, &band.diastolic_tiers, band.diastolic, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(RuleConfig::default().validate(), Ok(()));
    }

    #[test]
    fn classify_picks_most_severe_tier_first() {
        let band = RuleConfig::default().vitals.oxygen_low;
        assert_eq!(classify(&band.tiers, Direction::Below, 91.0), Severity::Low);
        assert_eq!(classify(&band.tiers, Direction::Below, 90.0), Severity::Medium);
        assert_eq!(classify(&band.tiers, Direction::Below, 87.0), Severity::High);
    }

    #[test]
    fn pressure_severity_takes_worse_of_both_numbers() {
        let band = RuleConfig::default().vitals.pressure_high;
        assert_eq!(band.severity(Direction::Above, 142.0, 90.0), Severity::Low);
        assert_eq!(band.severity(Direction::Above, 142.0, 101.0), Severity::High);
        assert_eq!(band.severity(Direction::Above, 165.0, 85.0), Severity::High);
    }

    #[test]
    fn flag_points_follow_scaling_policy() {
        let vitals = RuleConfig::default().vitals;
        assert_eq!(vitals.flag_points(VitalFlagKind::PressureHigh, Severity::Low), 20.0);
        assert_eq!(vitals.flag_points(VitalFlagKind::PressureHigh, Severity::High), 30.0);
        assert_eq!(vitals.flag_points(VitalFlagKind::HeartRateHigh, Severity::High), 10.0);
        assert_eq!(vitals.flag_points(VitalFlagKind::GlucoseLow, Severity::Low), 30.0);
        assert_eq!(vitals.flag_points(VitalFlagKind::OxygenLow, Severity::Medium), 20.0);
    }

    #[test]
    fn level_boundaries_are_inclusive() {
        let levels = RiskLevels::default();
        assert_eq!(levels.level_for(29.0), RiskLevel::Low);
        assert_eq!(levels.level_for(29.5), RiskLevel::Moderate);
        assert_eq!(levels.level_for(59.0), RiskLevel::Moderate);
        assert_eq!(levels.level_for(60.0), RiskLevel::High);
    }

    #[test]
    fn overrides_touch_only_named_fields() {
        let config = RuleConfig::with_overrides(json!({
            "adherence": { "bad_weight": 40.0 },
            "vitals": { "glucose_low": { "threshold": 65.0, "tiers": [] } }
        }))
        .unwrap();

        assert_eq!(config.adherence.bad_weight, 40.0);
        assert_eq!(config.adherence.good_threshold, 90.0);
        assert_eq!(config.vitals.glucose_low.threshold, 65.0);
        assert_eq!(config.vitals.glucose_low.weight, 20.0);
        assert!(config.vitals.glucose_low.tiers.is_empty());
        assert_eq!(config.vitals.glucose_high, RuleConfig::default().vitals.glucose_high);
    }

    #[test]
    fn rejects_inverted_adherence_thresholds() {
        let err = RuleConfig::with_overrides(json!({
            "adherence": { "good_threshold": 70.0 }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::AdherenceThresholds {
                good: 70.0,
                medium: 75.0
            }
        );
    }

    #[test]
    fn rejects_inverted_level_boundaries() {
        let mut config = RuleConfig::default();
        config.levels.low_max = 60.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LevelBoundaries { .. })
        ));
    }

    #[test]
    fn rejects_misordered_tiers() {
        let mut config = RuleConfig::default();
        config.vitals.oxygen_low.tiers.reverse();
        assert_eq!(
            config.validate(),
            Err(ConfigError::TierOrder {
                field: "vitals.oxygen_low"
            })
        );
    }

    #[test]
    fn rejects_zero_confirmation_and_empty_window() {
        let mut config = RuleConfig::default();
        config.vitals.pressure_high.min_readings = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroConfirmation {
                field: "vitals.pressure_high"
            })
        );

        let mut config = RuleConfig::default();
        config.exams.overdue_days = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyWindow {
                field: "exams.overdue_days"
            })
        );
    }

    #[test]
    fn rejects_windows_longer_than_a_century() {
        let err = RuleConfig::from_json_str(r#"{"exams":{"overdue_days":200000000}}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::WindowTooLong {
                field: "exams.overdue_days",
                days: 200_000_000,
                max: MAX_WINDOW_DAYS,
            }
        );

        let mut config = RuleConfig::default();
        config.vitals.window_days = MAX_WINDOW_DAYS;
        assert_eq!(config.validate(), Ok(()));
        config.adherence.window_days = MAX_WINDOW_DAYS + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WindowTooLong {
                field: "adherence.window_days",
                ..
            })
        ));
    }

    #[test]
    fn window_start_saturates_at_earliest_instant() {
        let start = window_start(DateTime::<Utc>::MIN_UTC, 30);
        assert_eq!(start, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn rejects_unparseable_overrides() {
        let err = RuleConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
