use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read rule configuration: {0}")]
    Parse(String),
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
    #[error("adherence good threshold ({good}) is below the medium threshold ({medium})")]
    AdherenceThresholds { good: f64, medium: f64 },
    #[error("risk level boundaries must satisfy 0 <= low_max ({low_max}) < moderate_max ({moderate_max}) < 100")]
    LevelBoundaries { low_max: f64, moderate_max: f64 },
    #[error("{field} must be a positive number of days")]
    EmptyWindow { field: &'static str },
    #[error("{field} must be at most {max} days, got {days}")]
    WindowTooLong {
        field: &'static str,
        days: u32,
        max: u32,
    },
    #[error("{field} must require at least one reading")]
    ZeroConfirmation { field: &'static str },
    #[error("{field} must be a finite, non-negative number, got {value}")]
    NegativeWeight { field: &'static str, value: f64 },
    #[error("{field} severity tiers must run from most to least severe and lie beyond the base threshold")]
    TierOrder { field: &'static str },
    #[error("{field} high and low thresholds overlap")]
    OverlappingBands { field: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} {record_id} belongs to patient {found}, not {expected}")]
    ForeignRecord {
        kind: &'static str,
        record_id: Uuid,
        expected: Uuid,
        found: Uuid,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
