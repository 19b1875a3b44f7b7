pub mod adherence;
pub mod config;
pub mod engine;
pub mod error;
pub mod exams;
pub mod input;
pub mod models;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod vitals;

pub use config::RuleConfig;
pub use engine::RiskEngine;
pub use error::{ConfigError, EngineError};
pub use models::{PatientRecords, PatientSummary};
