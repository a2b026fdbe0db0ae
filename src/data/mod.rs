pub mod database;
pub mod entity;
pub mod validate;

pub use database::{load_database, Database, DEFAULT_DATABASE_PATH};
pub use entity::{Bucket, EntityRecord, EntityStats, SetSpec};
pub use validate::{validate_database, ValidationDiagnostic, ValidationReport, ValidationSeverity};
