mod field;
mod finding;
mod record;

pub use field::{ConfigField, FieldKind};
pub use finding::{Finding, FindingKind, Severity};
pub use record::{ConfigurationRecord, DEFAULT_CONFIG_ID, EXPECTED_ITEMS, VALIDITY_MARKER};
