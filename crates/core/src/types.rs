/// Every registry row is keyed by its IFC GlobalId.
pub type Guid = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Name of the only schema the registry tables live in.
pub const REGISTRY_SCHEMA: &str = "patrimoni";
