/// Entity and principal identifiers are opaque strings. Upstream services
/// issue them as document ids or numeric row ids; both are compared as text.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
