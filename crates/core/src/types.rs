/// Entity primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar day used for trend bucketing.
pub type EntryDate = chrono::NaiveDate;
