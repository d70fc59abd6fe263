/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (daily reward bookkeeping) are the caller's local date.
pub type LocalDate = chrono::NaiveDate;
