//! Storage error model and SQLx error mapping.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | StorageError |
//! |------------|----------|--------------|
//! | `RowNotFound` | N/A | `Known(RecordNotFound)` |
//! | Database | `23505` | `Known(UniqueViolation)` (fields from the detail line) |
//! | Database | `23503` | `Known(ForeignKeyViolation)` |
//! | Database | `23001` | `Known(InvalidRelation)` |
//! | Database | class `22`, `23502`, `23514` | `InvalidData` |
//! | Database | class `08`, class `28`, `3D000`, `53300`, `57P01`..`57P03` | `Connection` |
//! | Database | any other code | `Known(Other(code))` |
//! | Database | no code | `Unclassified` |
//! | Pool / IO / TLS / configuration / protocol | N/A | `Connection` |
//! | Encode / decode / column lookup | N/A | `InvalidData` |
//! | Other | N/A | `Unclassified` |

use sqlx::error::DatabaseError;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Vendor classification of a storage failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorCode {
    /// A unique constraint rejected the write. `fields` may be empty when the
    /// database did not say which columns were involved.
    UniqueViolation { fields: Vec<String> },
    RecordNotFound,
    ForeignKeyViolation,
    /// A required relation would be broken by the change.
    InvalidRelation,
    /// Any other code the database reported (the raw SQLSTATE).
    Other(String),
}

impl VendorCode {
    pub fn as_str(&self) -> &str {
        match self {
            VendorCode::UniqueViolation { .. } => "unique_violation",
            VendorCode::RecordNotFound => "record_not_found",
            VendorCode::ForeignKeyViolation => "foreign_key_violation",
            VendorCode::InvalidRelation => "invalid_relation",
            VendorCode::Other(code) => code,
        }
    }
}

impl core::fmt::Display for VendorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by the persistence layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The database rejected the operation with a recognized code.
    #[error("{code}: {message}")]
    Known { code: VendorCode, message: String },

    /// The data handed to the database did not fit the schema.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The database could not be reached or the pool is unusable.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Anything the mapping does not recognize.
    #[error("database error: {0}")]
    Unclassified(String),
}

impl StorageError {
    pub fn known(code: VendorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn unique_violation<I, S>(fields: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::known(
            VendorCode::UniqueViolation {
                fields: fields.into_iter().map(Into::into).collect(),
            },
            message,
        )
    }

    pub fn not_found() -> Self {
        Self::known(VendorCode::RecordNotFound, "record not found")
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::not_found(),
            sqlx::Error::Database(db) => from_database_error(db.as_ref()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::Protocol(_) => Self::Connection(err.to_string()),
            sqlx::Error::Encode(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => Self::InvalidData(err.to_string()),
            _ => Self::Unclassified(err.to_string()),
        }
    }
}

fn from_database_error(db: &(dyn DatabaseError + 'static)) -> StorageError {
    let detail = db
        .try_downcast_ref::<PgDatabaseError>()
        .and_then(PgDatabaseError::detail);

    match db.code() {
        Some(code) => classify_sqlstate(&code, db.message(), detail),
        None => StorageError::Unclassified(db.message().to_string()),
    }
}

/// Classify a PostgreSQL SQLSTATE.
pub fn classify_sqlstate(code: &str, message: &str, detail: Option<&str>) -> StorageError {
    match code {
        "23505" => StorageError::unique_violation(
            detail.map(key_columns).unwrap_or_default(),
            message,
        ),
        "23503" => StorageError::known(VendorCode::ForeignKeyViolation, message),
        "23001" => StorageError::known(VendorCode::InvalidRelation, message),
        "23502" | "23514" => StorageError::InvalidData(message.to_string()),
        "3D000" | "53300" | "57P01" | "57P02" | "57P03" => {
            StorageError::Connection(message.to_string())
        }
        _ if code.starts_with("22") => StorageError::InvalidData(message.to_string()),
        _ if code.starts_with("08") || code.starts_with("28") => {
            StorageError::Connection(message.to_string())
        }
        other => StorageError::known(VendorCode::Other(other.to_string()), message),
    }
}

/// Column names from a PostgreSQL detail line such as
/// `Key (first_name, last_name)=(Ada, Lovelace) already exists.`
pub fn key_columns(detail: &str) -> Vec<String> {
    let Some(rest) = detail.strip_prefix("Key (") else {
        return Vec::new();
    };
    let Some(end) = rest.find(")=") else {
        return Vec::new();
    };

    rest[..end]
        .split(',')
        .map(|column| column.trim().trim_matches('"').to_string())
        .filter(|column| !column.is_empty())
        .collect()
}
