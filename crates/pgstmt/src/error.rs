//! Error types for pgstmt

use thiserror::Error;

/// Result type alias for pgstmt operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum StmtError {
    /// A statement was built without a target relation
    #[error("'target' is a required parameter")]
    TargetRequired,

    /// The target names a schema the catalog has never seen
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// The target names a relation the catalog has never seen
    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    /// The target string is not `relation` or `schema.relation`
    #[error("invalid relation target: {0}")]
    InvalidTarget(String),

    /// A raw WHERE template's `?` markers do not match its argument list
    #[error("template placeholder count ({markers}) does not match argument count ({args})")]
    TemplateArity { markers: usize, args: usize },

    /// UPDATE built without any SET values
    #[error("update without set values")]
    EmptySet,

    /// Row not found / zero rows affected
    #[error("not found: {0}")]
    NotFound(String),

    /// Query execution error
    #[error("query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("check constraint violation: {0}")]
    CheckViolation(String),

    /// Column decode/mapping error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StmtError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific StmtError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}
