//! Service-level error taxonomy.
//!
//! Every catalog operation fails with exactly one of four kinds. Callers
//! (HTTP layer, seeders, tests) match on the kind; the message is for humans.

use thiserror::Error;

use wareflow_core::DomainError;

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Input failed a rule. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The write collides with existing state (sku taken, duplicate edge).
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The storage layer failed. The unit of work was rolled back.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

/// Stable machine-readable error code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            e @ DomainError::NotFound(_) => ServiceError::NotFound(e.to_string()),
        }
    }
}

/// Generic mapping. Services that know which constraint a violation came from
/// rewrite the message before converting.
impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(msg) => ServiceError::Conflict(msg),
            StoreError::ForeignKeyViolation(msg) => ServiceError::NotFound(msg),
            StoreError::Rejected(domain) => domain.into(),
            other => ServiceError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FailPoint;

    #[test]
    fn store_errors_map_onto_four_kinds() {
        let cases = [
            (StoreError::UniqueViolation("sku".into()), ErrorKind::Conflict),
            (StoreError::ForeignKeyViolation("warehouse".into()), ErrorKind::NotFound),
            (StoreError::Rejected(DomainError::validation("bad")), ErrorKind::Validation),
            (StoreError::Rejected(DomainError::conflict("dup")), ErrorKind::Conflict),
            (StoreError::FailPoint(FailPoint::BeforeCommit), ErrorKind::Internal),
            (StoreError::Backend("disk full".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(ServiceError::from(err).kind(), kind);
        }
    }

    #[test]
    fn domain_not_found_keeps_its_subject() {
        let err = ServiceError::from(DomainError::not_found("warehouse 999"));
        assert_eq!(err, ServiceError::NotFound("warehouse 999 not found".to_string()));
        assert_eq!(err.kind().as_str(), "not_found");
    }
}
