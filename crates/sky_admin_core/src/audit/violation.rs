//! Contract violations raised by the audit interceptor.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Programming or configuration defect detected at a tagged entry point.
///
/// Never a user input problem: the operation is aborted and the request
/// should fail loudly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A tagged mutation was reached without an authenticated actor.
    MissingActor {
        entry_point: &'static str,
        request_id: Uuid,
    },
    /// A tagged mutation received a record without the `Auditable` capability.
    NotAuditable {
        entry_point: &'static str,
        entity: &'static str,
    },
}

impl ContractViolation {
    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingActor { .. } => "audit_missing_actor",
            Self::NotAuditable { .. } => "audit_not_auditable",
        }
    }
}

impl Display for ContractViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingActor {
                entry_point,
                request_id,
            } => write!(
                f,
                "entry point `{entry_point}` requires an authenticated actor (request {request_id})"
            ),
            Self::NotAuditable {
                entry_point,
                entity,
            } => write!(
                f,
                "entry point `{entry_point}` received `{entity}`, which does not expose audit fields"
            ),
        }
    }
}

impl Error for ContractViolation {}
