//! Audit attributes and the typed capability that exposes them.

use crate::clock::Timestamp;
use crate::context::ActorId;
use serde::{Deserialize, Serialize};

/// The four audit attributes carried by auditable records.
///
/// All fields are optional so that partial projections and freshly built
/// records can exist before the interceptor stamps them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: Option<Timestamp>,
    pub created_by: Option<ActorId>,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<ActorId>,
}

impl AuditFields {
    /// Sets all four attributes; created and updated values are identical.
    pub fn stamp_created(&mut self, now: Timestamp, actor: ActorId) {
        self.created_at = Some(now);
        self.created_by = Some(actor);
        self.updated_at = Some(now);
        self.updated_by = Some(actor);
    }

    /// Refreshes the updated pair; created values are left untouched.
    pub fn stamp_updated(&mut self, now: Timestamp, actor: ActorId) {
        self.updated_at = Some(now);
        self.updated_by = Some(actor);
    }
}

/// Capability implemented by records whose audit attributes may be stamped.
pub trait Auditable {
    fn audit_mut(&mut self) -> &mut AuditFields;
}

/// Any record handed to a persistence entry point.
///
/// Records that carry audit attributes return themselves from
/// `as_auditable`; the default `None` marks a record that must never reach a
/// tagged entry point. Only the generic `AuditInterceptor::invoke` consults
/// it; `invoke_audited` requires `Auditable` at compile time.
pub trait Entity {
    /// Stable name used in logs and contract violations.
    const NAME: &'static str;

    fn as_auditable(&mut self) -> Option<&mut dyn Auditable> {
        None
    }
}
