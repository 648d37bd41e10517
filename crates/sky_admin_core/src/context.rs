//! Request-scoped actor identity.
//!
//! # Responsibility
//! - Carry "who is making this call" from authentication down to the
//!   persistence boundary as an explicit value.
//!
//! # Invariants
//! - One `IdentityContext` belongs to exactly one logical request.
//! - The context is not `Clone`; it is passed by reference and dropped with
//!   the request, so a reused worker can never observe a previous actor.
//! - No process-wide or thread-local actor state exists anywhere in core.
//!
//! # See also
//! - `crate::auth::request::authenticate_request`

use uuid::Uuid;

/// Identifier of the authenticated principal (the actor's account id).
pub type ActorId = i64;

/// Identity bound to one logical request.
#[derive(Debug)]
pub struct IdentityContext {
    request_id: Uuid,
    actor: Option<ActorId>,
}

impl IdentityContext {
    /// Creates an anonymous context with a fresh request id.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: None,
        }
    }

    /// Creates a context already bound to `actor`.
    pub fn for_actor(actor: ActorId) -> Self {
        let mut ctx = Self::new();
        ctx.set(actor);
        ctx
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Binds `actor` to this request, replacing any previous binding.
    pub fn set(&mut self, actor: ActorId) {
        self.actor = Some(actor);
    }

    pub fn get(&self) -> Option<ActorId> {
        self.actor
    }

    /// Removes the actor binding; the request id is kept for log correlation.
    pub fn clear(&mut self) {
        self.actor = None;
    }
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityContext;

    #[test]
    fn new_context_is_anonymous() {
        let ctx = IdentityContext::new();
        assert_eq!(ctx.get(), None);
    }

    #[test]
    fn set_get_clear_lifecycle() {
        let mut ctx = IdentityContext::new();
        let request_id = ctx.request_id();

        ctx.set(42);
        assert_eq!(ctx.get(), Some(42));

        ctx.set(7);
        assert_eq!(ctx.get(), Some(7));

        ctx.clear();
        assert_eq!(ctx.get(), None);
        assert_eq!(ctx.request_id(), request_id);
    }

    #[test]
    fn contexts_get_distinct_request_ids() {
        let a = IdentityContext::for_actor(1);
        let b = IdentityContext::for_actor(1);
        assert_ne!(a.request_id(), b.request_id());
    }
}
