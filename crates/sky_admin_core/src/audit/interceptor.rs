//! Before-write audit stamping for tagged entry points.
//!
//! # Responsibility
//! - Resolve the entry point's tag, read the request actor and the clock, and
//!   stamp the target record's audit fields.
//! - Run the actual write only after stamping succeeded.
//!
//! # Invariants
//! - The target record is always the first argument of a guarded call.
//! - Stamping and the write form one unit: a violation means the write
//!   closure is never invoked, and a dropped call leaves nothing persisted.
//! - The interceptor mutates only the record it was handed; it holds no
//!   per-request state and is shared freely across threads.
//! - `invoke_audited` targets are `Auditable` by type; only the generic
//!   `invoke` can report `NotAuditable`.

use super::classifier::{EntryPoint, OperationClassifier, OperationTag};
use super::fields::{Auditable, Entity};
use super::violation::ContractViolation;
use crate::clock::{Clock, SystemClock};
use crate::context::IdentityContext;
use log::{debug, error};
use std::fmt::{Debug, Formatter};

/// Applies the audit policy declared in an `OperationClassifier`.
pub struct AuditInterceptor {
    classifier: OperationClassifier,
    clock: Box<dyn Clock>,
}

impl Debug for AuditInterceptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditInterceptor")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl AuditInterceptor {
    /// Creates an interceptor stamping with the system wall clock.
    pub fn new(classifier: OperationClassifier) -> Self {
        Self::with_clock(classifier, SystemClock::new())
    }

    pub fn with_clock(classifier: OperationClassifier, clock: impl Clock + 'static) -> Self {
        Self {
            classifier,
            clock: Box::new(clock),
        }
    }

    /// Stamps `target` according to the tag declared for `entry_point`.
    ///
    /// Returns the applied tag, or `None` for untagged entry points.
    ///
    /// # Errors
    /// - `NotAuditable` when a tagged entry point receives a record without
    ///   audit fields.
    /// - `MissingActor` when `ctx` has no bound actor.
    pub fn before<E: Entity>(
        &self,
        entry_point: EntryPoint,
        ctx: &IdentityContext,
        target: &mut E,
    ) -> Result<Option<OperationTag>, ContractViolation> {
        let Some(tag) = self.classifier.classify(entry_point) else {
            return Ok(None);
        };

        let Some(auditable) = target.as_auditable() else {
            return Err(reject(
                ContractViolation::NotAuditable {
                    entry_point: entry_point.name(),
                    entity: E::NAME,
                },
                ctx,
            ));
        };

        self.stamp(entry_point, tag, E::NAME, ctx, auditable)?;
        Ok(Some(tag))
    }

    /// Same as `before` for targets that carry audit fields by type.
    pub fn before_audited<E: Entity + Auditable>(
        &self,
        entry_point: EntryPoint,
        ctx: &IdentityContext,
        target: &mut E,
    ) -> Result<Option<OperationTag>, ContractViolation> {
        let Some(tag) = self.classifier.classify(entry_point) else {
            return Ok(None);
        };
        self.stamp(entry_point, tag, E::NAME, ctx, target)?;
        Ok(Some(tag))
    }

    /// Stamps `entity`, then hands it to `write`.
    ///
    /// `write` is the underlying persistence call; it is not invoked when
    /// stamping fails.
    pub fn invoke<E, T, Err, W>(
        &self,
        entry_point: EntryPoint,
        ctx: &IdentityContext,
        entity: &mut E,
        write: W,
    ) -> Result<T, Err>
    where
        E: Entity,
        Err: From<ContractViolation>,
        W: FnOnce(&mut E) -> Result<T, Err>,
    {
        self.before(entry_point, ctx, entity)?;
        write(entity)
    }

    /// Typed guarded call: `entity` must implement `Auditable`.
    pub fn invoke_audited<E, T, Err, W>(
        &self,
        entry_point: EntryPoint,
        ctx: &IdentityContext,
        entity: &mut E,
        write: W,
    ) -> Result<T, Err>
    where
        E: Entity + Auditable,
        Err: From<ContractViolation>,
        W: FnOnce(&mut E) -> Result<T, Err>,
    {
        self.before_audited(entry_point, ctx, entity)?;
        write(entity)
    }

    /// Runs a guarded call that has no target record.
    ///
    /// Nothing is stamped and a missing actor is not an error here.
    pub fn invoke_untargeted<T, Err, W>(
        &self,
        entry_point: EntryPoint,
        ctx: &IdentityContext,
        write: W,
    ) -> Result<T, Err>
    where
        W: FnOnce() -> Result<T, Err>,
    {
        if let Some(tag) = self.classifier.classify(entry_point) {
            debug!(
                "event=audit_fill module=audit status=skipped reason=no_target entry_point={} tag={} request_id={}",
                entry_point,
                tag.as_str(),
                ctx.request_id()
            );
        }
        write()
    }

    fn stamp(
        &self,
        entry_point: EntryPoint,
        tag: OperationTag,
        entity: &'static str,
        ctx: &IdentityContext,
        target: &mut dyn Auditable,
    ) -> Result<(), ContractViolation> {
        let Some(actor) = ctx.get() else {
            return Err(reject(
                ContractViolation::MissingActor {
                    entry_point: entry_point.name(),
                    request_id: ctx.request_id(),
                },
                ctx,
            ));
        };

        let now = self.clock.now_millis();
        match tag {
            OperationTag::Create => target.audit_mut().stamp_created(now, actor),
            OperationTag::Update => target.audit_mut().stamp_updated(now, actor),
        }

        debug!(
            "event=audit_fill module=audit status=ok entry_point={} tag={} entity={} actor={} request_id={}",
            entry_point,
            tag.as_str(),
            entity,
            actor,
            ctx.request_id()
        );
        Ok(())
    }
}

fn reject(violation: ContractViolation, ctx: &IdentityContext) -> ContractViolation {
    error!(
        "event=audit_fill module=audit status=error error_code={} request_id={} error={}",
        violation.code(),
        ctx.request_id(),
        violation
    );
    violation
}

#[cfg(test)]
mod tests {
    use super::AuditInterceptor;
    use crate::audit::{
        AuditFields, Auditable, ContractViolation, Entity, EntryPoint, OperationClassifier,
        OperationTag,
    };
    use crate::clock::{Clock, Timestamp};
    use crate::context::IdentityContext;
    use std::sync::atomic::{AtomicI64, Ordering};

    const INSERT: EntryPoint = EntryPoint::new("widget.insert");
    const UPDATE: EntryPoint = EntryPoint::new("widget.update");
    const REINDEX: EntryPoint = EntryPoint::new("widget.reindex");

    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now_millis(&self) -> Timestamp {
            self.0.fetch_add(10, Ordering::SeqCst)
        }
    }

    #[derive(Debug, Default)]
    struct Widget {
        audit: AuditFields,
    }

    impl Auditable for Widget {
        fn audit_mut(&mut self) -> &mut AuditFields {
            &mut self.audit
        }
    }

    impl Entity for Widget {
        const NAME: &'static str = "widget";

        fn as_auditable(&mut self) -> Option<&mut dyn Auditable> {
            Some(self)
        }
    }

    struct Plain;

    impl Entity for Plain {
        const NAME: &'static str = "plain";
    }

    fn interceptor() -> AuditInterceptor {
        let classifier = OperationClassifier::builder()
            .tag(INSERT, OperationTag::Create)
            .tag(UPDATE, OperationTag::Update)
            .build()
            .expect("classifier should build");
        AuditInterceptor::with_clock(classifier, StepClock(AtomicI64::new(1_000)))
    }

    #[test]
    fn untagged_entry_point_is_a_no_op_even_without_actor() {
        let interceptor = interceptor();
        let ctx = IdentityContext::new();
        let mut widget = Widget::default();

        let applied = interceptor
            .before(REINDEX, &ctx, &mut widget)
            .expect("untagged calls never fail");

        assert_eq!(applied, None);
        assert_eq!(widget.audit, AuditFields::default());
    }

    #[test]
    fn create_stamps_all_four_fields() {
        let interceptor = interceptor();
        let ctx = IdentityContext::for_actor(42);
        let mut widget = Widget::default();

        let applied = interceptor.before(INSERT, &ctx, &mut widget).unwrap();

        assert_eq!(applied, Some(OperationTag::Create));
        assert_eq!(widget.audit.created_at, Some(1_000));
        assert_eq!(widget.audit.updated_at, Some(1_000));
        assert_eq!(widget.audit.created_by, Some(42));
        assert_eq!(widget.audit.updated_by, Some(42));
    }

    #[test]
    fn update_refreshes_only_updated_pair() {
        let interceptor = interceptor();
        let mut widget = Widget::default();
        interceptor
            .before(INSERT, &IdentityContext::for_actor(42), &mut widget)
            .unwrap();
        let created = widget.audit;

        interceptor
            .before(UPDATE, &IdentityContext::for_actor(7), &mut widget)
            .unwrap();

        assert_eq!(widget.audit.created_at, created.created_at);
        assert_eq!(widget.audit.created_by, created.created_by);
        assert_eq!(widget.audit.updated_by, Some(7));
        assert!(widget.audit.updated_at > created.updated_at);
    }

    #[test]
    fn missing_actor_is_a_contract_violation_and_leaves_record_untouched() {
        let interceptor = interceptor();
        let ctx = IdentityContext::new();
        let mut widget = Widget::default();

        let err = interceptor.before(INSERT, &ctx, &mut widget).unwrap_err();

        assert_eq!(
            err,
            ContractViolation::MissingActor {
                entry_point: "widget.insert",
                request_id: ctx.request_id(),
            }
        );
        assert_eq!(widget.audit, AuditFields::default());
    }

    #[test]
    fn cleared_context_is_treated_as_missing_actor() {
        let interceptor = interceptor();
        let mut ctx = IdentityContext::for_actor(42);
        ctx.clear();

        let err = interceptor
            .before(UPDATE, &ctx, &mut Widget::default())
            .unwrap_err();
        assert!(matches!(err, ContractViolation::MissingActor { .. }));
    }

    #[test]
    fn non_auditable_target_is_a_contract_violation() {
        let interceptor = interceptor();
        let ctx = IdentityContext::for_actor(42);

        let err = interceptor.before(UPDATE, &ctx, &mut Plain).unwrap_err();

        assert_eq!(
            err,
            ContractViolation::NotAuditable {
                entry_point: "widget.update",
                entity: "plain",
            }
        );
    }

    #[test]
    fn invoke_writes_after_stamping() {
        let interceptor = interceptor();
        let ctx = IdentityContext::for_actor(42);
        let mut widget = Widget::default();

        let seen = interceptor
            .invoke(INSERT, &ctx, &mut widget, |w| {
                Ok::<_, ContractViolation>(w.audit)
            })
            .unwrap();

        assert_eq!(seen.created_by, Some(42));
        assert_eq!(seen, widget.audit);
    }

    #[test]
    fn invoke_skips_write_on_violation() {
        let interceptor = interceptor();
        let ctx = IdentityContext::new();
        let mut widget = Widget::default();
        let mut written = false;

        let result = interceptor.invoke(INSERT, &ctx, &mut widget, |_| {
            written = true;
            Ok::<_, ContractViolation>(())
        });

        assert!(result.is_err());
        assert!(!written);
    }

    #[test]
    fn invoke_untargeted_runs_without_actor() {
        let interceptor = interceptor();
        let ctx = IdentityContext::new();

        let value = interceptor
            .invoke_untargeted(INSERT, &ctx, || Ok::<_, ContractViolation>(5))
            .unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn invoke_audited_stamps_typed_targets() {
        let interceptor = interceptor();
        let mut widget = Widget::default();

        interceptor
            .invoke_audited(INSERT, &IdentityContext::for_actor(42), &mut widget, |_| {
                Ok::<_, ContractViolation>(())
            })
            .unwrap();
        assert_eq!(widget.audit.created_by, Some(42));

        let applied = interceptor
            .before_audited(REINDEX, &IdentityContext::new(), &mut widget)
            .unwrap();
        assert_eq!(applied, None);
    }

    #[test]
    fn invoke_audited_still_requires_an_actor() {
        let interceptor = interceptor();
        let mut widget = Widget::default();
        let mut written = false;

        let err = interceptor
            .invoke_audited(UPDATE, &IdentityContext::new(), &mut widget, |_| {
                written = true;
                Ok::<_, ContractViolation>(())
            })
            .unwrap_err();

        assert!(matches!(err, ContractViolation::MissingActor { .. }));
        assert!(!written);
        assert_eq!(widget.audit, AuditFields::default());
    }
}
