//! Background audit log writer.
//!
//! `add_log` enqueues a record and returns; a single worker task appends
//! records to the [`AuditStore`] in submission order. A record whose write
//! fails is logged and dropped (at-most-once, no retry).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use orgadmin_audit::{AuditError, LogAction, NewLogEntry, SubjectRef};
use orgadmin_auth::{Entity, Role, Session, User};
use orgadmin_core::{EntityId, UserId};

use crate::AuditStore;

enum Command {
    Append(NewLogEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle to the audit writer task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    tx: mpsc::UnboundedSender<Command>,
}

impl AuditLogger {
    /// Spawn the writer on the current tokio runtime.
    ///
    /// The task ends once every `AuditLogger` clone is dropped and the queue
    /// has drained.
    pub fn spawn(store: Arc<dyn AuditStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(writer_loop(store, rx));
        (Self { tx }, join)
    }

    /// Hand one record to the writer.
    ///
    /// Only fails when the writer task is gone; store failures surface in
    /// the logs, not here.
    pub fn add_log(&self, entry: NewLogEntry) -> Result<(), AuditError> {
        self.tx
            .send(Command::Append(entry))
            .map_err(|_| AuditError::WriterClosed)
    }

    /// Wait until everything enqueued before this call has been written
    /// (or dropped after a failure).
    pub async fn flush(&self) -> Result<(), AuditError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(done_tx))
            .map_err(|_| AuditError::WriterClosed)?;
        done_rx.await.map_err(|_| AuditError::WriterClosed)
    }

    /// Helpers bound to the acting session.
    pub fn scope<'a>(&'a self, session: Option<&Session>) -> AuditScope<'a> {
        AuditScope {
            logger: self,
            actor: session.map(Session::user_id),
            entity: None,
        }
    }
}

async fn writer_loop(store: Arc<dyn AuditStore>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append(entry) => {
                let action_type = entry.action().action_type();
                match store.append(entry).await {
                    Ok(stored) => debug!(log_id = %stored.id, %action_type, "audit entry written"),
                    Err(err) => error!(%action_type, error = %err, "audit entry dropped"),
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("audit writer stopped");
}

/// Typed log helpers, one per action.
///
/// The actor defaults to the session user; entity-scoped helpers default the
/// entry's entity to the entity they touched. Failures are logged at `warn`
/// and never reach the caller.
#[derive(Debug, Clone, Copy)]
pub struct AuditScope<'a> {
    logger: &'a AuditLogger,
    actor: Option<UserId>,
    entity: Option<EntityId>,
}

impl<'a> AuditScope<'a> {
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn user_create(&self, user: &User) {
        self.global(LogAction::UserCreate { user: user_ref(user) });
    }

    pub fn user_update(&self, user: &User) {
        self.global(LogAction::UserUpdate { user: user_ref(user) });
    }

    pub fn user_delete(&self, user: &User) {
        self.global(LogAction::UserDelete { user: user_ref(user) });
    }

    pub fn user_set_role(&self, user: &User) {
        self.global(LogAction::UserSetRole { user: user_ref(user) });
    }

    pub fn user_set_entity(&self, user: &User) {
        self.global(LogAction::UserSetEntity { user: user_ref(user) });
    }

    pub fn user_disable(&self, user: &User) {
        self.global(LogAction::UserDisable { user: user_ref(user) });
    }

    pub fn user_enable(&self, user: &User) {
        self.global(LogAction::UserEnable { user: user_ref(user) });
    }

    pub fn user_email_verified(&self, user: &User) {
        self.global(LogAction::UserEmailVerified { user: user_ref(user) });
    }

    pub fn role_create(&self, role: &Role) {
        self.global(LogAction::RoleCreate { role: role_ref(role) });
    }

    pub fn role_update(&self, role: &Role) {
        self.global(LogAction::RoleUpdate { role: role_ref(role) });
    }

    pub fn role_delete(&self, role: &Role) {
        self.global(LogAction::RoleDelete { role: role_ref(role) });
    }

    pub fn role_set_permission(&self, role: &Role) {
        self.global(LogAction::RoleSetPermission { role: role_ref(role) });
    }

    pub fn entity_create(&self, entity: &Entity) {
        self.scoped(entity, LogAction::EntityCreate { entity: entity_ref(entity) });
    }

    pub fn entity_update(&self, entity: &Entity) {
        self.scoped(entity, LogAction::EntityUpdate { entity: entity_ref(entity) });
    }

    pub fn entity_disable(&self, entity: &Entity) {
        self.scoped(entity, LogAction::EntityDisable { entity: entity_ref(entity) });
    }

    pub fn entity_enable(&self, entity: &Entity) {
        self.scoped(entity, LogAction::EntityEnable { entity: entity_ref(entity) });
    }

    fn global(&self, action: LogAction) {
        self.emit(action, None);
    }

    fn scoped(&self, touched: &Entity, action: LogAction) {
        self.emit(action, Some(self.entity.unwrap_or(touched.id)));
    }

    fn emit(&self, action: LogAction, entity_id: Option<EntityId>) {
        let action_type = action.action_type();
        let result = self
            .actor
            .ok_or(AuditError::MissingActor)
            .and_then(|actor| NewLogEntry::new(action, actor, entity_id, Utc::now()))
            .and_then(|entry| self.logger.add_log(entry));

        if let Err(err) = result {
            warn!(%action_type, error = %err, "audit entry not recorded");
        }
    }
}

fn user_ref(user: &User) -> SubjectRef {
    SubjectRef::new(user.id, user.name.clone())
}

fn role_ref(role: &Role) -> SubjectRef {
    SubjectRef::new(role.id, role.name.clone())
}

fn entity_ref(entity: &Entity) -> SubjectRef {
    SubjectRef::new(entity.id, entity.name.clone())
}
