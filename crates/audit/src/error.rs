use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("entity-scoped action '{0}' requires an entity id")]
    MissingEntity(&'static str),

    #[error("action '{0}' is not entity-scoped and cannot carry an entity id")]
    UnexpectedEntity(&'static str),

    #[error("no acting user could be resolved")]
    MissingActor,

    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("malformed action detail: {0}")]
    Detail(String),

    #[error("audit writer is closed")]
    WriterClosed,
}
