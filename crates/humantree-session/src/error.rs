//! Session error types.

use humantree_core::TreeError;
use humantree_storage::StorageError;
use thiserror::Error;

/// Errors produced by the edit-session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The actor is not allowed to edit this tree.
    #[error("not authorized to edit this tree")]
    NotAuthorized,

    /// The session is already in editing mode.
    #[error("session is already editing")]
    AlreadyEditing,

    /// A mutation or save was attempted outside editing mode.
    #[error("session is not editing")]
    NotEditing,

    /// A save is already in flight for this session.
    #[error("a save is already in progress")]
    SaveInFlight,

    /// Save completion reported without a pending save.
    #[error("no save is in progress")]
    NoSaveInFlight,

    /// A structural edit was rejected by the invariant engine.
    #[error(transparent)]
    Edit(#[from] TreeError),

    /// Persistence failed; the session stays dirty.
    #[error(transparent)]
    Save(#[from] StorageError),
}
