//! # Task Handlers
//!
//! One handler per queue. A handler performs the downstream operations for
//! one decoded payload; the worker owns acknowledging and counting.
//!
//! | Queue | Payload | Handler |
//! |-------|---------|---------|
//! | `ladok_sign` | `Document` | [`SignHandler`] |
//! | `ladok_validate` | `Document` | [`ValidateHandler`] |
//! | `ladok_del_signed` | `Document` | [`DelSignedHandler`] |
//! | `ladok_persistent_save` | `Document` | [`DocumentPersistHandler`] |
//! | `vc_persistent_save` | `PersistentRecord` | [`RecordSaveHandler`] |
//! | `vc_persistent_replace` | `PersistentRecord` | [`RecordReplaceHandler`] |
//! | `vc_persistent_delete` | `MetaData` | [`RecordDeleteHandler`] |

pub mod ladok;
pub mod persistent;

use std::sync::Arc;

use thiserror::Error;
use vc_01_document_store::{DocumentError, DocumentLifecycle};
use vc_02_persistent_store::{PersistentError, PersistentStoreApi};
use vc_03_signing_client::{SigningAuthority, SigningError};

pub use ladok::{DelSignedHandler, DocumentPersistHandler, SignHandler, ValidateHandler};
pub use persistent::{RecordDeleteHandler, RecordReplaceHandler, RecordSaveHandler};

/// The downstream services every handler draws from.
#[derive(Clone)]
pub struct Pipeline {
    pub documents: Arc<dyn DocumentLifecycle>,
    pub persistent: Arc<dyn PersistentStoreApi>,
    pub signing: Arc<dyn SigningAuthority>,
}

/// Failure of one task's downstream operation.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Persistent(#[from] PersistentError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}
