//! Qdrant API key rotation and the operation tracker.
//!
//! Rotation is two steps: `prepare` writes the new key to the key file, then
//! `ops_apply` (when enabled) restarts the store and tells the vector client
//! to reload its key. Both are recorded in the [`OpTracker`], which snapshot
//! restores share.

pub mod apply;
pub mod config;
pub mod error;
pub mod handlers;
pub mod key_file;
pub mod models;
pub mod ops;
pub mod reload;
pub mod service;

pub use apply::{CommandOutput, CommandRunner, OpsApplyMode, TokioCommandRunner};
pub use config::SecurityConfig;
pub use error::{SecurityError, SecurityResult};
pub use handlers::{SecurityApiDoc, security_router};
pub use models::{OpsApplyRequest, OpsApplyResponse, PrepareKeyRequest, PrepareKeyResponse};
pub use ops::{OpNotFound, OpTracker, OpUpdate, Operation, Stage};
pub use reload::KeyReloader;
pub use service::SecurityService;
