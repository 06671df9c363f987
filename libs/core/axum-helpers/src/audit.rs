//! Audit logging for security-relevant actions and every handled request.
//!
//! Two channels:
//! - [`AuditEvent`]: structured security events (login, key rotation, ops
//!   apply) emitted on the `audit` tracing target.
//! - [`AuditLog`]: an append-only JSON lines file with one entry per request,
//!   written by [`audit_log_middleware`].
//!
//! # Example
//! ```ignore
//! use axum_helpers::audit::{AuditEvent, AuditOutcome};
//!
//! AuditEvent::new(Some("admin".to_string()), "auth.login", None, AuditOutcome::Success)
//!     .with_ip(extract_ip_from_headers(&headers))
//!     .log();
//!
//! AuditEvent::new(Some("admin".to_string()), "ops.apply", None, AuditOutcome::Denied)
//!     .with_details(json!({"reason": "disabled"}))
//!     .log();
//! ```

use crate::http::{RequestId, rate_limit::client_ip};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

/// Outcome of an audited action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Action completed successfully
    Success,
    /// Action failed (e.g., validation error, system error)
    Failure,
    /// Action was denied (bad credentials, disabled feature)
    Denied,
}

/// Structured audit event for security logging.
///
/// Use the builder pattern to construct audit events with optional fields,
/// then call `.log()` to emit the event to the audit log.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Who performed the action (if known)
    pub user_id: Option<String>,
    /// Action performed (e.g., "auth.login", "qdrant_key.prepare")
    pub action: String,
    /// Resource affected (e.g., "collection:docs", "op:<id>")
    pub resource: Option<String>,
    /// Outcome of the action
    pub outcome: AuditOutcome,
    /// Client IP address
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timestamp when the event occurred
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Additional details about the event (JSON)
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        user_id: Option<String>,
        action: impl Into<String>,
        resource: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            user_id,
            action: action.into(),
            resource,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Attach details; they are serialized to JSON.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Emit the event on the "audit" target with structured fields.
    pub fn log(self) {
        tracing::info!(
            target: "audit",
            user_id = self.user_id,
            action = %self.action,
            resource = self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address,
            user_agent = self.user_agent,
            timestamp = %self.timestamp,
            details = ?self.details,
            "{}",
            serde_json::to_string(&self).unwrap_or_else(|_| "Failed to serialize audit event".to_string())
        );
    }
}

/// Extract client IP address from HTTP headers.
///
/// Returns the first X-Forwarded-For entry or X-Real-IP as fallback.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

pub fn extract_ip_from_socket(socket: Option<SocketAddr>) -> Option<String> {
    socket.map(|addr| addr.ip().to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// One line of the request audit file.
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub ts: i64,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub client: String,
    pub request_id: Option<String>,
}

/// Append-only JSON lines file shared by all requests.
#[derive(Clone, Debug)]
pub struct AuditLog {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl AuditLog {
    /// Creates the parent directory eagerly; failure is only logged since
    /// writes are best effort.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %path.display(), error = %e, "Cannot create audit log directory");
            }
        }
        Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())
            .await?;
        file.write_all(&line).await?;
        file.flush().await
    }
}

/// Writes one [`AuditEntry`] after each response.
///
/// Write failures are logged at debug and never change the response.
pub async fn audit_log_middleware(
    State(log): State<AuditLog>,
    request: Request,
    next: Next,
) -> Response {
    let ts = Utc::now().timestamp();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client = client_ip(&request);
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());

    let response = next.run(request).await;

    let entry = AuditEntry {
        ts,
        method,
        path,
        status: response.status().as_u16(),
        client,
        request_id,
    };
    if let Err(e) = log.append(&entry).await {
        tracing::debug!(path = %log.path().display(), error = %e, "Audit log write failed");
    }

    response
}
