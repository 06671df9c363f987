use domain_auth::AuthService;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::apply::CommandRunner;
use crate::config::SecurityConfig;
use crate::error::{SecurityError, SecurityResult};
use crate::key_file::write_key_file;
use crate::models::{OpsApplyRequest, OpsApplyResponse, PrepareKeyRequest, PrepareKeyResponse};
use crate::ops::{OpTracker, OpUpdate, Operation, Stage};
use crate::reload::KeyReloader;

pub const KEY_PREPARE_KIND: &str = "qdrant_key_prepare";
pub const OPS_APPLY_KIND: &str = "ops_apply";

/// Key rotation: write the new key, then (optionally) restart the store.
pub struct SecurityService<C: CommandRunner, K: KeyReloader> {
    auth: Arc<AuthService>,
    config: SecurityConfig,
    ops: OpTracker,
    runner: C,
    reloader: K,
}

impl<C: CommandRunner, K: KeyReloader> SecurityService<C, K> {
    pub fn new(
        auth: Arc<AuthService>,
        config: SecurityConfig,
        ops: OpTracker,
        runner: C,
        reloader: K,
    ) -> Self {
        Self {
            auth,
            config,
            ops,
            runner,
            reloader,
        }
    }

    fn apply_instructions(&self) -> Vec<String> {
        vec![
            "# 1) Ensure compose env mounts key file to Qdrant or uses env reference".to_string(),
            "# 2) Restart Qdrant service to apply new key:".to_string(),
            self.config.apply_command().join(" "),
            "# 3) Verify: curl -H 'api-key: <NEW_KEY>' http://localhost:6333/healthz".to_string(),
        ]
    }

    pub async fn prepare_key(&self, request: &PrepareKeyRequest) -> SecurityResult<PrepareKeyResponse> {
        self.auth.verify_admin_password(&request.admin_password)?;

        let key_file = self
            .config
            .key_file
            .as_deref()
            .ok_or(SecurityError::KeyFileNotConfigured)?;

        write_key_file(key_file, &request.new_key)
            .await
            .map_err(SecurityError::KeyFileWrite)?;

        self.reloader.mark_pending();

        let mut meta = Map::new();
        meta.insert("file".to_string(), json!(key_file.display().to_string()));
        let op = self.ops.create(KEY_PREPARE_KIND, meta).await;

        info!(op_id = %op.id, file = %key_file.display(), "Qdrant key prepared");

        Ok(PrepareKeyResponse {
            op_id: op.id,
            apply_instructions: self.apply_instructions(),
        })
    }

    pub async fn ops_apply(&self, request: &OpsApplyRequest) -> SecurityResult<OpsApplyResponse> {
        if !self.config.ops_apply_enabled {
            return Err(SecurityError::OpsApplyDisabled);
        }
        self.auth.verify_admin_password(&request.admin_password)?;

        let command = self.config.apply_command();
        if request.dry_run {
            return Ok(OpsApplyResponse {
                executed: false,
                command,
                rc: None,
                stdout: None,
                stderr: None,
                op_id: None,
            });
        }

        let mut meta = Map::new();
        meta.insert("command".to_string(), Value::from(command.join(" ")));
        let op = self.ops.create(OPS_APPLY_KIND, meta).await;

        let output = match self.runner.run(&command).await {
            Ok(output) => output,
            Err(e) => {
                self.ops.update(&op.id, OpUpdate::failed(e.to_string())).await?;
                return Err(SecurityError::Command(e));
            }
        };

        let update = if output.rc == 0 {
            match self.reloader.reload_from_file().await {
                Ok(()) => OpUpdate::stage(Stage::Completed),
                Err(e) => {
                    warn!(error = %e, "Store restarted but key reload failed");
                    OpUpdate::failed(format!("key reload failed: {e}"))
                }
            }
        } else {
            OpUpdate::failed(format!("command exited with {}", output.rc))
        };
        self.ops
            .update(&op.id, update.with_meta("rc", output.rc))
            .await?;

        info!(op_id = %op.id, rc = output.rc, "Ops apply finished");

        Ok(OpsApplyResponse {
            executed: true,
            command,
            rc: Some(output.rc),
            stdout: Some(output.stdout),
            stderr: Some(output.stderr),
            op_id: Some(op.id),
        })
    }

    pub async fn get_op(&self, id: &str) -> SecurityResult<Operation> {
        self.ops
            .get(id)
            .await
            .ok_or_else(|| crate::ops::OpNotFound(id.to_string()).into())
    }

    pub fn admin_username(&self) -> &str {
        self.auth.admin_username()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{CommandOutput, MockCommandRunner, OpsApplyMode};
    use crate::reload::MockKeyReloader;
    use axum_helpers::{JwtAuth, JwtConfig};
    use domain_auth::{AdminConfig, AuthError, hash_password};
    use std::path::PathBuf;

    const PASSWORD: &str = "admin-pass";

    fn auth(hash: Option<String>) -> Arc<AuthService> {
        Arc::new(AuthService::new(
            AdminConfig::new("admin", hash),
            JwtAuth::new(&JwtConfig::new("test-secret-key-at-least-32-chars-long!!")),
        ))
    }

    fn configured_auth() -> Arc<AuthService> {
        auth(Some(hash_password(PASSWORD).unwrap()))
    }

    fn service(
        auth: Arc<AuthService>,
        config: SecurityConfig,
        runner: MockCommandRunner,
        reloader: MockKeyReloader,
    ) -> SecurityService<MockCommandRunner, MockKeyReloader> {
        SecurityService::new(auth, config, OpTracker::new(), runner, reloader)
    }

    fn prepare_request(key: &str, password: &str) -> PrepareKeyRequest {
        PrepareKeyRequest {
            new_key: key.to_string(),
            admin_password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_prepare_key_writes_file_and_tracks_op() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("keys/qdrant.key");
        let config = SecurityConfig {
            key_file: Some(key_file.clone()),
            ..Default::default()
        };

        let mut reloader = MockKeyReloader::new();
        reloader.expect_mark_pending().times(1).return_const(());

        let svc = service(configured_auth(), config, MockCommandRunner::new(), reloader);
        let response = svc
            .prepare_key(&prepare_request("a-brand-new-key-0001", PASSWORD))
            .await
            .unwrap();

        assert_eq!(response.apply_instructions.len(), 4);
        assert_eq!(
            response.apply_instructions[2],
            "docker compose -f deployment/docker/docker-compose.server.yml up -d qdrant"
        );
        assert_eq!(
            std::fs::read_to_string(&key_file).unwrap(),
            "a-brand-new-key-0001"
        );

        let op = svc.get_op(&response.op_id).await.unwrap();
        assert_eq!(op.kind, KEY_PREPARE_KIND);
        assert_eq!(op.stage, Stage::Created);
        assert_eq!(op.meta["file"], key_file.display().to_string());
    }

    #[tokio::test]
    async fn test_prepare_key_wrong_password() {
        let config = SecurityConfig {
            key_file: Some(PathBuf::from("/nonexistent/qdrant.key")),
            ..Default::default()
        };
        let svc = service(
            configured_auth(),
            config,
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );

        let err = svc
            .prepare_key(&prepare_request("a-brand-new-key-0001", "not-the-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_prepare_key_password_not_configured() {
        let svc = service(
            auth(None),
            SecurityConfig::default(),
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );

        let err = svc
            .prepare_key(&prepare_request("a-brand-new-key-0001", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::Auth(AuthError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_prepare_key_without_key_file() {
        let svc = service(
            configured_auth(),
            SecurityConfig::default(),
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );

        let err = svc
            .prepare_key(&prepare_request("a-brand-new-key-0001", PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "QDRANT_API_KEY_FILE not configured on server");
    }

    #[tokio::test]
    async fn test_prepare_key_too_short_after_trim() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig {
            key_file: Some(dir.path().join("qdrant.key")),
            ..Default::default()
        };
        let svc = service(
            configured_auth(),
            config,
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );

        let err = svc
            .prepare_key(&prepare_request("   short-key-ab     ", PASSWORD))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to write key file: Key too short");
    }

    fn apply_config() -> SecurityConfig {
        SecurityConfig {
            ops_apply_enabled: true,
            compose_file: PathBuf::from("compose.yml"),
            ..Default::default()
        }
    }

    fn apply_request(dry_run: bool) -> OpsApplyRequest {
        OpsApplyRequest {
            admin_password: PASSWORD.to_string(),
            dry_run,
        }
    }

    #[tokio::test]
    async fn test_ops_apply_disabled() {
        let svc = service(
            configured_auth(),
            SecurityConfig::default(),
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );

        let err = svc.ops_apply(&apply_request(true)).await.unwrap_err();
        assert!(matches!(err, SecurityError::OpsApplyDisabled));
    }

    #[tokio::test]
    async fn test_ops_apply_dry_run_does_not_execute() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let svc = service(configured_auth(), apply_config(), runner, MockKeyReloader::new());
        let response = svc.ops_apply(&apply_request(true)).await.unwrap();

        assert!(!response.executed);
        assert_eq!(response.command[0], "docker");
        assert!(response.rc.is_none());
        assert!(response.op_id.is_none());
    }

    #[tokio::test]
    async fn test_ops_apply_runs_and_reloads_key() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|argv| argv.join(" ") == "docker compose -f compose.yml up -d qdrant")
            .times(1)
            .returning(|_| {
                Ok(CommandOutput {
                    rc: 0,
                    stdout: "ok".to_string(),
                    stderr: String::new(),
                })
            });
        let mut reloader = MockKeyReloader::new();
        reloader
            .expect_reload_from_file()
            .times(1)
            .returning(|| Ok(()));

        let svc = service(configured_auth(), apply_config(), runner, reloader);
        let response = svc.ops_apply(&apply_request(false)).await.unwrap();

        assert!(response.executed);
        assert_eq!(response.rc, Some(0));
        assert_eq!(response.stdout.as_deref(), Some("ok"));

        let op = svc.get_op(response.op_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(op.kind, OPS_APPLY_KIND);
        assert_eq!(op.stage, Stage::Completed);
        assert_eq!(op.meta["rc"], 0);
    }

    #[tokio::test]
    async fn test_ops_apply_nonzero_exit_skips_reload() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Ok(CommandOutput {
                rc: 1,
                stdout: String::new(),
                stderr: "no such service".to_string(),
            })
        });
        let mut reloader = MockKeyReloader::new();
        reloader.expect_reload_from_file().never();

        let config = SecurityConfig {
            ops_apply_mode: OpsApplyMode::Systemctl,
            ..apply_config()
        };
        let svc = service(configured_auth(), config, runner, reloader);
        let response = svc.ops_apply(&apply_request(false)).await.unwrap();

        assert_eq!(response.rc, Some(1));
        let op = svc.get_op(response.op_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(op.stage, Stage::Failed);
        assert_eq!(op.error.as_deref(), Some("command exited with 1"));
    }

    #[tokio::test]
    async fn test_ops_apply_runner_error() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "docker not found"))
        });

        let svc = service(configured_auth(), apply_config(), runner, MockKeyReloader::new());
        let err = svc.ops_apply(&apply_request(false)).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to run command: docker not found");
    }

    #[tokio::test]
    async fn test_get_op_missing() {
        let svc = service(
            configured_auth(),
            SecurityConfig::default(),
            MockCommandRunner::new(),
            MockKeyReloader::new(),
        );
        let err = svc.get_op("nope").await.unwrap_err();
        assert!(matches!(err, SecurityError::OpNotFound(_)));
    }
}
