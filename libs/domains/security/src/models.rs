use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PrepareKeyRequest {
    #[validate(length(min = 16, max = 256))]
    pub new_key: String,
    #[validate(length(min = 3))]
    pub admin_password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct PrepareKeyResponse {
    pub op_id: String,
    pub apply_instructions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct OpsApplyRequest {
    #[validate(length(min = 3))]
    pub admin_password: String,
    #[serde(default)]
    pub dry_run: bool,
}

/// `rc`, output and `op_id` are present only when the command ran.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct OpsApplyResponse {
    pub executed: bool,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_id: Option<String>,
}
