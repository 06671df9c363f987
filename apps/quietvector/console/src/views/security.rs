use domain_security::{OpsApplyRequest, PrepareKeyRequest};
use std::io::{BufRead, Write};

use crate::client::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::prompt::Prompt;

pub const MIN_KEY_LEN: usize = 16;

fn required<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>, label: &str) -> ConsoleResult<String> {
    prompt
        .ask(label)?
        .filter(|answer| !answer.is_empty())
        .ok_or_else(|| ConsoleError::input(format!("{label} is required")))
}

/// Prompt for the new key twice plus the admin password, then write the
/// key file on the server.
pub async fn rotate_key<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
) -> ConsoleResult<String> {
    let new_key = required(prompt, "new key")?;
    let confirm = required(prompt, "repeat new key")?;
    if new_key != confirm {
        return Err(ConsoleError::input("keys do not match"));
    }
    if new_key.chars().count() < MIN_KEY_LEN {
        return Err(ConsoleError::input(format!(
            "key must be at least {MIN_KEY_LEN} characters"
        )));
    }
    let admin_password = required(prompt, "admin password")?;

    let prepared = client
        .prepare_key(&PrepareKeyRequest {
            new_key,
            admin_password,
        })
        .await?;

    let mut out = vec![format!("op: {}", prepared.op_id), String::new()];
    out.extend(prepared.apply_instructions);
    Ok(out.join("\n"))
}

pub async fn apply<R: BufRead, W: Write>(
    client: &ApiClient,
    prompt: &mut Prompt<R, W>,
    dry_run: bool,
) -> ConsoleResult<String> {
    let admin_password = required(prompt, "admin password")?;

    let response = client
        .ops_apply(&OpsApplyRequest {
            admin_password,
            dry_run,
        })
        .await?;

    let command = response.command.join(" ");
    if !response.executed {
        return Ok(format!("dry run: {command}"));
    }

    let mut out = vec![
        format!("ran: {command}"),
        format!("rc: {}", response.rc.map_or_else(|| "-".to_string(), |rc| rc.to_string())),
    ];
    if let Some(op_id) = response.op_id {
        out.push(format!("op: {op_id}"));
    }
    for (label, text) in [("stdout", response.stdout), ("stderr", response.stderr)] {
        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            out.push(format!("{label}:\n{}", text.trim_end()));
        }
    }
    Ok(out.join("\n"))
}

pub async fn op(client: &ApiClient, op_id: &str) -> ConsoleResult<String> {
    let op = client.get_op(op_id).await?;
    let stage = serde_json::to_value(op.stage)?;

    let mut out = vec![
        format!("id: {}", op.id),
        format!("kind: {}", op.kind),
        format!("stage: {}", stage.as_str().unwrap_or("-")),
        format!("updated: {}", op.updated_at.to_rfc3339()),
    ];
    if let Some(error) = op.error {
        out.push(format!("error: {error}"));
    }
    for (key, value) in op.meta {
        out.push(format!("{key}: {value}"));
    }
    Ok(out.join("\n"))
}
