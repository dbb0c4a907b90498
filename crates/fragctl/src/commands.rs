//! CLI command implementations
//!
//! Output mirrors the JSON envelope an HTTP adapter would send:
//! `{"status": "ok", ...}` on success. Errors are left to `main`.

use std::path::Path;

use anyhow::{Context as _, Result};
use fragments::{
    is_supported_type, render, split_resource, Fragment, FragmentError, StorageGateway,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

/// Everything a command needs to act for one owner.
pub struct Context<'a> {
    pub gateway: &'a dyn StorageGateway,
    pub owner: &'a str,
    pub api_url: &'a str,
}

/// Wrap a payload in the success envelope.
fn success(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert("status".to_string(), json!("ok"));
    }
    body
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read the payload from a file, or stdin when no file is given.
async fn read_payload(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Store a new fragment
pub async fn create(ctx: &Context<'_>, content_type: &str, file: Option<&Path>) -> Result<()> {
    if !is_supported_type(content_type) {
        return Err(FragmentError::UnsupportedType(content_type.to_string()).into());
    }
    let data = read_payload(file).await?;

    let fragment = Fragment::create(ctx.gateway, ctx.owner, content_type, &data).await?;
    info!(id = %fragment.id(), size = fragment.size(), "fragment posted");

    print_json(&success(json!({
        "fragment": fragment,
        "location": fragment.location(ctx.api_url),
    })))
}

/// Read a fragment, converting when the resource carries an extension
pub async fn get(ctx: &Context<'_>, resource: &str, out: Option<&Path>) -> Result<()> {
    let (id, extension) = split_resource(resource);
    let fragment = Fragment::load_by_owner(ctx.gateway, ctx.owner, id).await?;
    let rendered = render(ctx.gateway, &fragment, extension).await?;

    eprintln!("Content-Type: {}", rendered.content_type);
    match out {
        Some(path) => tokio::fs::write(path, &rendered.data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&rendered.data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// Show metadata and available formats
pub async fn info(ctx: &Context<'_>, id: &str) -> Result<()> {
    let fragment = Fragment::load_by_owner(ctx.gateway, ctx.owner, id).await?;
    print_json(&success(json!({
        "fragment": fragment,
        "formats": fragment.formats(),
    })))
}

/// List the owner's fragments
pub async fn list(ctx: &Context<'_>, expand: bool) -> Result<()> {
    let listing = Fragment::list_by_owner(ctx.gateway, ctx.owner, expand).await;
    print_json(&success(json!({ "fragments": listing })))
}

/// Replace a fragment's data
pub async fn update(
    ctx: &Context<'_>,
    id: &str,
    content_type: &str,
    file: Option<&Path>,
) -> Result<()> {
    let mut fragment = Fragment::load_by_owner(ctx.gateway, ctx.owner, id).await?;
    let data = read_payload(file).await?;
    fragment.replace_data_as(ctx.gateway, content_type, &data).await?;
    info!(id = %fragment.id(), size = fragment.size(), "fragment updated");

    print_json(&success(json!({
        "fragment": fragment,
        "formats": fragment.formats(),
        "location": fragment.location(ctx.api_url),
    })))
}

/// Delete a fragment
pub async fn delete(ctx: &Context<'_>, id: &str) -> Result<()> {
    Fragment::delete_by_owner(ctx.gateway, ctx.owner, id).await?;
    print_json(&success(json!({})))
}
