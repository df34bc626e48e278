//! Assembly of the output executable.
//!
//! Stands in for a compiler toolchain: it copies the stub image, applies the
//! icon, and appends the payload overlay. The work happens in a partial file
//! next to the output that is renamed into place only when every step
//! succeeded, so a failed build leaves nothing at the output path.
//!
//! Nothing here raises; every problem becomes a [`Diagnostic`].

use super::{
    checksum::calculate_sha256,
    icon::{self, IconGroup},
    result::{BuildResult, Diagnostic},
    stub_image::{self, ImageFormat},
};
use crate::binder::payload::{Payload, overlay};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Inputs of one assembly run.
pub struct Assembly<'a> {
    pub stub: &'a Path,
    pub payload: &'a Payload,
    pub icon: Option<&'a Path>,
    pub output: &'a Path,
}

/// Runs the assembly and collects its diagnostics.
pub async fn assemble(input: Assembly<'_>) -> BuildResult {
    let mut diagnostics = Vec::new();

    let partial = partial_path(input.output);
    let outcome = build(&input, &partial, &mut diagnostics).await;

    match outcome {
        Ok(()) => match artifact_metadata(input.output).await {
            Ok((size, checksum)) => {
                log::info!(
                    "Created {} ({} bytes, sha256 {})",
                    input.output.display(),
                    size,
                    checksum
                );
                BuildResult::succeeded(diagnostics, input.output.to_path_buf(), size, checksum)
            }
            Err(message) => {
                diagnostics.push(Diagnostic::error(message));
                remove_quietly(input.output).await;
                BuildResult::failed(diagnostics)
            }
        },
        Err(message) => {
            log::warn!("Assembly of {} failed: {}", input.output.display(), message);
            diagnostics.push(Diagnostic::error(message));
            remove_quietly(&partial).await;
            BuildResult::failed(diagnostics)
        }
    }
}

async fn build(
    input: &Assembly<'_>,
    partial: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), String> {
    let image = stub_image::load(input.stub).await?;

    let icon = match input.icon {
        Some(path) => Some(load_icon(path).await?),
        None => None,
    };

    if let Some(parent) = input.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("cannot create output directory {}: {e}", parent.display()))?;
    }

    tokio::fs::write(partial, &image.bytes)
        .await
        .map_err(|e| format!("cannot write {}: {e}", partial.display()))?;

    if let Some((path, group)) = &icon {
        apply_icon(partial, path, group, image.format, diagnostics).await?;
    }

    append_payload(partial, input.payload).await?;
    mark_executable(partial).await?;

    tokio::fs::rename(partial, input.output)
        .await
        .map_err(|e| format!("cannot move output into place at {}: {e}", input.output.display()))?;

    Ok(())
}

async fn load_icon(path: &Path) -> Result<(PathBuf, IconGroup), String> {
    let owned = path.to_path_buf();
    let group = tokio::task::spawn_blocking(move || icon::load(&owned))
        .await
        .map_err(|e| format!("icon task panicked: {e}"))?
        .map_err(|e| e.to_string())?;
    Ok((path.to_path_buf(), group))
}

#[cfg(windows)]
async fn apply_icon(
    partial: &Path,
    icon_path: &Path,
    group: &IconGroup,
    format: ImageFormat,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), String> {
    if !format.has_resources() {
        diagnostics.push(Diagnostic::warning(format!(
            "icon {} not embedded: {format} stub images carry no icon resources",
            icon_path.display()
        )));
        return Ok(());
    }

    let exe = partial.to_path_buf();
    let group = group.clone();
    tokio::task::spawn_blocking(move || icon::embed(&exe, &group))
        .await
        .map_err(|e| format!("icon task panicked: {e}"))?
        .map_err(|e| e.to_string())
}

#[cfg(not(windows))]
async fn apply_icon(
    _partial: &Path,
    icon_path: &Path,
    _group: &IconGroup,
    format: ImageFormat,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), String> {
    let reason = if format.has_resources() {
        "resource editing requires a Windows host".to_string()
    } else {
        format!("{format} stub images carry no icon resources")
    };
    diagnostics.push(Diagnostic::warning(format!(
        "icon {} not embedded: {reason}",
        icon_path.display()
    )));
    Ok(())
}

async fn append_payload(partial: &Path, payload: &Payload) -> Result<(), String> {
    let describe = |e: std::io::Error| format!("cannot append payload to {}: {e}", partial.display());

    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(partial)
        .await
        .map_err(describe)?;
    file.write_all(payload.as_bytes()).await.map_err(describe)?;
    file.write_all(&overlay::footer(payload))
        .await
        .map_err(describe)?;
    file.flush().await.map_err(describe)?;
    file.sync_all().await.map_err(describe)
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| format!("cannot mark {} executable: {e}", path.display()))
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> Result<(), String> {
    Ok(())
}

async fn artifact_metadata(output: &Path) -> Result<(u64, String), String> {
    let size = tokio::fs::metadata(output)
        .await
        .map_err(|e| format!("cannot read output metadata: {e}"))?
        .len();
    let checksum = calculate_sha256(output).await.map_err(|e| e.to_string())?;
    Ok((size, checksum))
}

/// `<output>.<uuid>.partial` in the output's directory.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{name}.{}.partial", uuid::Uuid::new_v4()))
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = crate::binder::utils::fs::remove_file_if_exists(path).await {
        log::warn!("Could not remove {}: {}", path.display(), e);
    }
}
