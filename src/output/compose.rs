//! Montage composition through ImageMagick
//!
//! The `montage` tool is tried first. If it fails (missing binary, bad
//! input, ...) the images are appended side by side with `convert` instead.

use crate::config::LayoutConfig;
use crate::{MontageError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Which ImageMagick tool produced the montage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeTool {
    Montage,
    ConvertFallback,
}

/// Builds the argument list for `montage`
///
/// Borders and matte use the background colour so the tiles sit flush.
pub fn montage_args(paths: &[PathBuf], layout: &LayoutConfig, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-geometry".into(),
        format!("{}+0+0", layout.size).into(),
        "-tile".into(),
        layout.tile.clone().into(),
        "-background".into(),
        layout.background.clone().into(),
        "-bordercolor".into(),
        layout.background.clone().into(),
        "-mattecolor".into(),
        layout.background.clone().into(),
    ];
    args.extend(paths.iter().map(|p| p.as_os_str().to_owned()));
    args.push(output.as_os_str().to_owned());
    args
}

/// Builds the argument list for the `convert` fallback
pub fn convert_args(paths: &[PathBuf], layout: &LayoutConfig, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = paths.iter().map(|p| p.as_os_str().to_owned()).collect();
    args.push("-resize".into());
    args.push(layout.size.clone().into());
    args.push("+append".into());
    args.push(output.as_os_str().to_owned());
    args
}

/// Composes `paths` into a single image at `output`
///
/// # Returns
///
/// * `Ok(ComposeTool)` - The tool that produced the montage
/// * `Err(MontageError::Compose)` - Both `montage` and `convert` failed
pub async fn compose_montage(
    paths: &[PathBuf],
    layout: &LayoutConfig,
    output: &Path,
) -> Result<ComposeTool> {
    tracing::info!("Creating montage with {} images", paths.len());

    let args = montage_args(paths, layout, output);
    match run_tool("montage", &args).await {
        Ok(()) => {
            tracing::info!("Montage created successfully as {}", output.display());
            return Ok(ComposeTool::Montage);
        }
        Err(e) => tracing::error!("Error creating montage: {}", e),
    }

    tracing::info!("Attempting to use 'convert' as a fallback...");
    let args = convert_args(paths, layout, output);
    run_tool("convert", &args)
        .await
        .map_err(|e| MontageError::Compose(format!("error using convert fallback: {}", e)))?;

    tracing::info!("Montage created successfully as {}", output.display());
    Ok(ComposeTool::ConvertFallback)
}

/// Runs an external tool, returning a readable error on failure
async fn run_tool(program: &str, args: &[OsString]) -> std::result::Result<(), String> {
    tracing::debug!("Running ImageMagick {} command: {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to start {}: {}", program, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        tracing::debug!("{} stdout:\n{}", program, stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        tracing::debug!("{} stderr:\n{}", program, stderr.trim_end());
    }

    if output.status.success() {
        Ok(())
    } else {
        let detail = stderr.lines().next().unwrap_or("").trim();
        if detail.is_empty() {
            Err(format!("{} exited with {}", program, output.status))
        } else {
            Err(format!("{} exited with {}: {}", program, output.status, detail))
        }
    }
}
