use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Platform base directory that holds the default `subdir`.
fn platform_base() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "APPDATA";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("environment variable {var} is not set"))
}

fn expand_tilde(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return platform_base();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(platform_base()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolve the server home directory to an absolute path.
///
/// * `None` (or blank) → `<HOME or APPDATA>/<subdir>`
/// * `~` / `~/x` → expanded against the platform base
/// * relative → joined with the current working directory
///
/// With `create = true` the directory is created if missing.
pub fn resolve_home_dir(opt: Option<String>, subdir: &str, create: bool) -> Result<PathBuf> {
    let mut path = match opt.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand_tilde(raw)?,
        _ => platform_base()?.join(subdir),
    };

    if path.is_relative() {
        path = std::env::current_dir()
            .context("cannot read current directory")?
            .join(path);
    }

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }

    Ok(normalize(&path))
}

/// Drop `.` components so printed paths stay tidy.
fn normalize(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
