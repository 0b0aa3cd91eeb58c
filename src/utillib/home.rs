use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub fn home_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow!("the HOME environment variable is not set"))?;
    if home.is_empty() {
        return Err(anyhow!("the HOME environment variable is empty"));
    }
    Ok(home.into())
}

/// Change paths starting with `~/` to replace the `~` with the user's
/// home directory. Careful: if path is not representable as unicode
/// string, no expansion is attempted!
pub fn path_resolve_home(path: &Path) -> Result<PathBuf> {
    if let Some(path_str) = path.to_str() {
        if path_str == "~" {
            return home_dir();
        }
        if let Some(rest) = path_str.strip_prefix("~/") {
            return Ok(home_dir()?.join(rest));
        }
    }
    Ok(path.to_owned())
}
