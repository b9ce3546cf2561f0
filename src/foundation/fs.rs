use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::TreeflowResult;

/// Create the directory `path` will be written into, if it has one.
pub(crate) fn ensure_parent_dir(path: &Path) -> TreeflowResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fs.rs"]
mod tests;
