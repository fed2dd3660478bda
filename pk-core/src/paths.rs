//! Node data directory resolution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory permissions for the node data directory
pub const NODE_DIR_PERMISSIONS: u32 = 0o700;

/// Default node data directory when neither `--node-path` nor `PK_NODE_PATH`
/// is given: `<platform data dir>/pk`.
pub fn default_node_dir() -> io::Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "no data directory available on this platform",
        )
    })?;
    Ok(base.join("pk"))
}

/// Create the node data directory if missing, with owner-only permissions.
pub fn ensure_node_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(NODE_DIR_PERMISSIONS);
            fs::set_permissions(path, perms)?;
        }
    }
    Ok(())
}
