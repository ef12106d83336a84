//! Small filesystem helpers for the session storage backend.

use std::io::Write;
use std::path::Path;

/// Write `content` to `path` atomically: temp file in the same directory,
/// flush, then rename over the target. Readers never observe a torn file.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "session".to_string())
    ));

    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp, path)?;
    Ok(())
}
