// Filesystem helpers for run directories

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Remove `path` if it exists and create it again, empty.
pub fn create_or_clear_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Empty the contents of `path`, creating it if missing. The directory
/// itself is kept.
pub fn clear_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
        return Ok(());
    }
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            fs::remove_dir_all(&entry_path)?;
        } else {
            fs::remove_file(&entry_path)?;
        }
    }
    Ok(())
}

/// Write `value` as JSON indented by one space.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    let mut file = fs::File::create(path)?;
    file.write_all(&buf)?;
    Ok(())
}

/// Overwrite `path` with `contents` (no trailing newline added).
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_or_clear_dir_wipes_contents() {
        let dir = tempdir().unwrap();
        let run = dir.path().join("run");
        fs::create_dir_all(run.join("nested")).unwrap();
        fs::write(run.join("old.txt"), "x").unwrap();

        create_or_clear_dir(&run).unwrap();

        assert!(run.is_dir());
        assert_eq!(fs::read_dir(&run).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_dir_keeps_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        clear_dir(dir.path()).unwrap();

        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_dir_creates_missing() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("files");
        clear_dir(&missing).unwrap();
        assert!(missing.is_dir());
    }

    #[test]
    fn test_write_json_one_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        write_json(&serde_json::json!({"lr": 0.1}), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n \"lr\": 0.1\n}");
    }
}
