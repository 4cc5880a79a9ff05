use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting state files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append text to a file, creating it (and its parents) if it doesn't exist.
pub fn append_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

/// Read the last `n` non-empty lines of a text file. Missing file yields an empty list.
pub fn tail_lines(path: &Path, n: usize) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.trim().lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

/// Keep only the last `max_lines` lines of a text file.
///
/// Returns `true` if the file was rewritten, `false` if it was already short
/// enough or does not exist.
pub fn keep_last_lines(path: &Path, max_lines: usize) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= max_lines {
        return Ok(false);
    }
    let mut trimmed = lines[lines.len() - max_lines..].join("\n");
    if max_lines > 0 {
        trimmed.push('\n');
    }
    atomic_write(path, trimmed.as_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/state.json");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn append_text_accumulates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log/progress.txt");
        append_text(&path, "one\n").unwrap();
        append_text(&path, "two\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn tail_lines_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(tail_lines(&dir.path().join("nope.txt"), 5).unwrap().is_empty());
    }

    #[test]
    fn keep_last_lines_trims_oldest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        std::fs::write(&path, "a\nb\nc\nd\n").unwrap();

        assert!(keep_last_lines(&path, 2).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "c\nd\n");

        // Already short enough: untouched.
        assert!(!keep_last_lines(&path, 5).unwrap());
    }

    #[test]
    fn keep_zero_lines_empties_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        std::fs::write(&path, "a\nb\n").unwrap();

        assert!(keep_last_lines(&path, 0).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
