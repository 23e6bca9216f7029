use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use which::which;

/// Creates `path` (and parents) when missing; fails if something other than a
/// directory already sits there.
pub fn ensure_directory_exists(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("'{}' is not a directory", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(path),
        Err(e) => Err(e),
    }
}

/// Finds an executable either by explicit path or in the system PATH.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    which(name).with_context(|| {
        format!("{} executable not found. Please ensure it is installed and in your PATH.", name)
    })
}

pub fn format_file_size(size: u64) -> String {
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64 / 1024.0;
    if value < 1024.0 {
        return format!("{:.2} kB", value);
    }
    value /= 1024.0;
    if value < 1024.0 {
        return format!("{:.2} MB", value);
    }
    format!("{:.2} GB", value / 1024.0)
}
