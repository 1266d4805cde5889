use crate::app_dirs::AppDirs;
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Routes `log` output to a file; the terminal belongs to the TUI.
///
/// `RUST_LOG` selects the filter (default `warn`). Returns `false` when no
/// log file could be opened, in which case logging stays disabled.
pub fn init() -> bool {
    match AppDirs::log_path() {
        Some(path) => init_to(&path),
        None => false,
    }
}

pub fn init_to(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_log_file_in_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("typeduel.log");
        init_to(&path);
        assert!(path.exists());
    }
}
