// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Environment file discovery
//!
//! The binary loads one env file before parsing its arguments, so values in
//! it feed `RUST_LOG` and every clap `env = ...` fallback. Lookup starts in
//! the working directory and walks up towards the filesystem root; the
//! nearest directory holding any candidate wins, and within a directory
//! `.env.centralized` is preferred over `.env`.

use std::path::{Path, PathBuf};

/// Candidate names in order of preference within one directory.
pub const ENV_FILES: [&str; 2] = [".env.centralized", ".env"];

pub fn find_env_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        ENV_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

/// Load the nearest env file. Variables already set in the process
/// environment are never overwritten.
pub fn load_nearest(start: &Path) -> Option<PathBuf> {
    let path = find_env_file(start)?;
    dotenvy::from_path(&path).ok().map(|_| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn centralized_file_wins_within_a_directory() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(".env"), "A=1\n").unwrap();
        fs::write(root.path().join(".env.centralized"), "A=2\n").unwrap();

        assert_eq!(
            find_env_file(root.path()),
            Some(root.path().join(".env.centralized"))
        );
    }

    #[test]
    fn project_root_file_is_found_from_a_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("scripts").join("ops");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(".env.centralized"), "A=1\n").unwrap();

        assert_eq!(
            find_env_file(&nested),
            Some(root.path().join(".env.centralized"))
        );

        fs::write(nested.join(".env"), "A=2\n").unwrap();
        assert_eq!(find_env_file(&nested), Some(nested.join(".env")));
    }

    #[test]
    fn loaded_values_reach_the_process_environment() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(".env"),
            "CASCADE_ENV_FILES_TEST_MARKER=from-file\n",
        )
        .unwrap();

        assert_eq!(load_nearest(root.path()), Some(root.path().join(".env")));
        assert_eq!(
            std::env::var("CASCADE_ENV_FILES_TEST_MARKER").as_deref(),
            Ok("from-file")
        );
    }
}
