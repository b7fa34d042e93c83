#![allow(dead_code)]

pub mod logging;

use std::path::Path;

/// Write `files` (relative path, content) under `root`, creating directories.
pub fn write_project(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// `count` lines of filler so detections can be placed on exact lines.
pub fn filler(count: usize) -> String {
    "const filler = 1;\n".repeat(count)
}
