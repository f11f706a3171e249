use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A config file in its own temp directory.
pub struct TempConfig {
    dir: TempDir,
    path: PathBuf,
}

impl TempConfig {
    pub fn write(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");
        Self { dir, path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Directory holding the config, handy as a working directory.
    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Feed credentials every valid config needs.
pub const FEED_ENV: [(&str, &str); 2] = [
    ("BINANCE_API_KEY", "test-key"),
    ("BINANCE_API_SECRET", "test-secret"),
];

/// Build a credential lookup from pairs.
pub fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    let pairs = pairs.to_vec();
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    }
}
