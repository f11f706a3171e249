use std::path::PathBuf;

use bulletin::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use bulletin::adapter::outbound::sqlite::SqliteAnnouncementStore;
use tempfile::TempDir;

/// Temporary SQLite database file, removed on drop.
pub struct TempDb {
    _dir: TempDir,
    path: PathBuf,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("bulletin.db");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &str {
        self.path.to_str().expect("utf-8 temp path")
    }

    /// A fresh pool over the same file, as a restarted process would open.
    pub fn pool(&self) -> DbPool {
        let pool = create_pool(self.path(), 4, 5_000).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");
        pool
    }

    pub fn store(&self) -> SqliteAnnouncementStore {
        SqliteAnnouncementStore::new(self.pool())
    }
}
