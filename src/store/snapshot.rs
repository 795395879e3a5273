//! Pre-run snapshot of the history database.
//!
//! The store has no multi-statement transaction spanning a whole run, so a
//! file-level copy stands in for one: taken before the first mutation,
//! discarded on commit, renamed back over the database on rollback.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A file-level snapshot of the database taken before any mutation.
#[derive(Debug)]
pub struct Snapshot {
    db: PathBuf,
    /// None when the database did not exist before this run
    bak: Option<PathBuf>,
}

impl Snapshot {
    /// Copy the database aside. Must be called before the run mutates it.
    pub fn create(db: impl AsRef<Path>) -> Result<Self> {
        let db = db.as_ref().to_path_buf();
        let bak = if db.exists() {
            let bak = bak_path(&db);
            fs::copy(&db, &bak)?;
            Some(bak)
        } else {
            None
        };
        Ok(Self { db, bak })
    }

    /// Keep this run's mutations and discard the snapshot.
    pub fn commit(self) -> Result<()> {
        if let Some(bak) = &self.bak {
            fs::remove_file(bak)?;
        }
        Ok(())
    }

    /// Restore the pre-run state exactly.
    ///
    /// Any store handle on the database must be dropped first; the database
    /// file is replaced (or removed, when it did not exist before the run).
    pub fn restore(self) -> Result<()> {
        match &self.bak {
            Some(bak) => fs::rename(bak, &self.db)?,
            None => {
                if self.db.exists() {
                    fs::remove_file(&self.db)?;
                }
            }
        }
        Ok(())
    }
}

fn bak_path(db: &Path) -> PathBuf {
    let mut name = db.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    db.with_file_name(name)
}
