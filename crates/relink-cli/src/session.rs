//! Explicit session context shared by every command.

use anyhow::{Context, Result};
use relink_core::{ReconcileReport, ReconcilerConfig};
use relink_indexer::SnapshotStore;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration, output sink and results of the current session.
pub struct Session {
    pub config: ReconcilerConfig,
    config_path: PathBuf,
    root: PathBuf,
    out: Box<dyn Write>,
    pub last_report: Option<ReconcileReport>,
}

impl Session {
    /// Open a session, creating the config file with defaults for `root` if absent.
    pub fn open(config_path: PathBuf, root: PathBuf, out: Box<dyn Write>) -> Result<Self> {
        let config = ReconcilerConfig::load_or_create(&config_path, &root)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;

        Ok(Self {
            config,
            config_path,
            root,
            out,
            last_report: None,
        })
    }

    /// Persist the current configuration.
    pub fn save_config(&self) -> Result<()> {
        self.config
            .save(&self.config_path)
            .with_context(|| format!("Failed to save config {}", self.config_path.display()))
    }

    /// Working directory the session was opened in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot store in the configured mapping directory.
    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(self.config.last_mapping_dir.clone())
    }

    /// Write one line to the output sink.
    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    /// Write without a newline and flush, for prompts.
    pub fn prompt(&mut self, text: impl Display) -> Result<()> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    /// Output sink whose contents tests can read back.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
