//! Staged destination files: temp write, fsync, atomic promotion.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Suffix of the staging twin next to the final path.
const TMP_SUFFIX: &str = ".tmp";

/// Unix mode for downloaded files and sidecars.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Unix mode for created output directories.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// A temp file that becomes `final_path` on [`commit`](Self::commit) and
/// is removed on drop otherwise.
pub struct StagedFile {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Create the staging twin of `final_path`, creating parent
    /// directories as needed.
    pub async fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            create_output_dir(parent)?;
        }
        let temp_path = staging_path(final_path);
        let file = open_private(&temp_path).await?;
        Ok(Self {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            committed: false,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Drop bytes from a failed attempt so a retry starts clean.
    pub async fn truncate(&mut self) -> io::Result<()> {
        let file = self.handle()?;
        file.rewind().await?;
        file.set_len(0).await
    }

    pub async fn write_all(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.handle()?.write_all(chunk).await
    }

    /// Flush to stable storage; called once before promotion.
    pub async fn sync(&mut self) -> io::Result<()> {
        self.handle()?.sync_all().await
    }

    /// Close the handle and atomically rename onto the final path.
    pub async fn commit(mut self) -> io::Result<PathBuf> {
        self.file.take();
        tokio::fs::rename(&self.temp_path, &self.final_path).await?;
        self.committed = true;
        Ok(self.final_path.clone())
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already closed"))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

fn staging_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Recursively create an output directory with owner rwx, group/other rx.
fn create_output_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir)
}

async fn open_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options.open(path).await
}

/// Write a small sidecar file with owner-only permissions.
pub async fn write_sidecar(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = open_private(path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.flush().await
}
