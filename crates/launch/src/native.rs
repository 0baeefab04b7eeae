use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The native (VR) viewer inside a user's download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeViewer {
    executable: PathBuf,
    working_dir: PathBuf,
}
impl NativeViewer {
    /// Locate `executable` (relative to `dir`) inside `dir`.
    pub fn locate(dir: &Path, executable: &Path) -> Result<Self> {
        let path = dir.join(executable);
        if !path.is_file() {
            exn::bail!(ErrorKind::ExecutableNotFound(path));
        }
        Ok(Self { executable: path, working_dir: dir.to_path_buf() })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Start the viewer with the download directory as its working directory
    /// and return its process id. The viewer is never waited on.
    pub fn launch(&self) -> Result<u32> {
        let child = Command::new(&self.executable)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .spawn()
            .or_raise(|| ErrorKind::Spawn(self.executable.clone()))?;
        let pid = child.id();
        tracing::info!(executable = %self.executable.display(), pid, "Launched viewer");
        Ok(pid)
    }
}
