//! Input and output for the command-line caller.
//!
//! Reads whole files (or stdin) into memory and writes results atomically.

use getrandom::fill;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScryptboxError};

/// Path that stands for stdin or stdout.
pub const STDIO: &str = "-";

/// A file the caller reads input from or writes output to.
///
/// The path `-` selects stdin for [`Storage::load`] and stdout for
/// [`Storage::save`].
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage bound to stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(PathBuf::from(STDIO))
    }

    /// Returns `true` if this storage reads stdin / writes stdout.
    pub fn is_stdio(&self) -> bool {
        self.path.as_os_str() == STDIO
    }

    /// Loads the entire input into memory.
    ///
    /// # Errors
    ///
    /// Returns [`ScryptboxError::InputReadFailed`] if the input cannot be read.
    pub fn load(&self) -> Result<Vec<u8>> {
        if self.is_stdio() {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(ScryptboxError::InputReadFailed)?;
            return Ok(buf);
        }
        fs::read(&self.path).map_err(ScryptboxError::InputReadFailed)
    }

    /// Saves data, to stdout or to the file using atomic write.
    ///
    /// For files this method ensures crash-safety by:
    /// 1. Writing data to a temporary file with random name
    /// 2. Syncing the temporary file to disk
    /// 3. Atomically replacing the old file with the new one
    /// 4. Syncing the parent directory to ensure the rename is persisted
    ///
    /// Creates parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ScryptboxError::OutputWriteFailed`] if the output cannot be
    /// written.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if self.is_stdio() {
            let mut out = io::stdout().lock();
            out.write_all(data)
                .and_then(|()| out.flush())
                .map_err(ScryptboxError::OutputWriteFailed)?;
            return Ok(());
        }
        self.save_file(data).map_err(ScryptboxError::OutputWriteFailed)
    }

    fn save_file(&self, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // securely create temp file (fail if exists)
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        let written = tmp_file.write_all(data).and_then(|()| tmp_file.sync_all());
        drop(tmp_file);

        // atomic replace
        if let Err(e) = written.and_then(|()| self.atomic_replace(&tmp_path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory
        #[cfg(unix)]
        if let Some(parent) = self.parent_dir() {
            fs::File::open(parent)?.sync_all()?;
        }

        Ok(())
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Generates a unique temporary file path in the same directory.
    ///
    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> io::Result<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        fill(&mut buf).map_err(|e| io::Error::other(e.to_string()))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, hex::encode(buf));

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
    /// when the target exists, and a plain rename otherwise.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            return fs::rename(tmp_path, &self.path);
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        fs::rename(tmp_path, &self.path)
    }
}
