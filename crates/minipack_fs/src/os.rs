use std::{io, path::Path};

use crate::FileSystem;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    simdutf8::basic::from_utf8(&bytes).map_err(|_| {
      io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Could not read source file {path:?}: not valid UTF-8"),
      )
    })?;
    // SAFETY: `simdutf8` has validated the bytes above.
    Ok(unsafe { String::from_utf8_unchecked(bytes) })
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    std::fs::write(path, content)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
  }

  fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
      Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }
}
