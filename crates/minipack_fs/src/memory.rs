use std::{
  io::{self, Read, Write},
  path::Path,
};

use sugar_path::SugarPath;
use vfs::{MemoryFS, VfsPath};

use crate::FileSystem;

/// A file system kept entirely in memory. Paths are normalized and treated as absolute.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
  root: VfsPath,
}

impl Default for MemoryFileSystem {
  fn default() -> Self {
    Self { root: VfsPath::new(MemoryFS::new()) }
  }
}

impl MemoryFileSystem {
  pub fn new<P: AsRef<Path>, C: AsRef<[u8]>>(files: impl IntoIterator<Item = (P, C)>) -> Self {
    let fs = Self::default();
    for (path, content) in files {
      // Writing into a fresh in-memory tree only fails for paths escaping the root.
      let _ = fs.add_file(path.as_ref(), content.as_ref());
    }
    fs
  }

  pub fn add_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      self.create_dir_all(parent)?;
    }
    self.write(path, content)
  }

  fn vfs_path(&self, path: &Path) -> io::Result<VfsPath> {
    let normalized = path.normalize();
    let normalized = normalized.to_slash_lossy();
    self.root.join(normalized.trim_start_matches('/').trim_end_matches('/')).map_err(into_io_error)
  }
}

fn into_io_error(err: vfs::VfsError) -> io::Error {
  let kind = match err.kind() {
    vfs::error::VfsErrorKind::FileNotFound => io::ErrorKind::NotFound,
    _ => io::ErrorKind::Other,
  };
  io::Error::new(kind, err.to_string())
}

impl FileSystem for MemoryFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let mut file = self.vfs_path(path)?.open_file().map_err(into_io_error)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = self.vfs_path(path)?.create_file().map_err(into_io_error)?;
    file.write_all(content)?;
    file.flush()
  }

  fn is_file(&self, path: &Path) -> bool {
    self.vfs_path(path).and_then(|p| p.is_file().map_err(into_io_error)).unwrap_or(false)
  }

  fn is_dir(&self, path: &Path) -> bool {
    self.vfs_path(path).and_then(|p| p.is_dir().map_err(into_io_error)).unwrap_or(false)
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    self.vfs_path(path)?.create_dir_all().map_err(into_io_error)
  }

  fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
    let dir = self.vfs_path(path)?;
    if dir.exists().map_err(into_io_error)? {
      dir.remove_dir_all().map_err(into_io_error)?;
    }
    Ok(())
  }
}

#[test]
fn test_memory_file_system() {
  let fs = MemoryFileSystem::new([("/src/main.js", "import './dep.js'"), ("/src/dep.js", "")]);

  assert!(fs.is_file(Path::new("/src/main.js")));
  assert!(fs.is_file(Path::new("/src/./lib/../dep.js")));
  assert!(fs.is_dir(Path::new("/src")));
  assert!(!fs.is_file(Path::new("/src/missing.js")));
  assert_eq!(fs.read_to_string(Path::new("/src/main.js")).unwrap(), "import './dep.js'");

  fs.add_file(Path::new("/dist/nested/out.js"), b"console.log(1)").unwrap();
  assert_eq!(fs.read(Path::new("/dist/nested/out.js")).unwrap(), b"console.log(1)");

  let err = fs.read(Path::new("/nope.js")).unwrap_err();
  assert_eq!(err.kind(), io::ErrorKind::NotFound);

  fs.remove_dir_all(Path::new("/dist")).unwrap();
  assert!(!fs.is_dir(Path::new("/dist")));
}
