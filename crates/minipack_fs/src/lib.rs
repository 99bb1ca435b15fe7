mod file_system;
mod memory;
mod os;

use std::sync::Arc;

pub use crate::{file_system::FileSystem, memory::MemoryFileSystem, os::OsFileSystem};

pub type SharedFileSystem = Arc<dyn FileSystem>;
