use arcstr::ArcStr;
use dashmap::{DashMap, mapref::entry::Entry};
use minipack_utils::xxhash::content_hash;
use serde::{Deserialize, Serialize};

use crate::StrOrBytes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EmittedFile {
  Asset(EmittedAsset),
  Chunk(EmittedChunk),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedAsset {
  pub name: Option<String>,
  pub file_name: Option<String>,
  pub source: StrOrBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedChunk {
  /// Specifier of the chunk's entry module, resolved like a user entry.
  pub id: String,
  pub name: Option<String>,
  pub file_name: Option<String>,
  pub importer: Option<String>,
}

/// Files emitted by plugins, keyed by a reference id derived from their content so the same
/// emission always yields the same id.
///
/// The emitter outlives a build in watch mode. Every file remembers which modules emitted it, so a
/// rebuild keeps the files of cached modules and drops those of changed or removed ones.
#[derive(Debug, Default)]
pub struct FileEmitter {
  files: DashMap<ArcStr, EmittedFile>,
  file_names: DashMap<ArcStr, ArcStr>,
  /// `None` stands for hooks that are not about a module. They run again in every build.
  origins: DashMap<ArcStr, Vec<Option<ArcStr>>>,
}

impl FileEmitter {
  /// `origin` is the module whose hook emits the file.
  pub fn emit_file(&self, file: EmittedFile, origin: Option<&ArcStr>) -> ArcStr {
    let reference_id = Self::reference_id_for(&file);
    let origin = origin.cloned();
    {
      let mut origins = self.origins.entry(reference_id.clone()).or_default();
      if !origins.contains(&origin) {
        origins.push(origin);
      }
    }
    if let Entry::Vacant(vacant) = self.files.entry(reference_id.clone()) {
      if let EmittedFile::Asset(EmittedAsset { file_name: Some(file_name), .. }) = &file {
        self.file_names.insert(reference_id.clone(), file_name.as_str().into());
      }
      vacant.insert(file);
    }
    reference_id
  }

  fn reference_id_for(file: &EmittedFile) -> ArcStr {
    let mut key = Vec::new();
    match file {
      EmittedFile::Asset(asset) => {
        key.extend_from_slice(b"asset\0");
        key.extend_from_slice(asset.name.as_deref().unwrap_or_default().as_bytes());
        key.push(0);
        key.extend_from_slice(asset.file_name.as_deref().unwrap_or_default().as_bytes());
        key.push(0);
        key.extend_from_slice(asset.source.as_bytes());
      }
      EmittedFile::Chunk(chunk) => {
        key.extend_from_slice(b"chunk\0");
        key.extend_from_slice(chunk.id.as_bytes());
        key.push(0);
        key.extend_from_slice(chunk.name.as_deref().unwrap_or_default().as_bytes());
        key.push(0);
        key.extend_from_slice(chunk.file_name.as_deref().unwrap_or_default().as_bytes());
      }
    }
    content_hash(&key, 8).into()
  }

  /// Every emitted chunk, ordered by reference id so concurrent emissions stay deterministic.
  pub fn emitted_chunks(&self) -> Vec<(ArcStr, EmittedChunk)> {
    let mut chunks = self
      .files
      .iter()
      .filter_map(|entry| match entry.value() {
        EmittedFile::Chunk(chunk) => Some((entry.key().clone(), chunk.clone())),
        EmittedFile::Asset(_) => None,
      })
      .collect::<Vec<_>>();
    chunks.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    chunks
  }

  /// Every emitted asset, ordered by reference id.
  pub fn emitted_assets(&self) -> Vec<(ArcStr, EmittedAsset)> {
    let mut assets = self
      .files
      .iter()
      .filter_map(|entry| match entry.value() {
        EmittedFile::Asset(asset) => Some((entry.key().clone(), asset.clone())),
        EmittedFile::Chunk(_) => None,
      })
      .collect::<Vec<_>>();
    assets.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    assets
  }

  pub fn set_file_name(&self, reference_id: ArcStr, file_name: ArcStr) {
    self.file_names.insert(reference_id, file_name);
  }

  pub fn get_file_name(&self, reference_id: &str) -> anyhow::Result<ArcStr> {
    if let Some(file_name) = self.file_names.get(reference_id) {
      return Ok(file_name.clone());
    }
    if self.files.contains_key(reference_id) {
      anyhow::bail!(
        "Unable to get file name for emitted file \"{reference_id}\": file names are only available after the chunks have been generated."
      );
    }
    anyhow::bail!("Unable to get file name for unknown file \"{reference_id}\".")
  }

  /// Prepares a build on top of the files of the last one. Files of hooks that run again anyway
  /// are dropped, and generated file names are forgotten.
  pub fn start_build(&self) {
    self.retain_origins(|origin| origin.is_some());
    self.file_names.clear();
    for entry in &self.files {
      if let EmittedFile::Asset(EmittedAsset { file_name: Some(file_name), .. }) = entry.value() {
        self.file_names.insert(entry.key().clone(), file_name.as_str().into());
      }
    }
  }

  /// Forgets the emissions of a module that is loaded again.
  pub fn forget_module(&self, module_id: &str) {
    self.retain_origins(|origin| origin != Some(module_id));
  }

  /// Forgets the emissions of every module `keep` rejects.
  pub fn retain_modules(&self, keep: impl Fn(&str) -> bool) {
    self.retain_origins(|origin| origin.is_none_or(&keep));
  }

  fn retain_origins(&self, keep: impl Fn(Option<&str>) -> bool) {
    self.origins.retain(|_, origins| {
      origins.retain(|origin| keep(origin.as_deref()));
      !origins.is_empty()
    });
    self.files.retain(|reference_id, _| self.origins.contains_key(reference_id));
    self.file_names.retain(|reference_id, _| self.files.contains_key(reference_id));
  }

  pub fn clear(&self) {
    self.files.clear();
    self.file_names.clear();
    self.origins.clear();
  }
}

#[test]
fn test_file_emitter() {
  let emitter = FileEmitter::default();
  let asset = EmittedFile::Asset(EmittedAsset {
    name: Some("logo.svg".to_string()),
    file_name: None,
    source: "<svg/>".into(),
  });
  let first = emitter.emit_file(asset.clone(), None);
  assert_eq!(emitter.emit_file(asset, None), first);
  assert!(emitter.get_file_name(&first).is_err());

  let chunk = emitter.emit_file(EmittedFile::Chunk(EmittedChunk {
    id: "./worker.js".to_string(),
    name: Some("worker".to_string()),
    file_name: None,
    importer: None,
  }), None);
  assert_ne!(chunk, first);
  assert_eq!(emitter.emitted_chunks().len(), 1);
  assert_eq!(emitter.emitted_assets().len(), 1);

  emitter.set_file_name(chunk.clone(), "worker-abc.js".into());
  assert_eq!(emitter.get_file_name(&chunk).unwrap(), "worker-abc.js");
  assert!(emitter.get_file_name("missing").is_err());
}

#[test]
fn test_file_emitter_across_builds() {
  let emitter = FileEmitter::default();
  let asset = |source: &str| {
    let name = Some("copy.txt".to_string());
    EmittedFile::Asset(EmittedAsset { name, file_name: None, source: source.into() })
  };
  let main: ArcStr = "/app/src/main.js".into();
  let other: ArcStr = "/app/src/other.js".into();

  let from_main = emitter.emit_file(asset("main"), Some(&main));
  let from_other = emitter.emit_file(asset("other"), Some(&other));
  let shared = emitter.emit_file(asset("shared"), Some(&main));
  assert_eq!(emitter.emit_file(asset("shared"), Some(&other)), shared);
  let from_build_start = emitter.emit_file(asset("build"), None);
  emitter.set_file_name(from_main.clone(), "assets/copy-1.txt".into());

  emitter.start_build();
  assert!(emitter.get_file_name(&from_main).is_err());
  assert!(!emitter.emitted_assets().iter().any(|(id, _)| *id == from_build_start));
  assert_eq!(emitter.emitted_assets().len(), 3);

  // `main.js` changed and emits a new copy.
  emitter.forget_module(&main);
  let ids = emitter.emitted_assets().into_iter().map(|(id, _)| id).collect::<Vec<_>>();
  assert!(!ids.contains(&from_main));
  assert!(ids.contains(&shared) && ids.contains(&from_other));

  // `other.js` is no longer part of the graph.
  emitter.retain_modules(|id| id != other.as_str());
  assert!(emitter.emitted_assets().is_empty());
}
