use std::sync::Arc;

use arcstr::ArcStr;
use minipack_common::{ImportKind, ModuleType, Output, RenderedChunk, SideEffects};
use minipack_sourcemap::{JSONSourceMap, SourceMap};
use serde::{
  Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::SerializeStruct,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResolveIdArgs {
  pub specifier: ArcStr,
  pub importer: Option<ArcStr>,
  pub kind: ImportKind,
  pub is_entry: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResolveIdOutput {
  pub id: String,
  pub external: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookLoadArgs {
  pub id: ArcStr,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookLoadOutput {
  pub code: String,
  pub module_type: Option<ModuleType>,
  pub side_effects: Option<SideEffects>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookTransformArgs {
  pub id: ArcStr,
  pub code: ArcStr,
  pub module_type: ModuleType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookTransformOutput {
  pub code: Option<String>,
  /// Maps `code` back to the code the hook was given. Accepts the JSON text or the object.
  #[serde(default, deserialize_with = "deserialize_sourcemap")]
  pub map: Option<SourceMap>,
  pub module_type: Option<ModuleType>,
  pub side_effects: Option<SideEffects>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSourceMap {
  Json(String),
  Object(JSONSourceMap),
}

fn deserialize_sourcemap<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<SourceMap>, D::Error> {
  let map = match Option::<RawSourceMap>::deserialize(deserializer)? {
    None => return Ok(None),
    Some(RawSourceMap::Json(json)) => SourceMap::from_json_string(&json),
    Some(RawSourceMap::Object(json)) => SourceMap::from_json(json),
  };
  map.map(Some).map_err(|err| D::Error::custom(format!("invalid source map: {err}")))
}

#[derive(Debug, Clone)]
pub struct HookRenderChunkArgs {
  pub code: ArcStr,
  pub chunk: Arc<RenderedChunk>,
}

impl Serialize for HookRenderChunkArgs {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("HookRenderChunkArgs", 2)?;
    state.serialize_field("code", &self.code)?;
    state.serialize_field("chunk", self.chunk.as_ref())?;
    state.end()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HookRenderChunkOutput {
  pub code: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HookBuildEndArgs {
  /// First error of a failed build.
  pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookRenderErrorArgs {
  pub error: String,
}

/// The finished outputs, before anything is written.
#[derive(Debug, Clone)]
pub struct HookGenerateBundleArgs {
  pub is_write: bool,
  pub outputs: Arc<[Output]>,
}

impl Serialize for HookGenerateBundleArgs {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("HookGenerateBundleArgs", 2)?;
    state.serialize_field("isWrite", &self.is_write)?;
    let file_names = self.outputs.iter().map(Output::filename).collect::<Vec<_>>();
    state.serialize_field("fileNames", &file_names)?;
    state.end()
  }
}

#[derive(Debug, Clone)]
pub struct HookWriteBundleArgs {
  pub dir: String,
  pub outputs: Arc<[Output]>,
}

impl Serialize for HookWriteBundleArgs {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("HookWriteBundleArgs", 2)?;
    state.serialize_field("dir", &self.dir)?;
    let file_names = self.outputs.iter().map(Output::filename).collect::<Vec<_>>();
    state.serialize_field("fileNames", &file_names)?;
    state.end()
  }
}

#[test]
fn test_transform_output_map() {
  use serde_json::json;

  let map = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA;AACA"}"#;
  let object = serde_json::from_str::<serde_json::Value>(map).unwrap();
  for map in [json!(map), object] {
    let output: HookTransformOutput =
      serde_json::from_value(json!({ "code": "x", "map": map })).unwrap();
    let map = output.map.unwrap();
    assert_eq!(map.get_source(0), Some("a.js"));
    assert_eq!(map.get_tokens().count(), 2);
  }

  let output: HookTransformOutput = serde_json::from_value(json!({ "code": "x" })).unwrap();
  assert!(output.map.is_none());
  let output: HookTransformOutput =
    serde_json::from_value(json!({ "code": "x", "map": null })).unwrap();
  assert!(output.map.is_none());
  assert!(serde_json::from_value::<HookTransformOutput>(json!({ "map": "nope" })).is_err());
}
