mod common;

use std::path::Path;

use minipack::{
  AdvancedChunksOptions, BuildWarning, BundleError, BundlerOptions, FileSystem, FilterPattern,
  HookOrder, HookTransformOutput, ManualChunkGroup, Output, Plugin, SourceMap,
};

use common::{bundler, chunk_by_name, memory_fs, module_ids, options, regions};

#[tokio::test(flavor = "multi_thread")]
async fn bundles_a_single_entry_in_execution_order() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nimport './b.js';\nconsole.log('main');\n"),
    ("src/a.js", "import './shared.js';\nconsole.log('a');\n"),
    ("src/b.js", "import './shared.js';\nconsole.log('b');\n"),
    ("src/shared.js", "console.log('shared');\n"),
  ]);
  let output = bundler(&fs, options(&["./src/main.js"]), vec![]).generate().await.unwrap();

  assert_eq!(output.assets.len(), 1);
  let chunk = output.chunks().next().unwrap();
  assert_eq!(chunk.filename, "main.js");
  assert!(chunk.is_entry);
  assert_eq!(regions(&chunk.code), ["src/shared.js", "src/a.js", "src/b.js", "src/main.js"]);
  assert_eq!(module_ids(chunk), ["src/shared.js", "src/a.js", "src/b.js", "src/main.js"]);
  // Imports inside the chunk are gone, the rest of the module is kept.
  assert!(!chunk.code.contains("import"));
  assert!(chunk.code.contains("console.log('main');"));
  assert!(output.warnings.is_empty());
  assert_eq!(
    output.watch_files,
    ["/app/src/a.js", "/app/src/b.js", "/app/src/main.js", "/app/src/shared.js"]
  );
}

#[tokio::test(flavor = "multi_thread")]
async fn output_does_not_depend_on_scheduling() {
  let files = [
    ("src/main.js", "import './a.js';\nimport('./lazy.js');\n"),
    ("src/admin.js", "import './a.js';\nimport './b.js';\n"),
    ("src/a.js", "import './c.js';\nexport const a = 1;\n"),
    ("src/b.js", "import './c.js';\nexport const b = 1;\n"),
    ("src/c.js", "export const c = 1;\n"),
    ("src/lazy.js", "import './b.js';\nexport default 1;\n"),
  ];
  let mut snapshots = vec![];
  for _ in 0..5 {
    let fs = memory_fs(&files);
    let opts = BundlerOptions {
      chunk_filenames: Some("[name]-[hash].js".to_string()),
      sourcemap: Some(true),
      ..options(&["./src/main.js", "./src/admin.js"])
    };
    let output = bundler(&fs, opts, vec![]).generate().await.unwrap();
    let snapshot = output
      .assets
      .iter()
      .map(|output| {
        (output.filename().to_string(), String::from_utf8_lossy(output.content_as_bytes()).into())
      })
      .collect::<Vec<(String, String)>>();
    snapshots.push(snapshot);
  }
  assert!(snapshots.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test(flavor = "multi_thread")]
async fn hashes_in_file_names_are_lowercase_base36() {
  let fs = memory_fs(&[
    ("src/main.js", "import('./lazy.js');\nconsole.log('main');\n"),
    ("src/lazy.js", "export default 'lazy';\n"),
  ]);
  let opts = BundlerOptions {
    chunk_filenames: Some("[name]-[hash].js".to_string()),
    ..options(&["./src/main.js"])
  };
  let output = bundler(&fs, opts, vec![]).generate().await.unwrap();

  let lazy = chunk_by_name(output.chunks(), "lazy");
  let hash = lazy.filename.strip_prefix("lazy-").unwrap().strip_suffix(".js").unwrap();
  assert_eq!(hash.len(), 8);
  assert!(hash.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()), "{hash}");
}

#[tokio::test(flavor = "multi_thread")]
async fn shares_modules_between_entries() {
  let fs = memory_fs(&[
    ("src/main.js", "import './shared.js';\nconsole.log('main');\n"),
    ("src/admin.js", "import './shared.js';\nconsole.log('admin');\n"),
    ("src/shared.js", "console.log('shared');\n"),
  ]);
  let output = bundler(&fs, options(&["./src/main.js", "./src/admin.js"]), vec![])
    .generate()
    .await
    .unwrap();

  let filenames = output.assets.iter().map(Output::filename).collect::<Vec<_>>();
  assert_eq!(filenames, ["main.js", "admin.js", "shared.js"]);

  let main = chunk_by_name(output.chunks(), "main");
  let shared = chunk_by_name(output.chunks(), "shared");
  assert_eq!(main.imports, ["shared.js"]);
  assert!(main.code.starts_with("import \"./shared.js\";\n"));
  assert_eq!(module_ids(main), ["src/main.js"]);
  assert_eq!(module_ids(shared), ["src/shared.js"]);
  assert!(!shared.is_entry);

  // Every module lives in exactly one chunk.
  let mut all = output.chunks().flat_map(module_ids).collect::<Vec<_>>();
  all.sort();
  assert_eq!(all, ["src/admin.js", "src/main.js", "src/shared.js"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn dynamic_imports_get_their_own_chunk() {
  let fs = memory_fs(&[
    ("src/main.js", "const lazy = () => import('./lazy.js');\n"),
    ("src/lazy.js", "export default 'lazy';\n"),
  ]);
  let output = bundler(&fs, options(&["./src/main.js"]), vec![]).generate().await.unwrap();

  let main = chunk_by_name(output.chunks(), "main");
  let lazy = chunk_by_name(output.chunks(), "lazy");
  assert!(lazy.is_dynamic_entry);
  assert!(!lazy.is_entry);
  assert_eq!(main.dynamic_imports, ["lazy.js"]);
  assert!(main.imports.is_empty());
  assert!(main.code.contains("import(\"./lazy.js\")"));
}

#[tokio::test(flavor = "multi_thread")]
async fn externals_are_left_alone() {
  let fs = memory_fs(&[("src/main.js", "import React from 'react';\nconsole.log(React);\n")]);
  let opts = BundlerOptions {
    external: Some(vec![FilterPattern::glob("react")]),
    ..options(&["./src/main.js"])
  };
  let output = bundler(&fs, opts, vec![]).generate().await.unwrap();
  let chunk = output.chunks().next().unwrap();
  assert!(chunk.code.contains("import React from 'react';"));
  assert_eq!(module_ids(chunk), ["src/main.js"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_groups_take_precedence_in_declaration_order() {
  let fs = memory_fs(&[
    ("src/main.js", "import './vendor/react.js';\nimport './vendor/lodash.js';\n"),
    ("src/vendor/react.js", "console.log('react');\n"),
    ("src/vendor/lodash.js", "console.log('lodash');\n"),
  ]);
  let opts = BundlerOptions {
    manual_chunks: Some(vec![
      ManualChunkGroup::new("react", FilterPattern::glob("**/react.js")),
      ManualChunkGroup::new("vendor", FilterPattern::glob("**/vendor/**")),
      ManualChunkGroup::new("unused", FilterPattern::glob("**/nothing/**")),
    ]),
    ..options(&["./src/main.js"])
  };
  let output = bundler(&fs, opts, vec![]).generate().await.unwrap();

  let filenames = output.assets.iter().map(Output::filename).collect::<Vec<_>>();
  assert_eq!(filenames, ["main.js", "react.js", "vendor.js"]);
  assert_eq!(module_ids(chunk_by_name(output.chunks(), "react")), ["src/vendor/react.js"]);
  assert_eq!(module_ids(chunk_by_name(output.chunks(), "vendor")), ["src/vendor/lodash.js"]);
  assert_eq!(chunk_by_name(output.chunks(), "main").imports, ["react.js", "vendor.js"]);

  assert_eq!(output.warnings.len(), 1);
  assert!(matches!(
    output.warnings[0].downcast_ref::<BuildWarning>(),
    Some(BuildWarning::UnusedManualChunkGroup(name)) if name == "unused"
  ));
}

#[tokio::test(flavor = "multi_thread")]
async fn advanced_chunks_split_large_common_chunks() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nimport './b.js';\nimport './c.js';\n"),
    ("src/admin.js", "import './a.js';\nimport './b.js';\nimport './c.js';\n"),
    ("src/a.js", "console.log('a');\n"),
    ("src/b.js", "console.log('b');\n"),
    ("src/c.js", "console.log('c');\n"),
  ]);
  let opts = BundlerOptions {
    advanced_chunks: Some(AdvancedChunksOptions {
      max_module_count: Some(2),
      ..Default::default()
    }),
    ..options(&["./src/main.js", "./src/admin.js"])
  };
  let output = bundler(&fs, opts, vec![]).generate().await.unwrap();

  let common = output.chunks().filter(|chunk| !chunk.is_entry).collect::<Vec<_>>();
  assert_eq!(common.len(), 2);
  assert_eq!(module_ids(common[0]), ["src/a.js", "src/b.js"]);
  assert_eq!(module_ids(common[1]), ["src/c.js"]);
  assert_eq!(chunk_by_name(output.chunks(), "main").imports.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn reports_circular_dependencies() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\n"),
    ("src/a.js", "import './b.js';\nconsole.log('a');\n"),
    ("src/b.js", "import './a.js';\nconsole.log('b');\n"),
  ]);
  let output = bundler(&fs, options(&["./src/main.js"]), vec![]).generate().await.unwrap();

  let chunk = output.chunks().next().unwrap();
  assert_eq!(regions(&chunk.code), ["src/b.js", "src/a.js", "src/main.js"]);
  assert_eq!(output.warnings.len(), 1);
  assert_eq!(
    output.warnings[0].to_string(),
    "Circular dependency: src/a.js -> src/b.js -> src/a.js."
  );
}

#[tokio::test(flavor = "multi_thread")]
async fn writes_sourcemaps_next_to_chunks() {
  let fs = memory_fs(&[
    ("src/main.js", "import './dep.js';\nconsole.log('main');\n"),
    ("src/dep.js", "console.log('dep');\n"),
  ]);
  let opts = BundlerOptions { sourcemap: Some(true), ..options(&["./src/main.js"]) };
  let output = bundler(&fs, opts, vec![]).write().await.unwrap();

  let filenames = output.assets.iter().map(Output::filename).collect::<Vec<_>>();
  assert_eq!(filenames, ["main.js", "main.js.map"]);
  let chunk = output.chunks().next().unwrap();
  assert!(chunk.code.ends_with("\n//# sourceMappingURL=main.js.map"));
  assert_eq!(chunk.sourcemap_filename.as_deref(), Some("main.js.map"));
  let map = chunk.map.as_ref().unwrap().to_json_string();
  assert!(map.contains("src/dep.js"));
  assert!(map.contains("src/main.js"));

  let written = fs.read_to_string(Path::new("/app/dist/main.js")).unwrap();
  assert_eq!(written, chunk.code);
  assert!(fs.is_file(Path::new("/app/dist/main.js.map")));
}

fn banner_plugin(with_map: bool) -> Plugin {
  Plugin::new("banner").transform(HookOrder::Normal, move |_ctx, args| async move {
    // Every line moves down by two.
    let map = r#"{"version":3,"sources":["main.js"],"names":[],"mappings":";;AAAA;AACA;AACA"}"#;
    Ok(Some(HookTransformOutput {
      code: Some(format!("// one\n// two\n{}", args.code)),
      map: with_map.then(|| SourceMap::from_json_string(map).unwrap()),
      ..Default::default()
    }))
  })
}

#[tokio::test(flavor = "multi_thread")]
async fn sourcemaps_trace_transforms_back_to_the_source() {
  let original = "let answer = 42;\nconsole.log(answer);\n";
  let fs = memory_fs(&[("src/main.js", original)]);
  let opts = BundlerOptions { sourcemap: Some(true), ..options(&["./src/main.js"]) };
  let output = bundler(&fs, opts, vec![banner_plugin(true)]).generate().await.unwrap();

  assert!(output.warnings.is_empty());
  let chunk = output.chunks().next().unwrap();
  let map = chunk.map.as_ref().unwrap();
  let line_of = |text: &str| {
    let line = chunk.code.lines().position(|line| line.contains(text)).unwrap();
    u32::try_from(line).unwrap()
  };
  let token_on = |line: u32| map.get_tokens().find(|token| token.get_dst_line() == line);

  let token = token_on(line_of("console.log(answer)")).unwrap();
  assert_eq!(token.get_src_line(), 1);
  let source = token.get_source_id().unwrap();
  assert!(map.get_source(source).unwrap().ends_with("src/main.js"));
  assert_eq!(map.get_source_content(source), Some(original));
  assert_eq!(token_on(line_of("let answer")).unwrap().get_src_line(), 0);
  // The banner has nothing to point at.
  assert!(token_on(line_of("// one")).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn transforms_without_a_map_are_reported() {
  let fs = memory_fs(&[("src/main.js", "console.log('main');\n")]);
  let opts = BundlerOptions { sourcemap: Some(true), ..options(&["./src/main.js"]) };
  let output = bundler(&fs, opts, vec![banner_plugin(false)]).generate().await.unwrap();

  assert_eq!(output.warnings.len(), 1);
  assert!(matches!(
    output.warnings[0].downcast_ref::<BuildWarning>(),
    Some(BuildWarning::SourcemapBroken(module)) if module.ends_with("src/main.js")
  ));
  assert!(output.chunks().next().unwrap().map.is_some());

  // Nothing to report without sourcemaps.
  let output =
    bundler(&fs, options(&["./src/main.js"]), vec![banner_plugin(false)]).generate().await.unwrap();
  assert!(output.warnings.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn file_option_rejects_multiple_chunks() {
  let fs = memory_fs(&[
    ("src/main.js", "import('./lazy.js');\n"),
    ("src/lazy.js", "export default 1;\n"),
  ]);
  let opts =
    BundlerOptions { file: Some("dist/out.js".to_string()), ..options(&["./src/main.js"]) };
  let err = bundler(&fs, opts, vec![]).generate().await.unwrap_err();
  assert!(matches!(err.bundle_errors().next(), Some(BundleError::Configuration(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_modules_fail_the_build() {
  let fs = memory_fs(&[("src/main.js", "import './missing.js';\n")]);
  let err = bundler(&fs, options(&["./src/main.js"]), vec![]).generate().await.unwrap_err();
  assert!(!err.is_cancelled());
  assert!(matches!(err.bundle_errors().next(), Some(BundleError::Resolve { specifier, .. })
    if specifier == "./missing.js"));
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_bundlers_refuse_to_build() {
  let fs = memory_fs(&[("src/main.js", "console.log(1);\n")]);
  let mut bundler = bundler(&fs, options(&["./src/main.js"]), vec![]);
  bundler.close().await.unwrap();
  assert!(bundler.generate().await.is_err());
  // Closing twice is fine.
  bundler.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_builds_still_report_the_files_they_reached() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\n"),
    ("src/a.js", "import './missing.js';\n"),
  ]);
  let mut unresolved_entry = bundler(&fs, options(&["./src/main.js", "./src/gone.js"]), vec![]);
  assert!(unresolved_entry.generate().await.is_err());
  // Creating the entry starts a build.
  assert_eq!(unresolved_entry.watch_files(), ["/app/src/gone.js", "/app/src/main.js"]);

  let mut missing_import = bundler(&fs, options(&["./src/main.js"]), vec![]);
  assert!(missing_import.generate().await.is_err());
  assert_eq!(missing_import.watch_files(), ["/app/src/a.js", "/app/src/main.js"]);

  fs.write(Path::new("/app/src/missing.js"), b"export {};\n").unwrap();
  let output = missing_import.generate().await.unwrap();
  assert_eq!(missing_import.watch_files(), output.watch_files);
  assert_eq!(output.watch_files, ["/app/src/a.js", "/app/src/main.js", "/app/src/missing.js"]);
}
