mod common;

use std::{
  path::Path,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use minipack::{
  BundleError, Bundler, BundleOutput, BundlerOptions, EmittedAsset, EmittedFile, FileSystem,
  HookOrder, MemoryFileSystem, Output, Plugin, Watcher, WatcherChange, WatcherChangeKind,
  WatcherEvent, WatcherOptions, WatcherState,
};
use tokio::sync::broadcast;

use common::{bundler, chunk_by_name, memory_fs, options, regions};

type Loads = Arc<Mutex<Vec<String>>>;

fn counting_plugin(loads: &Loads) -> Plugin {
  let loads = Arc::clone(loads);
  Plugin::new("count-loads").load(HookOrder::Normal, move |_ctx, args| {
    loads.lock().unwrap().push(args.id.trim_start_matches("/app/").to_string());
    async { Ok(None) }
  })
}

fn take(loads: &Loads) -> Vec<String> {
  let mut loads = std::mem::take(&mut *loads.lock().unwrap());
  loads.sort();
  loads
}

fn edit(fs: &MemoryFileSystem, path: &str, content: &str) -> WatcherChange {
  let path = format!("/app/{path}");
  fs.write(Path::new(&path), content.as_bytes()).unwrap();
  WatcherChange::new(path, WatcherChangeKind::Modify)
}

fn test_options() -> WatcherOptions {
  WatcherOptions { write: false, use_fs_events: false, ..Default::default() }
}

fn watch(bundler: Bundler, options: WatcherOptions) -> Watcher {
  Watcher::new(Arc::new(tokio::sync::Mutex::new(bundler)), options).unwrap()
}

async fn next_event(events: &mut broadcast::Receiver<WatcherEvent>) -> WatcherEvent {
  tokio::time::timeout(Duration::from_secs(5), events.recv())
    .await
    .expect("watcher event in time")
    .expect("open event channel")
}

async fn next_output(events: &mut broadcast::Receiver<WatcherEvent>) -> (u64, Arc<BundleOutput>) {
  let WatcherEvent::BundleStart { generation: started } = next_event(events).await else {
    panic!("expected a build to start");
  };
  match next_event(events).await {
    WatcherEvent::BundleEnd { generation, output, .. } => {
      assert_eq!(generation, started);
      (generation, output)
    }
    other => panic!("expected generation {started} to finish, got {other:?}"),
  }
}

#[tokio::test(flavor = "multi_thread")]
async fn invalidate_reports_the_affected_importers() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nimport './b.js';\n"),
    ("src/a.js", "import './leaf.js';\n"),
    ("src/b.js", "console.log('b');\n"),
    ("src/leaf.js", "console.log('leaf');\n"),
  ]);
  let loads = Loads::default();
  let mut bundler = bundler(&fs, options(&["./src/main.js"]), vec![counting_plugin(&loads)]);

  // Nothing is cached before the first build.
  let untouched = WatcherChange::new("/app/src/leaf.js", WatcherChangeKind::Modify);
  assert_eq!(bundler.invalidate(&[untouched]), ["/app/src/leaf.js"]);

  bundler.generate().await.unwrap();
  assert_eq!(take(&loads), ["src/a.js", "src/b.js", "src/leaf.js", "src/main.js"]);

  let change = edit(&fs, "src/leaf.js", "console.log('leaf 2');\n");
  let mut affected = bundler.invalidate(&[change]);
  affected.sort();
  assert_eq!(affected, ["/app/src/a.js", "/app/src/leaf.js", "/app/src/main.js"]);

  let output = bundler.generate().await.unwrap();
  assert_eq!(take(&loads), ["src/leaf.js"]);
  assert!(output.chunks().next().unwrap().code.contains("leaf 2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn created_files_drop_the_cache() {
  let fs = memory_fs(&[("src/main.js", "import './a.js';\n"), ("src/a.js", "export {};\n")]);
  let loads = Loads::default();
  let mut bundler = bundler(&fs, options(&["./src/main.js"]), vec![counting_plugin(&loads)]);
  bundler.generate().await.unwrap();
  take(&loads);

  fs.write(Path::new("/app/src/new.js"), b"export {};\n").unwrap();
  let created = WatcherChange::new("/app/src/new.js", WatcherChangeKind::Create);
  assert_eq!(bundler.invalidate(&[created]), ["/app/src/new.js"]);

  bundler.generate().await.unwrap();
  assert_eq!(take(&loads), ["src/a.js", "src/main.js"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rebuilds_leave_unaffected_chunks_alone() {
  let fs = memory_fs(&[
    ("src/a.js", "import './b.js';\nconsole.log('a');\n"),
    ("src/b.js", "console.log('b');\n"),
    ("src/c.js", "import './d.js';\nconsole.log('c');\n"),
    ("src/d.js", "console.log('d');\n"),
  ]);
  let calls = Loads::default();
  let plugin = {
    let (resolves, transforms) = (Arc::clone(&calls), Arc::clone(&calls));
    Plugin::new("record")
      .resolve_id(HookOrder::Normal, move |_ctx, args| {
        if let Some(importer) = &args.importer {
          let importer = importer.trim_start_matches("/app/");
          resolves.lock().unwrap().push(format!("resolve {} from {importer}", args.specifier));
        }
        async { Ok(None) }
      })
      .transform(HookOrder::Normal, move |_ctx, args| {
        let id = args.id.trim_start_matches("/app/");
        transforms.lock().unwrap().push(format!("transform {id}"));
        async { Ok(None) }
      })
  };
  let opts = BundlerOptions {
    entry_filenames: Some("[name]-[hash].js".to_string()),
    ..options(&["./src/a.js", "./src/c.js"])
  };
  let mut bundler = bundler(&fs, opts, vec![plugin]);

  let first = bundler.generate().await.unwrap();
  assert_eq!(
    take(&calls),
    [
      "resolve ./b.js from src/a.js",
      "resolve ./d.js from src/c.js",
      "transform src/a.js",
      "transform src/b.js",
      "transform src/c.js",
      "transform src/d.js",
    ]
  );

  bundler.invalidate(&[edit(&fs, "src/b.js", "console.log('b 2');\n")]);
  let second = bundler.generate().await.unwrap();
  assert_eq!(take(&calls), ["transform src/b.js"]);

  let (before, after) = (chunk_by_name(first.chunks(), "c"), chunk_by_name(second.chunks(), "c"));
  assert_eq!(before.filename, after.filename);
  assert_eq!(before.code, after.code);
  assert_eq!(regions(&after.code), ["src/d.js", "src/c.js"]);

  let (before, after) = (chunk_by_name(first.chunks(), "a"), chunk_by_name(second.chunks(), "a"));
  assert_ne!(before.filename, after.filename);
  assert!(after.code.contains("console.log('b 2');"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rebuilds_drop_files_emitted_for_stale_modules() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nconsole.log('main');\n"),
    ("src/a.js", "console.log('a');\n"),
  ]);
  let plugin = Plugin::new("copy").transform(HookOrder::Normal, |ctx, args| {
    let name = Path::new(args.id.as_str()).with_extension("txt");
    let name = name.file_name().map(|name| name.to_string_lossy().into_owned());
    let copy = EmittedAsset { name, file_name: None, source: args.code.as_str().into() };
    ctx.emit_file(EmittedFile::Asset(copy));
    async { Ok(None) }
  });
  let copies = |output: &BundleOutput| {
    let mut copies = output
      .assets
      .iter()
      .filter(|output| matches!(output, Output::Asset(_)))
      .map(|output| String::from_utf8_lossy(output.content_as_bytes()).into_owned())
      .collect::<Vec<_>>();
    copies.sort();
    copies
  };
  let mut bundler = bundler(&fs, options(&["./src/main.js"]), vec![plugin]);

  let output = bundler.generate().await.unwrap();
  assert_eq!(copies(&output), ["console.log('a');\n", "import './a.js';\nconsole.log('main');\n"]);

  bundler.invalidate(&[edit(&fs, "src/main.js", "import './a.js';\nconsole.log('main 2');\n")]);
  let output = bundler.generate().await.unwrap();
  let expected = ["console.log('a');\n", "import './a.js';\nconsole.log('main 2');\n"];
  assert_eq!(copies(&output), expected);

  // `a.js` leaves the graph.
  bundler.invalidate(&[edit(&fs, "src/main.js", "console.log('main 3');\n")]);
  let output = bundler.generate().await.unwrap();
  assert_eq!(copies(&output), ["console.log('main 3');\n"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rebuilds_after_changes() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nconsole.log('main');\n"),
    ("src/a.js", "console.log('a');\n"),
  ]);
  let loads = Loads::default();
  let bundler = bundler(&fs, options(&["./src/main.js"]), vec![counting_plugin(&loads)]);
  let mut watcher = watch(bundler, test_options());
  let mut events = watcher.subscribe();

  let (generation, output) = next_output(&mut events).await;
  assert_eq!(generation, 1);
  assert!(output.chunks().next().unwrap().code.contains("console.log('a');"));
  assert_eq!(take(&loads), ["src/a.js", "src/main.js"]);

  let mut state = watcher.state();
  state.wait_for(|state| *state == WatcherState::AwaitingChanges).await.unwrap();

  watcher.notify_change(edit(&fs, "src/a.js", "console.log('a 2');\n"));
  let (generation, output) = next_output(&mut events).await;
  assert_eq!(generation, 2);
  assert!(output.chunks().next().unwrap().code.contains("console.log('a 2');"));
  assert_eq!(take(&loads), ["src/a.js"]);

  watcher.close().await;
  assert!(matches!(next_event(&mut events).await, WatcherEvent::Close));
  assert_eq!(*state.borrow(), WatcherState::Idle);
}

#[tokio::test(flavor = "multi_thread")]
async fn bursts_of_changes_share_one_rebuild() {
  let fs = memory_fs(&[
    ("src/main.js", "import './a.js';\nimport './b.js';\n"),
    ("src/a.js", "console.log('a');\n"),
    ("src/b.js", "console.log('b');\n"),
  ]);
  let loads = Loads::default();
  let bundler = bundler(&fs, options(&["./src/main.js"]), vec![counting_plugin(&loads)]);
  let watch_options = WatcherOptions { debounce: Duration::from_millis(100), ..test_options() };
  let mut watcher = watch(bundler, watch_options);
  let mut events = watcher.subscribe();
  next_output(&mut events).await;
  take(&loads);

  watcher.notify_change(edit(&fs, "src/a.js", "console.log('a 2');\n"));
  watcher.notify_change(edit(&fs, "src/b.js", "console.log('b 2');\n"));
  watcher.notify_change(edit(&fs, "src/a.js", "console.log('a 3');\n"));

  let (_, output) = next_output(&mut events).await;
  let code = &output.chunks().next().unwrap().code;
  assert!(code.contains("a 3") && code.contains("b 2"));
  assert_eq!(take(&loads), ["src/a.js", "src/b.js"]);

  watcher.close().await;
  assert!(matches!(next_event(&mut events).await, WatcherEvent::Close));
}

#[tokio::test(flavor = "multi_thread")]
async fn changes_during_a_build_supersede_it() {
  let fs = memory_fs(&[
    ("src/main.js", "import './slow.js';\nconsole.log('main');\n"),
    ("src/slow.js", "console.log('slow');\n"),
  ]);
  let slow = Arc::new(AtomicBool::new(false));
  let plugin = {
    let slow = Arc::clone(&slow);
    Plugin::new("slow").load(HookOrder::Normal, move |_ctx, args| {
      let delay = slow.load(Ordering::SeqCst) && args.id.ends_with("slow.js");
      async move {
        if delay {
          tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(None)
      }
    })
  };
  let bundler = bundler(&fs, options(&["./src/main.js"]), vec![plugin]);
  let mut watcher = watch(bundler, test_options());
  let mut events = watcher.subscribe();
  next_output(&mut events).await;

  slow.store(true, Ordering::SeqCst);
  watcher.notify_change(edit(&fs, "src/slow.js", "console.log('slow 2');\n"));
  assert!(matches!(next_event(&mut events).await, WatcherEvent::BundleStart { generation: 2 }));

  let main = "import './slow.js';\nconsole.log('main 2');\n";
  watcher.notify_change(edit(&fs, "src/main.js", main));

  // The superseded generation never reports an outcome.
  let (generation, output) = next_output(&mut events).await;
  assert!(generation > 2);
  let code = &output.chunks().next().unwrap().code;
  assert!(code.contains("slow 2") && code.contains("main 2"));
  assert_eq!(regions(code), ["src/slow.js", "src/main.js"]);

  // Nor does it report one once its slow load finishes.
  tokio::time::sleep(Duration::from_millis(400)).await;
  assert!(events.try_recv().is_err());

  watcher.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn recovers_once_errors_are_fixed() {
  let fs = memory_fs(&[("src/main.js", "console.log('main');\n")]);
  let bundler = bundler(&fs, options(&["./src/main.js"]), vec![]);
  let mut watcher = watch(bundler, test_options());
  let mut events = watcher.subscribe();
  next_output(&mut events).await;

  watcher.notify_change(edit(&fs, "src/main.js", "import './missing.js';\n"));
  let WatcherEvent::BundleStart { generation: started } = next_event(&mut events).await else {
    panic!("expected a build to start");
  };
  let WatcherEvent::Error { generation, error } = next_event(&mut events).await else {
    panic!("expected the build to fail");
  };
  assert_eq!(generation, started);
  assert!(matches!(error.bundle_errors().next(), Some(BundleError::Resolve { .. })));

  // The watcher keeps running after a failed build.
  fs.write(Path::new("/app/src/missing.js"), b"console.log('found');\n").unwrap();
  watcher.notify_change(WatcherChange::new("/app/src/missing.js", WatcherChangeKind::Create));
  let (_, output) = next_output(&mut events).await;
  let code = &output.chunks().next().unwrap().code;
  assert_eq!(regions(code), ["src/missing.js", "src/main.js"]);

  watcher.close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn changes_in_the_output_directory_are_ignored() {
  let fs = memory_fs(&[("src/main.js", "console.log('main');\n")]);
  let bundler = bundler(&fs, options(&["./src/main.js"]), vec![]);
  let watch_options = WatcherOptions { write: true, ..test_options() };
  let mut watcher = watch(bundler, watch_options);
  let mut events = watcher.subscribe();
  next_output(&mut events).await;
  assert!(fs.is_file(Path::new("/app/dist/main.js")));

  watcher.notify_change(WatcherChange::new("/app/dist/main.js", WatcherChangeKind::Modify));
  tokio::time::sleep(Duration::from_millis(200)).await;
  assert!(events.try_recv().is_err());
  assert_eq!(*watcher.state().borrow(), WatcherState::AwaitingChanges);

  watcher.close().await;
  assert!(matches!(next_event(&mut events).await, WatcherEvent::Close));
}
