use super::*;
use crate::engine::{Container, ContainerMetadata, PortBinding};
use crate::plugin::{AppExtension, ExtensionData, PLUGINS_DIR, PLUGIN_MANIFEST};
use crate::testing::{RecordingEngine, StaticUrlScanner};
use async_trait::async_trait;
use berth_foundation::{BerthConfig, BufferMessenger, MemoryCache, Messenger, Metrics};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap as Map;
use tempfile::TempDir;

const COMPOSE: &str = "\
services:
  web:
    image: nginx
    environment:
      A: '2'
  db:
    image: mariadb
";

struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
    engine: Arc<RecordingEngine>,
    messenger: Arc<BufferMessenger>,
    runtime: Arc<Runtime>,
}

impl Fixture {
    fn app(&self) -> Application {
        let config = AppConfig::new("My App").with_compose("docker-compose.yml");
        Application::new(config, self.root.join(APP_DESCRIPTOR_FILE), Arc::clone(&self.runtime))
    }
}

fn fixture(engine: RecordingEngine, extensions: Vec<Arc<dyn AppExtension>>) -> Fixture {
    fixture_with(engine, extensions, |b| b)
}

fn fixture_with(
    engine: RecordingEngine,
    extensions: Vec<Arc<dyn AppExtension>>,
    customize: impl FnOnce(crate::RuntimeBuilder) -> crate::RuntimeBuilder,
) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("app");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("docker-compose.yml"), COMPOSE).unwrap();

    let mut config = BerthConfig::default().with_user_conf_root(tmp.path().join("conf"));
    config.app_env.insert("A".into(), "1".into());

    let engine = Arc::new(engine);
    let messenger = Arc::new(BufferMessenger::new());
    let mut builder = Runtime::builder(config)
        .with_engine(engine.clone())
        .with_cache(Arc::new(MemoryCache::new()))
        .with_messenger(messenger.clone())
        .with_url_scanner(Arc::new(StaticUrlScanner::live(["http://localhost:32768"])))
        .with_plugin_roots(vec![]);
    for extension in extensions {
        builder = builder.with_builtin(extension);
    }

    Fixture {
        _tmp: tmp,
        root,
        engine,
        messenger,
        runtime: customize(builder).build().unwrap(),
    }
}

fn track(app: &Application, log: &Arc<Mutex<Vec<String>>>, hooks: &[&'static str]) {
    for &hook in hooks {
        let log = Arc::clone(log);
        app.events().on(hook, None, move |_app: &mut Application| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(hook.to_string());
                Ok(())
            })
        });
    }
}

fn read_all(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| std::fs::read_to_string(f).unwrap())
        .collect()
}

// ============================================================================
// init
// ============================================================================

#[tokio::test]
async fn test_identity() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let app = fx.app();

    assert_eq!(app.name(), "my-app");
    assert_eq!(app.project(), "myapp");
    assert_eq!(app.state(), AppState::Uninitialized);
    assert!(app.dir().ends_with("conf/compose/myapp"));
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();

    app.init().await.unwrap();
    let first_files = app.files.clone();
    let first_content = read_all(&first_files);

    app.init().await.unwrap();

    assert_eq!(app.files, first_files);
    assert_eq!(read_all(&app.files), first_content);
    assert_eq!(app.compose.len(), 2);
    assert_eq!(app.state(), AppState::Initialized);
}

#[tokio::test]
async fn test_globals_fragment_is_lowest_layer() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    app.init().await.unwrap();

    assert_eq!(app.compose[0].id, crate::compose::GLOBALS_FRAGMENT_ID);
    assert_eq!(app.services, vec!["db", "web"]);

    let merged = crate::compose::merge_all(app.compose.iter().map(|f| f.data.clone()));
    assert_eq!(merged["services"]["web"]["environment"]["A"], "2");
    assert_eq!(merged["services"]["db"]["environment"]["A"], "1");
    assert_eq!(merged["services"]["db"]["environment"]["BERTH_APP_NAME"], "my-app");
    assert_eq!(merged["services"]["web"]["labels"]["io.berth.app"], "my-app");

    let globals = std::fs::read_to_string(&app.files[0]).unwrap();
    assert!(globals.contains("version: '3.2'") || globals.contains("version: \"3.2\""));
    assert!(app.files[0].ends_with("globals.yml"));
}

#[tokio::test]
async fn test_missing_layers_are_skipped() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let config = AppConfig::new("bare").with_compose("nope.yml");
    let mut app = Application::new(config, fx.root.join(APP_DESCRIPTOR_FILE), fx.runtime.clone());

    app.init().await.unwrap();

    assert!(app.services.is_empty());
    assert_eq!(app.compose.len(), 1);
}

#[tokio::test]
async fn test_each_layer_keeps_its_own_fragment() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    std::fs::write(fx.root.join("a.yml"), "services:\n  web:\n    ports: ['80']\n").unwrap();
    std::fs::write(fx.root.join("b.yml"), "services:\n  web:\n    ports: ['443']\n").unwrap();
    let config = AppConfig::new("layered").with_compose("a.yml").with_compose("b.yml");
    let mut app = Application::new(config, fx.root.join(APP_DESCRIPTOR_FILE), fx.runtime.clone());

    app.init().await.unwrap();

    let ids: Vec<&str> = app.compose.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["globals", "compose-0", "compose-1"]);
    assert_eq!(app.compose[1].data["services"]["web"]["ports"], json!(["80"]));
    assert_eq!(app.compose[2].data["services"]["web"]["ports"], json!(["443"]));
    assert_eq!(app.files.len(), 3);
    assert!(app.files[1].ends_with("compose-0.yml"));
    assert!(app.files[2].ends_with("compose-1.yml"));
}

struct EnvExtension {
    name: &'static str,
    value: &'static str,
    image: Option<&'static str>,
}

#[async_trait]
impl AppExtension for EnvExtension {
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self, app: &mut Application, _rt: &Arc<Runtime>) -> Result<ExtensionData> {
        app.events()
            .on_owned(self.name, app_hooks::PRE_START, None, |_app: &mut Application| {
                Box::pin(async move { Ok(()) })
            });

        // 앞선 플러그인의 결과가 보여야 합니다
        let seen = app.env.get("X").cloned().unwrap_or_default();

        let mut data = ExtensionData::new()
            .with_env("X", self.value)
            .with_env(format!("SEEN_BY_{}", self.name.to_uppercase()), seen)
            .with_config(json!({"proxy": {"web": [format!("{}.site", self.name)]}}));
        if let Some(image) = self.image {
            data = data.with_fragment(ComposeFragment::new(
                "extra",
                json!({"services": {"web": {"image": image}, "cache": {"image": "redis"}}}),
            ));
        }
        Ok(data)
    }
}

#[tokio::test]
async fn test_plugins_merge_sequentially() {
    let fx = fixture(
        RecordingEngine::new(),
        vec![
            Arc::new(EnvExtension { name: "one", value: "1", image: Some("nginx:1") }),
            Arc::new(EnvExtension { name: "two", value: "2", image: Some("nginx:2") }),
        ],
    );
    let mut app = fx.app();
    app.init().await.unwrap();
    app.init().await.unwrap();

    assert_eq!(app.env["X"], "2");
    assert_eq!(app.env["SEEN_BY_TWO"], "1");
    assert_eq!(app.env["SEEN_BY_ONE"], "");
    assert_eq!(app.config.proxy["web"], vec!["two.site"]);

    let extra: Vec<_> = app.compose.iter().filter(|f| f.id == "extra").collect();
    assert_eq!(extra.len(), 1);
    assert_eq!(extra[0].data["services"]["web"]["image"], "nginx:2");
    assert_eq!(app.services, vec!["db", "web", "cache"]);

    // 재초기화해도 확장 훅은 중복되지 않습니다
    assert_eq!(app.events().handler_count(app_hooks::PRE_START), 2);
}

#[tokio::test]
async fn test_data_file_plugin_and_unknown_extension() {
    let fx = fixture(RecordingEngine::new(), vec![]);

    let plugin_dir = fx.root.join(PLUGINS_DIR).join("extras");
    std::fs::create_dir_all(&plugin_dir).unwrap();
    std::fs::write(plugin_dir.join(PLUGIN_MANIFEST), r#"{"app": "app.yml"}"#).unwrap();
    std::fs::write(
        plugin_dir.join("app.yml"),
        "env:\n  FROM_FILE: 'yes'\nservices:\n  - hijack\n",
    )
    .unwrap();

    let ghost_dir = fx.root.join(PLUGINS_DIR).join("ghost");
    std::fs::create_dir_all(&ghost_dir).unwrap();
    std::fs::write(ghost_dir.join(PLUGIN_MANIFEST), r#"{"app": "not-registered"}"#).unwrap();

    let mut app = fx.app();
    app.init().await.unwrap();

    assert_eq!(app.env["FROM_FILE"], "yes");
    assert_eq!(app.services, vec!["db", "web"]);
}

#[tokio::test]
async fn test_data_file_plugin_with_scalar_env() {
    let fx = fixture(RecordingEngine::new(), vec![]);

    let plugin_dir = fx.root.join(PLUGINS_DIR).join("php");
    std::fs::create_dir_all(&plugin_dir).unwrap();
    std::fs::write(plugin_dir.join(PLUGIN_MANIFEST), r#"{"app": "app.yml"}"#).unwrap();
    std::fs::write(plugin_dir.join("app.yml"), "env:\n  PHP_PORT: 9000\n").unwrap();

    let broken_dir = fx.root.join(PLUGINS_DIR).join("broken");
    std::fs::create_dir_all(&broken_dir).unwrap();
    std::fs::write(broken_dir.join(PLUGIN_MANIFEST), r#"{"app": "app.yml"}"#).unwrap();
    std::fs::write(broken_dir.join("app.yml"), "env:\n  NESTED:\n    a: 1\n").unwrap();

    let mut app = fx.app();
    app.init().await.unwrap();

    assert_eq!(app.env["PHP_PORT"], "9000");
    assert!(!app.env.contains_key("NESTED"));
}

#[tokio::test]
async fn test_pre_instantiate_app_runs_on_process_bus() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    fx.runtime.events().on(
        process_hooks::PRE_INSTANTIATE_APP,
        1,
        |app: &mut Application| {
            Box::pin(async move {
                app.env.insert("GLOBAL".into(), "on".into());
                Ok(())
            })
        },
    );

    let mut first = fx.app();
    first.init().await.unwrap();
    let mut second = fx.app();
    second.init().await.unwrap();

    for app in [&first, &second] {
        assert_eq!(
            app.compose[0].data["services"]["web"]["environment"]["GLOBAL"],
            "on"
        );
    }
    assert_eq!(first.events().handler_count(process_hooks::PRE_INSTANTIATE_APP), 0);
}

// ============================================================================
// Lifecycle
// ============================================================================

fn web_container(service: &str, port: u16) -> (Container, ContainerMetadata) {
    let container = Container {
        id: format!("{}-id", service),
        name: format!("myapp_{}_1", service),
        project: "myapp".into(),
        service: service.into(),
    };
    let mut ports = Map::new();
    ports.insert(
        "80/tcp".to_string(),
        vec![PortBinding { host_ip: "0.0.0.0".into(), host_port: port }],
    );
    let metadata = ContainerMetadata {
        id: container.id.clone(),
        name: container.name.clone(),
        service: service.into(),
        running: true,
        ports,
    };
    (container, metadata)
}

#[tokio::test]
async fn test_start_runs_steps_in_order() {
    let (web, web_meta) = web_container("web", 32768);
    let (db, db_meta) = web_container("db", 32769);
    let (ghost, ghost_meta) = web_container("ghost", 32770);
    let engine = RecordingEngine::new()
        .with_container(web, web_meta, true)
        .with_container(db, db_meta, false)
        .with_container(ghost, ghost_meta, true);
    let fx = fixture(engine, vec![]);

    let mut app = fx.app();
    let log = Arc::new(Mutex::new(Vec::new()));
    track(
        &app,
        &log,
        &[
            app_hooks::PRE_START,
            app_hooks::POST_START,
            app_hooks::PRE_INFO,
            app_hooks::POST_INFO,
        ],
    );

    app.start().await.unwrap();

    assert_eq!(
        *log.lock(),
        vec!["pre-start", "post-start", "pre-info", "post-info"]
    );
    assert_eq!(fx.engine.ops(), vec!["start:myapp"]);
    assert_eq!(fx.engine.calls()[0].files, app.files);

    let web_info = app.info.iter().find(|i| i.service == "web").unwrap();
    assert_eq!(web_info.urls, vec!["http://localhost:32768"]);
    let db_info = app.info.iter().find(|i| i.service == "db").unwrap();
    assert!(db_info.urls.is_empty());
    assert!(app.info.iter().all(|i| i.service != "ghost"));

    assert_eq!(app.urls, vec!["http://localhost:32768"]);
    assert_eq!(app.state(), AppState::Started);
    assert_eq!(fx.messenger.lines()[0], "Starting app my-app!");
}

#[tokio::test]
async fn test_failing_hook_aborts_start() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    let log = Arc::new(Mutex::new(Vec::new()));
    app.events().on(app_hooks::PRE_START, 1, |_app: &mut Application| {
        Box::pin(async move { Err(berth_foundation::Error::hook("pre-start", "nope")) })
    });
    track(&app, &log, &[app_hooks::PRE_START, app_hooks::POST_START]);

    let err = app.start().await.unwrap_err();

    assert!(matches!(err, berth_foundation::Error::Hook { .. }));
    assert!(fx.engine.ops().is_empty());
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_engine_failure_propagates() {
    let fx = fixture(RecordingEngine::new().fail_on("stop"), vec![]);
    let mut app = fx.app();
    let log = Arc::new(Mutex::new(Vec::new()));
    track(&app, &log, &[app_hooks::PRE_STOP, app_hooks::POST_STOP]);

    let err = app.stop().await.unwrap_err();

    assert!(matches!(err, berth_foundation::Error::Engine { .. }));
    assert_eq!(*log.lock(), vec!["pre-stop"]);
}

#[tokio::test]
async fn test_destroy_always_purges() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    let log = Arc::new(Mutex::new(Vec::new()));
    track(
        &app,
        &log,
        &[
            app_hooks::PRE_DESTROY,
            app_hooks::PRE_STOP,
            app_hooks::POST_STOP,
            app_hooks::PRE_UNINSTALL,
            app_hooks::POST_UNINSTALL,
            app_hooks::POST_DESTROY,
        ],
    );

    app.destroy().await.unwrap();

    assert_eq!(fx.engine.ops(), vec!["stop:myapp", "destroy:myapp"]);
    assert!(fx.engine.calls()[1].purge);
    assert_eq!(
        *log.lock(),
        vec![
            "pre-destroy",
            "pre-stop",
            "post-stop",
            "pre-uninstall",
            "post-uninstall",
            "post-destroy"
        ]
    );
    assert_eq!(app.state(), AppState::Destroyed);
}

#[tokio::test]
async fn test_rebuild_sequence() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    let log = Arc::new(Mutex::new(Vec::new()));
    track(&app, &log, &[app_hooks::PRE_REBUILD, app_hooks::POST_REBUILD]);

    app.rebuild().await.unwrap();

    assert_eq!(
        fx.engine.ops(),
        vec!["stop:myapp", "destroy:myapp", "build:myapp", "start:myapp"]
    );
    assert!(!fx.engine.calls()[1].purge);
    assert_eq!(*log.lock(), vec!["pre-rebuild", "post-rebuild"]);
    assert_eq!(app.state(), AppState::Started);
}

#[tokio::test]
async fn test_restart_is_stop_then_start() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();

    app.restart().await.unwrap();

    assert_eq!(fx.engine.ops(), vec!["stop:myapp", "start:myapp"]);
}

struct BrokenMessenger;

impl Messenger for BrokenMessenger {
    fn message(&self, _text: &str) -> Result<()> {
        Err(berth_foundation::Error::Internal("terminal gone".into()))
    }
}

struct BrokenMetrics;

#[async_trait]
impl Metrics for BrokenMetrics {
    async fn report(&self, _event: &str, _data: Value) -> Result<()> {
        Err(berth_foundation::Error::Http("offline".into()))
    }
}

#[tokio::test]
async fn test_side_channel_failures_do_not_block() {
    let fx = fixture_with(RecordingEngine::new(), vec![], |b| {
        b.with_messenger(Arc::new(BrokenMessenger))
            .with_metrics(Arc::new(BrokenMetrics))
    });
    let mut app = fx.app();

    app.start().await.unwrap();
    app.stop().await.unwrap();

    assert_eq!(fx.engine.ops(), vec!["start:myapp", "stop:myapp"]);
}

#[tokio::test]
async fn test_inspect_keeps_plugin_info() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    app.events().on(app_hooks::PRE_INFO, None, |app: &mut Application| {
        Box::pin(async move {
            let mut db = ServiceInfo::new("db");
            db.extra.insert("creds".into(), json!({"user": "root"}));
            if app.info.iter().all(|i| i.service != "db") {
                app.info.push(db);
            }
            Ok(())
        })
    });

    let info = app.inspect().await.unwrap();

    assert_eq!(info.len(), 2);
    assert_eq!(info[0].service, "db");
    assert_eq!(info[0].extra["creds"]["user"], "root");
    assert_eq!(info[1], ServiceInfo::new("web"));
}

#[tokio::test]
async fn test_append_fragment_only_writes_new_file() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    app.init().await.unwrap();
    let globals_before = std::fs::metadata(&app.files[0]).unwrap().modified().unwrap();

    let file = app
        .append_fragment(ComposeFragment::new(
            "proxy",
            json!({"services": {"web": {"labels": {"x": "y"}}}}),
        ))
        .unwrap();

    assert_eq!(app.files.last(), Some(&file));
    assert_eq!(app.files.len(), 3);
    assert_eq!(
        std::fs::metadata(&app.files[0]).unwrap().modified().unwrap(),
        globals_before
    );
    assert_eq!(app.metrics_parse()["services"], json!(["db", "web"]));
}

#[tokio::test]
async fn test_appended_fragment_survives_reinit() {
    let fx = fixture(RecordingEngine::new(), vec![]);
    let mut app = fx.app();
    app.init().await.unwrap();
    app.append_fragment(ComposeFragment::new(
        "proxy",
        json!({"services": {"web": {"labels": {"x": "y"}}}}),
    ))
    .unwrap();

    app.init().await.unwrap();

    let ids: Vec<&str> = app.compose.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["globals", "compose-0", "proxy"]);
    assert_eq!(app.files.len(), 3);
    assert!(app.files[2].ends_with("proxy.yml"));
}
