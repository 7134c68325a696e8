//! # Plugin System
//!
//! 애플리케이션 확장 플러그인 시스템
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                          │
//! │  ┌──────────────────┐   ┌────────────────────────────────┐  │
//! │  │ builtins         │   │ <root>/plugins/*/plugin.json   │  │
//! │  │ (native, proxy)  │   │ (native 이름 or app.yml)        │  │
//! │  └────────┬─────────┘   └───────────────┬────────────────┘  │
//! │           └──────── find (이름 중복 제거) ┘                  │
//! │                          │                                  │
//! │              load(descriptor, &mut app)                     │
//! │                          │                                  │
//! │        ExtensionData { config, composeFragments,            │
//! │                        env, labels }                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct MyExtension;
//!
//! #[async_trait]
//! impl AppExtension for MyExtension {
//!     fn name(&self) -> &str { "my-extension" }
//!
//!     async fn load(&self, app: &mut Application, _rt: &Arc<Runtime>) -> Result<ExtensionData> {
//!         Ok(ExtensionData::new().with_env("MY_FLAG", "1"))
//!     }
//! }
//!
//! registry.register_builtin(Arc::new(MyExtension));
//! ```

mod descriptor;
mod discovery;
mod extension;
mod registry;

pub use descriptor::{AppUnit, PluginDescriptor, PLUGIN_MANIFEST};
pub use discovery::{discover_root, PLUGINS_DIR};
pub use extension::{AppExtension, ExtensionData, ALLOWED_KEYS};
pub use registry::PluginRegistry;
