//! Compose model
//!
//! 순서가 있는 fragment 목록과 결정적인 deep merge, 파일 flatten.
//!
//! ```text
//! [globals] ─▶ [compose-0 ..] ─▶ [plugin ...] ─▶ [proxy]
//!  (lowest)                                  (highest)
//! ```

mod fragment;
mod merge;
mod store;

pub use fragment::{
    collect_services, declared_fragment_id, dump_fragments, globals_fragment, upsert_fragment,
    ComposeFragment, COMPOSE_VERSION, DECLARED_FRAGMENT_PREFIX, GLOBALS_FRAGMENT_ID,
};
pub use merge::{deep_merge, merge_all};
pub use store::{validate_files, DescriptorStore, YamlStore};
