//! berth-engine: Docker adapter for the Berth engine port
//!
//! - 조회 (`list` / `is_running` / `scan`): Docker API (`bollard`)
//! - 변경 (`start` / `stop` / `destroy` / `build`): `docker compose` 프로세스

mod compose;
mod docker;

pub use compose::{ComposeCommand, ComposeOutput};
pub use docker::{DockerEngine, COMPOSE_PROJECT_LABEL, COMPOSE_SERVICE_LABEL};
