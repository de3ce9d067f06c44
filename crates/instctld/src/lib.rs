// # instctld
//
// HTTP front end for the instance control plane: environment settings, the
// axum gateway and the provider wiring used by the `instctld` binary.
//
// The daemon is a thin integration layer. Validation, workflows and DNS sync
// live in `instctl-core`; provider calls live in the provider crates.

pub mod gateway;
pub mod settings;
pub mod shutdown;

pub use gateway::{AppState, create_router_with_state};
pub use settings::Settings;
