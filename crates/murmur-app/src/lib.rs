//! Application shell: owns the store from startup to shutdown and hands out
//! sessions and conversation pollers to the UI layer.

pub mod app;
pub mod config;
pub mod session;
pub mod sync;
pub mod telemetry;

pub use app::App;
pub use config::AppConfig;
pub use session::Session;
pub use sync::{ConversationPoller, PollerState, SyncError};
