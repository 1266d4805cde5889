// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod opponent;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod target;
pub mod util;

pub use error::{Error, InvalidTargetError};
pub use session::{Mode, SessionResult, SessionState, Transition, TypingSession};
pub use target::{Target, TargetProvider};
