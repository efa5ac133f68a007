// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;

// ── Backends ────────────────────────────────────────────────────────────────
pub mod compatible;
pub mod factory;
pub mod scripted;

pub use http_client::{build_backend_client, build_backend_client_with_timeout};
pub use scrub::sanitize_api_error;
pub use traits::{DisabledBackend, GenerationRequest, GenerationSettings, GenerativeBackend};

pub use compatible::CompatibleBackend;
pub use factory::{compatible_backend_url, create_backend};
pub use scripted::{ScriptedBackend, ScriptedReply};
