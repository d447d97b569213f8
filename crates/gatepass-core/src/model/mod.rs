// ── Domain model ──
//
// Client-side view of visitor passes and the user who holds them.
// Wire types from `gatepass-api` are converted here; nothing above this
// layer sees raw timestamp strings.

pub mod pass;
pub mod pass_id;
pub mod user;
pub mod verification;

pub use pass::{DEFAULT_VISITOR_NAME, PassStatus, VisitorPass, normalize_visitor_name};
pub use pass_id::PassId;
pub use user::{Role, UserContext};
pub use verification::Verification;
