//! Chat presentation layer
//!
//! - `view`: the conversation pane controller
//! - `sidebar`: the session list observer
//! - `identity`: the display-name entry

pub mod identity;
pub mod sidebar;
pub mod view;

pub use identity::DisplayName;
pub use sidebar::{render_buckets, short_id, Sidebar};
pub use view::{ChatView, SubmitOutcome, ViewStatus};
