mod actions;
pub mod events;
mod session;
pub mod utils;

pub use actions::{Action, ActionOutcome, GuardService};
pub use events::SessionEvent;
pub use session::{SessionHandle, SessionLease, SessionState};
