//! Core engine — the simulated bidding feed and the session that drives it.

pub mod clock;
pub mod feed;
pub mod roster;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use feed::{ApprovalOutcome, BiddingFeed};
pub use roster::Roster;
pub use session::EngineSession;
