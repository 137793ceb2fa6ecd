pub mod admin;
pub mod vote;

pub use admin::add_candidate;
pub use vote::{VoteFlow, VotePhase, VoteRecord};
