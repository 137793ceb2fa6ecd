// Instructions module
// - initialize (admin creates the ballot)
// - vote (any wallet, once)
// - add_candidate (admin only)

pub mod add_candidate;
pub mod initialize;
pub mod vote;

pub use add_candidate::*;
pub use initialize::*;
pub use vote::*;
