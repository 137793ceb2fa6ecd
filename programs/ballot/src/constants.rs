pub const ANCHOR_DISCRIMINATOR: usize = 8;

// Seeds for PDA derivation: ["ballot", admin]
pub const BALLOT: &[u8] = b"ballot";

// Seeds for PDA derivation: ["voter", ballot, voter]
pub const VOTER_RECORD: &[u8] = b"voter";

// Candidate list is allocated up front, no realloc on add_candidate
pub const MAX_CANDIDATES: usize = 16;

// Candidate names are limited in bytes, not characters
pub const MAX_NAME_LEN: usize = 32;
