use anchor_lang::prelude::*;

#[error_code]
pub enum BallotError {
    // Voting errors
    #[msg("Voting deadline has passed")]
    VotingClosed,

    #[msg("Candidate index is out of range")]
    InvalidCandidate,

    // Authorization errors
    #[msg("Only the ballot admin can perform this action")]
    Unauthorized,

    // Candidate list errors
    #[msg("Candidate name must not be empty")]
    EmptyName,

    #[msg("Candidate name must be at most 32 bytes")]
    NameTooLong,

    #[msg("Maximum number of candidates reached")]
    TooManyCandidates,

    // Arithmetic errors
    #[msg("Arithmetic overflow")]
    Overflow,
}
