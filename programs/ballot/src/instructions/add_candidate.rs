use anchor_lang::prelude::*;
use crate::{state::*, errors::*, constants::*};

// Add Candidate Instruction
//
// Admin-only append to the candidate list. The ballot PDA is derived from the
// stored admin, so a foreign signer reaches the has_one check and fails with
// Unauthorized instead of a seeds mismatch.

#[derive(Accounts)]
pub struct AddCandidate<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [BALLOT, ballot.admin.as_ref()],
        bump = ballot.bump,
        has_one = admin @ BallotError::Unauthorized,
    )]
    pub ballot: Account<'info, Ballot>,
}

impl<'info> AddCandidate<'info> {
    pub fn add_candidate(&mut self, name: String) -> Result<()> {
        self.ballot.push_candidate(name)?;
        msg!("Candidate #{} added", self.ballot.candidates.len());
        Ok(())
    }
}
