use anchor_lang::prelude::*;
use crate::{state::*, errors::*, constants::*};

// Initialize Instruction
//
// Creates the ballot PDA for the signing admin with the initial candidates.
// A non-zero deadline_seconds closes voting that many seconds after creation.

#[derive(Accounts)]
pub struct Initialize<'info> {
    // Admin - becomes the only key allowed to add candidates
    #[account(mut)]
    pub admin: Signer<'info>,

    // Ballot PDA
    // Seeds: ["ballot", admin]
    #[account(
        init,
        payer = admin,
        space = ANCHOR_DISCRIMINATOR + Ballot::INIT_SPACE,
        seeds = [BALLOT, admin.key().as_ref()],
        bump,
    )]
    pub ballot: Account<'info, Ballot>,

    pub system_program: Program<'info, System>,
}

impl<'info> Initialize<'info> {
    pub fn initialize(
        &mut self,
        candidate_names: Vec<String>,
        deadline_seconds: u64,
        bumps: &InitializeBumps,
    ) -> Result<()> {
        require!(
            candidate_names.len() <= MAX_CANDIDATES,
            BallotError::TooManyCandidates
        );

        let now = Clock::get()?.unix_timestamp;
        let (has_deadline, voting_deadline) = deadline_from(now, deadline_seconds)?;

        self.ballot.set_inner(Ballot {
            admin: self.admin.key(),
            has_deadline,
            voting_deadline,
            candidates: Vec::with_capacity(candidate_names.len()),
            bump: bumps.ballot,
        });

        for name in candidate_names {
            self.ballot.push_candidate(name)?;
        }

        msg!(
            "Ballot created with {} candidates, deadline {}",
            self.ballot.candidates.len(),
            voting_deadline
        );
        Ok(())
    }
}
