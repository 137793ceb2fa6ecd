use anchor_lang::prelude::*;
use crate::{state::*, errors::*, constants::*};

#[event]
pub struct Voted {
    pub voter: Pubkey,
    pub candidate_index: u32,
    pub vote_count: u64,
}

// Vote Instruction
//
// Increments one candidate's count and creates the voter record PDA.
// The record is created with `init`, so a second vote from the same wallet
// fails inside account validation before any count changes.

#[derive(Accounts)]
pub struct Vote<'info> {
    #[account(mut)]
    pub voter: Signer<'info>,

    #[account(
        mut,
        seeds = [BALLOT, ballot.admin.as_ref()],
        bump = ballot.bump,
    )]
    pub ballot: Account<'info, Ballot>,

    // Voter record PDA
    // Seeds: ["voter", ballot, voter]
    #[account(
        init,
        payer = voter,
        space = ANCHOR_DISCRIMINATOR + VoterRecord::INIT_SPACE,
        seeds = [VOTER_RECORD, ballot.key().as_ref(), voter.key().as_ref()],
        bump,
    )]
    pub voter_record: Account<'info, VoterRecord>,

    pub system_program: Program<'info, System>,
}

impl<'info> Vote<'info> {
    pub fn vote(&mut self, candidate_index: u32, bumps: &VoteBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        require!(self.ballot.is_open(now), BallotError::VotingClosed);

        let vote_count = self.ballot.record_vote(candidate_index)?;

        self.voter_record.set_inner(VoterRecord {
            ballot: self.ballot.key(),
            voter: self.voter.key(),
            voted_at: now,
            bump: bumps.voter_record,
        });

        msg!(
            "Vote for candidate #{}, {} votes total",
            candidate_index,
            self.ballot.total_votes()
        );

        emit!(Voted {
            voter: self.voter.key(),
            candidate_index,
            vote_count,
        });
        Ok(())
    }
}
