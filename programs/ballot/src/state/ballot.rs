use anchor_lang::prelude::*;
use crate::{constants::*, errors::*};

// Single candidate entry, index-ordered inside the ballot
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct Candidate {
    #[max_len(MAX_NAME_LEN)]
    pub name: String,
    pub vote_count: u64,
}

// Ballot account
// One per admin, holds the whole candidate list and the optional deadline
#[account]
#[derive(InitSpace)]
pub struct Ballot {
    // Only key allowed to add candidates
    pub admin: Pubkey,

    // When false, voting_deadline is ignored and voting never closes
    pub has_deadline: bool,

    // Unix timestamp after which votes are rejected
    pub voting_deadline: i64,

    #[max_len(MAX_CANDIDATES)]
    pub candidates: Vec<Candidate>,

    pub bump: u8,
}

impl Ballot {
    // Voting is open when no deadline is set or it is still in the future
    pub fn is_open(&self, now: i64) -> bool {
        !self.has_deadline || now < self.voting_deadline
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }

    pub fn push_candidate(&mut self, name: String) -> Result<()> {
        validate_name(&name)?;
        require!(
            self.candidates.len() < MAX_CANDIDATES,
            BallotError::TooManyCandidates
        );
        self.candidates.push(Candidate { name, vote_count: 0 });
        Ok(())
    }

    pub fn record_vote(&mut self, candidate_index: u32) -> Result<u64> {
        let candidate = self
            .candidates
            .get_mut(candidate_index as usize)
            .ok_or(BallotError::InvalidCandidate)?;
        candidate.vote_count = candidate
            .vote_count
            .checked_add(1)
            .ok_or(BallotError::Overflow)?;
        Ok(candidate.vote_count)
    }
}

// (has_deadline, voting_deadline) for a ballot created at `now`
// deadline_seconds == 0 means no deadline
pub fn deadline_from(now: i64, deadline_seconds: u64) -> Result<(bool, i64)> {
    if deadline_seconds == 0 {
        return Ok((false, 0));
    }
    let seconds = i64::try_from(deadline_seconds).map_err(|_| BallotError::Overflow)?;
    let deadline = now.checked_add(seconds).ok_or(BallotError::Overflow)?;
    Ok((true, deadline))
}

pub fn validate_name(name: &str) -> Result<()> {
    require!(!name.trim().is_empty(), BallotError::EmptyName);
    require!(name.len() <= MAX_NAME_LEN, BallotError::NameTooLong);
    Ok(())
}
