use anchor_lang::prelude::*;

// Records who voted on a ballot, not for whom
#[account]
#[derive(InitSpace)]
pub struct VoterRecord {
    pub ballot: Pubkey,
    pub voter: Pubkey,
    pub voted_at: i64,
    pub bump: u8,
}
