use anchor_lang::prelude::*;
pub mod constants;
pub mod errors;
pub mod instructions;
pub mod state;

pub use instructions::*;
pub use errors::*;
pub use state::*;

declare_id!("5wQYNaQ8DgqpEqtpCHuYJBjoeGHsugiVhUWbDV5d3nBB");

#[program]
pub mod ballot {
    use super::*;

    // Create the ballot for the signing admin
    // Seeds the candidate list; deadline_seconds == 0 means voting never closes
    pub fn initialize(
        ctx: Context<Initialize>,
        candidate_names: Vec<String>,
        deadline_seconds: u64,
    ) -> Result<()> {
        ctx.accounts.initialize(candidate_names, deadline_seconds, &ctx.bumps)
    }

    // Cast one vote for the candidate at a zero-based index
    // The voter record PDA makes a second vote from the same wallet fail
    pub fn vote(ctx: Context<Vote>, candidate_index: u32) -> Result<()> {
        ctx.accounts.vote(candidate_index, &ctx.bumps)
    }

    // Append a candidate with zero votes
    // Only the ballot admin can add candidates
    pub fn add_candidate(ctx: Context<AddCandidate>, name: String) -> Result<()> {
        ctx.accounts.add_candidate(name)
    }
}
