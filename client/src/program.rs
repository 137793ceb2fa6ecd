//! Wire format of the on-chain `ballot` program: PDA seeds, Anchor
//! discriminators, instruction data, account and event decoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::BorshDeserialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_system_interface::program::ID as SYSTEM_PROGRAM_ID;

use crate::{
    error::CallError,
    gateway::{RawCandidate, VotedEvent},
};

// PDA Seeds
pub const BALLOT_SEED: &[u8] = b"ballot";
pub const VOTER_RECORD_SEED: &[u8] = b"voter";

pub const ANCHOR_DISCRIMINATOR: usize = 8;

const EVENT_LOG_PREFIX: &str = "Program data: ";

/// First 8 bytes of sha256("<namespace>:<name>").
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..ANCHOR_DISCRIMINATOR]);
    discriminator
}

pub fn ballot_address(program_id: &Pubkey, admin: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[BALLOT_SEED, admin.as_ref()], program_id).0
}

pub fn voter_record_address(program_id: &Pubkey, ballot: &Pubkey, voter: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[VOTER_RECORD_SEED, ballot.as_ref(), voter.as_ref()],
        program_id,
    )
    .0
}

// Borsh string: u32 little-endian length + bytes
fn push_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

pub fn initialize_ix(
    program_id: &Pubkey,
    admin: &Pubkey,
    candidate_names: &[String],
    deadline_seconds: u64,
) -> Instruction {
    let ballot = ballot_address(program_id, admin);

    let mut data = discriminator("global", "initialize").to_vec();
    data.extend_from_slice(&(candidate_names.len() as u32).to_le_bytes());
    for name in candidate_names {
        push_string(&mut data, name);
    }
    data.extend_from_slice(&deadline_seconds.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(ballot, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    }
}

pub fn vote_ix(program_id: &Pubkey, voter: &Pubkey, ballot: &Pubkey, candidate_index: u32) -> Instruction {
    let voter_record = voter_record_address(program_id, ballot, voter);

    let mut data = discriminator("global", "vote").to_vec();
    data.extend_from_slice(&candidate_index.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*voter, true),
            AccountMeta::new(*ballot, false),
            AccountMeta::new(voter_record, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    }
}

pub fn add_candidate_ix(program_id: &Pubkey, admin: &Pubkey, ballot: &Pubkey, name: &str) -> Instruction {
    let mut data = discriminator("global", "add_candidate").to_vec();
    push_string(&mut data, name);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new(*ballot, false),
        ],
        data,
    }
}

#[derive(BorshDeserialize, Debug, Clone, PartialEq, Eq)]
struct CandidateAccount {
    name: String,
    vote_count: u64,
}

/// Decoded `Ballot` account.
#[derive(BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BallotAccount {
    admin: [u8; 32],
    pub has_deadline: bool,
    pub voting_deadline: i64,
    candidates: Vec<CandidateAccount>,
    pub bump: u8,
}

impl BallotAccount {
    pub fn admin(&self) -> Pubkey {
        Pubkey::new_from_array(self.admin)
    }

    pub fn candidates(&self) -> Vec<RawCandidate> {
        self.candidates
            .iter()
            .map(|c| RawCandidate {
                name: c.name.clone(),
                vote_count: c.vote_count,
            })
            .collect()
    }
}

/// Decode ballot account data. The account is allocated at its maximum size,
/// so trailing bytes after the encoded value are expected.
pub fn decode_ballot(address: &Pubkey, data: &[u8]) -> Result<BallotAccount, CallError> {
    if data.len() < ANCHOR_DISCRIMINATOR || data[..ANCHOR_DISCRIMINATOR] != discriminator("account", "Ballot") {
        return Err(CallError::UnexpectedAccount(*address));
    }
    Ok(BallotAccount::deserialize(&mut &data[ANCHOR_DISCRIMINATOR..])?)
}

#[derive(BorshDeserialize)]
struct VotedPayload {
    voter: [u8; 32],
    candidate_index: u32,
    vote_count: u64,
}

/// Extract `Voted` events from transaction logs. Other events and malformed
/// entries are skipped.
pub fn parse_voted_events(logs: &[String]) -> Vec<VotedEvent> {
    let tag = discriminator("event", "Voted");
    logs.iter()
        .filter_map(|line| line.strip_prefix(EVENT_LOG_PREFIX))
        .filter_map(|payload| STANDARD.decode(payload.trim()).ok())
        .filter(|bytes| bytes.len() > ANCHOR_DISCRIMINATOR && bytes[..ANCHOR_DISCRIMINATOR] == tag)
        .filter_map(|bytes| VotedPayload::deserialize(&mut &bytes[ANCHOR_DISCRIMINATOR..]).ok())
        .map(|payload| VotedEvent {
            voter: Pubkey::new_from_array(payload.voter),
            candidate_index: payload.candidate_index,
            vote_count: payload.vote_count,
        })
        .collect()
}
