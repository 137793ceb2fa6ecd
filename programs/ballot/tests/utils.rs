// Test utilities for the ballot program

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use litesvm::LiteSVM;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use solana_system_interface::program::ID as system_program;

// Program ID matching declare_id!
pub const BALLOT_PROGRAM_ID: Pubkey = Pubkey::new_from_array(ballot::ID.to_bytes());

// PDA Seeds
pub const BALLOT: &[u8] = b"ballot";
pub const VOTER_RECORD: &[u8] = b"voter";

// Built by `anchor build` at the workspace root
pub const PROGRAM_SO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../target/deploy/ballot.so");

// ======================== HELPERS ========================

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// Build Anchor instruction discriminator (first 8 bytes of sha256("global:method_name"))
pub fn anchor_discriminator(method: &str) -> [u8; 8] {
    discriminator("global", method)
}

// Setup LiteSVM with the ballot program and a wall-clock timestamp
pub fn setup_svm() -> LiteSVM {
    let mut svm = LiteSVM::new();
    let program_bytes = std::fs::read(PROGRAM_SO).expect("ballot.so missing, run `anchor build`");
    svm.add_program(BALLOT_PROGRAM_ID, &program_bytes)
        .expect("Failed to add ballot program");

    let mut clock: solana_sdk::clock::Clock = svm.get_sysvar();
    clock.unix_timestamp = 1_700_000_000;
    svm.set_sysvar(&clock);
    svm
}

// Create and fund account
pub fn create_funded_account(svm: &mut LiteSVM, lamports: u64) -> Keypair {
    let keypair = Keypair::new();
    svm.airdrop(&keypair.pubkey(), lamports)
        .expect("Airdrop should succeed");
    keypair
}

// Derive ballot PDA
pub fn derive_ballot_pda(admin: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BALLOT, admin.as_ref()], &BALLOT_PROGRAM_ID)
}

// Derive voter record PDA
pub fn derive_voter_record_pda(ballot: &Pubkey, voter: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[VOTER_RECORD, ballot.as_ref(), voter.as_ref()],
        &BALLOT_PROGRAM_ID,
    )
}

// Build initialize instruction
pub fn build_initialize_ix(admin: &Pubkey, names: &[&str], deadline_seconds: u64) -> Instruction {
    let (ballot, _) = derive_ballot_pda(admin);

    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let mut data = anchor_discriminator("initialize").to_vec();
    names.serialize(&mut data).expect("names serialize");
    data.extend_from_slice(&deadline_seconds.to_le_bytes());

    Instruction {
        program_id: BALLOT_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(ballot, false),
            AccountMeta::new_readonly(system_program, false),
        ],
        data,
    }
}

// Build vote instruction
pub fn build_vote_ix(voter: &Pubkey, ballot: &Pubkey, candidate_index: u32) -> Instruction {
    let (voter_record, _) = derive_voter_record_pda(ballot, voter);

    let mut data = anchor_discriminator("vote").to_vec();
    data.extend_from_slice(&candidate_index.to_le_bytes());

    Instruction {
        program_id: BALLOT_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*voter, true),
            AccountMeta::new(*ballot, false),
            AccountMeta::new(voter_record, false),
            AccountMeta::new_readonly(system_program, false),
        ],
        data,
    }
}

// Build add_candidate instruction
pub fn build_add_candidate_ix(signer: &Pubkey, ballot: &Pubkey, name: &str) -> Instruction {
    let mut data = anchor_discriminator("add_candidate").to_vec();
    // Borsh serialization: len (4 bytes) + string bytes
    data.extend_from_slice(&(name.len() as u32).to_le_bytes());
    data.extend_from_slice(name.as_bytes());

    Instruction {
        program_id: BALLOT_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*signer, true),
            AccountMeta::new(*ballot, false),
        ],
        data,
    }
}

// Mirror of the on-chain layout, decoded after the 8-byte discriminator
#[derive(BorshDeserialize, Debug)]
pub struct BallotView {
    pub admin: [u8; 32],
    pub has_deadline: bool,
    pub voting_deadline: i64,
    pub candidates: Vec<CandidateView>,
    pub bump: u8,
}

#[derive(BorshDeserialize, Debug)]
pub struct CandidateView {
    pub name: String,
    pub vote_count: u64,
}

#[derive(BorshDeserialize, Debug)]
pub struct VotedView {
    pub voter: [u8; 32],
    pub candidate_index: u32,
    pub vote_count: u64,
}

pub fn read_ballot(svm: &LiteSVM, ballot: &Pubkey) -> BallotView {
    let account = svm.get_account(ballot).expect("Ballot account should exist");
    assert_eq!(account.owner, BALLOT_PROGRAM_ID);
    assert_eq!(&account.data[..8], &discriminator("account", "Ballot"));
    BallotView::deserialize(&mut &account.data[8..]).expect("Ballot should decode")
}

// Collect Voted events from "Program data:" log lines
pub fn voted_events(logs: &[String]) -> Vec<VotedView> {
    let tag = discriminator("event", "Voted");
    logs.iter()
        .filter_map(|line| line.strip_prefix("Program data: "))
        .filter_map(|payload| STANDARD.decode(payload).ok())
        .filter(|bytes| bytes.len() > 8 && bytes[..8] == tag)
        .filter_map(|bytes| VotedView::deserialize(&mut &bytes[8..]).ok())
        .collect()
}

// Advance the SVM clock by the specified number of seconds
pub fn advance_time(svm: &mut LiteSVM, seconds: u64) {
    let mut clock: solana_sdk::clock::Clock = svm.get_sysvar();
    clock.unix_timestamp += seconds as i64;
    svm.set_sysvar(&clock);

    let current_slot = clock.slot;
    svm.warp_to_slot(current_slot + (seconds * 2) + 5);
}
