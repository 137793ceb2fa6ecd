//! Election snapshot builder.
//!
//! Every refresh rebuilds the whole view from four independent reads; nothing
//! is carried over from the previous snapshot.

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::ElectionDisplay,
    error::{BallotError, Operation, Result},
    gateway::{BallotGateway, RawCandidate},
};

/// Source of the current unix time used for `is_active`.
pub trait Clock {
    fn unix_timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// 1-based; the program index is `id - 1`.
    pub id: u32,
    pub name: String,
    pub vote_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionSnapshot {
    pub title: String,
    pub description: String,
    pub candidates: Vec<Candidate>,
    /// When this snapshot was taken.
    pub start_time: i64,
    /// Voting deadline, if the ballot has one.
    pub end_time: Option<i64>,
    pub is_active: bool,
    pub total_votes: u64,
    #[serde(serialize_with = "serialize_pubkey")]
    pub admin: Pubkey,
}

fn serialize_pubkey<S: Serializer>(key: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

impl ElectionSnapshot {
    pub fn candidate(&self, id: u32) -> Option<&Candidate> {
        id.checked_sub(1)
            .and_then(|index| self.candidates.get(index as usize))
    }

    /// Share of the total for one candidate, in percent.
    pub fn percentage(&self, id: u32) -> f64 {
        match self.candidate(id) {
            Some(c) if self.total_votes > 0 => c.vote_count as f64 * 100.0 / self.total_votes as f64,
            _ => 0.0,
        }
    }
}

/// Build a snapshot from raw reads.
pub fn build(
    raw: Vec<RawCandidate>,
    has_deadline: bool,
    voting_deadline: i64,
    admin: Pubkey,
    now: i64,
    display: &ElectionDisplay,
) -> ElectionSnapshot {
    let candidates: Vec<Candidate> = raw
        .into_iter()
        .enumerate()
        .map(|(index, c)| {
            let meta = display.candidates.get(&c.name);
            Candidate {
                id: index as u32 + 1,
                description: meta.and_then(|m| m.description.clone()),
                image_url: meta.and_then(|m| m.image_url.clone()),
                name: c.name,
                vote_count: c.vote_count,
            }
        })
        .collect();
    let total_votes = candidates.iter().map(|c| c.vote_count).sum();

    ElectionSnapshot {
        title: display.title.clone(),
        description: display.description.clone(),
        candidates,
        start_time: now,
        end_time: has_deadline.then_some(voting_deadline),
        is_active: !has_deadline || now < voting_deadline,
        total_votes,
        admin,
    }
}

/// Read the ballot through `gateway` and build a fresh snapshot.
///
/// Fails on the first failing read; nothing read before it is kept.
pub fn refresh(gateway: &dyn BallotGateway, clock: &dyn Clock, display: &ElectionDisplay) -> Result<ElectionSnapshot> {
    let raw = gateway
        .get_candidates()
        .map_err(BallotError::call(Operation::GetCandidates))?;
    let has_deadline = gateway
        .has_deadline()
        .map_err(BallotError::call(Operation::HasDeadline))?;
    let voting_deadline = gateway
        .voting_deadline()
        .map_err(BallotError::call(Operation::VotingDeadline))?;
    let admin = gateway.admin().map_err(BallotError::call(Operation::Admin))?;

    let snapshot = build(
        raw,
        has_deadline,
        voting_deadline,
        admin,
        clock.unix_timestamp(),
        display,
    );
    debug!(
        "snapshot of {}: {} candidates, {} votes, active={}",
        gateway.ballot(),
        snapshot.candidates.len(),
        snapshot.total_votes,
        snapshot.is_active
    );
    Ok(snapshot)
}
