//! Vote submission flow: `Idle -> Submitting -> Confirmed`, back to `Idle` on
//! any failure.

use log::{info, warn};
use serde::Serialize;
use solana_sdk::signature::Signature;

use crate::{
    config::ConfirmationPolicy,
    error::{BallotError, Operation, Precondition, Result},
    gateway::{BallotGateway, PendingTransaction},
    wallet::WalletSession,
};

/// What this session knows about its own vote.
///
/// `user_vote` is only known after a confirmed submission in this session;
/// the program stores whether an address voted, not for whom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteRecord {
    pub has_voted: bool,
    pub user_vote: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VotePhase {
    #[default]
    Idle,
    Submitting {
        candidate_id: u32,
        pending: PendingTransaction,
    },
    Confirmed {
        candidate_id: u32,
    },
}

#[derive(Debug, Default)]
pub struct VoteFlow {
    phase: VotePhase,
    record: VoteRecord,
}

impl VoteFlow {
    pub fn new(record: VoteRecord) -> Self {
        Self {
            phase: VotePhase::Idle,
            record,
        }
    }

    pub fn record(&self) -> VoteRecord {
        self.record
    }

    pub fn phase(&self) -> &VotePhase {
        &self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, VotePhase::Submitting { .. })
    }

    /// Check preconditions and send the vote for a 1-based candidate id.
    ///
    /// Nothing is sent when a precondition fails. A send failure leaves the
    /// flow idle so the caller may retry.
    pub fn submit(
        &mut self,
        wallet: &WalletSession,
        gateway: Option<&dyn BallotGateway>,
        candidate_id: u32,
    ) -> Result<Signature> {
        if !wallet.is_connected() {
            return Err(Precondition::NotConnected.into());
        }
        let gateway = gateway.ok_or(Precondition::NoGateway)?;
        if self.record.has_voted {
            return Err(Precondition::AlreadyVoted.into());
        }
        if self.is_in_flight() {
            return Err(Precondition::SubmissionInFlight.into());
        }
        let index = candidate_id
            .checked_sub(1)
            .ok_or(Precondition::InvalidCandidateId(candidate_id))?;

        let signature = gateway.vote(index).map_err(|source| {
            warn!("vote for candidate {} failed to send: {}", candidate_id, source);
            BallotError::ContractCallFailed {
                operation: Operation::Vote,
                source,
            }
        })?;
        self.phase = VotePhase::Submitting {
            candidate_id,
            pending: PendingTransaction::new(Operation::Vote, signature),
        };
        Ok(signature)
    }

    /// Wait for the in-flight vote. On confirmation the record is updated;
    /// on failure or timeout the flow returns to idle with the record untouched.
    pub fn confirm(
        &mut self,
        gateway: Option<&dyn BallotGateway>,
        policy: ConfirmationPolicy,
    ) -> Result<(u32, Signature)> {
        let (candidate_id, pending) = match std::mem::take(&mut self.phase) {
            VotePhase::Submitting {
                candidate_id,
                pending,
            } => (candidate_id, pending),
            other => {
                self.phase = other;
                return Err(Precondition::NothingToConfirm.into());
            }
        };
        let Some(gateway) = gateway else {
            return Err(Precondition::NoGateway.into());
        };

        match pending.wait(gateway, policy) {
            Ok(()) => {
                self.record = VoteRecord {
                    has_voted: true,
                    user_vote: Some(candidate_id),
                };
                self.phase = VotePhase::Confirmed { candidate_id };
                info!("vote for candidate {} confirmed", candidate_id);
                Ok((candidate_id, *pending.signature()))
            }
            Err(err) => {
                warn!("vote for candidate {} failed: {}", candidate_id, err);
                Err(err)
            }
        }
    }
}
