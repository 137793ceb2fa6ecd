//! Contract gateway.
//!
//! [`BallotGateway`] is a handle on one ballot account bound to one signer.
//! Reads return decoded program state; writes return the transaction
//! signature, which must be awaited through [`PendingTransaction`] before the
//! effect counts as durable.

use std::{
    rc::Rc,
    sync::mpsc::Sender,
    thread,
    time::{Duration, Instant},
};

use log::{debug, info};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};

use crate::{
    config::ConfirmationPolicy,
    error::{BallotError, CallError, Operation, Result},
};

pub type CallResult<T> = std::result::Result<T, CallError>;

/// Candidate as stored by the program, index-ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub name: String,
    pub vote_count: u64,
}

/// Payload of the program's `Voted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotedEvent {
    pub voter: Pubkey,
    pub candidate_index: u32,
    pub vote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

pub trait BallotGateway {
    /// Ballot account this gateway is bound to.
    fn ballot(&self) -> Pubkey;

    /// Address that signs every write.
    fn signer(&self) -> Pubkey;

    fn get_candidates(&self) -> CallResult<Vec<RawCandidate>>;

    fn has_deadline(&self) -> CallResult<bool>;

    fn voting_deadline(&self) -> CallResult<i64>;

    fn admin(&self) -> CallResult<Pubkey>;

    fn has_voted(&self, voter: &Pubkey) -> CallResult<bool>;

    /// Submit a vote for a zero-based candidate index.
    fn vote(&self, candidate_index: u32) -> CallResult<Signature>;

    fn add_candidate(&self, name: &str) -> CallResult<Signature>;

    fn status(&self, signature: &Signature) -> CallResult<TxStatus>;

    /// Deliver every `Voted` event for this ballot to `sink` until
    /// [`unsubscribe`](Self::unsubscribe) is called with the returned id.
    fn subscribe_voted(&self, sink: Sender<VotedEvent>) -> CallResult<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Creates gateways for a ballot address and signer.
pub trait GatewayConnector {
    fn bind(&self, ballot: Pubkey, signer: Rc<Keypair>) -> CallResult<Rc<dyn BallotGateway>>;
}

/// A submitted write whose inclusion has not been observed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    operation: Operation,
    signature: Signature,
    submitted_at: Instant,
}

impl PendingTransaction {
    pub fn new(operation: Operation, signature: Signature) -> Self {
        info!("{} submitted: {}", operation, signature);
        Self {
            operation,
            signature,
            submitted_at: Instant::now(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Poll the gateway until the transaction is confirmed, rejected, or the
    /// policy timeout elapses. The timeout counts from the start of the wait.
    pub fn wait(&self, gateway: &dyn BallotGateway, policy: ConfirmationPolicy) -> Result<()> {
        let started = Instant::now();
        loop {
            let status = gateway
                .status(&self.signature)
                .map_err(BallotError::call(self.operation))?;
            match status {
                TxStatus::Confirmed => {
                    info!(
                        "{} confirmed: {} after {:?}",
                        self.operation,
                        self.signature,
                        self.submitted_at.elapsed()
                    );
                    return Ok(());
                }
                TxStatus::Failed(reason) => {
                    return Err(BallotError::ContractCallFailed {
                        operation: self.operation,
                        source: CallError::Rejected(reason),
                    });
                }
                TxStatus::Pending => {}
            }

            let waited = started.elapsed();
            if waited >= policy.timeout {
                return Err(BallotError::Timeout {
                    operation: self.operation,
                    signature: self.signature,
                    waited,
                });
            }
            debug!("{} still pending after {:?}", self.signature, waited);
            thread::sleep(policy.poll_interval.min(policy.timeout - waited).max(Duration::from_millis(1)));
        }
    }
}
