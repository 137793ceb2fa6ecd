use std::{fmt, time::Duration};

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

/// Contract operation named in call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Bind,
    GetCandidates,
    HasDeadline,
    VotingDeadline,
    Admin,
    HasVoted,
    Vote,
    AddCandidate,
    SubscribeVoted,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Bind => "bind",
            Operation::GetCandidates => "get_candidates",
            Operation::HasDeadline => "has_deadline",
            Operation::VotingDeadline => "voting_deadline",
            Operation::Admin => "admin",
            Operation::HasVoted => "has_voted",
            Operation::Vote => "vote",
            Operation::AddCandidate => "add_candidate",
            Operation::SubscribeVoted => "subscribe_voted",
        };
        f.write_str(name)
    }
}

/// Failure reported by a gateway backend.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),

    #[error("account {0} is not a ballot account")]
    UnexpectedAccount(Pubkey),

    #[error("failed to decode account data: {0}")]
    Decode(#[from] std::io::Error),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Local checks that reject an action before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("no ballot gateway is bound")]
    NoGateway,

    #[error("this wallet has already voted")]
    AlreadyVoted,

    #[error("a vote submission is already in flight")]
    SubmissionInFlight,

    #[error("no vote submission is waiting for confirmation")]
    NothingToConfirm,

    #[error("candidate id {0} is not a valid 1-based id")]
    InvalidCandidateId(u32),

    #[error("candidate name must not be empty")]
    EmptyCandidateName,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("wallet does not control {0}")]
    UnknownAccount(Pubkey),

    #[error("wallet rejected `{method}`: {reason}")]
    Rejected { method: &'static str, reason: String },

    #[error("unexpected wallet response to `{method}`")]
    UnexpectedResponse { method: &'static str },
}

#[derive(Debug, Error)]
pub enum BallotError {
    #[error("no wallet provider is available")]
    ProviderUnavailable,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("contract call `{operation}` failed: {source}")]
    ContractCallFailed {
        operation: Operation,
        #[source]
        source: CallError,
    },

    #[error("{wallet} is not the ballot admin ({admin})")]
    Unauthorized { wallet: Pubkey, admin: Pubkey },

    #[error("precondition failed: {0}")]
    PreconditionFailed(#[from] Precondition),

    #[error("`{operation}` transaction {signature} not confirmed after {waited:?}")]
    Timeout {
        operation: Operation,
        signature: Signature,
        waited: Duration,
    },
}

impl BallotError {
    /// Adapter for `map_err` on gateway results.
    pub fn call(operation: Operation) -> impl FnOnce(CallError) -> BallotError {
        move |source| BallotError::ContractCallFailed { operation, source }
    }

    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            BallotError::PreconditionFailed(p) => Some(*p),
            _ => None,
        }
    }
}

pub type Result<T, E = BallotError> = std::result::Result<T, E>;
