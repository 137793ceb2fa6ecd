//! Client for the `ballot` program.
//!
//! A [`VotingSession`] connects a [`WalletProvider`], binds a
//! [`BallotGateway`] to the configured ballot, keeps an [`ElectionSnapshot`]
//! current and runs the vote and add-candidate flows. [`local`] provides an
//! in-process chain for running the whole stack without a cluster.

pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod listener;
pub mod local;
pub mod program;
pub mod session;
pub mod snapshot;
pub mod wallet;

pub use config::{ClientConfig, ConfirmationPolicy, ElectionDisplay};
pub use error::{BallotError, CallError, Operation, Precondition, Result, WalletError};
pub use gateway::{BallotGateway, GatewayConnector, PendingTransaction, TxStatus, VotedEvent};
pub use session::{CandidateReceipt, VoteReceipt, VotingSession};
pub use snapshot::{Candidate, Clock, ElectionSnapshot};
pub use wallet::{WalletProvider, WalletSession};
