//! Candidate admin flow.
//!
//! The admin comparison only saves a doomed transaction fee; the program
//! enforces the same rule on-chain.

use log::warn;
use solana_sdk::signature::Signature;

use crate::{
    config::ConfirmationPolicy,
    error::{BallotError, Operation, Precondition, Result},
    gateway::{BallotGateway, PendingTransaction},
    wallet::WalletSession,
};

/// Add a candidate as the connected wallet and wait for confirmation.
///
/// Fails with [`BallotError::Unauthorized`] without sending anything when the
/// connected address is not the on-chain admin.
pub fn add_candidate(
    wallet: &WalletSession,
    gateway: Option<&dyn BallotGateway>,
    name: &str,
    policy: ConfirmationPolicy,
) -> Result<Signature> {
    let address = *wallet.address().ok_or(Precondition::NotConnected)?;
    let gateway = gateway.ok_or(Precondition::NoGateway)?;
    if name.trim().is_empty() {
        return Err(Precondition::EmptyCandidateName.into());
    }

    let admin = gateway.admin().map_err(BallotError::call(Operation::Admin))?;
    if admin != address {
        warn!("{} tried to add a candidate, admin is {}", address, admin);
        return Err(BallotError::Unauthorized {
            wallet: address,
            admin,
        });
    }

    let signature = gateway
        .add_candidate(name)
        .map_err(BallotError::call(Operation::AddCandidate))?;
    PendingTransaction::new(Operation::AddCandidate, signature).wait(gateway, policy)?;
    Ok(signature)
}
