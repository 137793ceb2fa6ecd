//! Voting session.
//!
//! Owns everything a connected client holds: the wallet session, the gateway
//! binding with its live-update subscription, the latest snapshot and the vote
//! flow. Each piece is replaced as a whole on connect, reconnect and
//! disconnect.

use std::rc::Rc;

use log::{debug, info, warn};
use solana_sdk::signature::Signature;

use crate::{
    config::ClientConfig,
    error::{BallotError, Operation, Precondition, Result},
    flows::{self, VoteFlow, VotePhase, VoteRecord},
    gateway::{BallotGateway, GatewayConnector, SubscriptionId},
    listener::LiveUpdates,
    snapshot::{self, Clock, ElectionSnapshot, SystemClock},
    wallet::{WalletProvider, WalletSession},
};

// Gateway plus its one subscription; dropped together
struct Binding {
    gateway: Rc<dyn BallotGateway>,
    updates: LiveUpdates,
}

/// Outcome of a confirmed vote.
///
/// The vote is durable once confirmed, so a failed follow-up refresh is
/// reported here instead of failing the vote.
#[derive(Debug)]
pub struct VoteReceipt {
    pub candidate_id: u32,
    pub signature: Signature,
    pub refresh: Result<()>,
}

/// Outcome of a confirmed add-candidate transaction, with the follow-up
/// refresh reported separately like [`VoteReceipt`].
#[derive(Debug)]
pub struct CandidateReceipt {
    pub signature: Signature,
    pub refresh: Result<()>,
}

pub struct VotingSession {
    config: ClientConfig,
    provider: Option<Rc<dyn WalletProvider>>,
    connector: Rc<dyn GatewayConnector>,
    clock: Rc<dyn Clock>,
    wallet: WalletSession,
    binding: Option<Binding>,
    election: Option<ElectionSnapshot>,
    vote: VoteFlow,
    // has_voted came from the program for the current binding
    vote_status_loaded: bool,
}

impl VotingSession {
    pub fn new(
        config: ClientConfig,
        provider: Option<Rc<dyn WalletProvider>>,
        connector: Rc<dyn GatewayConnector>,
    ) -> Self {
        Self {
            config,
            provider,
            connector,
            clock: Rc::new(SystemClock),
            wallet: WalletSession::disconnected(),
            binding: None,
            election: None,
            vote: VoteFlow::default(),
            vote_status_loaded: false,
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn election(&self) -> Option<&ElectionSnapshot> {
        self.election.as_ref()
    }

    pub fn vote_record(&self) -> VoteRecord {
        self.vote.record()
    }

    pub fn vote_phase(&self) -> &VotePhase {
        self.vote.phase()
    }

    pub fn is_voting(&self) -> bool {
        self.vote.is_in_flight()
    }

    pub fn gateway(&self) -> Option<&Rc<dyn BallotGateway>> {
        self.binding.as_ref().map(|b| &b.gateway)
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.binding.as_ref().map(|b| b.updates.subscription_id())
    }

    fn bound_gateway(&self) -> Option<&dyn BallotGateway> {
        self.binding.as_ref().map(|b| b.gateway.as_ref())
    }

    /// Connect the wallet, bind the configured ballot and load its state.
    ///
    /// The snapshot and the vote status are loaded independently; the first
    /// failure is returned. The wallet stays connected and bound either way,
    /// and a vote status that failed to load is fetched again before voting.
    pub fn connect(&mut self) -> Result<()> {
        let (wallet, signer) = WalletSession::connect(self.provider.as_deref())?;

        // Release the old subscription before anything new is acquired
        self.teardown();
        self.wallet = wallet;

        let Some(ballot) = self.config.ballot else {
            warn!("no ballot address configured, wallet connected without a gateway");
            return Ok(());
        };
        let gateway = self
            .connector
            .bind(ballot, signer)
            .map_err(BallotError::call(Operation::Bind))?;
        let updates = LiveUpdates::subscribe(&gateway)?;
        self.binding = Some(Binding { gateway, updates });

        let refreshed = self.refresh().map(|_| ());
        let vote_status = self.load_vote_status();
        refreshed.and(vote_status)
    }

    /// Reconnect silently when the provider already authorized an account.
    /// Returns whether a connection was made.
    pub fn auto_reconnect(&mut self) -> Result<bool> {
        let accounts = WalletSession::authorized_accounts(self.provider.as_deref())?;
        if accounts.is_empty() {
            debug!("no authorized accounts, staying disconnected");
            return Ok(false);
        }
        self.connect()?;
        Ok(true)
    }

    /// Drop the binding and its subscription and forget the wallet.
    pub fn disconnect(&mut self) {
        self.teardown();
        if let Some(address) = self.wallet.address() {
            info!("wallet {} disconnected", address);
        }
        self.wallet = WalletSession::disconnected();
    }

    fn teardown(&mut self) {
        self.binding = None;
        self.election = None;
        self.vote = VoteFlow::default();
        self.vote_status_loaded = false;
    }

    // has_voted is re-derived; which candidate is unknowable after reconnect
    fn load_vote_status(&mut self) -> Result<()> {
        let address = *self.wallet.address().ok_or(Precondition::NotConnected)?;
        let gateway = self.bound_gateway().ok_or(Precondition::NoGateway)?;
        let has_voted = gateway
            .has_voted(&address)
            .map_err(BallotError::call(Operation::HasVoted))?;
        self.vote = VoteFlow::new(VoteRecord {
            has_voted,
            user_vote: None,
        });
        self.vote_status_loaded = true;
        Ok(())
    }

    /// Rebuild the snapshot. On failure the previous snapshot is kept as is.
    pub fn refresh(&mut self) -> Result<&ElectionSnapshot> {
        let gateway = self.bound_gateway().ok_or(Precondition::NoGateway)?;
        let snapshot = snapshot::refresh(gateway, self.clock.as_ref(), &self.config.display)?;
        Ok(self.election.insert(snapshot))
    }

    /// Send a vote for a 1-based candidate id without waiting for it.
    pub fn submit_vote(&mut self, candidate_id: u32) -> Result<Signature> {
        if self.wallet.is_connected() && self.binding.is_some() && !self.vote_status_loaded {
            self.load_vote_status()?;
        }
        let gateway = self.binding.as_ref().map(|b| b.gateway.as_ref());
        self.vote.submit(&self.wallet, gateway, candidate_id)
    }

    /// Wait for the submitted vote, then refresh the snapshot.
    pub fn confirm_vote(&mut self) -> Result<VoteReceipt> {
        let gateway = self.binding.as_ref().map(|b| b.gateway.as_ref());
        let (candidate_id, signature) = self.vote.confirm(gateway, self.config.confirmation)?;

        let refresh = self.refresh().map(|_| ());
        if let Err(err) = &refresh {
            warn!("refresh after vote {} failed: {}", signature, err);
        }
        Ok(VoteReceipt {
            candidate_id,
            signature,
            refresh,
        })
    }

    /// Submit and confirm a vote for a 1-based candidate id.
    pub fn vote(&mut self, candidate_id: u32) -> Result<VoteReceipt> {
        self.submit_vote(candidate_id)?;
        self.confirm_vote()
    }

    /// Add a candidate as admin, wait for confirmation and refresh.
    ///
    /// Once confirmed the candidate exists on-chain, so a failed refresh is
    /// reported in the receipt instead of failing the call.
    pub fn add_candidate(&mut self, name: &str) -> Result<CandidateReceipt> {
        let signature = flows::add_candidate(
            &self.wallet,
            self.bound_gateway(),
            name,
            self.config.confirmation,
        )?;

        let refresh = self.refresh().map(|_| ());
        if let Err(err) = &refresh {
            warn!("refresh after adding {:?} failed: {}", name, err);
        }
        Ok(CandidateReceipt { signature, refresh })
    }

    /// Consume pending `Voted` events and refresh once if any arrived.
    ///
    /// Returns the number of events consumed. A failed refresh is logged and
    /// returned; it is not retried.
    pub fn poll_updates(&mut self) -> Result<usize> {
        let Some(binding) = &self.binding else {
            return Ok(0);
        };
        let events = binding.updates.drain();
        if events.is_empty() {
            return Ok(0);
        }
        debug!("{} Voted event(s) received, refreshing", events.len());
        match self.refresh() {
            Ok(_) => Ok(events.len()),
            Err(err) => {
                warn!("live refresh failed: {}", err);
                Err(err)
            }
        }
    }
}
