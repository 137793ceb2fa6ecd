// Test utilities: an in-memory ballot chain and wallet

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
    sync::mpsc::Sender,
    time::Duration,
};

use ballot_client::{
    gateway::{CallResult, RawCandidate, SubscriptionId},
    snapshot::Clock,
    wallet::{WalletRequest, WalletResponse},
    BallotGateway, CallError, ClientConfig, ConfirmationPolicy, GatewayConnector, Operation, TxStatus, VotedEvent,
    VotingSession, WalletError, WalletProvider,
};
use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

pub const BALLOT: Pubkey = Pubkey::new_from_array([42; 32]);
pub const NOW: i64 = 1_700_000_000;
pub const CHAIN_ID: u64 = 31337;

/// How the fake settles submitted transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Immediate,
    Never,
    Reject(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Vote { signer: Pubkey, index: u32 },
    AddCandidate { signer: Pubkey, name: String },
}

pub struct FakeState {
    pub candidates: Vec<RawCandidate>,
    pub has_deadline: bool,
    pub voting_deadline: i64,
    pub admin: Pubkey,
    pub voters: HashSet<Pubkey>,
    pub now: i64,
    pub failing: HashSet<Operation>,
    pub confirm: Confirm,
    pub writes: Vec<Write>,
    pub binds: usize,
    pub unsubscribed: Vec<SubscriptionId>,
    statuses: HashMap<Signature, TxStatus>,
    subscribers: BTreeMap<SubscriptionId, Sender<VotedEvent>>,
    next_signature: u64,
    next_subscription: u64,
}

impl FakeState {
    fn check(&self, operation: Operation) -> CallResult<()> {
        if self.failing.contains(&operation) {
            return Err(CallError::Transport(format!("{} unavailable", operation)));
        }
        Ok(())
    }

    fn record_vote(&mut self, voter: Pubkey, index: u32) -> CallResult<()> {
        if self.has_deadline && self.now >= self.voting_deadline {
            return Err(CallError::Rejected("VotingClosed".to_string()));
        }
        if self.voters.contains(&voter) {
            return Err(CallError::Rejected("AlreadyVoted".to_string()));
        }
        let candidate = self
            .candidates
            .get_mut(index as usize)
            .ok_or_else(|| CallError::Rejected("InvalidCandidate".to_string()))?;
        candidate.vote_count += 1;
        let event = VotedEvent {
            voter,
            candidate_index: index,
            vote_count: candidate.vote_count,
        };
        self.voters.insert(voter);
        for sink in self.subscribers.values() {
            let _ = sink.send(event.clone());
        }
        Ok(())
    }

    fn settle(&mut self) -> (Signature, bool) {
        self.next_signature += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&self.next_signature.to_le_bytes());
        let signature = Signature::from(bytes);
        let status = match &self.confirm {
            Confirm::Immediate => TxStatus::Confirmed,
            Confirm::Never => TxStatus::Pending,
            Confirm::Reject(reason) => TxStatus::Failed(reason.clone()),
        };
        let applies = status == TxStatus::Confirmed;
        self.statuses.insert(signature, status);
        (signature, applies)
    }
}

/// Shared in-memory ballot. Clones refer to the same state.
#[derive(Clone)]
pub struct FakeChain(pub Rc<RefCell<FakeState>>);

impl FakeChain {
    pub fn new(admin: Pubkey, names: &[&str]) -> Self {
        Self(Rc::new(RefCell::new(FakeState {
            candidates: names
                .iter()
                .map(|name| RawCandidate {
                    name: name.to_string(),
                    vote_count: 0,
                })
                .collect(),
            has_deadline: false,
            voting_deadline: 0,
            admin,
            voters: HashSet::new(),
            now: NOW,
            failing: HashSet::new(),
            confirm: Confirm::Immediate,
            writes: Vec::new(),
            binds: 0,
            unsubscribed: Vec::new(),
            statuses: HashMap::new(),
            subscribers: BTreeMap::new(),
            next_signature: 0,
            next_subscription: 0,
        })))
    }

    pub fn fail(&self, operation: Operation) {
        self.0.borrow_mut().failing.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.0.borrow_mut().failing.remove(&operation);
    }

    pub fn set_confirm(&self, confirm: Confirm) {
        self.0.borrow_mut().confirm = confirm;
    }

    pub fn set_deadline(&self, deadline: i64) {
        let mut state = self.0.borrow_mut();
        state.has_deadline = true;
        state.voting_deadline = deadline;
    }

    pub fn set_votes(&self, index: usize, vote_count: u64) {
        self.0.borrow_mut().candidates[index].vote_count = vote_count;
    }

    pub fn mark_voted(&self, voter: Pubkey) {
        self.0.borrow_mut().voters.insert(voter);
    }

    /// A vote cast by some other client.
    pub fn external_vote(&self, voter: Pubkey, index: u32) {
        self.0
            .borrow_mut()
            .record_vote(voter, index)
            .expect("external vote should succeed");
    }

    pub fn writes(&self) -> Vec<Write> {
        self.0.borrow().writes.clone()
    }

    pub fn vote_count(&self, index: usize) -> u64 {
        self.0.borrow().candidates[index].vote_count
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subscribers.len()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.0.borrow().unsubscribed.clone()
    }

    pub fn binds(&self) -> usize {
        self.0.borrow().binds
    }

    pub fn gateway(&self, signer: Pubkey) -> FakeGateway {
        FakeGateway {
            chain: self.clone(),
            signer,
        }
    }
}

impl Clock for FakeChain {
    fn unix_timestamp(&self) -> i64 {
        self.0.borrow().now
    }
}

impl GatewayConnector for FakeChain {
    fn bind(&self, ballot: Pubkey, signer: Rc<Keypair>) -> CallResult<Rc<dyn BallotGateway>> {
        let mut state = self.0.borrow_mut();
        state.check(Operation::Bind)?;
        if ballot != BALLOT {
            return Err(CallError::AccountNotFound(ballot));
        }
        state.binds += 1;
        Ok(Rc::new(FakeGateway {
            chain: self.clone(),
            signer: signer.pubkey(),
        }))
    }
}

pub struct FakeGateway {
    chain: FakeChain,
    signer: Pubkey,
}

impl BallotGateway for FakeGateway {
    fn ballot(&self) -> Pubkey {
        BALLOT
    }

    fn signer(&self) -> Pubkey {
        self.signer
    }

    fn get_candidates(&self) -> CallResult<Vec<RawCandidate>> {
        let state = self.chain.0.borrow();
        state.check(Operation::GetCandidates)?;
        Ok(state.candidates.clone())
    }

    fn has_deadline(&self) -> CallResult<bool> {
        let state = self.chain.0.borrow();
        state.check(Operation::HasDeadline)?;
        Ok(state.has_deadline)
    }

    fn voting_deadline(&self) -> CallResult<i64> {
        let state = self.chain.0.borrow();
        state.check(Operation::VotingDeadline)?;
        Ok(state.voting_deadline)
    }

    fn admin(&self) -> CallResult<Pubkey> {
        let state = self.chain.0.borrow();
        state.check(Operation::Admin)?;
        Ok(state.admin)
    }

    fn has_voted(&self, voter: &Pubkey) -> CallResult<bool> {
        let state = self.chain.0.borrow();
        state.check(Operation::HasVoted)?;
        Ok(state.voters.contains(voter))
    }

    fn vote(&self, candidate_index: u32) -> CallResult<Signature> {
        let mut state = self.chain.0.borrow_mut();
        state.check(Operation::Vote)?;
        state.writes.push(Write::Vote {
            signer: self.signer,
            index: candidate_index,
        });
        let (signature, applies) = state.settle();
        if applies {
            state.record_vote(self.signer, candidate_index)?;
        }
        Ok(signature)
    }

    fn add_candidate(&self, name: &str) -> CallResult<Signature> {
        let mut state = self.chain.0.borrow_mut();
        state.check(Operation::AddCandidate)?;
        state.writes.push(Write::AddCandidate {
            signer: self.signer,
            name: name.to_string(),
        });
        if self.signer != state.admin {
            return Err(CallError::Rejected("Unauthorized".to_string()));
        }
        let (signature, applies) = state.settle();
        if applies {
            state.candidates.push(RawCandidate {
                name: name.to_string(),
                vote_count: 0,
            });
        }
        Ok(signature)
    }

    fn status(&self, signature: &Signature) -> CallResult<TxStatus> {
        Ok(self
            .chain
            .0
            .borrow()
            .statuses
            .get(signature)
            .cloned()
            .unwrap_or(TxStatus::Pending))
    }

    fn subscribe_voted(&self, sink: Sender<VotedEvent>) -> CallResult<SubscriptionId> {
        let mut state = self.chain.0.borrow_mut();
        state.check(Operation::SubscribeVoted)?;
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.subscribers.insert(id, sink);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.chain.0.borrow_mut();
        state.subscribers.remove(&id);
        state.unsubscribed.push(id);
    }
}

/// Wallet with a request log. Accounts are authorized once requested.
pub struct FakeWallet {
    keypairs: Vec<Rc<Keypair>>,
    lamports: u64,
    authorized: Cell<bool>,
    pub requests: RefCell<Vec<&'static str>>,
}

impl FakeWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypairs: vec![Rc::new(keypair)],
            lamports: 3 * LAMPORTS_PER_SOL / 2,
            authorized: Cell::new(false),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            keypairs: Vec::new(),
            lamports: 0,
            authorized: Cell::new(false),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn authorized(self) -> Self {
        self.authorized.set(true);
        self
    }

    pub fn address(&self) -> Pubkey {
        self.keypairs[0].pubkey()
    }

    pub fn requested(&self, method: &str) -> bool {
        self.requests.borrow().iter().any(|m| *m == method)
    }
}

impl WalletProvider for FakeWallet {
    fn request(&self, request: WalletRequest) -> Result<WalletResponse, WalletError> {
        self.requests.borrow_mut().push(request.method());
        let addresses = || -> Vec<Pubkey> { self.keypairs.iter().map(|k| k.pubkey()).collect() };
        match request {
            WalletRequest::RequestAccounts => {
                self.authorized.set(true);
                Ok(WalletResponse::Accounts(addresses()))
            }
            WalletRequest::Accounts if self.authorized.get() => Ok(WalletResponse::Accounts(addresses())),
            WalletRequest::Accounts => Ok(WalletResponse::Accounts(Vec::new())),
            WalletRequest::ChainId => Ok(WalletResponse::ChainId(CHAIN_ID)),
            WalletRequest::Balance(_) => Ok(WalletResponse::Balance(self.lamports)),
        }
    }

    fn signer(&self, address: &Pubkey) -> Result<Rc<Keypair>, WalletError> {
        self.keypairs
            .iter()
            .find(|k| k.pubkey() == *address)
            .cloned()
            .ok_or(WalletError::UnknownAccount(*address))
    }
}

pub fn fast_policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        ballot: Some(BALLOT),
        confirmation: fast_policy(),
        chain_id: CHAIN_ID,
        ..ClientConfig::default()
    }
}

pub fn new_session(chain: &FakeChain, wallet: Rc<FakeWallet>) -> VotingSession {
    VotingSession::new(test_config(), Some(wallet), Rc::new(chain.clone())).with_clock(Rc::new(chain.clone()))
}

/// Chain with Alice, Bob and Charlie administered by `admin`.
pub fn setup(admin: &Keypair) -> FakeChain {
    FakeChain::new(admin.pubkey(), &["Alice", "Bob", "Charlie"])
}
