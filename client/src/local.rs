//! In-process chain backed by LiteSVM.
//!
//! [`LocalChain`] hosts the compiled `ballot` program, executes transactions
//! synchronously and forwards `Voted` events from the transaction logs to
//! subscribers. [`LocalWallet`] is a keypair-backed wallet on top of it.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc::Sender,
};

use litesvm::LiteSVM;
use log::{debug, info, warn};
use solana_sdk::{
    clock::Clock as SysClock,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;

use crate::{
    config::ClientConfig,
    error::{CallError, WalletError},
    gateway::{BallotGateway, CallResult, GatewayConnector, RawCandidate, SubscriptionId, TxStatus, VotedEvent},
    program::{self, BallotAccount},
    snapshot::{Clock, SystemClock},
    wallet::{WalletProvider, WalletRequest, WalletResponse},
};

#[derive(Debug, Error)]
pub enum LocalChainError {
    #[error("failed to read program {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load program: {0}")]
    Deploy(String),

    #[error("airdrop to {address} failed: {reason}")]
    Airdrop { address: Pubkey, reason: String },

    #[error(transparent)]
    Call(#[from] CallError),
}

struct Subscriber {
    ballot: Pubkey,
    sink: Sender<VotedEvent>,
}

struct ChainState {
    svm: LiteSVM,
    program_id: Pubkey,
    chain_id: u64,
    outcomes: HashMap<Signature, TxStatus>,
    next_subscription: u64,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
}

impl ChainState {
    fn dispatch(&mut self, ballot: &Pubkey, events: &[VotedEvent]) {
        if events.is_empty() {
            return;
        }
        // Receivers that went away are pruned
        self.subscribers.retain(|id, subscriber| {
            if subscriber.ballot != *ballot {
                return true;
            }
            let delivered = events.iter().all(|event| subscriber.sink.send(event.clone()).is_ok());
            if !delivered {
                debug!("dropping closed subscriber {:?}", id);
            }
            delivered
        });
    }
}

/// Shared handle on one LiteSVM instance. Clones refer to the same chain.
#[derive(Clone)]
pub struct LocalChain {
    state: Rc<RefCell<ChainState>>,
}

impl LocalChain {
    /// Empty chain whose clock starts at the current wall time.
    pub fn new(program_id: Pubkey, chain_id: u64) -> Self {
        let mut svm = LiteSVM::new();
        let mut clock: SysClock = svm.get_sysvar();
        clock.unix_timestamp = SystemClock.unix_timestamp();
        svm.set_sysvar(&clock);

        Self {
            state: Rc::new(RefCell::new(ChainState {
                svm,
                program_id,
                chain_id,
                outcomes: HashMap::new(),
                next_subscription: 0,
                subscribers: BTreeMap::new(),
            })),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.program_id, config.chain_id)
    }

    /// Load the compiled program (`target/deploy/ballot.so`).
    pub fn load_program(&self, path: impl AsRef<Path>) -> Result<(), LocalChainError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LocalChainError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut state = self.state.borrow_mut();
        let program_id = state.program_id;
        state
            .svm
            .add_program(program_id, &bytes)
            .map_err(|e| LocalChainError::Deploy(format!("{:?}", e)))?;
        info!("program {} loaded from {}", program_id, path.display());
        Ok(())
    }

    pub fn program_id(&self) -> Pubkey {
        self.state.borrow().program_id
    }

    pub fn chain_id(&self) -> u64 {
        self.state.borrow().chain_id
    }

    pub fn fund(&self, address: &Pubkey, lamports: u64) -> Result<(), LocalChainError> {
        self.state
            .borrow_mut()
            .svm
            .airdrop(address, lamports)
            .map(|_| ())
            .map_err(|failed| LocalChainError::Airdrop {
                address: *address,
                reason: failed.err.to_string(),
            })
    }

    pub fn create_funded_keypair(&self, lamports: u64) -> Result<Keypair, LocalChainError> {
        let keypair = Keypair::new();
        self.fund(&keypair.pubkey(), lamports)?;
        Ok(keypair)
    }

    pub fn balance(&self, address: &Pubkey) -> u64 {
        self.state.borrow().svm.get_balance(address).unwrap_or(0)
    }

    /// Create a ballot administered by `admin`. A zero deadline means voting
    /// never closes.
    pub fn deploy_ballot(
        &self,
        admin: &Keypair,
        candidate_names: &[String],
        deadline_seconds: u64,
    ) -> Result<Pubkey, LocalChainError> {
        let program_id = self.program_id();
        let ballot = program::ballot_address(&program_id, &admin.pubkey());
        let ix = program::initialize_ix(&program_id, &admin.pubkey(), candidate_names, deadline_seconds);
        self.send(ix, admin, &ballot)?;
        info!(
            "ballot {} created with {} candidate(s)",
            ballot,
            candidate_names.len()
        );
        Ok(ballot)
    }

    /// Move the chain clock forward.
    pub fn advance_time(&self, seconds: u64) {
        let mut state = self.state.borrow_mut();
        let mut clock: SysClock = state.svm.get_sysvar();
        clock.unix_timestamp += seconds as i64;
        state.svm.set_sysvar(&clock);

        let current_slot = clock.slot;
        state.svm.warp_to_slot(current_slot + (seconds * 2) + 5);
    }

    fn ballot_account(&self, ballot: &Pubkey) -> CallResult<BallotAccount> {
        let state = self.state.borrow();
        let account = state
            .svm
            .get_account(ballot)
            .ok_or(CallError::AccountNotFound(*ballot))?;
        if account.owner != state.program_id {
            return Err(CallError::UnexpectedAccount(*ballot));
        }
        program::decode_ballot(ballot, &account.data)
    }

    fn account_exists(&self, address: &Pubkey) -> bool {
        let state = self.state.borrow();
        state
            .svm
            .get_account(address)
            .is_some_and(|account| account.owner == state.program_id && account.lamports > 0)
    }

    // Execute one instruction and publish its Voted events to the ballot's subscribers
    fn send(&self, ix: Instruction, signer: &Keypair, ballot: &Pubkey) -> CallResult<Signature> {
        let mut state = self.state.borrow_mut();
        let blockhash = state.svm.latest_blockhash();
        let tx = Transaction::new_signed_with_payer(&[ix], Some(&signer.pubkey()), &[signer], blockhash);
        let signature = tx.signatures[0];

        let result = state.svm.send_transaction(tx);
        // Identical follow-up transactions need a fresh blockhash
        state.svm.expire_blockhash();

        match result {
            Ok(meta) => {
                state.outcomes.insert(signature, TxStatus::Confirmed);
                let events = program::parse_voted_events(&meta.logs);
                debug!("{} executed, {} Voted event(s)", signature, events.len());
                state.dispatch(ballot, &events);
                Ok(signature)
            }
            Err(failed) => {
                let reason = failed.err.to_string();
                warn!("{} failed: {}", signature, reason);
                for line in &failed.meta.logs {
                    debug!("  {}", line);
                }
                state.outcomes.insert(signature, TxStatus::Failed(reason.clone()));
                Err(CallError::Rejected(reason))
            }
        }
    }

    fn status(&self, signature: &Signature) -> TxStatus {
        self.state
            .borrow()
            .outcomes
            .get(signature)
            .cloned()
            .unwrap_or(TxStatus::Pending)
    }

    fn subscribe(&self, ballot: Pubkey, sink: Sender<VotedEvent>) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.subscribers.insert(id, Subscriber { ballot, sink });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.borrow_mut().subscribers.remove(&id);
    }

    /// Number of live `Voted` subscriptions across all ballots.
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}

/// Chain time, so `is_active` agrees with what the program enforces.
impl Clock for LocalChain {
    fn unix_timestamp(&self) -> i64 {
        let clock: SysClock = self.state.borrow().svm.get_sysvar();
        clock.unix_timestamp
    }
}

impl GatewayConnector for LocalChain {
    fn bind(&self, ballot: Pubkey, signer: Rc<Keypair>) -> CallResult<Rc<dyn BallotGateway>> {
        self.ballot_account(&ballot)?;
        debug!("bound ballot {} for {}", ballot, signer.pubkey());
        Ok(Rc::new(LocalGateway {
            chain: self.clone(),
            ballot,
            signer,
        }))
    }
}

pub struct LocalGateway {
    chain: LocalChain,
    ballot: Pubkey,
    signer: Rc<Keypair>,
}

impl BallotGateway for LocalGateway {
    fn ballot(&self) -> Pubkey {
        self.ballot
    }

    fn signer(&self) -> Pubkey {
        self.signer.pubkey()
    }

    fn get_candidates(&self) -> CallResult<Vec<RawCandidate>> {
        Ok(self.chain.ballot_account(&self.ballot)?.candidates())
    }

    fn has_deadline(&self) -> CallResult<bool> {
        Ok(self.chain.ballot_account(&self.ballot)?.has_deadline)
    }

    fn voting_deadline(&self) -> CallResult<i64> {
        Ok(self.chain.ballot_account(&self.ballot)?.voting_deadline)
    }

    fn admin(&self) -> CallResult<Pubkey> {
        Ok(self.chain.ballot_account(&self.ballot)?.admin())
    }

    fn has_voted(&self, voter: &Pubkey) -> CallResult<bool> {
        let record = program::voter_record_address(&self.chain.program_id(), &self.ballot, voter);
        Ok(self.chain.account_exists(&record))
    }

    fn vote(&self, candidate_index: u32) -> CallResult<Signature> {
        let ix = program::vote_ix(
            &self.chain.program_id(),
            &self.signer.pubkey(),
            &self.ballot,
            candidate_index,
        );
        self.chain.send(ix, &self.signer, &self.ballot)
    }

    fn add_candidate(&self, name: &str) -> CallResult<Signature> {
        let ix = program::add_candidate_ix(&self.chain.program_id(), &self.signer.pubkey(), &self.ballot, name);
        self.chain.send(ix, &self.signer, &self.ballot)
    }

    fn status(&self, signature: &Signature) -> CallResult<TxStatus> {
        Ok(self.chain.status(signature))
    }

    fn subscribe_voted(&self, sink: Sender<VotedEvent>) -> CallResult<SubscriptionId> {
        Ok(self.chain.subscribe(self.ballot, sink))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.chain.unsubscribe(id);
    }
}

/// Wallet holding local keypairs. Accounts count as authorized after the
/// first `RequestAccounts` until [`revoke`](Self::revoke) is called.
pub struct LocalWallet {
    chain: LocalChain,
    keypairs: Vec<Rc<Keypair>>,
    authorized: Cell<bool>,
}

impl LocalWallet {
    pub fn new(chain: LocalChain, keypairs: Vec<Keypair>) -> Self {
        Self {
            chain,
            keypairs: keypairs.into_iter().map(Rc::new).collect(),
            authorized: Cell::new(false),
        }
    }

    /// Wallet that already authorized its accounts, as after an earlier visit.
    pub fn authorized(self) -> Self {
        self.authorized.set(true);
        self
    }

    pub fn revoke(&self) {
        self.authorized.set(false);
    }

    fn addresses(&self) -> Vec<Pubkey> {
        self.keypairs.iter().map(|k| k.pubkey()).collect()
    }
}

impl WalletProvider for LocalWallet {
    fn request(&self, request: WalletRequest) -> Result<WalletResponse, WalletError> {
        match request {
            WalletRequest::RequestAccounts => {
                self.authorized.set(true);
                Ok(WalletResponse::Accounts(self.addresses()))
            }
            WalletRequest::Accounts if self.authorized.get() => Ok(WalletResponse::Accounts(self.addresses())),
            WalletRequest::Accounts => Ok(WalletResponse::Accounts(Vec::new())),
            WalletRequest::ChainId => Ok(WalletResponse::ChainId(self.chain.chain_id())),
            WalletRequest::Balance(address) => Ok(WalletResponse::Balance(self.chain.balance(&address))),
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
