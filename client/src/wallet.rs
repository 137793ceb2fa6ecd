//! Wallet session.
//!
//! A [`WalletProvider`] is the injected wallet: it answers account, network and
//! balance requests and holds the signing keys. [`WalletSession`] is the
//! connected identity derived from it.

use std::rc::Rc;

use log::{debug, info};
use serde::{Serialize, Serializer};
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey, signature::Keypair};

use crate::error::{BallotError, Result, WalletError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletRequest {
    /// Ask the user to authorize accounts. May prompt.
    RequestAccounts,
    /// Accounts already authorized. Never prompts.
    Accounts,
    ChainId,
    Balance(Pubkey),
}

impl WalletRequest {
    pub fn method(&self) -> &'static str {
        match self {
            WalletRequest::RequestAccounts => "request_accounts",
            WalletRequest::Accounts => "accounts",
            WalletRequest::ChainId => "chain_id",
            WalletRequest::Balance(_) => "get_balance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletResponse {
    Accounts(Vec<Pubkey>),
    ChainId(u64),
    /// Native balance in lamports.
    Balance(u64),
}

pub trait WalletProvider {
    fn request(&self, request: WalletRequest) -> Result<WalletResponse, WalletError>;

    /// Signing key for one of the provider's accounts.
    fn signer(&self, address: &Pubkey) -> Result<Rc<Keypair>, WalletError>;
}

fn unexpected(request: &WalletRequest) -> WalletError {
    WalletError::UnexpectedResponse {
        method: request.method(),
    }
}

fn request_accounts(provider: &dyn WalletProvider, request: WalletRequest) -> Result<Vec<Pubkey>, WalletError> {
    match provider.request(request.clone())? {
        WalletResponse::Accounts(accounts) => Ok(accounts),
        _ => Err(unexpected(&request)),
    }
}

fn chain_id(provider: &dyn WalletProvider) -> Result<u64, WalletError> {
    let request = WalletRequest::ChainId;
    match provider.request(request.clone())? {
        WalletResponse::ChainId(id) => Ok(id),
        _ => Err(unexpected(&request)),
    }
}

fn balance(provider: &dyn WalletProvider, address: Pubkey) -> Result<u64, WalletError> {
    let request = WalletRequest::Balance(address);
    match provider.request(request.clone())? {
        WalletResponse::Balance(lamports) => Ok(lamports),
        _ => Err(unexpected(&request)),
    }
}

/// Connected wallet identity. `is_connected()` holds exactly when an address
/// is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    #[serde(serialize_with = "serialize_address")]
    address: Option<Pubkey>,
    chain_id: Option<u64>,
    balance: String,
}

fn serialize_address<S: Serializer>(address: &Option<Pubkey>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match address {
        Some(key) => serializer.collect_str(key),
        None => serializer.serialize_none(),
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self {
            address: None,
            chain_id: None,
            balance: "0".to_string(),
        }
    }

    /// Request account access and derive address, network and balance.
    ///
    /// Returns the session together with the signer used for every later
    /// contract call.
    pub fn connect(provider: Option<&dyn WalletProvider>) -> Result<(Self, Rc<Keypair>)> {
        let provider = provider.ok_or(BallotError::ProviderUnavailable)?;

        let accounts = request_accounts(provider, WalletRequest::RequestAccounts)?;
        let address = *accounts.first().ok_or(WalletError::NoAccounts)?;
        let signer = provider.signer(&address)?;
        let chain_id = chain_id(provider)?;
        let lamports = balance(provider, address)?;

        info!("wallet {} connected on network {}", address, chain_id);
        let session = Self {
            address: Some(address),
            chain_id: Some(chain_id),
            balance: format_sol(lamports),
        };
        Ok((session, signer))
    }

    /// Accounts the provider already authorized, without prompting.
    /// An absent provider has none.
    pub fn authorized_accounts(provider: Option<&dyn WalletProvider>) -> Result<Vec<Pubkey>> {
        let Some(provider) = provider else {
            debug!("no wallet provider, skipping auto-reconnect");
            return Ok(Vec::new());
        };
        Ok(request_accounts(provider, WalletRequest::Accounts)?)
    }

    pub fn address(&self) -> Option<&Pubkey> {
        self.address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Native balance as a decimal SOL string.
    pub fn balance(&self) -> &str {
        &self.balance
    }
}

/// Format lamports as SOL with trailing zeros trimmed: `1.5`, `0.0`, `12.000000001`.
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let fraction = lamports % LAMPORTS_PER_SOL;
    if fraction == 0 {
        return format!("{whole}.0");
    }
    let digits = format!("{fraction:09}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
