//! In-memory chain and encryption SDK shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U64, U256, address, hex, keccak256};
use alloy_sol_types::{SolCall, SolInterface};
use async_trait::async_trait;
use launchpad_app::Launchpad;
use launchpad_chain::contracts::{
    IConfidentialToken::{self, IConfidentialTokenCalls},
    ITokenFactory::{self, ITokenFactoryCalls},
    TokenInfo,
};
use launchpad_chain::{ChainError, EvmRpc, TransactionReceipt, TransactionRequest, WalletSession};
use launchpad_core::DEFAULT_SUPPLY;
use launchpad_fhe::{
    EncryptionSdk, InstanceProvider, SdkError, TypedDataPayload, UserDecryptRequest, unix_now,
};
use parking_lot::Mutex;
use serde_json::Value;

pub const DEPLOYER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BUYER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const FACTORY: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const POLL: Duration = Duration::from_millis(1);

/// One wei in ether-denominated test prices.
pub fn milli_ether() -> U256 {
    U256::from(1_000_000_000_000_000u64)
}

// ---------------------------------------------------------------------------
// FakeChain
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ChainState {
    factory: Option<Address>,
    tokens: Vec<TokenInfo>,
    sale_supply: Vec<u64>,
    /// Current balance handle per (token, holder).
    handles: HashMap<(Address, Address), B256>,
    /// Plaintext behind each handle ever issued.
    plaintexts: HashMap<B256, u64>,
    receipts: HashMap<B256, TransactionReceipt>,
    sent: Vec<TransactionRequest>,
    signed: Vec<Value>,
    block: u64,
    nonce: u64,
}

/// Simulates the factory and its confidential tokens behind [`EvmRpc`].
pub struct FakeChain {
    accounts: Vec<Address>,
    state: Mutex<ChainState>,
    hold_receipts: AtomicBool,
    fail_receipts: AtomicBool,
    reject_signatures: AtomicBool,
    fail_balance_reads: AtomicBool,
}

impl FakeChain {
    /// A chain with no factory deployed.
    pub fn empty(accounts: Vec<Address>) -> Arc<Self> {
        Arc::new(Self {
            accounts,
            state: Mutex::new(ChainState::default()),
            hold_receipts: AtomicBool::new(false),
            fail_receipts: AtomicBool::new(false),
            reject_signatures: AtomicBool::new(false),
            fail_balance_reads: AtomicBool::new(false),
        })
    }

    /// A chain with the factory already at [`FACTORY`].
    pub fn with_factory(accounts: Vec<Address>) -> Arc<Self> {
        let chain = Self::empty(accounts);
        chain.state.lock().factory = Some(FACTORY);
        chain
    }

    pub fn factory(&self) -> Option<Address> {
        self.state.lock().factory
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    pub fn signed(&self) -> Vec<Value> {
        self.state.lock().signed.clone()
    }

    pub fn token(&self, index: usize) -> (TokenInfo, u64) {
        let state = self.state.lock();
        (state.tokens[index].clone(), state.sale_supply[index])
    }

    pub fn token_count(&self) -> usize {
        self.state.lock().tokens.len()
    }

    pub fn plaintext(&self, handle: B256) -> Option<u64> {
        self.state.lock().plaintexts.get(&handle).copied()
    }

    /// Keep every transaction pending until [`FakeChain::release_receipts`].
    pub fn hold_receipts(&self) {
        self.hold_receipts.store(true, Ordering::SeqCst);
    }

    pub fn release_receipts(&self) {
        self.hold_receipts.store(false, Ordering::SeqCst);
    }

    /// Mine every following transaction with status 0 and no state change.
    pub fn fail_receipts(&self, fail: bool) {
        self.fail_receipts.store(fail, Ordering::SeqCst);
    }

    pub fn reject_signatures(&self, reject: bool) {
        self.reject_signatures.store(reject, Ordering::SeqCst);
    }

    pub fn fail_balance_reads(&self, fail: bool) {
        self.fail_balance_reads.store(fail, Ordering::SeqCst);
    }

    fn token_index(state: &ChainState, token: Address) -> Option<usize> {
        state.tokens.iter().position(|t| t.token == token)
    }

    fn execute(&self, state: &mut ChainState, tx: &TransactionRequest) -> Result<Option<Address>, ChainError> {
        let Some(to) = tx.to else {
            let address = Address::from_word(keccak256(tx.data.as_ref()));
            state.factory = Some(address);
            return Ok(Some(address));
        };

        if Some(to) == state.factory {
            let call = ITokenFactoryCalls::abi_decode(&tx.data, true)?;
            let ITokenFactoryCalls::createToken(c) = call else {
                return Err(ChainError::Reverted("not a write method".into()));
            };
            if c.name.is_empty() || c.symbol.is_empty() {
                return Err(ChainError::Reverted("Name and symbol required".into()));
            }
            if c.pricePerToken.is_zero() {
                return Err(ChainError::Reverted("Price must be positive".into()));
            }
            let supply = if c.supply == 0 { DEFAULT_SUPPLY } else { c.supply };
            let index = state.tokens.len() as u64;
            let mut seed = to.to_vec();
            seed.extend_from_slice(&index.to_be_bytes());
            let token = Address::from_word(keccak256(&seed));
            state.tokens.push(TokenInfo {
                token,
                name: c.name,
                symbol: c.symbol,
                maxSupply: supply,
                pricePerToken: c.pricePerToken,
                creator: tx.from,
            });
            state.sale_supply.push(supply);
            return Ok(None);
        }

        let Some(index) = Self::token_index(state, to) else {
            return Err(ChainError::Reverted("no contract at target".into()));
        };
        let IConfidentialTokenCalls::buy(c) = IConfidentialTokenCalls::abi_decode(&tx.data, true)? else {
            return Err(ChainError::Reverted("not a write method".into()));
        };
        if c.amount == 0 {
            return Err(ChainError::Reverted("Amount must be positive".into()));
        }
        let expected = state.tokens[index].pricePerToken * U256::from(c.amount);
        if tx.value.unwrap_or_default() != expected {
            return Err(ChainError::Reverted("Incorrect payment".into()));
        }
        if c.amount > state.sale_supply[index] {
            return Err(ChainError::Reverted("Insufficient supply".into()));
        }
        state.sale_supply[index] -= c.amount;

        let previous = state
            .handles
            .get(&(to, tx.from))
            .and_then(|h| state.plaintexts.get(h))
            .copied()
            .unwrap_or(0);
        let mut seed = to.to_vec();
        seed.extend_from_slice(tx.from.as_slice());
        seed.extend_from_slice(&state.nonce.to_be_bytes());
        let handle = keccak256(&seed);
        state.plaintexts.insert(handle, previous + c.amount);
        state.handles.insert((to, tx.from), handle);
        Ok(None)
    }
}

#[async_trait]
impl EvmRpc for FakeChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(31_337)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.accounts.clone())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let state = self.state.lock();

        if Some(to) == state.factory {
            let encoded = match ITokenFactoryCalls::abi_decode(&data, true)? {
                ITokenFactoryCalls::getCatalog(_) => ITokenFactory::getCatalogCall::abi_encode_returns(
                    &(state.tokens.clone(), state.sale_supply.clone()),
                ),
                ITokenFactoryCalls::tokenCount(_) => ITokenFactory::tokenCountCall::abi_encode_returns(
                    &(U256::from(state.tokens.len()),),
                ),
                ITokenFactoryCalls::getToken(c) => {
                    let index = c.index.to::<usize>();
                    let info = state
                        .tokens
                        .get(index)
                        .cloned()
                        .ok_or_else(|| ChainError::Reverted("index out of bounds".into()))?;
                    ITokenFactory::getTokenCall::abi_encode_returns(&(info,))
                }
                ITokenFactoryCalls::createToken(_) => {
                    return Err(ChainError::Reverted("write method called as view".into()));
                }
            };
            return Ok(encoded.into());
        }

        let Some(index) = Self::token_index(&state, to) else {
            // Calls to an address without code return nothing.
            return Ok(Bytes::new());
        };
        let encoded = match IConfidentialTokenCalls::abi_decode(&data, true)? {
            IConfidentialTokenCalls::pricePerToken(_) => {
                IConfidentialToken::pricePerTokenCall::abi_encode_returns(&(
                    state.tokens[index].pricePerToken,
                ))
            }
            IConfidentialTokenCalls::saleSupply(_) => {
                IConfidentialToken::saleSupplyCall::abi_encode_returns(&(state.sale_supply[index],))
            }
            IConfidentialTokenCalls::confidentialBalanceOf(c) => {
                if self.fail_balance_reads.load(Ordering::SeqCst) {
                    return Err(ChainError::Transport("connection reset".into()));
                }
                let handle = state
                    .handles
                    .get(&(to, c.account))
                    .copied()
                    .unwrap_or(B256::ZERO);
                IConfidentialToken::confidentialBalanceOfCall::abi_encode_returns(&(handle,))
            }
            IConfidentialTokenCalls::buy(_) => {
                return Err(ChainError::Reverted("write method called as view".into()));
            }
        };
        Ok(encoded.into())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        if !self.accounts.contains(&tx.from) {
            return Err(ChainError::Rejected(format!("unknown account {}", tx.from)));
        }
        let mut state = self.state.lock();
        let failed = self.fail_receipts.load(Ordering::SeqCst);
        let contract_address = if failed {
            None
        } else {
            self.execute(&mut state, tx)?
        };

        state.nonce += 1;
        state.block += 1;
        let hash = keccak256(state.nonce.to_be_bytes());
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: U64::from(state.block),
            status: Some(U64::from(u64::from(!failed))),
            contract_address,
            gas_used: U256::from(21_000u64),
        };
        state.receipts.insert(hash, receipt);
        state.sent.push(tx.clone());
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        if self.hold_receipts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.state.lock().receipts.get(&hash).cloned())
    }

    async fn sign_typed_data(
        &self,
        signer: Address,
        typed_data: &Value,
    ) -> Result<String, ChainError> {
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(ChainError::from_rpc(
                4001,
                "MetaMask Tx Signature: User denied message signature.".into(),
                None,
            ));
        }
        if !self.accounts.contains(&signer) {
            return Err(ChainError::Rejected(format!("unknown account {signer}")));
        }
        self.state.lock().signed.push(typed_data.clone());
        let mut signature = keccak256(typed_data.to_string().as_bytes()).to_vec();
        signature.extend_from_slice(keccak256(signer.as_slice()).as_slice());
        signature.push(0x1b);
        Ok(hex::encode_prefixed(signature))
    }
}

// ---------------------------------------------------------------------------
// FakeSdk
// ---------------------------------------------------------------------------

/// Decrypts handles by looking up the plaintext the fake chain recorded.
pub struct FakeSdk {
    chain: Arc<FakeChain>,
    requests: Mutex<Vec<UserDecryptRequest>>,
    fail: AtomicBool,
}

impl FakeSdk {
    pub fn new(chain: Arc<FakeChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            requests: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn requests(&self) -> Vec<UserDecryptRequest> {
        self.requests.lock().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EncryptionSdk for FakeSdk {
    fn create_eip712(
        &self,
        public_key: &[u8],
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> TypedDataPayload {
        TypedDataPayload::new(
            55_815,
            address!("b6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1"),
            public_key,
            contract_addresses,
            start_timestamp,
            duration_days,
        )
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<B256, U256>, SdkError> {
        request.validate(unix_now())?;
        self.requests.lock().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(SdkError::Relayer {
                status: 500,
                body: "gateway unavailable".into(),
            });
        }
        Ok(request
            .handles
            .iter()
            .filter_map(|p| {
                self.chain
                    .plaintext(p.handle)
                    .map(|v| (p.handle, U256::from(v)))
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub chain: Arc<FakeChain>,
    pub sdk: Arc<FakeSdk>,
}

impl Fixture {
    pub fn new() -> Self {
        let chain = FakeChain::with_factory(vec![DEPLOYER, BUYER]);
        let sdk = FakeSdk::new(Arc::clone(&chain));
        Self { chain, sdk }
    }

    pub fn rpc(&self) -> Arc<dyn EvmRpc> {
        Arc::clone(&self.chain) as Arc<dyn EvmRpc>
    }

    pub async fn wallet(&self, account: Address) -> WalletSession {
        WalletSession::connect(self.rpc(), Some(account), POLL)
            .await
            .expect("account is managed by the fake chain")
    }

    pub fn disconnected(&self) -> WalletSession {
        WalletSession::disconnected(self.rpc(), POLL)
    }

    fn instances(&self) -> Arc<InstanceProvider> {
        Arc::new(InstanceProvider::ready(
            Arc::clone(&self.sdk) as Arc<dyn EncryptionSdk>
        ))
    }

    pub async fn launchpad(&self, account: Address) -> Launchpad {
        Launchpad::new(FACTORY, self.wallet(account).await, self.instances())
    }

    pub fn launchpad_with(&self, factory: Address, wallet: WalletSession) -> Launchpad {
        Launchpad::new(factory, wallet, self.instances())
    }

    /// A launchpad whose encryption instance never becomes ready.
    pub async fn launchpad_without_sdk(&self, account: Address) -> Launchpad {
        let instances = Arc::new(InstanceProvider::new(|| {
            Box::pin(async { Err(SdkError::Init("relayer unreachable".into())) })
        }));
        Launchpad::new(FACTORY, self.wallet(account).await, instances)
    }
}

/// Create a token through the orchestrator and return its catalog entry.
pub async fn create_through(
    launchpad: &Launchpad,
    name: &str,
    symbol: &str,
    supply: &str,
    price: &str,
) -> launchpad_app::CatalogToken {
    launchpad.update_form(|f| {
        f.name = name.into();
        f.symbol = symbol.into();
        f.supply = supply.into();
        f.price = price.into();
    });
    launchpad.create_token().await.expect("create succeeds");
    launchpad
        .snapshot()
        .catalog
        .into_iter()
        .find(|t| t.symbol == symbol.trim())
        .expect("created token is listed")
}
