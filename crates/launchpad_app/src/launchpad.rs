//! The launchpad orchestrator: create, buy, and decrypt flows over an
//! injected wallet session and encryption instance.
//!
//! Every flow reports its outcome twice: as the returned `Result`, and as the
//! status line in [`LaunchpadState`]. Failures are logged and never retried.

use std::sync::Arc;

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, B256, U256};
use launchpad_chain::{FactoryContract, TokenContract, WalletSession, purchase_cost};
use launchpad_core::{DEFAULT_SUPPLY, LaunchpadError};
use launchpad_fhe::{
    DEFAULT_DURATION_DAYS, EncryptionSdk, HandleContractPair, InstanceProvider, InstanceStatus,
    UserDecryptRequest, unix_now,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::balances::{BalanceHandle, fetch_balances};
use crate::catalog::{CatalogToken, fetch_catalog};
use crate::inflight::{FlowKind, InFlightRegistry};
use crate::state::{CreateForm, LaunchpadState};

pub const FACTORY_NOT_CONFIGURED: &str = "Set a deployed factory address to create tokens.";
const PREPARING: &str = "Preparing transaction...";
const CREATED: &str = "Token created on-chain.";
const CREATE_IN_PROGRESS: &str = "A token creation is already in progress.";
const NAME_AND_SYMBOL_REQUIRED: &str = "Name and symbol are required";
const PRICE_MUST_BE_POSITIVE: &str = "Price must be positive";
const ENTER_AMOUNT: &str = "Enter an amount greater than zero.";
const CONNECT_TO_BUY: &str = "Connect a wallet to buy tokens.";
const PURCHASE_CONFIRMED: &str = "Purchase confirmed.";
const INSTANCE_NOT_READY: &str = "Encryption instance is not ready yet.";
const CONNECT_TO_DECRYPT: &str = "Connect a wallet to decrypt balances.";

pub struct Launchpad {
    factory: Address,
    wallet: WalletSession,
    instances: Arc<InstanceProvider>,
    inflight: InFlightRegistry,
    state: Mutex<LaunchpadState>,
}

/// Clears `creating` when the create flow ends, however it ends.
struct CreatingFlag<'a>(&'a Launchpad);

impl Drop for CreatingFlag<'_> {
    fn drop(&mut self) {
        self.0.with_state(|s| s.creating = false);
    }
}

impl Launchpad {
    pub fn new(factory: Address, wallet: WalletSession, instances: Arc<InstanceProvider>) -> Self {
        Self {
            factory,
            wallet,
            instances,
            inflight: InFlightRegistry::new(),
            state: Mutex::new(LaunchpadState::new()),
        }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn factory_configured(&self) -> bool {
        self.factory != Address::ZERO
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn inflight(&self) -> &InFlightRegistry {
        &self.inflight
    }

    /// A copy of the current state with the in-flight sets filled in.
    pub fn snapshot(&self) -> LaunchpadState {
        let mut state = self.state.lock().clone();
        state.buying = self.inflight.tokens_in_flight(FlowKind::Buy);
        state.decrypting = self.inflight.tokens_in_flight(FlowKind::Decrypt);
        state
    }

    pub fn status(&self) -> Option<String> {
        self.state.lock().status_message.clone()
    }

    pub fn update_form(&self, f: impl FnOnce(&mut CreateForm)) {
        self.with_state(|s| f(&mut s.form));
    }

    pub fn set_buy_amount(&self, token: Address, amount: impl Into<String>) {
        let amount = amount.into();
        self.with_state(|s| {
            s.buy_amounts.insert(token, amount);
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut LaunchpadState) -> R) -> R {
        f(&mut *self.state.lock())
    }

    fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|s| s.status_message = Some(message));
    }

    /// Surface a failure on the status line and in the log.
    fn report(&self, err: LaunchpadError) -> LaunchpadError {
        let message = err.user_message();
        error!(category = ?err.category(), "{message}");
        self.set_status(message);
        err
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Refetch the catalog and replace it wholesale.
    pub async fn refresh_catalog(&self) -> Result<Vec<CatalogToken>, LaunchpadError> {
        if !self.factory_configured() {
            self.set_status(FACTORY_NOT_CONFIGURED);
            return Ok(Vec::new());
        }

        self.with_state(|s| s.catalog_loading = true);
        let result = fetch_catalog(self.wallet.rpc(), self.factory).await;
        self.with_state(|s| s.catalog_loading = false);

        match result {
            Ok(catalog) => {
                let catalog = catalog.unwrap_or_default();
                self.with_state(|s| s.catalog = catalog.clone());
                Ok(catalog)
            }
            Err(e) => {
                warn!(factory = %self.factory, "catalog refresh failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Refetch balance handles for the current catalog.
    pub async fn refresh_balances(&self) -> Vec<BalanceHandle> {
        let tokens = self.with_state(|s| {
            s.balances_loading = true;
            s.catalog.clone()
        });
        let handles = fetch_balances(self.wallet.rpc(), self.wallet.account(), &tokens).await;
        self.with_state(|s| {
            s.balances = handles.clone();
            s.balances_loading = false;
        });
        handles
    }

    pub async fn refresh(&self) -> Result<(), LaunchpadError> {
        self.refresh_catalog().await?;
        self.refresh_balances().await;
        Ok(())
    }

    /// Start (or finish) initialising the encryption instance.
    pub async fn prepare_encryption(&self) -> InstanceStatus {
        if let Err(e) = self.instances.get_or_init().await {
            warn!("encryption instance unavailable: {e}");
        }
        self.instances.status()
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Submit the create form. Returns the transaction hash once mined.
    pub async fn create_token(&self) -> Result<B256, LaunchpadError> {
        if !self.factory_configured() {
            return Err(self.report(LaunchpadError::Precondition(
                FACTORY_NOT_CONFIGURED.into(),
            )));
        }

        let already_creating = self.with_state(|s| std::mem::replace(&mut s.creating, true));
        if already_creating {
            return Err(self.report(LaunchpadError::Precondition(CREATE_IN_PROGRESS.into())));
        }
        let _creating = CreatingFlag(self);
        self.set_status(PREPARING);

        let form = self.with_state(|s| s.form.clone());
        match self.submit_create(&form).await {
            Ok(hash) => {
                self.with_state(|s| {
                    s.status_message = Some(CREATED.into());
                    s.form.clear_retaining_price();
                });
                if let Err(e) = self.refresh_catalog().await {
                    warn!("catalog refresh after create failed: {e}");
                }
                Ok(hash)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn submit_create(&self, form: &CreateForm) -> Result<B256, LaunchpadError> {
        let signer = self.wallet.signer()?;

        let name = form.name.trim();
        let symbol = form.symbol.trim();
        let supply = parse_supply(&form.supply)?;
        let price = parse_price(&form.price)?;

        if name.is_empty() || symbol.is_empty() {
            return Err(LaunchpadError::Precondition(NAME_AND_SYMBOL_REQUIRED.into()));
        }
        if price.is_zero() {
            return Err(LaunchpadError::Precondition(PRICE_MUST_BE_POSITIVE.into()));
        }

        let tx = FactoryContract::new(self.factory).create_token_tx(signer, name, symbol, supply, price);
        let hash = self.wallet.send_transaction(&tx).await?;
        info!(tx = %hash, symbol, supply, price = %price, "createToken submitted");
        self.set_status(format!("Submitting createToken... {hash}"));

        let receipt = self.wallet.wait_for_receipt(hash).await?;
        info!(tx = %hash, block = receipt.block(), "createToken confirmed");
        Ok(hash)
    }

    // -----------------------------------------------------------------------
    // Buy
    // -----------------------------------------------------------------------

    /// Buy the amount entered for `token`, paying exactly amount × price.
    pub async fn buy_token(&self, token: Address) -> Result<B256, LaunchpadError> {
        let (entry, amount_input) =
            self.with_state(|s| (s.token(token).cloned(), s.buy_amount(token).to_string()));
        let Some(entry) = entry else {
            return Err(self.report(LaunchpadError::Precondition(format!(
                "Token {token} is not in the catalog."
            ))));
        };

        let amount = match amount_input.trim().parse::<u64>() {
            Ok(amount) if amount > 0 => amount,
            _ => return Err(self.report(LaunchpadError::Precondition(ENTER_AMOUNT.into()))),
        };
        let Some(signer) = self.wallet.account() else {
            return Err(self.report(LaunchpadError::Wallet(CONNECT_TO_BUY.into())));
        };
        let Some(cost) = purchase_cost(entry.price_per_token, amount) else {
            return Err(self.report(LaunchpadError::Precondition(format!(
                "Cost of {amount} {} overflows.",
                entry.symbol
            ))));
        };

        let Some(guard) = self.inflight.try_begin(token, FlowKind::Buy) else {
            return Err(self.report(LaunchpadError::Precondition(
                FlowKind::Buy.busy_message(&entry.symbol),
            )));
        };
        debug!(token = %token, request = %guard.request(), amount, "buy started");
        self.set_status(format!("Buying {amount} {}...", entry.symbol));

        let tx = TokenContract::new(token).buy_tx(signer, amount, cost);
        let submitted = async {
            let hash = self.wallet.send_transaction(&tx).await?;
            debug!(token = %token, tx = %hash, amount, cost = %cost, "buy submitted");
            self.wallet.wait_for_receipt(hash).await?;
            Ok::<_, LaunchpadError>(hash)
        }
        .await;

        match submitted {
            Ok(hash) => {
                info!(token = %token, tx = %hash, amount, "purchase confirmed");
                self.set_status(PURCHASE_CONFIRMED);
                let (catalog, _) = tokio::join!(self.refresh_catalog(), self.refresh_balances());
                if let Err(e) = catalog {
                    warn!("catalog refresh after purchase failed: {e}");
                }
                Ok(hash)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Decrypt
    // -----------------------------------------------------------------------

    /// Decrypt the connected account's balance of `token`.
    ///
    /// Every call generates a fresh keypair and asks for a fresh signature.
    pub async fn decrypt_balance(&self, token: Address) -> Result<U256, LaunchpadError> {
        let Some(sdk) = self.instances.instance() else {
            return Err(self.report(LaunchpadError::Precondition(INSTANCE_NOT_READY.into())));
        };
        let Some(user) = self.wallet.account() else {
            return Err(self.report(LaunchpadError::Wallet(CONNECT_TO_DECRYPT.into())));
        };

        let (entry, handle) = self.with_state(|s| (s.token(token).cloned(), s.handle_for(token)));
        let Some(entry) = entry else {
            return Err(self.report(LaunchpadError::Precondition(format!(
                "Token {token} is not in the catalog."
            ))));
        };
        let Some(handle) = handle else {
            return Err(self.report(LaunchpadError::Precondition(format!(
                "No encrypted balance to decrypt for {}.",
                entry.symbol
            ))));
        };

        let Some(guard) = self.inflight.try_begin(token, FlowKind::Decrypt) else {
            return Err(self.report(LaunchpadError::Precondition(
                FlowKind::Decrypt.busy_message(&entry.symbol),
            )));
        };
        debug!(token = %token, request = %guard.request(), "decrypt started");

        match self.user_decrypt(&*sdk, token, handle, user).await {
            Ok(value) => {
                info!(token = %token, "balance decrypted");
                self.with_state(|s| {
                    s.decrypted.insert(token, value);
                    s.status_message = Some(format!("Decrypted balance for {}: {value}", entry.symbol));
                });
                Ok(value)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn user_decrypt(
        &self,
        sdk: &dyn EncryptionSdk,
        token: Address,
        handle: B256,
        user: Address,
    ) -> Result<U256, LaunchpadError> {
        let keypair = sdk.generate_keypair();
        let start_timestamp = unix_now();
        let contract_addresses = vec![token];

        let typed_data = sdk.create_eip712(
            &keypair.public_key(),
            &contract_addresses,
            start_timestamp,
            DEFAULT_DURATION_DAYS,
        );
        let signature = self.wallet.sign_typed_data(&typed_data.to_json()).await?;

        let request = UserDecryptRequest {
            handles: vec![HandleContractPair {
                handle,
                contract_address: token,
            }],
            keypair,
            signature: signature.trim_start_matches("0x").to_string(),
            contract_addresses,
            user_address: user,
            start_timestamp,
            duration_days: DEFAULT_DURATION_DAYS,
        };
        let values = sdk.user_decrypt(request).await?;
        Ok(values.get(&handle).copied().unwrap_or(U256::ZERO))
    }
}

impl std::fmt::Debug for Launchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launchpad")
            .field("factory", &self.factory)
            .field("wallet", &self.wallet)
            .field("instances", &self.instances)
            .finish()
    }
}

/// Blank means [`DEFAULT_SUPPLY`].
fn parse_supply(input: &str) -> Result<u64, LaunchpadError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(DEFAULT_SUPPLY);
    }
    input
        .parse::<u64>()
        .map_err(|_| LaunchpadError::Precondition(format!("Invalid supply: {input}")))
}

/// Decimal native units to wei. Blank is zero.
fn parse_price(input: &str) -> Result<U256, LaunchpadError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(U256::ZERO);
    }
    // parse_ether wraps negatives into two's complement.
    if input.starts_with('-') {
        return Err(LaunchpadError::Precondition(PRICE_MUST_BE_POSITIVE.into()));
    }
    parse_ether(input).map_err(|_| LaunchpadError::Precondition(format!("Invalid price: {input}")))
}
