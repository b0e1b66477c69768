use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};

use crate::balances::BalanceHandle;
use crate::catalog::CatalogToken;

/// Price prefilled in the create form, in native units.
pub const DEFAULT_PRICE: &str = "0.001";

// ---------------------------------------------------------------------------
// Create form
// ---------------------------------------------------------------------------

/// Raw input of the create-token form. Values are parsed when submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateForm {
    pub name: String,
    pub symbol: String,
    /// Blank means the default supply.
    pub supply: String,
    /// Decimal native units, e.g. `"0.001"`.
    pub price: String,
}

impl CreateForm {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            supply: String::new(),
            price: DEFAULT_PRICE.to_string(),
        }
    }

    /// Clear the form after a successful create. The price is kept.
    pub fn clear_retaining_price(&mut self) {
        self.name.clear();
        self.symbol.clear();
        self.supply.clear();
    }
}

impl Default for CreateForm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Launchpad state
// ---------------------------------------------------------------------------

/// Everything a front end needs to render the launchpad.
#[derive(Debug, Clone, Default)]
pub struct LaunchpadState {
    pub form: CreateForm,
    pub creating: bool,
    pub status_message: Option<String>,
    pub catalog: Vec<CatalogToken>,
    pub catalog_loading: bool,
    pub balances: Vec<BalanceHandle>,
    pub balances_loading: bool,
    /// Buy-amount input per token.
    pub buy_amounts: HashMap<Address, String>,
    pub decrypted: HashMap<Address, U256>,
    /// Tokens with a purchase in flight. Filled in on snapshot.
    pub buying: HashSet<Address>,
    /// Tokens with a decryption in flight. Filled in on snapshot.
    pub decrypting: HashSet<Address>,
}

impl LaunchpadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self, token: Address) -> Option<&CatalogToken> {
        self.catalog.iter().find(|t| t.token == token)
    }

    /// The decryptable handle for `token`, if the account holds one.
    pub fn handle_for(&self, token: Address) -> Option<B256> {
        self.balances
            .iter()
            .find(|b| b.token == token && b.handle != B256::ZERO)
            .map(|b| b.handle)
    }

    pub fn buy_amount(&self, token: Address) -> &str {
        self.buy_amounts.get(&token).map(String::as_str).unwrap_or("")
    }

    pub fn decrypted_balance(&self, token: Address) -> Option<U256> {
        self.decrypted.get(&token).copied()
    }

    pub fn is_buying(&self, token: Address) -> bool {
        self.buying.contains(&token)
    }

    pub fn is_decrypting(&self, token: Address) -> bool {
        self.decrypting.contains(&token)
    }
}
