pub mod config;
pub mod error;
pub mod logging;
pub mod network;

pub use config::{LaunchpadConfig, RelayerConfig, validate_url};
pub use error::{ErrorCategory, LaunchpadError};
pub use network::{Network, NetworkConfig, get_network_configs};

/// Supply minted for sale when a token is created without an explicit supply.
pub const DEFAULT_SUPPLY: u64 = 1_000_000_000;
