//! Lazily initialised, shared encryption instance.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use launchpad_core::RelayerConfig;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::EncryptionSdk;
use crate::error::SdkError;
use crate::relayer::RelayerSdk;

type InitFn =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EncryptionSdk>, SdkError>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl InstanceStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Builds the [`EncryptionSdk`] on first use and hands out the same instance
/// afterwards. A failed initialisation is retried on the next call.
pub struct InstanceProvider {
    cell: OnceCell<Arc<dyn EncryptionSdk>>,
    init: InitFn,
    status: Mutex<InstanceStatus>,
}

impl InstanceProvider {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn EncryptionSdk>, SdkError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(init),
            status: Mutex::new(InstanceStatus::Uninitialized),
        }
    }

    /// Provider backed by the decryption relayer.
    pub fn relayer(config: RelayerConfig, timeout: Duration) -> Self {
        Self::new(move || {
            let config = config.clone();
            Box::pin(async move {
                let sdk = RelayerSdk::connect(config, timeout).await?;
                Ok(Arc::new(sdk) as Arc<dyn EncryptionSdk>)
            })
        })
    }

    /// Provider around an instance that is already initialised.
    pub fn ready(sdk: Arc<dyn EncryptionSdk>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(sdk)),
            init: Box::new(|| Box::pin(async { Err(SdkError::NotReady) })),
            status: Mutex::new(InstanceStatus::Ready),
        }
    }

    pub async fn get_or_init(&self) -> Result<Arc<dyn EncryptionSdk>, SdkError> {
        if let Some(sdk) = self.cell.get() {
            return Ok(Arc::clone(sdk));
        }

        *self.status.lock() = InstanceStatus::Loading;
        let result = self.cell.get_or_try_init(|| (self.init)()).await;
        match result {
            Ok(sdk) => {
                *self.status.lock() = InstanceStatus::Ready;
                info!("encryption instance initialised");
                Ok(Arc::clone(sdk))
            }
            Err(e) => {
                error!("encryption instance failed to initialise: {e}");
                *self.status.lock() = InstanceStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The instance, if it has finished initialising. Never starts init.
    pub fn instance(&self) -> Option<Arc<dyn EncryptionSdk>> {
        self.cell.get().cloned()
    }

    pub fn status(&self) -> InstanceStatus {
        self.status.lock().clone()
    }
}

impl std::fmt::Debug for InstanceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceProvider")
            .field("status", &*self.status.lock())
            .finish()
    }
}
