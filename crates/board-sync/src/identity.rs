use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use board_core::config::IdentityConfig;

use crate::error::StoreError;

/// The signed-in user, as far as the board cares: who to stamp on new items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<Identity>, StoreError>;
}

/// A fixed identity, usually read from `board.yaml`.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Identity>);

impl StaticIdentity {
    pub fn new(email: impl Into<String>, full_name: Option<String>) -> Self {
        Self(Some(Identity {
            email: email.into(),
            full_name,
        }))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn from_config(config: Option<&IdentityConfig>) -> Self {
        match config {
            Some(c) => Self::new(c.email.clone(), c.full_name.clone()),
            None => Self::anonymous(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<Identity>, StoreError> {
        Ok(self.0.clone())
    }
}
