//! Sign-in rejection audit trail.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::error::StoreError;
use crate::models::SignInRejection;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_rejection(&self, rejection: &SignInRejection) -> Result<(), StoreError>;
}

/// Sink that keeps rejections in memory.
#[derive(Default)]
pub struct InMemoryAuditSink {
    rejections: Mutex<Vec<SignInRejection>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejections(&self) -> Vec<SignInRejection> {
        self.rejections
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record_rejection(&self, rejection: &SignInRejection) -> Result<(), StoreError> {
        self.rejections
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("audit sink lock poisoned")))?
            .push(rejection.clone());
        Ok(())
    }
}

/// Writes security events to the sink and the log.
#[derive(Clone)]
pub struct SecurityAuditService {
    sink: Arc<dyn AuditSink>,
}

impl SecurityAuditService {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record a refused sign-in. A failed audit write is logged and does not
    /// change the outcome of the sign-in.
    pub async fn sign_in_rejected(&self, rejection: SignInRejection) {
        tracing::warn!(
            email = %rejection.email,
            provider = %rejection.provider,
            reason = rejection.reason.as_str(),
            "Sign-in rejected"
        );
        if let Err(e) = self.sink.record_rejection(&rejection).await {
            tracing::error!(
                error = %e,
                reason = rejection.reason.as_str(),
                "Failed to write sign-in rejection audit record"
            );
        }
    }
}
