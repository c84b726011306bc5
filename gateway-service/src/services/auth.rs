//! Sign-in, session issuance and per-request session resolution.

use chrono::Duration;
use std::sync::Arc;

use super::audit::SecurityAuditService;
use super::directory::UserDirectory;
use super::enrichment::SessionEnrichmentService;
use super::error::{GatewayError, StoreError};
use super::identity_provider::IdentityProvider;
use super::metrics;
use super::role_policy::RoleAssignmentPolicy;
use super::sessions::SessionStore;
use super::validator::{IdentityValidator, VerifiedIdentity};
use crate::models::{
    IdentityAssertion, IssuedSession, NewUser, ProviderCallback, SessionRecord, SignInRejection, User,
};
use crate::utils::{generate_token, hash_token};

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    validator: IdentityValidator,
    policy: RoleAssignmentPolicy,
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    enrichment: SessionEnrichmentService,
    audit: SecurityAuditService,
    session_max_age: Duration,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        validator: IdentityValidator,
        policy: RoleAssignmentPolicy,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        enrichment: SessionEnrichmentService,
        audit: SecurityAuditService,
        session_max_age: Duration,
    ) -> Self {
        Self {
            provider,
            validator,
            policy,
            directory,
            sessions,
            enrichment,
            audit,
            session_max_age,
        }
    }

    /// Complete a provider redirect: fetch the assertion, then sign in.
    pub async fn sign_in_with_provider(
        &self,
        callback: ProviderCallback,
    ) -> Result<IssuedSession, GatewayError> {
        let assertion = match self.provider.validate_and_fetch_profile(callback).await {
            Ok(assertion) => assertion,
            Err(e) => {
                metrics::record_sign_in(e.code());
                return Err(e);
            }
        };
        self.sign_in(&assertion).await
    }

    /// Validate an assertion, provision the user on first contact and issue a
    /// session. Rejected assertions never touch the directory.
    pub async fn sign_in(&self, assertion: &IdentityAssertion) -> Result<IssuedSession, GatewayError> {
        let identity = match self.validator.validate(assertion) {
            Ok(identity) => identity,
            Err(reason) => {
                metrics::record_sign_in(reason.as_str());
                self.audit
                    .sign_in_rejected(SignInRejection::new(
                        assertion.email.trim().to_lowercase(),
                        assertion.provider.clone(),
                        reason,
                    ))
                    .await;
                return Err(reason.into());
            }
        };

        let result = match self.provision(&identity).await {
            Ok(_) => self.issue(&identity.email).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(issued) => {
                metrics::record_sign_in("success");
                tracing::info!(
                    user_id = %issued.record.snapshot.user_id,
                    role = %issued.record.snapshot.role,
                    "Session issued"
                );
            }
            Err(e) => metrics::record_sign_in(e.code()),
        }
        result
    }

    /// Find the directory record, creating it on first contact. A concurrent
    /// creator winning the race is not an error: the record is looked up again.
    async fn provision(&self, identity: &VerifiedIdentity) -> Result<User, GatewayError> {
        if let Some(user) = self.directory.find_by_email(&identity.email).await? {
            return Ok(user);
        }

        let assignment = self.policy.assign(&identity.email);
        let new_user = NewUser {
            email: identity.email.clone(),
            display_name: identity.name.clone(),
            avatar_url: identity.picture.clone(),
            role: assignment.role,
            title: assignment.title,
            expertise: assignment.expertise,
            department: assignment.department,
        };

        match self.directory.create(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, role = %user.role, "Provisioned new user");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                tracing::debug!("Concurrent first sign-in; re-reading directory record");
                self.directory
                    .find_by_email(&identity.email)
                    .await?
                    .ok_or(GatewayError::DirectoryConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn issue(&self, email: &str) -> Result<IssuedSession, GatewayError> {
        let snapshot = self.enrichment.enrich(email).await?;
        let token = generate_token();
        let record = SessionRecord::new(hash_token(&token), snapshot, self.session_max_age);
        self.sessions.insert(record.clone()).await?;
        Ok(IssuedSession { token, record })
    }

    /// Resolve a presented token.
    ///
    /// Expired sessions are deleted and reported as `SessionExpired`. The
    /// owning account is re-checked on every call: a deleted account ends the
    /// session, an inactive one ends it too but the record is still returned
    /// once with `is_active` cleared so callers can tell the two apart.
    pub async fn resolve(&self, token: &str) -> Result<SessionRecord, GatewayError> {
        let token_hash = hash_token(token);
        let mut record = self
            .sessions
            .find(&token_hash)
            .await?
            .ok_or(GatewayError::Unauthenticated)?;

        if record.is_expired() {
            self.sessions.delete(&token_hash).await?;
            return Err(GatewayError::SessionExpired);
        }

        match self.directory.find_by_id(record.snapshot.user_id).await? {
            None => {
                self.sessions.delete(&token_hash).await?;
                Err(GatewayError::Unauthenticated)
            }
            Some(user) if !user.is_active => {
                tracing::info!(user_id = %user.user_id, "Invalidating session of inactive account");
                self.sessions.delete(&token_hash).await?;
                record.snapshot.is_active = false;
                Ok(record)
            }
            Some(_) => Ok(record),
        }
    }

    /// Re-enrich from the directory and rotate the token. The old token stops
    /// working.
    pub async fn refresh(&self, token: &str) -> Result<IssuedSession, GatewayError> {
        let current = self.resolve(token).await?;
        if !current.snapshot.is_active {
            return Err(GatewayError::AccountInactive);
        }

        let issued = self.issue(&current.snapshot.email).await?;
        self.sessions.delete(&current.token_hash_text).await?;
        Ok(issued)
    }

    /// Destroy the session behind `token`. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), GatewayError> {
        self.sessions.delete(&hash_token(token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserUpdate};
    use crate::services::{
        InMemoryAuditSink, InMemorySessionStore, InMemoryUserDirectory, MockIdentityProvider,
        PermissionCatalog,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Directory that reports the first `hidden_lookups` email lookups as
    /// misses, as if another sign-in created the record in between.
    struct RacingDirectory {
        inner: Arc<InMemoryUserDirectory>,
        hidden_lookups: AtomicUsize,
    }

    #[async_trait]
    impl UserDirectory for RacingDirectory {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let hidden = self
                .hidden_lookups
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hidden {
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(user_id).await
        }

        async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
            self.inner.create(new_user).await
        }

        async fn update(&self, user_id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError> {
            self.inner.update(user_id, update).await
        }
    }

    async fn racing(hidden_lookups: usize) -> (AuthService, Arc<InMemoryUserDirectory>, Uuid) {
        let inner = Arc::new(InMemoryUserDirectory::new());
        let existing = auth_service(
            inner.clone(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryAuditSink::new()),
        )
        .sign_in(&assertion("new.person@hylur.net", true))
        .await
        .unwrap()
        .record
        .snapshot
        .user_id;

        let directory = Arc::new(RacingDirectory {
            inner: inner.clone(),
            hidden_lookups: AtomicUsize::new(hidden_lookups),
        });
        let auth = auth_service(
            directory,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryAuditSink::new()),
        );
        (auth, inner, existing)
    }

    struct Harness {
        auth: AuthService,
        directory: Arc<InMemoryUserDirectory>,
        sessions: Arc<InMemorySessionStore>,
        audit: Arc<InMemoryAuditSink>,
    }

    fn auth_service(
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<InMemorySessionStore>,
        audit: Arc<InMemoryAuditSink>,
    ) -> AuthService {
        let enrichment =
            SessionEnrichmentService::new(directory.clone(), Arc::new(PermissionCatalog::standard()));
        AuthService::new(
            Arc::new(MockIdentityProvider::new()),
            IdentityValidator::new("hylur.net"),
            RoleAssignmentPolicy::new("hylur.net"),
            directory,
            sessions,
            enrichment,
            SecurityAuditService::new(audit),
            Duration::hours(24),
        )
    }

    fn harness() -> Harness {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let auth = auth_service(directory.clone(), sessions.clone(), audit.clone());
        Harness {
            auth,
            directory,
            sessions,
            audit,
        }
    }

    fn assertion(email: &str, verified: bool) -> IdentityAssertion {
        IdentityAssertion {
            email: email.to_string(),
            email_verified: verified,
            name: Some("Someone".to_string()),
            picture: None,
            provider: "google".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejection_is_audited_without_directory_write() {
        let h = harness();
        let res = h.auth.sign_in(&assertion("client@otherco.com", true)).await;

        assert!(matches!(res, Err(GatewayError::DomainRejected)));
        assert!(h.directory.is_empty());
        assert!(h.sessions.is_empty());
        let audit = h.audit.rejections();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].email, "client@otherco.com");
    }

    #[tokio::test]
    async fn test_second_sign_in_reuses_record() {
        let h = harness();
        let first = h.auth.sign_in(&assertion("new.person@hylur.net", true)).await.unwrap();
        let second = h.auth.sign_in(&assertion("new.person@hylur.net", true)).await.unwrap();

        assert_eq!(h.directory.len(), 1);
        assert_eq!(first.record.snapshot.user_id, second.record.snapshot.user_id);
        assert_eq!(first.record.snapshot.role, Role::Guest);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn test_losing_a_creation_race_reuses_the_winner() {
        let (auth, directory, existing) = racing(1).await;

        let issued = auth.sign_in(&assertion("new.person@hylur.net", true)).await.unwrap();
        assert_eq!(issued.record.snapshot.user_id, existing);
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_creation_race_without_a_winner_fails() {
        let (auth, directory, _) = racing(2).await;

        let res = auth.sign_in(&assertion("new.person@hylur.net", true)).await;
        assert!(matches!(res, Err(GatewayError::DirectoryConflict)));
        assert_eq!(directory.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let h = harness();
        let issued = h.auth.sign_in(&assertion("a@hylur.net", true)).await.unwrap();

        let mut stale = issued.record.clone();
        stale.expiry_utc = stale.created_utc - Duration::seconds(1);
        h.sessions.insert(stale).await.unwrap();

        assert!(matches!(
            h.auth.resolve(&issued.token).await,
            Err(GatewayError::SessionExpired)
        ));
        assert!(h.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_role_change_reaches_new_sessions_only() {
        let h = harness();
        let old = h.auth.sign_in(&assertion("a@hylur.net", true)).await.unwrap();
        h.directory
            .update(
                old.record.snapshot.user_id,
                UserUpdate {
                    role: Some(Role::Coo),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let still_old = h.auth.resolve(&old.token).await.unwrap();
        assert_eq!(still_old.snapshot.role, Role::Guest);
        assert_eq!(still_old.snapshot.permissions, old.record.snapshot.permissions);

        let refreshed = h.auth.refresh(&old.token).await.unwrap();
        assert_eq!(refreshed.record.snapshot.role, Role::Coo);
        assert!(matches!(
            h.auth.resolve(&old.token).await,
            Err(GatewayError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_deactivation_invalidates_session() {
        let h = harness();
        let issued = h.auth.sign_in(&assertion("a@hylur.net", true)).await.unwrap();
        h.directory
            .update(
                issued.record.snapshot.user_id,
                UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let record = h.auth.resolve(&issued.token).await.unwrap();
        assert!(!record.snapshot.is_active);
        assert!(h.sessions.is_empty());
        assert!(matches!(
            h.auth.sign_in(&assertion("a@hylur.net", true)).await,
            Err(GatewayError::AccountInactive)
        ));
    }
}
