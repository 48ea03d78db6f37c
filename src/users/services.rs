use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{
    model::{normalize_email, Role, User},
    repo::UserRepo,
};
use crate::{
    auth::password::{hash_password, verify_dummy, verify_password},
    config::AdminSeed,
    error::StoreError,
};

/// Credential store: owns normalization and password hashing on top of a `UserRepo`.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepo>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, name: &str, email: &str, password: &str) -> Result<User, StoreError> {
        self.create_with_role(name, email, password, Role::User).await
    }

    async fn create_with_role(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let email = normalize_email(email);
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        let hash = hash_blocking(password).await?;
        // The unique index still catches a concurrent insert of the same email.
        self.repo.insert(name.trim(), &email, &hash, role).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.repo.find_by_email(&normalize_email(email)).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.repo.find_by_id(id).await
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.repo.list().await
    }

    /// Returns the user only when the password matches. Unknown emails still
    /// pay for one hash verification.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = self.find_by_email(email).await?;
        let plain = password.to_owned();
        match user {
            None => {
                tokio::task::spawn_blocking(move || verify_dummy(&plain))
                    .await
                    .map_err(anyhow::Error::from)?;
                Ok(None)
            }
            Some(user) => {
                let hash = user.password_hash.clone();
                let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
                    .await
                    .map_err(anyhow::Error::from)??;
                Ok(ok.then_some(user))
            }
        }
    }

    pub async fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<User, StoreError> {
        let email = normalize_email(email);
        if let Some(existing) = self.repo.find_by_email(&email).await? {
            if existing.id != id {
                return Err(StoreError::DuplicateEmail);
            }
        }
        self.repo.update_profile(id, name.trim(), &email).await
    }

    /// Replaces the digest only.
    pub async fn update_password(&self, id: Uuid, new_password: &str) -> Result<(), StoreError> {
        let hash = hash_blocking(new_password).await?;
        self.repo.update_password(id, &hash).await?;
        debug!(user_id = %id, "password digest replaced");
        Ok(())
    }

    /// `Ok(false)` when `current` does not match the stored digest.
    pub async fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<bool, StoreError> {
        let user = self.repo.find_by_id(id).await?.ok_or(StoreError::NotFound)?;
        let plain = current.to_owned();
        let hash = user.password_hash;
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(anyhow::Error::from)??;
        if !ok {
            return Ok(false);
        }
        self.update_password(id, new_password).await?;
        Ok(true)
    }

    /// Creates the configured admin, or promotes an existing account with that email.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<User, StoreError> {
        match self.find_by_email(&seed.email).await? {
            Some(user) if user.role == Role::Admin => Ok(user),
            Some(user) => {
                info!(user_id = %user.id, "promoting existing user to admin");
                self.repo.set_role(user.id, Role::Admin).await
            }
            None => {
                let user = self
                    .create_with_role(&seed.name, &seed.email, &seed.password, Role::Admin)
                    .await?;
                info!(user_id = %user.id, "bootstrap admin created");
                Ok(user)
            }
        }
    }
}

async fn hash_blocking(plain: &str) -> Result<String, StoreError> {
    let plain = plain.to_owned();
    let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(hash)
}
