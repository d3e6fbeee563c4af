use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{ClearOutcome, CreateUserInput, NewUser, SeedOutcome, User};
use crate::domain::error::DomainError;
use crate::domain::ports::{ExternalUser, SeedSource};
use crate::domain::repo::{RepoError, UsersRepository};
use crate::domain::validation::{validate_create_user, validate_id_param, validate_search_query};

const EMAIL_TAKEN: &str = "User with this email already exists";
const USERNAME_TAKEN: &str = "User with this username already exists";

/// `one` for exactly one item, `many` otherwise (including zero).
pub fn pluralize<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn users_word(count: u64) -> &'static str {
    pluralize(count, "user", "users")
}

/// Wrap a store failure into the caller-facing database error for `message`.
fn store_failure(message: &'static str) -> impl FnOnce(RepoError) -> DomainError {
    move |e| {
        error!(error = %e, "{message}");
        DomainError::database_with_cause(message, e)
    }
}

/// Domain service with the user directory rules.
/// Depends only on the repository and seed source ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    seed: Arc<dyn SeedSource>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>, seed: Arc<dyn SeedSource>) -> Self {
        Self { repo, seed }
    }

    #[instrument(name = "users_info.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Fetching all users");
        let users = self
            .repo
            .find_all()
            .await
            .map_err(store_failure("Failed to fetch users"))?;
        let count = users.len() as u64;
        info!("Successfully fetched {} {}", count, users_word(count));
        Ok(users)
    }

    #[instrument(name = "users_info.service.get_user", skip(self, raw_id), fields(user_id = %raw_id))]
    pub async fn get_user(&self, raw_id: &str) -> Result<User, DomainError> {
        let id = validate_id_param(raw_id)?;
        debug!("Fetching user by id");

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(store_failure("Failed to fetch user"))?
            .ok_or_else(|| {
                warn!("User not found");
                DomainError::not_found("User", id)
            })?;
        debug!("Successfully fetched user");
        Ok(user)
    }

    #[instrument(name = "users_info.service.search_users", skip(self, query), fields(query = ?query))]
    pub async fn search_users(&self, query: Option<&str>) -> Result<Vec<User>, DomainError> {
        let q = validate_search_query(query)?;

        let users = self
            .repo
            .search_by_name(&q)
            .await
            .map_err(store_failure("Failed to search users"))?;
        let count = users.len() as u64;
        info!("Found {} {} for query: {}", count, users_word(count), q);
        Ok(users)
    }

    #[instrument(
        name = "users_info.service.create_user",
        skip(self, input),
        fields(email = ?input.email, username = ?input.username)
    )]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, DomainError> {
        info!("Creating new user");

        let new_user = validate_create_user(input)?;

        if self
            .repo
            .find_by_email(&new_user.email)
            .await
            .map_err(store_failure("Failed to create user"))?
            .is_some()
        {
            warn!(email = %new_user.email, "User creation failed - email already exists");
            return Err(DomainError::conflict(EMAIL_TAKEN));
        }

        if self
            .repo
            .find_by_username(&new_user.username)
            .await
            .map_err(store_failure("Failed to create user"))?
            .is_some()
        {
            warn!(username = %new_user.username, "User creation failed - username already exists");
            return Err(DomainError::conflict(USERNAME_TAKEN));
        }

        // A concurrent insert can still win between the checks and this write;
        // the unique constraints catch it.
        let user = self.repo.insert(new_user).await.map_err(|e| match e {
            RepoError::UniqueViolation { constraint } => {
                warn!(%constraint, "User creation lost a uniqueness race");
                DomainError::conflict(conflict_message(&constraint))
            }
            other => store_failure("Failed to create user")(other),
        })?;

        info!(user_id = user.id, "User created successfully");
        Ok(user)
    }

    /// One-shot import from the external directory into an empty store.
    #[instrument(name = "users_info.service.seed_from_source", skip(self))]
    pub async fn seed_from_source(&self) -> Result<SeedOutcome, DomainError> {
        info!("Starting database seeding from external source");

        let existing = self
            .repo
            .count()
            .await
            .map_err(store_failure("Failed to seed database"))?;
        if existing > 0 {
            warn!(existing_count = existing, "Database seeding skipped - users already exist");
            return Err(DomainError::conflict_with_details(
                "Database already contains users",
                json!({ "existingCount": existing }),
            ));
        }

        let external = self.seed.fetch_users().await.map_err(|e| {
            error!(error = %e, "Database seeding failed");
            DomainError::database_with_cause("Failed to seed database", e)
        })?;
        let fetched = external.len() as u64;
        info!("Fetched {} {} from external source", fetched, users_word(fetched));

        let batch: Vec<NewUser> = external.into_iter().map(from_external).collect();
        let created = self.repo.insert_many(batch).await.map_err(|e| match e {
            RepoError::UniqueViolation { constraint } => {
                warn!(%constraint, "Seed data clashed with existing users");
                DomainError::conflict(conflict_message(&constraint))
            }
            other => store_failure("Failed to seed database")(other),
        })?;

        let count = created.len() as u64;
        info!(created_count = count, "Database seeding completed successfully");
        Ok(SeedOutcome {
            message: format!(
                "Database seeded successfully with {} {}",
                count,
                users_word(count)
            ),
            count,
        })
    }

    #[instrument(name = "users_info.service.clear_all", skip(self))]
    pub async fn clear_all(&self) -> Result<ClearOutcome, DomainError> {
        info!("Clearing all users from database");
        let count = self
            .repo
            .delete_all()
            .await
            .map_err(store_failure("Failed to clear users"))?;
        info!(deleted_count = count, "All users cleared successfully");
        Ok(ClearOutcome {
            message: format!("All {} {} cleared successfully", count, users_word(count)),
            count,
        })
    }

    #[instrument(name = "users_info.service.count_users", skip(self))]
    pub async fn count_users(&self) -> Result<u64, DomainError> {
        let count = self
            .repo
            .count()
            .await
            .map_err(store_failure("Failed to get user count"))?;
        debug!(count, "User count retrieved");
        Ok(count)
    }

    /// Store round-trip used by the health endpoint.
    pub async fn health(&self) -> Result<(), DomainError> {
        self.repo
            .ping()
            .await
            .map_err(store_failure("Database health check failed"))
    }
}

fn conflict_message(constraint: &str) -> &'static str {
    if constraint.contains("username") {
        USERNAME_TAKEN
    } else if constraint.contains("email") {
        EMAIL_TAKEN
    } else {
        "User already exists"
    }
}

/// Trim; blank becomes `None`.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// External records skip the field rules but are stored in canonical form:
/// strings trimmed, email lower-cased, company reduced to its name.
fn from_external(u: ExternalUser) -> NewUser {
    NewUser {
        name: u.name.trim().to_string(),
        email: u.email.trim().to_lowercase(),
        username: u.username.trim().to_string(),
        phone: trimmed(u.phone),
        website: trimmed(u.website),
        company: trimmed(u.company.map(|c| c.name)),
    }
}
