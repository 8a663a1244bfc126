use std::sync::{Arc, LazyLock};

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{error, info, warn};

use murmur_db::models::UserRow;
use murmur_db::{Database, DbError};
use murmur_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use murmur_types::models::User;

use crate::error::ApiError;
use crate::validation::{validate_login, validate_registration};
use crate::{parse_db_timestamp, run_blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self { db })
    }
}

// Fixed Argon2id work factor: 19 MiB, 2 passes, 1 lane.
const ARGON2_M_COST_KIB: u32 = 19 * 1024;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

fn password_hasher() -> Result<Argon2<'static>, ApiError> {
    let params = Params::new(ARGON2_M_COST_KIB, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(|e| ApiError::Internal(format!("Invalid Argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

// Verified against when the username is unknown, so both login failures
// cost one full Argon2id verify.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("murmur-no-such-user").unwrap_or_else(|e| {
        error!("Could not build dummy password hash: {}", e);
        String::new()
    })
});

/// False for a wrong password and for a stored hash that cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Unparsable password hash in store: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Login check. With no stored hash the password is still run through the
/// verifier, and the result is always false.
fn credentials_match(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let _ = verify_password(password, &DUMMY_HASH);
            false
        }
    }
}

pub async fn register(
    state: &AppState,
    req: RegisterRequest,
) -> Result<RegisterResponse, ApiError> {
    let req = validate_registration(req)?;
    let username = req.username.clone();

    // Hashing is CPU-bound, so it runs on the blocking pool with the insert
    let user_id = run_blocking(state, move |db| {
        let password_hash = hash_password(&req.password)?;

        match db.create_user(
            &req.username,
            &req.email,
            &password_hash,
            req.profile_image.as_deref(),
        ) {
            Ok(id) => Ok(id),
            Err(DbError::UniqueViolation(raw)) => {
                warn!("Registration rejected for '{}': {}", req.username, raw);
                Err(ApiError::AccountExists)
            }
            Err(e) => {
                error!("Registration error: {}", e);
                Err(e.into())
            }
        }
    })
    .await?;

    info!("Registered user '{}' (id {})", username, user_id);
    Ok(RegisterResponse { user_id })
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoginResponse, ApiError> {
    let req = validate_login(req)?;

    let user = run_blocking(state, move |db| {
        let row = db.get_user_by_username(&req.username).map_err(|e| {
            error!("Login error: {}", e);
            ApiError::from(e)
        })?;

        if !credentials_match(&req.password, row.as_ref().map(|r| r.password.as_str())) {
            return Err(ApiError::InvalidCredentials);
        }

        match row {
            Some(row) => Ok(user_from_row(row)),
            None => Err(ApiError::InvalidCredentials),
        }
    })
    .await?;

    info!("User '{}' logged in", user.username);
    Ok(LoginResponse { user })
}

/// Drops the password hash.
fn user_from_row(row: UserRow) -> User {
    let created_at = parse_db_timestamp(&row.created_at, &format!("user {}", row.id));
    User {
        id: row.id,
        username: row.username,
        email: row.email,
        profile_image: row.profile_image,
        created_at,
    }
}
