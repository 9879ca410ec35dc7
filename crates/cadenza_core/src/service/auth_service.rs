//! Registration and login use-cases.
//!
//! # Responsibility
//! - Enforce user name and password policy before anything is stored.
//! - Hash passwords with PBKDF2-HMAC-SHA256 and a per-user random salt.
//! - Verify logins against the cost recorded in each stored hash.
//!
//! # Invariants
//! - Plaintext passwords never reach the repository or the logs.
//! - Stored hashes use the `pbkdf2:sha256:<rounds>$<salt-hex>$<key-hex>`
//!   layout, so raising `DEFAULT_PBKDF2_ROUNDS` never breaks old hashes.

use crate::model::listener::{normalize_user_name, NewUser, User};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Display, Formatter};

const HASH_SCHEME: &str = "pbkdf2:sha256";
const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 32;
/// PBKDF2 iteration count for new hashes.
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 600_000;
const MIN_PASSWORD_CHARS: usize = 8;

static USER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.\-]{3,32}$").expect("valid user name regex"));

/// Service error for authentication use-cases.
#[derive(Debug)]
pub enum AuthServiceError {
    /// Requested user name is already registered.
    NameNotUnique(String),
    UnknownUser(String),
    /// Password does not match the stored hash.
    Authentication,
    InvalidUserName(String),
    /// Password violates policy; payload names the failed rule.
    WeakPassword(&'static str),
    Repo(RepoError),
}

impl Display for AuthServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameNotUnique(name) => write!(f, "user name `{name}` is already taken"),
            Self::UnknownUser(name) => write!(f, "user name `{name}` not recognised"),
            Self::Authentication => write!(f, "password does not match user name"),
            Self::InvalidUserName(name) => write!(
                f,
                "invalid user name `{name}`: expected 3-32 chars of a-z, 0-9, `_`, `.`, `-`"
            ),
            Self::WeakPassword(rule) => write!(f, "password rejected: {rule}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type AuthServiceResult<T> = Result<T, AuthServiceError>;

/// Authentication facade over a borrowed repository.
pub struct AuthService<'r, R: CatalogRepository + ?Sized> {
    repo: &'r mut R,
    rounds: u32,
}

impl<'r, R: CatalogRepository + ?Sized> AuthService<'r, R> {
    pub fn new(repo: &'r mut R) -> Self {
        Self::with_rounds(repo, DEFAULT_PBKDF2_ROUNDS)
    }

    /// Uses `rounds` PBKDF2 iterations for newly registered users.
    ///
    /// Existing hashes keep verifying with the rounds recorded in them.
    pub fn with_rounds(repo: &'r mut R, rounds: u32) -> Self {
        Self {
            repo,
            rounds: rounds.max(1),
        }
    }

    /// Registers a new user after policy checks.
    pub fn add_user(&mut self, user_name: &str, password: &str) -> AuthServiceResult<User> {
        let user_name = normalize_user_name(user_name);
        if !USER_NAME_RE.is_match(&user_name) {
            return Err(AuthServiceError::InvalidUserName(user_name));
        }
        check_password_policy(password)?;

        if self.repo.get_user(&user_name)?.is_some() {
            return Err(AuthServiceError::NameNotUnique(user_name));
        }

        let new_user = NewUser::new(&user_name, hash_password_with_rounds(password, self.rounds));
        match self.repo.add_user(&new_user) {
            Ok(user) => {
                info!(
                    "event=user_register module=auth status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(RepoError::Conflict(_)) => Err(AuthServiceError::NameNotUnique(user_name)),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_user(&self, user_name: &str) -> AuthServiceResult<User> {
        self.repo
            .get_user(user_name)?
            .ok_or_else(|| AuthServiceError::UnknownUser(normalize_user_name(user_name)))
    }

    /// Checks credentials and returns the matching user.
    pub fn authenticate_user(&self, user_name: &str, password: &str) -> AuthServiceResult<User> {
        let user = self.get_user(user_name)?;
        if !verify_password(password, &user.password_hash) {
            warn!(
                "event=user_login module=auth status=error user_id={} error_code=bad_credentials",
                user.id
            );
            return Err(AuthServiceError::Authentication);
        }
        info!("event=user_login module=auth status=ok user_id={}", user.id);
        Ok(user)
    }
}

/// Hashes a password with a fresh random salt and `DEFAULT_PBKDF2_ROUNDS`.
pub fn hash_password(password: &str) -> String {
    hash_password_with_rounds(password, DEFAULT_PBKDF2_ROUNDS)
}

/// Hashes a password with a fresh random salt and an explicit cost.
pub fn hash_password_with_rounds(password: &str, rounds: u32) -> String {
    let rounds = rounds.max(1);
    let salt_hex = hex::encode(rand::random::<[u8; SALT_BYTES]>());
    let key_hex = derive_key_hex(password, &salt_hex, rounds);
    format!("{HASH_SCHEME}:{rounds}${salt_hex}${key_hex}")
}

/// Verifies a password against a hash produced by [`hash_password`].
///
/// Malformed or foreign hashes never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some(method), Some(salt_hex), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Some(rounds) = method
        .strip_prefix(HASH_SCHEME)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|rounds| rounds.parse::<u32>().ok())
        .filter(|rounds| *rounds > 0)
    else {
        return false;
    };
    if salt_hex.is_empty() {
        return false;
    }
    constant_time_eq(
        derive_key_hex(password, salt_hex, rounds).as_bytes(),
        expected.as_bytes(),
    )
}

/// Password policy: minimum length plus upper, lower and digit classes.
pub fn check_password_policy(password: &str) -> AuthServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthServiceError::WeakPassword("must be at least 8 characters"));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthServiceError::WeakPassword(
            "must contain an upper case letter",
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthServiceError::WeakPassword(
            "must contain a lower case letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthServiceError::WeakPassword("must contain a digit"));
    }
    Ok(())
}

fn derive_key_hex(password: &str, salt_hex: &str, rounds: u32) -> String {
    let mut key = [0u8; KEY_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt_hex.as_bytes(), rounds, &mut key);
    hex::encode(key)
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0u8, |acc, (l, r)| acc | (l ^ r))
            == 0
}
