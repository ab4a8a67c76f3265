//! Registered users and their credentials.
//!
//! Passwords are stored as bcrypt hashes; the hash never leaves this module.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ulid::Ulid;

use crate::limits::*;

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone)]
struct User {
    id: Ulid,
    /// Registration order.
    seq: u64,
    user_name: String,
    name: String,
    password_hash: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Ulid,
    pub user_name: String,
    pub name: String,
}

impl From<&User> for UserInfo {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            user_name: u.user_name.clone(),
            name: u.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    MissingField(&'static str),
    PasswordTooShort(usize),
    AlreadyExists(String),
    NotFound(Ulid),
    LimitExceeded(&'static str),
    /// Anonymous registration once the store already has users.
    RegistrationClosed,
    Hashing(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::MissingField(_) => write!(f, "userName, name, and password are required."),
            UserError::PasswordTooShort(min) => {
                write!(f, "Password must be at least {min} characters long.")
            }
            UserError::AlreadyExists(_) => write!(f, "User already exists."),
            UserError::NotFound(_) => write!(f, "User not found."),
            UserError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            UserError::RegistrationClosed => write!(f, "token missing or invalid - login to proceed"),
            UserError::Hashing(e) => write!(f, "password hashing failed: {e}"),
        }
    }
}

impl std::error::Error for UserError {}

pub struct UserStore {
    users: DashMap<Ulid, User>,
    by_name: DashMap<String, Ulid>,
    next_seq: AtomicU64,
    /// Held by anonymous registration from the emptiness check to the insert.
    first: Mutex<()>,
    cost: u32,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::with_cost(BCRYPT_COST)
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store hashing with a custom bcrypt cost (4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self {
            users: DashMap::new(),
            by_name: DashMap::new(),
            next_seq: AtomicU64::new(0),
            first: Mutex::new(()),
            cost,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Register on behalf of an authenticated caller.
    pub fn register(&self, request: &RegisterRequest) -> Result<UserInfo, UserError> {
        let (user_name, name, password) = checked_fields(request)?;
        if self.by_name.contains_key(user_name) {
            return Err(UserError::AlreadyExists(user_name.to_string()));
        }
        let password_hash = self.hash_password(password)?;
        self.insert(user_name, name, password_hash)
    }

    /// Anonymous registration: succeeds only while the store is empty. Two
    /// racing callers cannot both get in.
    pub fn register_first(&self, request: &RegisterRequest) -> Result<UserInfo, UserError> {
        let _guard = self.first.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.users.is_empty() {
            return Err(UserError::RegistrationClosed);
        }
        let (user_name, name, password) = checked_fields(request)?;
        let password_hash = self.hash_password(password)?;
        self.insert(user_name, name, password_hash)
    }

    fn insert(&self, user_name: &str, name: &str, password_hash: String) -> Result<UserInfo, UserError> {
        if self.users.len() >= MAX_USERS {
            return Err(UserError::LimitExceeded("too many users"));
        }

        let id = Ulid::new();
        match self.by_name.entry(user_name.to_string()) {
            Entry::Occupied(_) => return Err(UserError::AlreadyExists(user_name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        let user = User {
            id,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            user_name: user_name.to_string(),
            name: name.to_string(),
            password_hash,
        };
        let info = UserInfo::from(&user);
        self.users.insert(id, user);

        info!(user_id = %id, user_name, "user registered");
        Ok(info)
    }

    /// The user matching both name and password, if any.
    pub fn verify_credentials(&self, user_name: &str, password: &str) -> Option<UserInfo> {
        let id = *self.by_name.get(user_name)?.value();
        // Clone out so no map shard stays locked while bcrypt runs.
        let user = self.users.get(&id)?.value().clone();
        verify_password(password, &user.password_hash).then(|| UserInfo::from(&user))
    }

    pub fn get(&self, id: &Ulid) -> Option<UserInfo> {
        self.users.get(id).map(|u| UserInfo::from(u.value()))
    }

    /// All users in registration order.
    pub fn list(&self) -> Vec<UserInfo> {
        let mut users: Vec<(u64, UserInfo)> = self
            .users
            .iter()
            .map(|u| (u.seq, UserInfo::from(u.value())))
            .collect();
        users.sort_by_key(|(seq, _)| *seq);
        users.into_iter().map(|(_, info)| info).collect()
    }

    pub fn delete(&self, id: Ulid) -> Result<UserInfo, UserError> {
        let (_, user) = self.users.remove(&id).ok_or(UserError::NotFound(id))?;
        self.by_name.remove_if(&user.user_name, |_, owner| *owner == id);
        info!(user_id = %id, "user deleted");
        Ok(UserInfo::from(&user))
    }

    pub fn reset(&self) {
        self.users.clear();
        self.by_name.clear();
        info!("users reset");
    }

    fn hash_password(&self, password: &str) -> Result<String, UserError> {
        bcrypt::hash(password, self.cost).map_err(|e| UserError::Hashing(e.to_string()))
    }
}

fn checked_fields(request: &RegisterRequest) -> Result<(&str, &str, &str), UserError> {
    let user_name = required(&request.user_name, "userName")?;
    let name = required(&request.name, "name")?;
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(UserError::MissingField("password"))?;

    if user_name.len() > MAX_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Err(UserError::LimitExceeded("name too long"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(UserError::LimitExceeded("password too long"));
    }
    Ok((user_name, name, password))
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, UserError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(UserError::MissingField(name))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(ok) => ok,
        Err(e) => {
            warn!("unreadable password hash: {e}");
            false
        }
    }
}
