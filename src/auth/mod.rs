use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;

use crate::config::UserEntry;

/// The authenticated caller. Its name is the owner filter for every card query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>, roles: Vec<String>) -> Self {
        Self { name: name.into(), roles }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Username/password pair decoded from an `Authorization: Basic` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicAuthError {
    Missing,
    NotBasic,
    InvalidEncoding,
    MissingSeparator,
}

impl std::fmt::Display for BasicAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasicAuthError::Missing => write!(f, "Missing Authorization header"),
            BasicAuthError::NotBasic => write!(f, "Authorization header must use Basic scheme"),
            BasicAuthError::InvalidEncoding => write!(f, "Invalid Basic credentials encoding"),
            BasicAuthError::MissingSeparator => write!(f, "Basic credentials must be user:password"),
        }
    }
}

impl std::error::Error for BasicAuthError {}

impl Credentials {
    /// Parse the value of an Authorization header using the Basic scheme
    pub fn from_basic_header(header: Option<&str>) -> Result<Self, BasicAuthError> {
        let header = header.ok_or(BasicAuthError::Missing)?.trim();
        let (scheme, encoded) = header.split_once(' ').ok_or(BasicAuthError::NotBasic)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(BasicAuthError::NotBasic);
        }

        let decoded = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| BasicAuthError::InvalidEncoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::InvalidEncoding)?;

        let (username, password) = decoded.split_once(':').ok_or(BasicAuthError::MissingSeparator)?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Encode as an Authorization header value
    pub fn to_basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

/// Pluggable identity collaborator
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Option<Principal>;

    fn authorize(&self, principal: &Principal, required_role: &str) -> bool {
        principal.has_role(required_role)
    }
}

struct StoredUser {
    /// PHC string, e.g. `$argon2id$v=19$...`
    password_hash: String,
    roles: Vec<String>,
}

/// Identity provider over a fixed list of users. Passwords are kept only as
/// argon2 hashes; a configured password that is already a PHC hash is used as is.
pub struct InMemoryIdentityProvider {
    users: HashMap<String, StoredUser>,
}

impl InMemoryIdentityProvider {
    pub fn new(entries: &[UserEntry]) -> Self {
        let mut users = HashMap::with_capacity(entries.len());
        for entry in entries {
            let password_hash = if PasswordHash::new(&entry.password).is_ok() {
                entry.password.clone()
            } else {
                match hash_password(&entry.password) {
                    Ok(hash) => hash,
                    Err(err) => {
                        tracing::error!("failed to hash password for '{}': {}", entry.name, err);
                        continue;
                    }
                }
            };
            users.insert(
                entry.name.clone(),
                StoredUser {
                    password_hash,
                    roles: entry.roles.clone(),
                },
            );
        }
        Self { users }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn authenticate(&self, credentials: &Credentials) -> Option<Principal> {
        let user = self.users.get(&credentials.username)?;
        if !verify_password(&user.password_hash, &credentials.password) {
            return None;
        }
        Some(Principal::new(credentials.username.clone(), user.roles.clone()))
    }
}

/// Generates a new password hash using argon2.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password_hash: &str, password: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("failed to parse password hash: {}", err);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::new(&[
            UserEntry::new("sarah1", "abc123", &["CARD-OWNER"]),
            UserEntry::new("hank-owns-no-cards", "qrs456", &["NON-OWNER"]),
        ])
    }

    fn creds(user: &str, pass: &str) -> Credentials {
        Credentials { username: user.to_string(), password: pass.to_string() }
    }

    #[test]
    fn parses_basic_header() {
        // "sarah1:abc123"
        let c = Credentials::from_basic_header(Some("Basic c2FyYWgxOmFiYzEyMw==")).unwrap();
        assert_eq!(c, creds("sarah1", "abc123"));
    }

    #[test]
    fn basic_header_round_trips_passwords_with_colons() {
        let c = creds("kumar2", "a:b:c");
        let parsed = Credentials::from_basic_header(Some(&c.to_basic_header())).unwrap();
        assert_eq!(parsed, c);
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(Credentials::from_basic_header(None), Err(BasicAuthError::Missing));
        assert_eq!(
            Credentials::from_basic_header(Some("Bearer abc.def")),
            Err(BasicAuthError::NotBasic)
        );
        assert_eq!(
            Credentials::from_basic_header(Some("Basic !!!")),
            Err(BasicAuthError::InvalidEncoding)
        );
        // "nocolon"
        assert_eq!(
            Credentials::from_basic_header(Some("Basic bm9jb2xvbg==")),
            Err(BasicAuthError::MissingSeparator)
        );
    }

    #[test]
    fn authenticates_known_user() {
        let principal = provider().authenticate(&creds("sarah1", "abc123")).unwrap();
        assert_eq!(principal.name, "sarah1");
        assert!(principal.has_role("CARD-OWNER"));
    }

    #[test]
    fn rejects_bad_password_and_unknown_user() {
        assert!(provider().authenticate(&creds("sarah1", "BAD-PASSWORD")).is_none());
        assert!(provider().authenticate(&creds("BAD-USER", "abc123")).is_none());
    }

    #[test]
    fn stores_salted_hashes_not_passwords() {
        let p = provider();
        let stored = &p.users["sarah1"].password_hash;
        assert!(stored.starts_with("$argon2"), "unexpected hash format: {}", stored);
        assert!(!stored.contains("abc123"));

        // Same password, different salt
        let again = provider();
        assert_ne!(&again.users["sarah1"].password_hash, stored);
    }

    #[test]
    fn accepts_preconfigured_hashes() {
        let hash = hash_password("xyz789").unwrap();
        let p = InMemoryIdentityProvider::new(&[UserEntry::new("kumar2", &hash, &["CARD-OWNER"])]);
        assert!(p.authenticate(&creds("kumar2", "xyz789")).is_some());
        assert!(p.authenticate(&creds("kumar2", &hash)).is_none());
    }

    #[test]
    fn authorizes_by_role() {
        let p = provider();
        let hank = p.authenticate(&creds("hank-owns-no-cards", "qrs456")).unwrap();
        assert!(!p.authorize(&hank, "CARD-OWNER"));
        assert!(p.authorize(&hank, "NON-OWNER"));
    }
}
