//! Token interning table.
//!
//! Protocol, attribute, error, and type names are shared with the capture
//! engine as compact integer tokens. The engine owns token assignment; this
//! module caches the mapping in both directions so that repeated lookups
//! never leave the process.
//!
//! Token `0` is the reserved "no token" sentinel: the empty string maps to it
//! and it maps back to the empty string, without ever consulting the engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Interned integer identifier for a protocol/attribute/type/error name.
///
/// Opaque and process-stable: once a string is interned it maps to the same
/// token for the remainder of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// The reserved "no token" sentinel.
    pub const NONE: Token = Token(0);

    /// Returns true if this is the sentinel token.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Token {
    fn from(id: u32) -> Self {
        Token(id)
    }
}

/// External token authority consumed from the capture engine.
///
/// The authority guarantees idempotent assignment: interning the same string
/// twice yields the same id, so duplicate calls racing on a cache miss are
/// tolerated.
pub trait TokenAuthority: Send + Sync {
    /// Assign (or look up) the token for a name. Never called with `""`.
    fn intern(&self, name: &str) -> u32;

    /// Resolve a token back to its name. Returns `""` for an id the
    /// authority has not assigned yet.
    fn resolve(&self, id: u32) -> String;
}

/// Bidirectional interning cache backed by an external [`TokenAuthority`].
///
/// Forward (string -> token) and reverse (token -> string) maps are populated
/// together and never diverge. Entries are never evicted; the table lives as
/// long as the owning session.
pub struct TokenTable {
    authority: Arc<dyn TokenAuthority>,
    forward: RwLock<HashMap<String, Token>>,
    reverse: RwLock<HashMap<Token, String>>,
}

impl TokenTable {
    /// Create an empty table backed by the given authority.
    pub fn new(authority: Arc<dyn TokenAuthority>) -> Self {
        Self {
            authority,
            forward: RwLock::new(HashMap::new()),
            reverse: RwLock::new(HashMap::new()),
        }
    }

    /// Get the token for a name, interning it on first sight.
    ///
    /// `""` returns [`Token::NONE`] without consulting the authority. Any
    /// other name hits the cache, or costs exactly one authority round-trip
    /// and is cached in both directions.
    pub fn get(&self, name: &str) -> Token {
        if name.is_empty() {
            return Token::NONE;
        }

        {
            let forward = self.forward.read().unwrap();
            if let Some(&token) = forward.get(name) {
                return token;
            }
        }

        // Miss: one authority round-trip, outside any lock. A concurrent
        // lookup of the same name may also get here; the authority assigns
        // idempotent ids, so both writers insert the same pair.
        let token = Token(self.authority.intern(name));
        tracing::debug!(name, id = token.0, "interned token");

        let mut forward = self.forward.write().unwrap();
        let mut reverse = self.reverse.write().unwrap();
        forward.entry(name.to_string()).or_insert(token);
        reverse.entry(token).or_insert_with(|| name.to_string());

        token
    }

    /// Resolve a token back to its name.
    ///
    /// [`Token::NONE`] returns `""` without consulting the authority. An
    /// authority miss (unknown id) also yields `""` but is *not* cached, so a
    /// later assignment of that id can still be resolved.
    pub fn string(&self, token: Token) -> String {
        if token.is_none() {
            return String::new();
        }

        {
            let reverse = self.reverse.read().unwrap();
            if let Some(name) = reverse.get(&token) {
                return name.clone();
            }
        }

        let name = self.authority.resolve(token.0);
        if name.is_empty() {
            return name;
        }

        let mut forward = self.forward.write().unwrap();
        let mut reverse = self.reverse.write().unwrap();
        forward.entry(name.clone()).or_insert(token);
        reverse.entry(token).or_insert_with(|| name.clone());

        name
    }

    /// Number of interned entries (excluding the sentinel).
    pub fn len(&self) -> usize {
        self.reverse.read().unwrap().len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.reverse.read().unwrap().is_empty()
    }
}

impl fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTable")
            .field("entries", &self.len())
            .finish()
    }
}
