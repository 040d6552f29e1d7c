//! Per-type behaviour lookup.
//!
//! A [`TypeRegistry`] maps object names to [`TypeProfile`] factories. Types
//! without a registered profile get [`DefaultProfile`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::kinds::{CaseCommentProfile, CaseProfile, TimeCardProfile, UserProfile};

/// How a lookup key given to [`SfType::get`](crate::SfType::get) is
/// turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLookup {
    /// The key is a record Id.
    Id(String),
    /// Query for the record's Id first; fall back to the key if nothing
    /// matches.
    Filter { filter: String, unrestricted: bool },
}

/// Behaviour specific to one object type.
pub trait TypeProfile: Send + Sync + std::fmt::Debug {
    /// Filter ANDed into every query of the type unless the query is
    /// unrestricted.
    fn restriction(&self) -> Option<&str> {
        None
    }

    /// How to resolve a lookup key.
    fn key_lookup(&self, key: &str) -> KeyLookup {
        KeyLookup::Id(key.to_string())
    }
}

/// Profile used for types nothing is registered for.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProfile;

impl TypeProfile for DefaultProfile {}

/// Constructor for a profile.
pub type ProfileFactory = fn() -> Arc<dyn TypeProfile>;

/// Map of object names to profile factories.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    factories: HashMap<String, ProfileFactory>,
}

impl TypeRegistry {
    /// A registry with no profiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in profiles: `Case`, `CaseComment`, `User`
    /// and `TimeCard__c`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(CaseProfile::TYPE_NAME, || Arc::new(CaseProfile))
            .register(CaseCommentProfile::TYPE_NAME, || Arc::new(CaseCommentProfile))
            .register(UserProfile::TYPE_NAME, || Arc::new(UserProfile))
            .register(TimeCardProfile::TYPE_NAME, || Arc::new(TimeCardProfile));
        registry
    }

    /// Register (or replace) the profile for `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, factory: ProfileFactory) -> &mut Self {
        self.factories.insert(type_name.into(), factory);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Build the profile for `type_name`.
    pub fn profile(&self, type_name: &str) -> Arc<dyn TypeProfile> {
        match self.factories.get(type_name) {
            Some(factory) => factory(),
            None => Arc::new(DefaultProfile),
        }
    }
}
