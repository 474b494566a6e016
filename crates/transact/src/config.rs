//! Storage policy settings consulted during transaction pre-resolution.
//!
//! These settings are owned by the deployment, not by individual requests:
//! they describe what the backing store allows (deletes, client-assigned ids,
//! inline match URLs) and how aggressively resolution results may be cached.

use serde::{Deserialize, Serialize};

/// Policy for client-assigned resource ids.
///
/// The strategy determines whether an update addressed to `Type/id` can name
/// a resource the server has never seen, which in turn decides whether the
/// engine preloads resource bodies for directly targeted ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientIdStrategy {
    /// Clients may not assign resource ids.
    NotAllowed,

    /// Clients may assign ids containing at least one non-numeric character.
    /// Purely numeric ids remain reserved for the server.
    #[default]
    Alphanumeric,

    /// Clients may assign any id, including purely numeric ones.
    Any,
}

/// Storage-level settings that shape pre-resolution behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Whether resources can be deleted on this store. When deletes are
    /// disabled, previously resolved identities can never become stale, so
    /// cached resolutions stay trustworthy even across reference lookups.
    pub deletes_enabled: bool,

    /// Whether references inside resource bodies may use conditional match
    /// URLs (`Patient?identifier=...`) in place of concrete ids.
    pub allow_inline_match_urls: bool,

    /// Whether resolved match URLs may be remembered across transactions.
    pub match_url_cache_enabled: bool,

    /// Policy for client-assigned resource ids.
    pub client_id_strategy: ClientIdStrategy,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            deletes_enabled: true,
            allow_inline_match_urls: true,
            match_url_cache_enabled: true,
            client_id_strategy: ClientIdStrategy::default(),
        }
    }
}
