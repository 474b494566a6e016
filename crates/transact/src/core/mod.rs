//! Backend seams for the transaction engine.
//!
//! The engine never talks to a database directly. It goes through three
//! traits: [`TransactionStore`] for batched read-side lookups,
//! [`WriteSession`] for flush control over buffered writes, and
//! [`WriteExecutor`] for applying individual entries.

mod executor;
mod session;
mod store;

pub use executor::WriteExecutor;
pub use session::{FlushMode, FlushModeGuard, WriteSession};
pub use store::{HashColumn, IdentityLookup, ResolveMode, TokenHashRow, TransactionStore};
