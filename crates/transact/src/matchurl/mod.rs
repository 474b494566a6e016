//! Conditional (match) URL handling.
//!
//! A conditional expression like `Patient?identifier=http://acme.org|123`
//! stands in for a resource the client could not address directly. This
//! module decides which expressions are eligible for batched resolution
//! ([`MatchUrlPattern`]), parses them into structured queries
//! ([`parse_match_url`]), and computes the token index hashes used for
//! bulk lookup.

mod hash;
mod parse;
mod shape;

pub use hash::{hash_token_system_and_value, hash_token_value};
pub use parse::{parse_match_url, MatchUrlQuery, ParamValue};
pub use shape::MatchUrlPattern;
