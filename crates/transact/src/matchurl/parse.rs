//! Conditional expression parsing.

use std::collections::BTreeMap;

use crate::error::RequestError;
use crate::model::{ResourceDefinition, SearchParamType};

/// A single search parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A token value, optionally qualified by a system.
    ///
    /// `system: Some("")` means the value was written `|code`, which asks
    /// for a code with no system. `None` means no system was given at all.
    Token {
        /// Token system, when the value contained a `|` separator.
        system: Option<String>,
        /// Token code.
        value: String,
    },
    /// Any other value, decoded and unescaped but otherwise verbatim.
    Plain(String),
}

/// A parsed conditional expression.
///
/// Values are grouped as AND-groups of OR-values: repeating a parameter
/// name adds an AND-group, commas within one value add OR-values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchUrlQuery {
    resource_type: String,
    params: BTreeMap<String, Vec<Vec<ParamValue>>>,
}

impl MatchUrlQuery {
    /// The resource type the expression searches.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// All parameters, keyed by name (modifiers included in the key).
    pub fn params(&self) -> &BTreeMap<String, Vec<Vec<ParamValue>>> {
        &self.params
    }

    /// Returns the lone token of a single-token expression.
    ///
    /// `Some` only when the expression has exactly one parameter name
    /// carrying one AND-group with one token OR-value. These are the
    /// expressions eligible for hashed bulk lookup; everything else takes
    /// the per-expression search path.
    pub fn single_token(&self) -> Option<(&str, &ParamValue)> {
        if self.params.len() != 1 {
            return None;
        }
        let (name, groups) = self.params.iter().next()?;
        if groups.len() != 1 || groups[0].len() != 1 {
            return None;
        }
        match &groups[0][0] {
            token @ ParamValue::Token { .. } => Some((name.as_str(), token)),
            ParamValue::Plain(_) => None,
        }
    }
}

/// Parses a conditional expression against a resource definition.
///
/// The query part (after the first `?`) is split into `name=value` pairs.
/// Names may carry a `:modifier` suffix; the base name must be a search
/// parameter of the definition, except `_`-prefixed names which are always
/// accepted. Values are percent-decoded, split on unescaped `,` into
/// OR-values, and token parameters without a modifier are further split on
/// the first unescaped `|` into system and code.
///
/// # Errors
///
/// Returns [`RequestError::InvalidMatchUrl`] when a parameter name is not
/// defined for the resource type.
///
/// # Examples
///
/// ```
/// use helios_transact::matchurl::{parse_match_url, ParamValue};
/// use helios_transact::model::{ResourceDefinition, SearchParamType};
///
/// let patient = ResourceDefinition::new("Patient")
///     .with_param("identifier", SearchParamType::Token);
///
/// let query = parse_match_url("Patient?identifier=http://acme.org|123", &patient).unwrap();
/// let (name, value) = query.single_token().unwrap();
/// assert_eq!(name, "identifier");
/// assert_eq!(
///     value,
///     &ParamValue::Token {
///         system: Some("http://acme.org".to_string()),
///         value: "123".to_string(),
///     }
/// );
/// ```
pub fn parse_match_url(
    url: &str,
    definition: &ResourceDefinition,
) -> Result<MatchUrlQuery, RequestError> {
    let query = match url.split_once('?') {
        Some((_, query)) => query,
        None => "",
    };

    let mut params: BTreeMap<String, Vec<Vec<ParamValue>>> = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let raw_name = parts.next().unwrap_or("");
        let raw_value = parts.next().unwrap_or("");

        let name = urlencoding::decode(raw_name);
        if name.is_empty() {
            continue;
        }
        let base = name.split(':').next().unwrap_or(&name);
        let param_type = if base.starts_with('_') {
            None
        } else {
            match definition.param_type(base) {
                Some(param_type) => Some(param_type),
                None => {
                    return Err(RequestError::InvalidMatchUrl {
                        url: url.to_string(),
                        message: format!(
                            "{} does not have a search parameter named {}",
                            definition.name(),
                            name
                        ),
                    });
                }
            }
        };
        let as_token = param_type == Some(SearchParamType::Token) && name == base;

        let decoded = urlencoding::decode(raw_value);
        let or_values = split_unescaped(&decoded, ',')
            .into_iter()
            .map(|piece| parse_value(&piece, as_token))
            .collect();
        params.entry(name).or_default().push(or_values);
    }

    Ok(MatchUrlQuery {
        resource_type: definition.name().to_string(),
        params,
    })
}

/// Splits one OR-value into its final form.
fn parse_value(piece: &str, as_token: bool) -> ParamValue {
    if !as_token {
        return ParamValue::Plain(unescape(piece));
    }
    let mut halves = split_unescaped(piece, '|').into_iter();
    let first = halves.next().unwrap_or_default();
    match halves.next() {
        Some(rest) => {
            // Only the first pipe separates; later ones belong to the code.
            let mut value = rest;
            for extra in halves {
                value.push('|');
                value.push_str(&extra);
            }
            ParamValue::Token {
                system: Some(unescape(&first)),
                value: unescape(&value),
            }
        }
        None => ParamValue::Token {
            system: None,
            value: unescape(&first),
        },
    }
}

/// Splits on a delimiter, ignoring occurrences escaped with a backslash.
/// Escape sequences are left in place for [`unescape`] to consume.
fn split_unescaped(input: &str, delimiter: char) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == delimiter {
            pieces.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

/// Removes backslash escapes, keeping the escaped character.
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut escaped = false;
    for ch in input.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

// Percent-decoding helper built on the url crate. Values are decoded one
// component at a time; the leading `=` makes form_urlencoded treat the
// whole component as a value, so embedded `=` survives.
mod urlencoding {
    pub fn decode(raw: &str) -> String {
        let mut prefixed = String::with_capacity(raw.len() + 1);
        prefixed.push('=');
        prefixed.push_str(raw);
        url::form_urlencoded::parse(prefixed.as_bytes())
            .next()
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }
}
