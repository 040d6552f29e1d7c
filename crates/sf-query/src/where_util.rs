//! Helpers for composing WHERE expressions.
//!
//! Every helper returns an empty string when it has nothing to say, and
//! [`and`]/[`or`] drop empty fragments, so optional filters can be passed
//! along unconditionally:
//!
//! ```rust
//! use sftools_query::where_util;
//!
//! let open_only = false;
//! let filter = where_util::and([
//!     where_util::eq("OwnerId", "005000000000001AAA"),
//!     if open_only { "IsClosed = FALSE".to_string() } else { String::new() },
//! ]);
//! assert_eq!(filter, "(OwnerId = '005000000000001AAA')");
//! ```
//!
//! Values are escaped with [`escape_string`]; field names are taken as given.

use sftools_client::security::soql::escape_string;

/// `field = 'value'`, or `""` without a field.
pub fn eq(field: &str, value: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    format!("{} = '{}'", field, escape_string(value))
}

/// `field IN ('v1','v2')`, skipping empty values.
///
/// Returns `""` without a field or without any non-empty value.
pub fn in_list<I, S>(field: &str, values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if field.is_empty() {
        return String::new();
    }
    let quoted: Vec<String> = values
        .into_iter()
        .filter(|v| !v.as_ref().is_empty())
        .map(|v| format!("'{}'", escape_string(v.as_ref())))
        .collect();
    if quoted.is_empty() {
        return String::new();
    }
    format!("{} IN ({})", field, quoted.join(","))
}

/// `field LIKE '%value%'`.
///
/// Wildcards inside `value` are kept, so callers can still match with
/// `_` and `%`.
pub fn like(field: &str, value: &str) -> String {
    if field.is_empty() || value.is_empty() {
        return String::new();
    }
    format!("{} LIKE '%{}%'", field, escape_string(value))
}

/// Parenthesise each non-empty fragment and join them with ` AND `.
pub fn and<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join("AND", fragments)
}

/// Parenthesise each non-empty fragment and join them with ` OR `.
pub fn or<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join("OR", fragments)
}

fn join<I, S>(operator: &str, fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter(|f| !f.as_ref().trim().is_empty())
        .map(|f| format!("({})", f.as_ref()))
        .collect::<Vec<_>>()
        .join(&format!(" {operator} "))
}
