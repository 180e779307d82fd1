//! Geographic name canonicalization.
//!
//! Table rows and boundary features spell state names differently. Both
//! sides go through `canonicalize` so the choropleth join is an exact
//! string match on the resulting `GeoKey`.
//!
//! RULE: the rewrite table is a finite allow-list checked in order. No
//! rewrite target may appear as a rewrite source, which keeps the mapping
//! idempotent. Unknown spellings are never guessed at.

use crate::{rowset::Value, types::GeoKey};

/// Ordered rewrites applied after lowercasing and trimming. First match wins.
pub const REWRITES: &[(&str, &str)] = &[
    ("orissa", "odisha"),
    ("andaman and nicobar", "andaman & nicobar islands"),
    (
        "dadra and nagar haveli and daman and diu",
        "dadra & nagar haveli & daman & diu",
    ),
];

/// Map a raw place name to its canonical key. `None` maps to the empty key.
pub fn canonicalize(raw: Option<&str>) -> GeoKey {
    let Some(raw) = raw else {
        return GeoKey::new();
    };
    let key = raw.trim().to_lowercase();
    REWRITES
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| to.to_string())
        .unwrap_or(key)
}

/// `canonicalize` for a table cell. Non-text cells map to the empty key.
pub fn canonicalize_value(v: &Value) -> GeoKey {
    canonicalize(v.as_str())
}
