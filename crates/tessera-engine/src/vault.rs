//! Carry-forward of write-only fields.
//!
//! The remote system never echoes secrets such as passwords or pre-shared
//! keys, so a naive read would blank them on every cycle. The vault keeps
//! the value the caller already holds.

use tessera_core::Scalar;

/// Resolve a sensitive scalar from what the wire reported and what the
/// caller previously held.
///
/// A non-empty wire value wins; otherwise a non-empty previous value is
/// carried forward unchanged; otherwise the field stays empty. A value is
/// never invented.
pub fn resolve_sensitive(wire: Option<&Scalar>, previous: Option<&Scalar>) -> Option<Scalar> {
    let non_empty = |s: &&Scalar| !s.is_empty();

    wire.filter(non_empty)
        .or_else(|| previous.filter(non_empty))
        .or(wire)
        .or(previous)
        .cloned()
}
