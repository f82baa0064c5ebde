//! Successor rule for circular rotation.

use wallet_core::PaymentIdentifier;

/// Pick the identifier that follows `current_position`.
///
/// The smallest position strictly greater than `current_position`; if none
/// exists, wrap around to the smallest position overall. The pool does not
/// need to be sorted. Returns `None` only for an empty pool.
pub fn successor(pool: &[PaymentIdentifier], current_position: i32) -> Option<&PaymentIdentifier> {
    pool.iter()
        .filter(|identifier| identifier.position > current_position)
        .min_by_key(|identifier| identifier.position)
        .or_else(|| pool.iter().min_by_key(|identifier| identifier.position))
}

/// The lowest-position identifier, used to bootstrap an idle pool.
pub fn first_in_rotation(pool: &[PaymentIdentifier]) -> Option<&PaymentIdentifier> {
    pool.iter().min_by_key(|identifier| identifier.position)
}
