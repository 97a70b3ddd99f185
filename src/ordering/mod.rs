//! Entry ordering engine (pure).
//!
//! Maps a list of entries and a preference to the target order. Never
//! touches the live container; placing the result is the synchronizer's
//! job.

use crate::host::Entry;
use crate::model::{EntryId, MalformedEntry, OrderPreference};

/// Read the id of every entry, in input order.
///
/// # Errors
///
/// Returns [`MalformedEntry`] for the first entry whose id attribute is
/// missing or not a non-negative integer.
pub fn entry_ids<E: Entry>(entries: &[E]) -> Result<Vec<EntryId>, MalformedEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| read_id(position, entry))
        .collect()
}

fn read_id<E: Entry>(position: usize, entry: &E) -> Result<EntryId, MalformedEntry> {
    let raw = entry
        .id_attribute()
        .ok_or_else(|| MalformedEntry::missing(position))?;
    EntryId::parse(&raw).map_err(|error| MalformedEntry::invalid(position, raw.clone(), error))
}

/// Compute the target order of `entries` for `preference`.
///
/// Ascending by id with a stable sort (equal ids keep their input order),
/// then reversed for [`OrderPreference::Reversed`]. So
/// `order(xs, Reversed)` is always `order(xs, Default)` reversed, and
/// applying `order` twice with the same preference changes nothing as long
/// as ids are unique.
///
/// # Errors
///
/// Returns [`MalformedEntry`] if any entry lacks a usable id. No partial
/// order is produced; the caller leaves the container as it is.
pub fn order<E: Entry>(entries: &[E], preference: OrderPreference) -> Result<Vec<E>, MalformedEntry> {
    let ids = entry_ids(entries)?;
    let mut keyed: Vec<(EntryId, &E)> = ids.into_iter().zip(entries).collect();
    keyed.sort_by_key(|(id, _)| *id);

    let mut ordered: Vec<E> = keyed.into_iter().map(|(_, entry)| entry.clone()).collect();
    if preference.is_reversed() {
        ordered.reverse();
    }
    Ok(ordered)
}

/// Whether `entries` already appear in the order `preference` asks for.
///
/// # Errors
///
/// Same as [`order`].
pub fn is_ordered<E: Entry>(entries: &[E], preference: OrderPreference) -> Result<bool, MalformedEntry> {
    let ids = entry_ids(entries)?;
    let sorted = match preference {
        OrderPreference::Default => ids.windows(2).all(|pair| pair[0] <= pair[1]),
        OrderPreference::Reversed => ids.windows(2).all(|pair| pair[0] >= pair[1]),
    };
    Ok(sorted)
}
