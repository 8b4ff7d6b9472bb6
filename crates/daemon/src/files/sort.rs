//! Listing order.
//!
//! Each [`SortKey`] maps to one comparator. `Type` and `Size` wrap theirs in
//! a directories-first grouping. Sorting is stable, and `reverse` flips the
//! complete result, grouping included.

use std::cmp::Ordering;

use dirbrowse_protocol::{Entry, Listing, SortKey, SortOrder};

/// Case-insensitive name order, folded char by char.
fn by_name(a: &Entry, b: &Entry) -> Ordering {
    let folded_a = a.name.chars().flat_map(char::to_lowercase);
    let folded_b = b.name.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b)
}

fn by_size(a: &Entry, b: &Entry) -> Ordering {
    a.size.cmp(&b.size)
}

fn by_time(a: &Entry, b: &Entry) -> Ordering {
    a.modified_at.cmp(&b.modified_at)
}

/// Order directories before everything else, then defer to `within`.
fn directories_first(
    within: fn(&Entry, &Entry) -> Ordering,
) -> impl Fn(&Entry, &Entry) -> Ordering {
    move |a: &Entry, b: &Entry| match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => within(a, b),
    }
}

/// The comparator for a sort key.
pub fn comparator(key: SortKey) -> Box<dyn Fn(&Entry, &Entry) -> Ordering> {
    match key {
        SortKey::Name => Box::new(by_name),
        SortKey::Size => Box::new(directories_first(by_size)),
        SortKey::Time => Box::new(by_time),
        SortKey::Type => Box::new(directories_first(by_name)),
    }
}

/// Sort entries by `key`, then reverse the whole sequence if asked.
pub fn sort(mut entries: Vec<Entry>, key: SortKey, reverse: bool) -> Vec<Entry> {
    let compare = comparator(key);
    entries.sort_by(|a, b| compare(a, b));
    if reverse {
        entries.reverse();
    }
    entries
}

/// Order a listing and, below the root, put the parent entry first.
///
/// The parent entry is added after sorting, so it always leads regardless
/// of key or direction. Counters are left untouched.
pub fn arrange(listing: Listing, order: SortOrder, with_parent: bool) -> Listing {
    let Listing {
        entries,
        total,
        total_size,
    } = listing;

    let mut entries = sort(entries, order.key, order.reverse);
    if with_parent {
        entries.insert(0, Entry::parent());
    }

    Listing {
        entries,
        total,
        total_size,
    }
}
