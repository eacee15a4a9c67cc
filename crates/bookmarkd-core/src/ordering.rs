//! Ordering engine
//!
//! Pure functions keeping bookmark positions within a category gapless and
//! duplicate-free. Callers pass the `order` slots of the *other* members of a
//! category (never the bookmark being moved); the functions shift those slots
//! to make room for, or close up after, the moved bookmark.
//!
//! Every mutation is O(category size). Fine for a single-user collection,
//! not meant for high-frequency concurrent reordering.

use std::cmp::Ordering;

/// Position for appending after `orders`: one past the current maximum, 0 when empty
pub fn append_position<I>(orders: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    orders.into_iter().max().map_or(0, |max| max + 1)
}

/// Clamp a requested position into `0..=len`
///
/// `len` is the number of slots the target category will hold besides the
/// moved bookmark, so `len` itself means "drop at the end".
pub fn clamp_position(requested: i64, len: usize) -> i64 {
    requested.clamp(0, len as i64)
}

/// Move a bookmark within one category from `from` to `to`
///
/// Moving down shifts members in `(from, to]` up by one slot; moving up
/// shifts members in `[to, from)` down by one slot.
pub fn move_within<'a, I>(others: I, from: i64, to: i64)
where
    I: IntoIterator<Item = &'a mut i64>,
{
    match from.cmp(&to) {
        Ordering::Equal => {}
        Ordering::Less => {
            for order in others {
                if *order > from && *order <= to {
                    *order -= 1;
                }
            }
        }
        Ordering::Greater => {
            for order in others {
                if *order >= to && *order < from {
                    *order += 1;
                }
            }
        }
    }
}

/// Close the gap left behind by a bookmark that was at `removed`
pub fn close_gap<'a, I>(others: I, removed: i64)
where
    I: IntoIterator<Item = &'a mut i64>,
{
    for order in others {
        if *order > removed {
            *order -= 1;
        }
    }
}

/// Open a slot at `at` for an incoming bookmark
pub fn open_slot<'a, I>(others: I, at: i64)
where
    I: IntoIterator<Item = &'a mut i64>,
{
    for order in others {
        if *order >= at {
            *order += 1;
        }
    }
}

/// Whether `orders` is exactly `{0, 1, ..., n-1}`
pub fn is_contiguous<I>(orders: I) -> bool
where
    I: IntoIterator<Item = i64>,
{
    let mut orders: Vec<i64> = orders.into_iter().collect();
    orders.sort_unstable();
    orders.iter().zip(0_i64..).all(|(order, expected)| *order == expected)
}
