//! Identity joins across independently listed collections
//!
//! Collections are small (hundreds of objects per snapshot) so joins are
//! plain nested scans in the order of the left-hand collection.

/// Result of pairing two collections by key
#[derive(Debug)]
pub struct Joined<'a, L, R> {
    /// Matched pairs in left-collection order
    pub pairs: Vec<(&'a L, &'a R)>,
    /// Left items with no counterpart on the right
    pub unmatched: Vec<&'a L>,
}

/// Pair every left item with the first right item sharing its key
///
/// Left items without a counterpart are collected in `unmatched` rather
/// than failing the join.
pub fn join_first<'a, L, R, K, FL, FR>(
    left: &'a [L],
    right: &'a [R],
    left_key: FL,
    right_key: FR,
) -> Joined<'a, L, R>
where
    K: PartialEq,
    FL: Fn(&'a L) -> K,
    FR: Fn(&'a R) -> K,
{
    let mut pairs = Vec::new();
    let mut unmatched = Vec::new();

    for l in left {
        let key = left_key(l);
        match find_first(right, &key, &right_key) {
            Some(r) => pairs.push((l, r)),
            None => unmatched.push(l),
        }
    }

    Joined { pairs, unmatched }
}

/// First item whose key equals `key`
pub fn find_first<'a, T, K, F>(items: &'a [T], key: &K, extract: F) -> Option<&'a T>
where
    K: PartialEq,
    F: Fn(&'a T) -> K,
{
    items.iter().find(|&item| extract(item) == *key)
}
