use roster_model::{User, UserId, UserRow};
use std::collections::BTreeSet;

/// Derive the display view: `records − tombstones`, filtered by `predicate`,
/// mapped to rows. Output order follows `records`.
pub fn project(records: &[User], tombstones: &BTreeSet<UserId>, predicate: &str) -> Vec<UserRow> {
    let needle = predicate.trim().to_lowercase();
    records
        .iter()
        .filter(|user| !tombstones.contains(&user.id))
        .filter(|user| matches_lowered(user, &needle))
        .map(UserRow::from)
        .collect()
}

/// Case-insensitive substring match against name or email.
///
/// An empty (or whitespace-only) predicate matches every user.
pub fn matches_predicate(user: &User, predicate: &str) -> bool {
    matches_lowered(user, &predicate.trim().to_lowercase())
}

fn matches_lowered(user: &User, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    user.name.to_lowercase().contains(needle) || user.email.to_lowercase().contains(needle)
}
