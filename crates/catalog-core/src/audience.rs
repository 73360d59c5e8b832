//! Audience groups: the rollout rings a catalog config is published for.

use std::collections::BTreeSet;

/// Opaque audience group name, e.g. `general`, `ring0`, `ring3_9`.
pub type AudienceGroup = String;

/// The group whose config request carries no `AudienceGroup` parameter.
pub const DEFAULT_AUDIENCE_GROUP: &str = "general";

/// Audience groups requested when nothing else is configured.
pub const DEFAULT_AUDIENCE_GROUPS: [&str; 9] = [
    "general", "ring0", "ring1", "ring1_5", "ring1_6", "ring2", "ring3", "ring3_6", "ring3_9",
];

/// Short display label for an audience group (`ring1_5` -> `R1.5`).
///
/// Matching is case-insensitive. Unknown groups are returned unchanged.
pub fn audience_shorthand(audience_group: &str) -> &str {
    match audience_group.to_ascii_lowercase().as_str() {
        "general" => "R4",
        "ring0" => "R0",
        "ring1" => "R1",
        "ring1_5" => "R1.5",
        "ring1_6" => "R1.6",
        "ring2" => "R2",
        "ring3" => "R3",
        "ring3_6" => "R3.6",
        "ring3_9" => "R3.9",
        "staff" => "Staff",
        _ => audience_group,
    }
}

/// Re-seed a user's audience selection against the discovered audience set.
///
/// A selection that is empty, or shares nothing with `discovered`, is replaced
/// by the full discovered set. Otherwise it is kept as is.
pub fn reseed_selection(
    selection: &BTreeSet<AudienceGroup>,
    discovered: &BTreeSet<AudienceGroup>,
) -> BTreeSet<AudienceGroup> {
    if selection.is_disjoint(discovered) {
        discovered.clone()
    } else {
        selection.clone()
    }
}
