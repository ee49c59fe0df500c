//! Element identity generation.

use uuid::Uuid;

/// Length of a generated identity (`8-4-4-4-12` hex groups plus hyphens).
pub const ID_LENGTH: usize = 36;

const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Generates a fresh element identity.
///
/// The value is a random v4 UUID in its lowercase hyphenated form, e.g.
/// `0f8fad5b-d9cb-469f-a165-70867728950e`.
pub fn generate_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Returns `true` when `candidate` has the shape of a generated identity:
/// 36 characters of lowercase hex grouped `8-4-4-4-12`.
///
/// Version and variant bits are not checked.
pub fn is_generated_id(candidate: &str) -> bool {
    if candidate.len() != ID_LENGTH {
        return false;
    }
    let groups: Vec<&str> = candidate.split('-').collect();
    groups.len() == GROUPS.len()
        && groups.iter().zip(GROUPS).all(|(group, len)| {
            group.len() == len
                && group
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}
