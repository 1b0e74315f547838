//! Composite resource identities
//!
//! Relationship resources are identified by `<part1>#<part2>`.

use crate::error::{ProviderError, Result};

/// Separator between the parts of a composite id
pub const FIELD_SEP: &str = "#";

/// Build a composite id
pub fn join(parts: &[&str]) -> String {
    parts.join(FIELD_SEP)
}

/// Split a composite id into exactly `N` non-empty parts
pub fn split<const N: usize>(id: &str) -> Result<[&str; N]> {
    let parts: Vec<&str> = id.split(FIELD_SEP).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::BrokenId(id.to_string()));
    }
    <[&str; N]>::try_from(parts).map_err(|_| ProviderError::BrokenId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_split() {
        let id = join(&["ins-1", "u1"]);
        assert_eq!(id, "ins-1#u1");
        assert_eq!(split::<2>(&id).unwrap(), ["ins-1", "u1"]);
    }

    #[test]
    fn test_wrong_segment_count() {
        assert!(matches!(split::<2>("ins-1"), Err(ProviderError::BrokenId(_))));
        assert!(matches!(split::<2>("a#b#c"), Err(ProviderError::BrokenId(_))));
    }

    #[test]
    fn test_empty_segment() {
        assert!(split::<2>("ins-1#").is_err());
        assert!(split::<2>("#u1").is_err());
        assert!(split::<2>("").is_err());
    }
}
