//! Mapping capability flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// What a mapping may be used for.
    ///
    /// Callers pass a requirement when resolving a mapping; a mapping
    /// qualifies if its flags intersect the requirement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Permissions: u8 {
        /// Reads, existence checks and enumeration.
        const READ = 1 << 0;
        /// Writes, directory creation and removal.
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Permissions {
    /// No capability at all. A mapping with `NONE` never resolves.
    pub const NONE: Self = Self::empty();

    pub fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        assert!(Permissions::READ_WRITE.intersects(Permissions::READ));
        assert!(Permissions::READ_WRITE.intersects(Permissions::WRITE));
        assert!(!Permissions::READ.intersects(Permissions::WRITE));
        assert!(!Permissions::NONE.intersects(Permissions::READ_WRITE));
    }

    #[test]
    fn test_helpers() {
        assert!(Permissions::READ.can_read());
        assert!(!Permissions::READ.can_write());
        assert!(Permissions::READ_WRITE.can_write());
        assert!(!Permissions::NONE.can_read());
    }

    #[test]
    fn test_ron_names() {
        let encoded = ron::to_string(&Permissions::READ).unwrap();
        assert_eq!(encoded, "\"READ\"");

        let decoded: Permissions = ron::from_str("\"READ | WRITE\"").unwrap();
        assert_eq!(decoded, Permissions::READ_WRITE);
    }
}
