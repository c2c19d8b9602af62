//! Operations a policy can grant

use depot_core::Flag;
use serde::{Deserialize, Serialize};

/// An operation granted by a security policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyPermission {
    /// Upload files
    Pick,
    /// View or download files
    Read,
    /// Retrieve file metadata
    Stat,
    /// Overwrite file contents
    Write,
    /// Overwrite file contents from a URL
    WriteUrl,
    /// Store files to custom storage
    Store,
    /// Transform files (crop, resize, rotate); also needed by viewers
    Convert,
    /// Delete files
    Remove,
    /// Read EXIF metadata
    Exif,
    /// Run workflows
    RunWorkflow,
}

impl Flag for PolicyPermission {
    const UNIVERSE_NAME: &'static str = "policy call";
    const TABLE_VERSION: u16 = 1;
    const ORDER: &'static [Self] = &[
        PolicyPermission::Pick,
        PolicyPermission::Read,
        PolicyPermission::Stat,
        PolicyPermission::Write,
        PolicyPermission::WriteUrl,
        PolicyPermission::Store,
        PolicyPermission::Convert,
        PolicyPermission::Remove,
        PolicyPermission::Exif,
        PolicyPermission::RunWorkflow,
    ];

    fn bit(self) -> u64 {
        match self {
            PolicyPermission::Pick => 1 << 0,
            PolicyPermission::Read => 1 << 1,
            PolicyPermission::Stat => 1 << 2,
            PolicyPermission::Write => 1 << 3,
            PolicyPermission::WriteUrl => 1 << 4,
            PolicyPermission::Store => 1 << 5,
            PolicyPermission::Convert => 1 << 6,
            PolicyPermission::Remove => 1 << 7,
            PolicyPermission::Exif => 1 << 8,
            PolicyPermission::RunWorkflow => 1 << 9,
        }
    }

    fn token(self) -> &'static str {
        match self {
            PolicyPermission::Pick => "pick",
            PolicyPermission::Read => "read",
            PolicyPermission::Stat => "stat",
            PolicyPermission::Write => "write",
            PolicyPermission::WriteUrl => "writeUrl",
            PolicyPermission::Store => "store",
            PolicyPermission::Convert => "convert",
            PolicyPermission::Remove => "remove",
            PolicyPermission::Exif => "exif",
            PolicyPermission::RunWorkflow => "runWorkflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::FlagSet;

    #[test]
    fn test_all_ten_permissions_declared() {
        assert_eq!(PolicyPermission::ORDER.len(), 10);
        assert_eq!(FlagSet::<PolicyPermission>::all().len(), 10);
        assert_eq!(PolicyPermission::universe_mask(), (1 << 10) - 1);
    }

    #[test]
    fn test_tokens_round_trip() {
        for permission in PolicyPermission::ORDER {
            assert_eq!(
                PolicyPermission::from_token(permission.token()),
                Some(*permission)
            );
        }
        assert_eq!(PolicyPermission::from_token("write_url"), None);
    }
}
