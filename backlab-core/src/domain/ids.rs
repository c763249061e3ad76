use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an externally stored dataset.
///
/// The core never reads dataset contents, only ids. `0` means "none selected"
/// and is passed through to the request unchanged; submit gating catches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub u64);

impl DatasetId {
    pub const NONE: DatasetId = DatasetId(0);

    pub fn is_selected(self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for DatasetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable synthetic identifier of a condition inside a builder.
///
/// Allocated from a counter, never derived from content, so two conditions
/// with identical fields remain individually addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(pub(crate) u64);

impl ConditionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
