//! Chain types shared between the RPC layer and the collectors.

use alloy_primitives::B256;

/// The subset of a block header the consistency checker needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
    pub state_root: B256,
}

/// Which block a state query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    /// The JSON-RPC parameter form: `"latest"` or a `0x`-prefixed quantity.
    pub fn to_param(self) -> String {
        match self {
            Self::Latest => "latest".to_string(),
            Self::Number(n) => format!("{n:#x}"),
        }
    }
}

impl std::fmt::Display for BlockTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Number(n) => write!(f, "#{n}"),
        }
    }
}
