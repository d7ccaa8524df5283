//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chainprobe_core::{BlockHeader, BlockTag};
use chainprobe_rpc::{ChainRpc, TransportError};

pub const ACCOUNT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
pub const TOKEN: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const POOL: &str = "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640";

/// A node with fixed answers. `None` fields fail like an unreachable node.
#[derive(Clone, Default)]
pub struct FakeNode {
    pub url: String,
    pub balance: Option<U256>,
    pub nonce: Option<u64>,
    pub height: Option<u64>,
    pub call_result: Option<Bytes>,
    pub blocks: HashMap<u64, BlockHeader>,
}

impl FakeNode {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    fn unreachable(&self) -> TransportError {
        TransportError::Http(format!("connection refused: {}", self.url))
    }
}

#[async_trait]
impl ChainRpc for FakeNode {
    async fn balance_at(&self, _address: Address) -> Result<U256, TransportError> {
        self.balance.ok_or_else(|| self.unreachable())
    }

    async fn nonce_at(&self, _address: Address) -> Result<u64, TransportError> {
        self.nonce.ok_or_else(|| self.unreachable())
    }

    async fn block_by_number(&self, block: BlockTag) -> Result<BlockHeader, TransportError> {
        match block {
            BlockTag::Number(n) => self.blocks.get(&n).copied().ok_or_else(|| self.unreachable()),
            BlockTag::Latest => Err(self.unreachable()),
        }
    }

    async fn call_contract(&self, _to: Address, _data: &Bytes) -> Result<Bytes, TransportError> {
        self.call_result.clone().ok_or_else(|| self.unreachable())
    }

    async fn current_block_height(&self) -> Result<u64, TransportError> {
        self.height.ok_or_else(|| self.unreachable())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Header whose hash and state root end in the given bytes.
pub fn header(number: u64, hash_last: u8, root_last: u8) -> BlockHeader {
    let mut hash = [0x5au8; 32];
    hash[31] = hash_last;
    let mut root = [0xa5u8; 32];
    root[31] = root_last;
    BlockHeader {
        number,
        hash: B256::from(hash),
        state_root: B256::from(root),
    }
}

/// A 32-byte big-endian word.
pub fn word(value: u64) -> Bytes {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    Bytes::from(out.to_vec())
}

/// Resolves endpoint URLs to pre-built fake nodes.
pub fn connector(
    nodes: Vec<FakeNode>,
) -> impl Fn(&str) -> Result<Arc<dyn ChainRpc>, TransportError> {
    let nodes: HashMap<String, Arc<dyn ChainRpc>> = nodes
        .into_iter()
        .map(|n| (n.url.clone(), Arc::new(n) as Arc<dyn ChainRpc>))
        .collect();
    move |url: &str| {
        nodes
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Build(format!("unknown endpoint {url}")))
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
