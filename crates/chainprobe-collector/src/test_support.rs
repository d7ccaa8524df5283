//! In-process `ChainRpc` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chainprobe_core::{BlockHeader, BlockTag};
use chainprobe_rpc::{ChainRpc, TransportError};

/// Header at `number` whose hash and state root end in the given bytes.
pub(crate) fn header(number: u64, hash_last: u8, root_last: u8) -> BlockHeader {
    let mut hash = [0x11u8; 32];
    hash[31] = hash_last;
    let mut root = [0x22u8; 32];
    root[31] = root_last;
    BlockHeader {
        number,
        hash: B256::from(hash),
        state_root: B256::from(root),
    }
}

/// Unset answers fail with `TransportError::Http`.
pub(crate) struct MockChain {
    url: String,
    balance: Option<U256>,
    nonce: Option<u64>,
    height: Option<u64>,
    call_result: Option<Bytes>,
    blocks: HashMap<u64, BlockHeader>,
    delay: Option<Duration>,
    pub(crate) calls: Mutex<Vec<(Address, Bytes)>>,
    pub(crate) requests: AtomicUsize,
}

impl MockChain {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            balance: None,
            nonce: None,
            height: None,
            call_result: None,
            blocks: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_balance(mut self, wei: U256) -> Self {
        self.balance = Some(wei);
        self
    }

    pub(crate) fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub(crate) fn with_height(mut self, height: u64) -> Self {
        self.height = Some(height);
        self
    }

    pub(crate) fn with_call_result(mut self, data: impl Into<Bytes>) -> Self {
        self.call_result = Some(data.into());
        self
    }

    pub(crate) fn with_block(self, header: BlockHeader) -> Self {
        self.with_block_at(header.number, header)
    }

    /// Serve `header` when block `number` is requested.
    pub(crate) fn with_block_at(mut self, number: u64, header: BlockHeader) -> Self {
        self.blocks.insert(number, header);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn answer<T: Clone>(&self, value: Option<&T>, what: &str) -> Result<T, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        value
            .cloned()
            .ok_or_else(|| TransportError::Http(format!("mock has no {what}")))
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn balance_at(&self, _address: Address) -> Result<U256, TransportError> {
        self.answer(self.balance.as_ref(), "balance").await
    }

    async fn nonce_at(&self, _address: Address) -> Result<u64, TransportError> {
        self.answer(self.nonce.as_ref(), "nonce").await
    }

    async fn block_by_number(&self, block: BlockTag) -> Result<BlockHeader, TransportError> {
        let found = match block {
            BlockTag::Number(n) => self.blocks.get(&n),
            BlockTag::Latest => self.blocks.values().max_by_key(|h| h.number),
        };
        self.answer(found, "block")
            .await
            .map_err(|_| TransportError::BlockNotFound {
                block: block.to_param(),
            })
    }

    async fn call_contract(&self, to: Address, data: &Bytes) -> Result<Bytes, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((to, data.clone()));
        self.answer(self.call_result.as_ref(), "call result").await
    }

    async fn current_block_height(&self) -> Result<u64, TransportError> {
        self.answer(self.height.as_ref(), "height").await
    }

    fn url(&self) -> &str {
        &self.url
    }
}
