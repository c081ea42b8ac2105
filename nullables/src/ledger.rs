//! Nullable ledger: a scripted chain for testing detection and inventory.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use unqgate_ledger::{Block, Call, LedgerClient, LedgerError, Operation, TransferVariant};
use unqgate_types::{ChainAddress, NftRef};

/// A chain whose blocks, failures and connection drops are set up by the test.
///
/// Heights without a scripted block read as empty blocks.
pub struct NullLedger {
    height: AtomicU64,
    decimals: u8,
    blocks: Mutex<HashMap<u64, Block>>,
    missing: Mutex<HashSet<u64>>,
    broken: Mutex<HashMap<u64, LedgerError>>,
    stalled: Mutex<HashSet<u64>>,
    inventory: Mutex<HashMap<String, Vec<NftRef>>>,
    valid_addresses: Mutex<Option<HashSet<String>>>,
    connected: AtomicBool,
    /// Data calls left to fail with `Disconnected`.
    drops: AtomicU32,
    down: AtomicBool,
    reconnects: AtomicU32,
    block_reads: AtomicU32,
}

impl NullLedger {
    pub fn new(height: u64) -> Self {
        Self::with_decimals(height, 18)
    }

    pub fn with_decimals(height: u64, decimals: u8) -> Self {
        Self {
            height: AtomicU64::new(height),
            decimals,
            blocks: Mutex::new(HashMap::new()),
            missing: Mutex::new(HashSet::new()),
            broken: Mutex::new(HashMap::new()),
            stalled: Mutex::new(HashSet::new()),
            inventory: Mutex::new(HashMap::new()),
            valid_addresses: Mutex::new(None),
            connected: AtomicBool::new(true),
            drops: AtomicU32::new(0),
            down: AtomicBool::new(false),
            reconnects: AtomicU32::new(0),
            block_reads: AtomicU32::new(0),
        }
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn insert_block(&self, block: Block) {
        self.blocks.lock().unwrap().insert(block.height, block);
    }

    /// Append a signed transfer operation to the block at `height`.
    pub fn add_transfer(&self, height: u64, from: &str, to: &str, value: u128) {
        self.add_operation(
            height,
            Some(from),
            Call::Transfer {
                variant: TransferVariant::TransferKeepAlive,
                dest: ChainAddress::from(to),
                value,
            },
        );
    }

    pub fn add_operation(&self, height: u64, signer: Option<&str>, call: Call) {
        let mut blocks = self.blocks.lock().unwrap();
        let block = blocks.entry(height).or_insert_with(|| Block {
            height,
            hash: format!("0xblock{height}"),
            operations: Vec::new(),
        });
        let index = block.operations.len() as u32;
        block.operations.push(Operation {
            index,
            hash: format!("0x{height:x}{index:04x}"),
            signer: signer.map(ChainAddress::from),
            call,
        });
    }

    /// The block at `height` has no retrievable operations.
    pub fn set_missing(&self, height: u64) {
        self.missing.lock().unwrap().insert(height);
    }

    /// Reading the block at `height` fails with `error`.
    pub fn set_broken(&self, height: u64, error: LedgerError) {
        self.broken.lock().unwrap().insert(height, error);
    }

    /// Reading the block at `height` never completes.
    pub fn set_stalled(&self, height: u64) {
        self.stalled.lock().unwrap().insert(height);
    }

    /// The next `n` data calls fail with `Disconnected`. The client only
    /// notices once a call fails.
    pub fn drop_connection(&self, n: u32) {
        self.drops.store(n, Ordering::SeqCst);
    }

    /// While down, every call including reconnect fails with `Unreachable`.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
        if down {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    pub fn set_inventory(&self, address: &str, tokens: Vec<NftRef>) {
        self.inventory
            .lock()
            .unwrap()
            .insert(address.to_string(), tokens);
    }

    /// Restrict address validation to `addresses`. By default any non-empty
    /// string is accepted.
    pub fn set_valid_addresses(&self, addresses: &[&str]) {
        *self.valid_addresses.lock().unwrap() =
            Some(addresses.iter().map(|a| a.to_string()).collect());
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn block_reads(&self) -> u32 {
        self.block_reads.load(Ordering::SeqCst)
    }

    fn check_connection(&self) -> Result<(), LedgerError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(LedgerError::Unreachable("ledger is down".into()));
        }
        let dropped = self
            .drops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if dropped {
            self.connected.store(false, Ordering::SeqCst);
            return Err(LedgerError::Disconnected);
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn current_height(&self) -> Result<u64, LedgerError> {
        self.check_connection()?;
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn block_at(&self, height: u64) -> Result<Option<Block>, LedgerError> {
        self.check_connection()?;
        self.block_reads.fetch_add(1, Ordering::SeqCst);
        let stalled = self.stalled.lock().unwrap().contains(&height);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let broken = self.broken.lock().unwrap().get(&height).cloned();
        if let Some(error) = broken {
            return Err(error);
        }
        if self.missing.lock().unwrap().contains(&height) {
            return Ok(None);
        }
        let block = self.blocks.lock().unwrap().get(&height).cloned();
        Ok(Some(block.unwrap_or_else(|| Block {
            height,
            hash: format!("0xblock{height}"),
            operations: Vec::new(),
        })))
    }

    fn validate_address_format(&self, address: &str) -> bool {
        match &*self.valid_addresses.lock().unwrap() {
            Some(valid) => valid.contains(address),
            None => !address.is_empty(),
        }
    }

    async fn native_decimals(&self) -> Result<u8, LedgerError> {
        self.check_connection()?;
        Ok(self.decimals)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<(), LedgerError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(LedgerError::Unreachable("ledger is down".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn tokens_owned_by(&self, address: &str) -> Result<Vec<NftRef>, LedgerError> {
        self.check_connection()?;
        Ok(self
            .inventory
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }
}
