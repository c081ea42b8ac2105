//! HTTP ledger client against a Substrate API Sidecar-compatible REST API.
//!
//! Endpoints used:
//! - `GET /blocks/head/header` for the head height
//! - `GET /blocks/{n}` for a block and its extrinsics
//! - `GET /runtime/spec` for the native token decimals
//! - `GET {inventory}/accounts/{address}/tokens` for NFT ownership

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use unqgate_crypto::{validate_address, UNIQUE_PREFIX};
use unqgate_types::{ChainAddress, NftRef};

use crate::{Block, Call, LedgerClient, LedgerError, Operation, TransferVariant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct SidecarConfig {
    pub endpoint: String,
    /// Base URL of the NFT inventory API; defaults to `endpoint`.
    pub inventory_endpoint: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Required SS58 prefix for accepted addresses, `None` to accept any network.
    pub ss58_prefix: Option<u16>,
}

impl SidecarConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            inventory_endpoint: None,
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ss58_prefix: Some(UNIQUE_PREFIX),
        }
    }
}

pub struct SidecarClient {
    http_client: reqwest::Client,
    endpoint: String,
    inventory_endpoint: String,
    ss58_prefix: Option<u16>,
    connected: AtomicBool,
    decimals: OnceLock<u8>,
}

#[derive(Debug, Deserialize)]
struct HeaderResponse {
    number: String,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    number: String,
    hash: String,
    #[serde(default)]
    extrinsics: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryEntry {
    collection_id: u32,
    token_id: u32,
}

impl SidecarClient {
    pub fn new(config: SidecarConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_default();
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let inventory_endpoint = config
            .inventory_endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.clone());
        Self {
            http_client,
            endpoint,
            inventory_endpoint,
            ss58_prefix: config.ss58_prefix,
            connected: AtomicBool::new(true),
            decimals: OnceLock::new(),
        }
    }

    /// `GET url`, decoding JSON. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, LedgerError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            let err = if e.is_timeout() {
                LedgerError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                LedgerError::Unreachable(format!("connection failed: {e}"))
            } else {
                LedgerError::RequestFailed(e.to_string())
            };
            if err.is_connection_loss() {
                self.connected.store(false, Ordering::SeqCst);
            }
            err
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LedgerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        let body = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("{url}: {e}")))?;
        Ok(Some(body))
    }

    async fn fetch_head(&self) -> Result<u64, LedgerError> {
        let url = format!("{}/blocks/head/header", self.endpoint);
        let header: HeaderResponse = self
            .get_json(&url)
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse("no head header".into()))?;
        parse_u64(&header.number)
    }
}

fn parse_u64(s: &str) -> Result<u64, LedgerError> {
    s.parse()
        .map_err(|_| LedgerError::InvalidResponse(format!("not a number: {s}")))
}

/// Read an account id that Sidecar renders either as `"addr"` or `{"id": "addr"}`.
fn account_id(value: &Value) -> Option<ChainAddress> {
    match value {
        Value::String(s) => Some(ChainAddress::from(s.as_str())),
        Value::Object(map) => map.get("id").and_then(account_id),
        _ => None,
    }
}

/// Decode one Sidecar extrinsic. Shape problems in the call become
/// [`Call::Undecodable`] so one odd extrinsic never hides the rest of the block.
fn parse_extrinsic(index: u32, value: &Value) -> Operation {
    let hash = value
        .get("hash")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let signer = value
        .get("signature")
        .and_then(|s| s.get("signer"))
        .and_then(account_id);
    Operation {
        index,
        hash,
        signer,
        call: parse_call(value),
    }
}

fn parse_call(value: &Value) -> Call {
    let method = value.get("method");
    let pallet = method.and_then(|m| m.get("pallet")).and_then(Value::as_str);
    let name = method.and_then(|m| m.get("method")).and_then(Value::as_str);
    let (Some(pallet), Some(name)) = (pallet, name) else {
        return Call::Undecodable("missing method".into());
    };

    let variant = match (pallet, TransferVariant::from_method(name)) {
        ("balances", Some(variant)) => variant,
        _ => {
            return Call::Other {
                pallet: pallet.to_string(),
                method: name.to_string(),
            }
        }
    };

    let args = value.get("args");
    let dest = args.and_then(|a| a.get("dest")).and_then(account_id);
    let amount = args.and_then(|a| a.get("value")).and_then(|v| match v {
        Value::String(s) => s.parse::<u128>().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    });
    match (dest, amount) {
        (Some(dest), Some(value)) => Call::Transfer {
            variant,
            dest,
            value,
        },
        _ => Call::Undecodable(format!("balances.{name} with unreadable args")),
    }
}

/// `tokenDecimals` is a list of strings in Sidecar (`["18"]`) but a bare
/// number in some proxies.
fn parse_decimals(spec: &Value) -> Option<u8> {
    let raw = spec.get("properties")?.get("tokenDecimals")?;
    let first = match raw {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match first {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    }
}

#[async_trait]
impl LedgerClient for SidecarClient {
    async fn current_height(&self) -> Result<u64, LedgerError> {
        self.fetch_head().await
    }

    async fn block_at(&self, height: u64) -> Result<Option<Block>, LedgerError> {
        let url = format!("{}/blocks/{height}", self.endpoint);
        let block: BlockResponse = self
            .get_json(&url)
            .await?
            .ok_or(LedgerError::BlockNotFound(height))?;
        let Some(extrinsics) = block.extrinsics else {
            return Ok(None);
        };
        let operations = extrinsics
            .iter()
            .enumerate()
            .map(|(i, v)| parse_extrinsic(i as u32, v))
            .collect();
        Ok(Some(Block {
            height: parse_u64(&block.number)?,
            hash: block.hash,
            operations,
        }))
    }

    fn validate_address_format(&self, address: &str) -> bool {
        validate_address(address, self.ss58_prefix)
    }

    async fn native_decimals(&self) -> Result<u8, LedgerError> {
        if let Some(decimals) = self.decimals.get() {
            return Ok(*decimals);
        }
        let url = format!("{}/runtime/spec", self.endpoint);
        let spec: Value = self
            .get_json(&url)
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse("no runtime spec".into()))?;
        let decimals = parse_decimals(&spec)
            .ok_or_else(|| LedgerError::InvalidResponse("runtime spec lacks tokenDecimals".into()))?;
        Ok(*self.decimals.get_or_init(|| decimals))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<(), LedgerError> {
        tracing::info!(endpoint = %self.endpoint, "reconnecting to ledger");
        let height = self.fetch_head().await?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(height, "ledger connection restored");
        Ok(())
    }

    async fn tokens_owned_by(&self, address: &str) -> Result<Vec<NftRef>, LedgerError> {
        let url = format!("{}/accounts/{address}/tokens", self.inventory_endpoint);
        let entries: Vec<InventoryEntry> = self.get_json(&url).await?.unwrap_or_default();
        Ok(entries
            .into_iter()
            .map(|e| NftRef::new(e.collection_id, e.token_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_signed_transfer() {
        let ext = json!({
            "method": { "pallet": "balances", "method": "transferKeepAlive" },
            "signature": { "signature": "0x00", "signer": { "id": "unqAlice" } },
            "args": { "dest": { "id": "unqAlice" }, "value": "1000000000000000" },
            "hash": "0xfeed"
        });
        let op = parse_extrinsic(3, &ext);
        assert_eq!(op.index, 3);
        assert_eq!(op.hash, "0xfeed");
        assert_eq!(op.signer, Some(ChainAddress::from("unqAlice")));
        assert_eq!(
            op.call,
            Call::Transfer {
                variant: TransferVariant::TransferKeepAlive,
                dest: ChainAddress::from("unqAlice"),
                value: 1_000_000_000_000_000,
            }
        );
    }

    #[test]
    fn unsigned_inherent_has_no_signer() {
        let ext = json!({
            "method": { "pallet": "timestamp", "method": "set" },
            "signature": null,
            "args": { "now": "1700000000000" },
            "hash": "0x01"
        });
        let op = parse_extrinsic(0, &ext);
        assert_eq!(op.signer, None);
        assert!(matches!(op.call, Call::Other { ref pallet, .. } if pallet == "timestamp"));
    }

    #[test]
    fn malformed_transfer_is_undecodable() {
        let ext = json!({
            "method": { "pallet": "balances", "method": "transfer" },
            "args": { "dest": 7 },
            "hash": "0x02"
        });
        assert!(matches!(parse_extrinsic(1, &ext).call, Call::Undecodable(_)));
        assert!(matches!(parse_call(&json!({})), Call::Undecodable(_)));
    }

    #[test]
    fn plain_string_account_ids() {
        assert_eq!(account_id(&json!("unqBob")), Some(ChainAddress::from("unqBob")));
        assert_eq!(account_id(&json!({ "id": "unqBob" })), Some(ChainAddress::from("unqBob")));
        assert_eq!(account_id(&json!(5)), None);
    }

    #[test]
    fn decimals_from_runtime_spec() {
        assert_eq!(parse_decimals(&json!({ "properties": { "tokenDecimals": ["18"] } })), Some(18));
        assert_eq!(parse_decimals(&json!({ "properties": { "tokenDecimals": 12 } })), Some(12));
        assert_eq!(parse_decimals(&json!({ "properties": {} })), None);
    }

    #[test]
    fn address_validation_uses_prefix() {
        let client = SidecarClient::new(SidecarConfig::new("http://localhost:8080/"));
        let unq = unqgate_crypto::encode_ss58(UNIQUE_PREFIX, &[1u8; 32]).unwrap();
        assert!(client.validate_address_format(&unq));
        assert!(!client.validate_address_format("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"));
        assert!(!client.validate_address_format("garbage"));
        assert!(client.is_connected());
    }
}
