//! Previous-transaction lookup: an in-memory cache and a blockstream.info client

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{BitcoinError, Result};
use crate::keys::Network;
use crate::transaction::Tx;

/// Resolves a transaction id to its parsed transaction
pub trait TxFetcher {
    fn fetch(&self, tx_id: &[u8; 32], net: Network) -> Result<Tx>;
}

/// In-memory transaction store keyed by id, optionally backed by another fetcher
#[derive(Default)]
pub struct TxCache {
    txs: Mutex<HashMap<[u8; 32], Tx>>,
    upstream: Option<Box<dyn TxFetcher + Send + Sync>>,
}

impl TxCache {
    /// Offline cache: lookups only succeed for inserted transactions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upstream(upstream: impl TxFetcher + Send + Sync + 'static) -> Self {
        TxCache {
            txs: Mutex::new(HashMap::new()),
            upstream: Some(Box::new(upstream)),
        }
    }

    /// Store a transaction under its own id and return that id
    pub fn insert(&self, tx: Tx) -> Result<[u8; 32]> {
        let id = tx.hash()?;
        self.lock().insert(id, tx);
        Ok(id)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[u8; 32], Tx>> {
        self.txs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TxFetcher for TxCache {
    fn fetch(&self, tx_id: &[u8; 32], net: Network) -> Result<Tx> {
        if let Some(tx) = self.lock().get(tx_id) {
            debug!(tx_id = %hex::encode(tx_id), "transaction cache hit");
            return Ok(tx.clone());
        }

        let Some(upstream) = &self.upstream else {
            return Err(BitcoinError::TxNotFound(hex::encode(tx_id)));
        };
        let tx = upstream.fetch(tx_id, net)?;
        let actual = tx.hash()?;
        if actual != *tx_id {
            return Err(BitcoinError::TxIdMismatch {
                requested: hex::encode(tx_id),
                actual: hex::encode(actual),
            });
        }
        self.lock().insert(actual, tx.clone());
        Ok(tx)
    }
}

/// Where and how `HttpFetcher` looks transactions up
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub main_url: String,
    pub test_url: String,
    /// Directory of raw transactions named by id; `None` disables it
    pub cache_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            main_url: "https://blockstream.info".to_string(),
            test_url: "https://blockstream.info/testnet".to_string(),
            cache_dir: Some(PathBuf::from("txdb")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl FetcherConfig {
    fn base_url(&self, net: Network) -> &str {
        match net {
            Network::Main => &self.main_url,
            Network::Test => &self.test_url,
        }
    }
}

/// Fetches raw transactions from an Esplora-style HTTP API
pub struct HttpFetcher {
    config: FetcherConfig,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BitcoinError::Network(e.to_string()))?;
        Ok(HttpFetcher { config, client })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn fetch_raw(&self, tx_id: &str, net: Network) -> Result<Vec<u8>> {
        let cache_file = self.config.cache_dir.as_ref().map(|dir| dir.join(tx_id));
        if let Some(path) = cache_file.as_ref().filter(|p| p.exists()) {
            debug!(path = %path.display(), "reading cached transaction");
            return Ok(fs::read(path)?);
        }

        let url = format!("{}/api/tx/{}/hex", self.config.base_url(net), tx_id);
        info!(%url, "fetching transaction");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| BitcoinError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BitcoinError::TxNotFound(tx_id.to_string()));
        }
        let text = response
            .text()
            .map_err(|e| BitcoinError::Network(e.to_string()))?;
        let raw = hex::decode(text.trim())?;

        if let (Some(dir), Some(path)) = (&self.config.cache_dir, &cache_file) {
            fs::create_dir_all(dir)?;
            fs::write(path, &raw)?;
            debug!(path = %path.display(), "cached transaction");
        }
        Ok(raw)
    }
}

impl TxFetcher for HttpFetcher {
    fn fetch(&self, tx_id: &[u8; 32], net: Network) -> Result<Tx> {
        let id = hex::encode(tx_id);
        let raw = self.fetch_raw(&id, net)?;
        let tx = parse_fetched(&raw, net)?;
        let actual = tx.id()?;
        if actual != id {
            return Err(BitcoinError::TxIdMismatch {
                requested: id,
                actual,
            });
        }
        Ok(tx)
    }
}

/// Parse a raw transaction as served by a block explorer. Segwit-marked
/// transactions have their marker, flag and witness data dropped so the
/// result hashes to the transaction id.
pub fn parse_fetched(raw: &[u8], net: Network) -> Result<Tx> {
    if raw.len() > 5 && raw[4] == 0 {
        let mut stripped = raw[..4].to_vec();
        stripped.extend_from_slice(&raw[6..]);
        let mut cursor = Cursor::new(stripped.as_slice());
        let mut tx = Tx::parse(&mut cursor, net)?;

        // parsing stopped at the witness data; the lock time is the last four bytes
        let tail: [u8; 4] = raw[raw.len() - 4..]
            .try_into()
            .map_err(|_| BitcoinError::Parse("truncated transaction".to_string()))?;
        tx.locktime = u32::from_le_bytes(tail);
        return Ok(tx);
    }

    let mut cursor = Cursor::new(raw);
    let tx = Tx::parse(&mut cursor, net)?;
    if (cursor.position() as usize) != raw.len() {
        return Err(BitcoinError::Parse(format!(
            "{} trailing bytes after transaction",
            raw.len() - cursor.position() as usize
        )));
    }
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use crate::transaction::{TxIn, TxOut};

    const SEGWIT_TX_HEX: &str = "010000000001026c4224e4d6bab0cfdfd67870e084cda34e42d3544b3c77d310df40831fa4f5061700000023220020fb24ee0fec024ff3ff03c44d16ca523b78fd33ebaab99176e98b3f5e0e78da9dffffffffe8faf73aee5a09b1b678277fc63150dff639c97521e9088d6721a2b995f33664010000002322002083e1adc1eb82945fa99500bcd9df963b0e731524fd8eb25ef205e88d3bd7ab77ffffffff03a0370a00000000001976a914b00ff32bbc990acde3e5ac022e6d4120fb168f1e88ac7f791300000000001976a914128afed7e8d4e6f3a9d2d38ad560c307ebf392ba88ac54115c00000000001976a914c65d16caa1d8c1c46cc1bfac92eff06b02d8afcc88ac04004830450221009d93dc766b4a3417d7daccffe39719cd0344779c19d589d3a078625139a7dcd50220267c1b9b365d0eaa3b036771cbfc994c2b1c5b29e5107f023f036360cb60c8b50147304402206346b5c2bfa243c9cd0c5056abedfadc79e4a2b67b918315fc3faf79dfd12d7602203f729a665afd02ceb4b07898c06c81f0dfc378f66409ed828a4b5fe84f9287550169522102b951c91d97118489d1980ec472d89b5bc98fb98d0bafa17aca238d18a758b8642103d45b78e2a683330c62878e44610a5d1c8d40bd1f261b1110940b1b8a5aecd3e82103796ecd1667be6e20af571c46517e4ecf5e83052df864266658dd7f88e63efa6153ae0400483045022100e396deff2fe6dd6081e35f9dced6e09ea1b8b4830ae322b5d58986596996893d0220485420653c118c1a13b48941166b242077530d2b3cab908abe67af6b96ef2850014730440220171e11f4d6a106464a94e29f46750803a7deb214e6fbe2140ec5d80577dded0e02203483ab0c685f66e17b4afa86ba053732b43ff1ca7654796e72b69bd224bf26c4016952210375e42f77749f92a6b54c8e85fab2209e6807e15a3768c024a5cab01dc301c0282103fd4969521bd2d0f8e147c16655ae9c29dc48cb4f124b7a6398db78b1cbc878a221036bc18f387d1e4ba80492854cee639bd4ab6e3a310d9faa6f17350bbdc4c029d053ae25680a00";

    fn sample_tx(locktime: u32) -> Tx {
        Tx::new(
            1,
            vec![TxIn::new([0x22; 32], 1)],
            vec![TxOut::new(5_000, Script::empty())],
            locktime,
            Network::Test,
        )
    }

    /// Serves a fixed transaction regardless of the id asked for
    struct Fixed(Tx);

    impl TxFetcher for Fixed {
        fn fetch(&self, _tx_id: &[u8; 32], _net: Network) -> Result<Tx> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_cache_insert_and_clear() {
        let cache = TxCache::new();
        assert!(cache.is_empty());

        let tx = sample_tx(0);
        let id = cache.insert(tx.clone()).unwrap();
        assert_eq!(id, tx.hash().unwrap());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.fetch(&id, Network::Test).unwrap(), tx);

        cache.clear();
        assert!(cache.is_empty());
        assert!(matches!(
            cache.fetch(&id, Network::Test),
            Err(BitcoinError::TxNotFound(_))
        ));
    }

    #[test]
    fn test_cache_upstream() {
        let tx = sample_tx(7);
        let id = tx.hash().unwrap();
        let cache = TxCache::with_upstream(Fixed(tx.clone()));

        assert_eq!(cache.fetch(&id, Network::Test).unwrap(), tx);
        assert_eq!(cache.len(), 1);

        // upstream answering with a different transaction
        let other = sample_tx(8).hash().unwrap();
        assert!(matches!(
            cache.fetch(&other, Network::Test),
            Err(BitcoinError::TxIdMismatch { .. })
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_parse_fetched_segwit() {
        let raw = hex::decode(SEGWIT_TX_HEX).unwrap();
        let tx = parse_fetched(&raw, Network::Main).unwrap();

        assert_eq!(tx.version, 1);
        assert_eq!(tx.tx_ins.len(), 2);
        assert_eq!(tx.tx_outs.len(), 3);
        assert_eq!(tx.tx_outs[0].amount, 669600);
        assert_eq!(tx.tx_outs[1].amount, 1276287);
        assert_eq!(tx.tx_outs[2].amount, 6033748);
        assert_eq!(tx.locktime, 682021);
        assert_eq!(
            tx.id().unwrap(),
            "3ecf9b3d965cfaa2c472f09b5f487fbd838e4e1f861e3542c541d39c5cb7bc25"
        );
    }

    #[test]
    fn test_parse_fetched_legacy() {
        let tx = sample_tx(3);
        let mut raw = tx.serialize().unwrap();
        assert_eq!(parse_fetched(&raw, Network::Test).unwrap(), tx);

        raw.push(0);
        assert!(matches!(
            parse_fetched(&raw, Network::Test),
            Err(BitcoinError::Parse(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.base_url(Network::Main), "https://blockstream.info");
        assert_eq!(
            config.base_url(Network::Test),
            "https://blockstream.info/testnet"
        );
        assert_eq!(config.cache_dir, Some(PathBuf::from("txdb")));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_http_fetcher_reads_disk_cache() {
        let dir = std::env::temp_dir().join(format!("scratch-btc-txdb-{}", std::process::id()));
        let tx = sample_tx(11);
        let id = tx.id().unwrap();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(&id), tx.serialize().unwrap()).unwrap();

        let fetcher = HttpFetcher::new(FetcherConfig {
            cache_dir: Some(dir.clone()),
            ..FetcherConfig::default()
        })
        .unwrap();
        assert_eq!(fetcher.fetch(&tx.hash().unwrap(), Network::Test).unwrap(), tx);

        fs::remove_dir_all(&dir).unwrap();
    }
}
