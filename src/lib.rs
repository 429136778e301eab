//! Bitcoin from scratch - Rust implementation
//!
//! Finite fields, secp256k1, ECDSA, Base58Check, the Script interpreter and
//! legacy transactions, built up from arbitrary-precision integers.

pub mod base58;
pub mod bitcoin;
pub mod curves;
pub mod ecdsa;
pub mod encoding;
pub mod error;
pub mod fetcher;
pub mod field;
pub mod hash;
pub mod keys;
pub mod op;
pub mod script;
pub mod transaction;

pub use error::{BitcoinError, Result, ScriptError};

pub use base58::{decode_base58_check, encode_base58, encode_base58_check};
pub use bitcoin::{CURVE, G, N, P};
pub use curves::{Curve, Point};
pub use ecdsa::{PrivateKey, Signature};
pub use fetcher::{FetcherConfig, HttpFetcher, TxCache, TxFetcher};
pub use field::FieldElement;
pub use keys::{Network, S256Point};
pub use script::{ExecContext, Script, ScriptCmd};
pub use transaction::{Tx, TxIn, TxOut};
