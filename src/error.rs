//! Unified error types for the library

use thiserror::Error;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum BitcoinError {
    #[error("{value} is not in field range 0 to {modulus} - 1")]
    InvalidFieldElement { value: String, modulus: String },

    #[error("Cannot operate on elements of different fields")]
    FieldMismatch,

    #[error("Division by zero in field")]
    DivisionByZero,

    #[error("({x}, {y}) is not on the curve")]
    PointNotOnCurve { x: String, y: String },

    #[error("Points are not on the same curve")]
    CurveMismatch,

    #[error("Bad signature encoding: {0}")]
    BadSignatureEncoding(&'static str),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(&'static str),

    #[error("Private key must be in range 1 to N - 1")]
    InvalidPrivateKey,

    #[error("Script push of {0} bytes exceeds 520 bytes")]
    ScriptTooLong(usize),

    #[error("Parsing script failed: {0}")]
    ScriptParseFailed(String),

    #[error("Invalid base58 character: {0:?}")]
    InvalidBase58Character(char),

    #[error("Bad checksum")]
    BadChecksum,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Input index {0} out of range")]
    InputIndex(usize),

    #[error("Transaction {0} not found")]
    TxNotFound(String),

    #[error("Transaction id mismatch: requested {requested}, got {actual}")]
    TxIdMismatch { requested: String, actual: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hex::FromHexError> for BitcoinError {
    fn from(e: hex::FromHexError) -> Self {
        BitcoinError::Parse(e.to_string())
    }
}

/// Why a script evaluation stopped without succeeding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("{0} failed")]
    OpFailed(&'static str),

    #[error("Unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("{0} is not supported")]
    UnsupportedOpcode(&'static str),

    #[error("Redeem script does not match the P2SH hash")]
    P2shHashMismatch,

    #[error("Redeem script could not be parsed")]
    BadRedeemScript,

    #[error("Stack is empty after evaluation")]
    EmptyStack,

    #[error("Top stack element is false")]
    FalseResult,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BitcoinError>;
