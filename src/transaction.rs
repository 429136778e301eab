//! The Transaction object in Bitcoin
//! Reference: https://en.bitcoin.it/wiki/Transaction

use std::fmt;
use std::io::Cursor;

use num_bigint::BigInt;
use tracing::debug;

use crate::ecdsa::PrivateKey;
use crate::encoding::{
    bytes_to_int, decode_int, decode_varint, encode_int, encode_varint, little_endian_to_u64,
    read_array,
};
use crate::error::{BitcoinError, Result};
use crate::fetcher::TxFetcher;
use crate::hash::hash256;
use crate::keys::Network;
use crate::script::{ExecContext, Script, ScriptCmd, p2pkh_script_sig};

/// Legacy signature hash type covering every input and output
pub const SIGHASH_ALL: u32 = 1;

/// Bitcoin Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub version: u32,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
    pub locktime: u32,
    pub net: Network,
}

impl Tx {
    pub fn new(
        version: u32,
        tx_ins: Vec<TxIn>,
        tx_outs: Vec<TxOut>,
        locktime: u32,
        net: Network,
    ) -> Self {
        Tx {
            version,
            tx_ins,
            tx_outs,
            locktime,
            net,
        }
    }

    /// Parse a legacy (non-segwit) transaction
    pub fn parse(cursor: &mut Cursor<&[u8]>, net: Network) -> Result<Self> {
        let version = decode_int(cursor, 4)? as u32;

        let num_inputs = decode_varint(cursor)?;
        let tx_ins = (0..num_inputs)
            .map(|_| TxIn::parse(cursor))
            .collect::<Result<Vec<_>>>()?;

        let num_outputs = decode_varint(cursor)?;
        let tx_outs = (0..num_outputs)
            .map(|_| TxOut::parse(cursor))
            .collect::<Result<Vec<_>>>()?;

        let locktime = decode_int(cursor, 4)? as u32;

        Ok(Tx {
            version,
            tx_ins,
            tx_outs,
            locktime,
            net,
        })
    }

    /// Serialize to the wire format
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = encode_int(self.version as u64, 4);
        out.extend(encode_varint(self.tx_ins.len() as u64));
        for tx_in in &self.tx_ins {
            out.extend(tx_in.serialize()?);
        }
        self.serialize_tail(&mut out)?;
        Ok(out)
    }

    /// Outputs and lock time, shared by serialization and the signature hash
    fn serialize_tail(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(encode_varint(self.tx_outs.len() as u64));
        for tx_out in &self.tx_outs {
            out.extend(tx_out.serialize()?);
        }
        out.extend(encode_int(self.locktime as u64, 4));
        Ok(())
    }

    /// hash256 of the serialization, byte-reversed
    pub fn hash(&self) -> Result<[u8; 32]> {
        let mut hash = hash256(&self.serialize()?);
        hash.reverse();
        Ok(hash)
    }

    /// Transaction ID as hex
    pub fn id(&self) -> Result<String> {
        Ok(hex::encode(self.hash()?))
    }

    /// Sum of spent output amounts minus the sum of created ones. Totals
    /// are kept in `i128`, so no combination of `u64` amounts overflows.
    pub fn fee(&self, fetcher: &dyn TxFetcher) -> Result<i128> {
        let mut input_total = 0i128;
        for tx_in in &self.tx_ins {
            input_total += i128::from(tx_in.value(fetcher, self.net)?);
        }
        let output_total: i128 = self.tx_outs.iter().map(|o| i128::from(o.amount)).sum();
        Ok(input_total - output_total)
    }

    /// Legacy SIGHASH_ALL signature hash for one input. The signed input
    /// carries `redeem_script` when given, otherwise the script_pubkey it
    /// spends; every other input's script is blank.
    pub fn sig_hash(
        &self,
        input_index: usize,
        redeem_script: Option<&Script>,
        fetcher: &dyn TxFetcher,
    ) -> Result<BigInt> {
        if input_index >= self.tx_ins.len() {
            return Err(BitcoinError::InputIndex(input_index));
        }

        let mut out = encode_int(self.version as u64, 4);
        out.extend(encode_varint(self.tx_ins.len() as u64));
        for (i, tx_in) in self.tx_ins.iter().enumerate() {
            let script_sig = if i != input_index {
                Script::empty()
            } else if let Some(redeem) = redeem_script {
                redeem.clone()
            } else {
                tx_in.script_pubkey(fetcher, self.net)?
            };
            out.extend(tx_in.serialize_with(&script_sig)?);
        }
        self.serialize_tail(&mut out)?;
        out.extend(encode_int(SIGHASH_ALL as u64, 4));

        Ok(bytes_to_int(&hash256(&out)))
    }

    /// Run the input's script_sig against the output it spends
    pub fn verify_input(&self, input_index: usize, fetcher: &dyn TxFetcher) -> Result<bool> {
        let tx_in = self
            .tx_ins
            .get(input_index)
            .ok_or(BitcoinError::InputIndex(input_index))?;
        let script_pubkey = tx_in.script_pubkey(fetcher, self.net)?;

        // P2SH: the redeem script is the last push of the script_sig
        let redeem_script = if script_pubkey.is_p2sh() {
            let Some(ScriptCmd::Data(raw)) = tx_in.script_sig.cmds.last() else {
                debug!(input_index, "p2sh input has no redeem script");
                return Ok(false);
            };
            match Script::parse_raw(raw) {
                Ok(redeem) => Some(redeem),
                Err(e) => {
                    debug!(input_index, error = %e, "could not parse redeem script");
                    return Ok(false);
                }
            }
        } else {
            None
        };

        let z = self.sig_hash(input_index, redeem_script.as_ref(), fetcher)?;
        let ctx = ExecContext {
            z,
            locktime: self.locktime,
            sequence: tx_in.sequence,
            version: self.version,
        };
        let combined = &tx_in.script_sig + &script_pubkey;
        Ok(combined.evaluate(&ctx))
    }

    /// Check the fee and every input. Double spends are not detected.
    pub fn verify(&self, fetcher: &dyn TxFetcher) -> Result<bool> {
        let fee = self.fee(fetcher)?;
        if fee < 0 {
            debug!(fee = %fee, "transaction creates value");
            return Ok(false);
        }
        for i in 0..self.tx_ins.len() {
            if !self.verify_input(i, fetcher)? {
                debug!(input_index = i, "input failed verification");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sign a P2PKH input with a compressed public key, then verify it
    pub fn sign_input(
        &mut self,
        input_index: usize,
        private_key: &PrivateKey,
        fetcher: &dyn TxFetcher,
    ) -> Result<bool> {
        let z = self.sig_hash(input_index, None, fetcher)?;
        let mut der = private_key.sign(&z)?.der()?;
        der.push(SIGHASH_ALL as u8);
        let sec = private_key.public_key().sec(true)?;

        let tx_in = self
            .tx_ins
            .get_mut(input_index)
            .ok_or(BitcoinError::InputIndex(input_index))?;
        tx_in.script_sig = p2pkh_script_sig(der, sec);

        self.verify_input(input_index, fetcher)
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        matches!(
            self.tx_ins.as_slice(),
            [tx_in] if tx_in.prev_tx == [0u8; 32] && tx_in.prev_index == 0xffffffff
        )
    }

    /// Block height from the first push of a coinbase script_sig (BIP34)
    pub fn coinbase_height(&self) -> Option<u64> {
        if !self.is_coinbase() {
            return None;
        }
        match self.tx_ins[0].script_sig.cmds.first() {
            Some(ScriptCmd::Data(data)) => Some(little_endian_to_u64(data)),
            _ => None,
        }
    }
}

impl fmt::Display for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Ok(id) => writeln!(f, "tx: {id}")?,
            Err(_) => writeln!(f, "tx: <unserializable>")?,
        }
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "tx_ins:")?;
        for tx_in in &self.tx_ins {
            writeln!(f, "  {tx_in}")?;
        }
        writeln!(f, "tx_outs:")?;
        for tx_out in &self.tx_outs {
            writeln!(f, "  {tx_out}")?;
        }
        write!(f, "locktime: {}", self.locktime)
    }
}

/// Transaction Input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    /// Previous transaction hash, in the byte order of its hex id
    pub prev_tx: [u8; 32],
    pub prev_index: u32,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    /// Unsigned input with a final sequence number
    pub fn new(prev_tx: [u8; 32], prev_index: u32) -> Self {
        TxIn {
            prev_tx,
            prev_index,
            script_sig: Script::empty(),
            sequence: 0xffffffff,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut prev_tx = read_array::<32>(cursor)?;
        prev_tx.reverse();
        let prev_index = decode_int(cursor, 4)? as u32;
        let script_sig = Script::parse(cursor)?;
        let sequence = decode_int(cursor, 4)? as u32;

        Ok(TxIn {
            prev_tx,
            prev_index,
            script_sig,
            sequence,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.serialize_with(&self.script_sig)
    }

    fn serialize_with(&self, script_sig: &Script) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(41 + script_sig.cmds.len() * 34);
        let mut prev_tx = self.prev_tx;
        prev_tx.reverse();
        out.extend_from_slice(&prev_tx);
        out.extend(encode_int(self.prev_index as u64, 4));
        out.extend(script_sig.serialize()?);
        out.extend(encode_int(self.sequence as u64, 4));
        Ok(out)
    }

    /// The transaction this input spends from
    pub fn fetch_tx(&self, fetcher: &dyn TxFetcher, net: Network) -> Result<Tx> {
        fetcher.fetch(&self.prev_tx, net)
    }

    fn spent_output(&self, fetcher: &dyn TxFetcher, net: Network) -> Result<TxOut> {
        let mut tx = self.fetch_tx(fetcher, net)?;
        let index = self.prev_index as usize;
        if index >= tx.tx_outs.len() {
            return Err(BitcoinError::Parse(format!(
                "{self} spends a missing output"
            )));
        }
        Ok(tx.tx_outs.swap_remove(index))
    }

    /// Amount of the output being spent
    pub fn value(&self, fetcher: &dyn TxFetcher, net: Network) -> Result<u64> {
        Ok(self.spent_output(fetcher, net)?.amount)
    }

    /// Locking script of the output being spent
    pub fn script_pubkey(&self, fetcher: &dyn TxFetcher, net: Network) -> Result<Script> {
        Ok(self.spent_output(fetcher, net)?.script_pubkey)
    }
}

impl fmt::Display for TxIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.prev_tx), self.prev_index)
    }
}

/// Transaction Output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in satoshis
    pub amount: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(amount: u64, script_pubkey: Script) -> Self {
        TxOut {
            amount,
            script_pubkey,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let amount = decode_int(cursor, 8)?;
        let script_pubkey = Script::parse(cursor)?;
        Ok(TxOut {
            amount,
            script_pubkey,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = encode_int(self.amount, 8);
        out.extend(self.script_pubkey.serialize()?);
        Ok(out)
    }
}

impl fmt::Display for TxOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.amount, self.script_pubkey)
    }
}
