//! Bitcoin Script implementation
//! Reference: https://en.bitcoin.it/wiki/Script

use std::collections::VecDeque;
use std::fmt;
use std::io::Cursor;

use num_bigint::BigInt;
use num_traits::Zero;
use tracing::{debug, warn};

use crate::base58::{decode_base58_check, h160_to_p2pkh_address, h160_to_p2sh_address};
use crate::encoding::{decode_varint, encode_varint, read_array, read_bytes};
use crate::error::{BitcoinError, Result, ScriptError};
use crate::keys::Network;
use crate::op::{
    OP_0, OP_CHECKSIG, OP_DUP, OP_ELSE, OP_ENDIF, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160,
    OP_PUSHDATA1, OP_PUSHDATA2, OpKind, Stack, decode_num, encode_num, op_equal, op_hash160,
    op_kind, op_name, op_verify,
};

/// Largest data push a script may carry
pub const MAX_PUSH_SIZE: usize = 520;

/// Script command - either an opcode or data bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCmd {
    Op(u8),
    Data(Vec<u8>),
}

/// Values from the spending transaction that the interpreter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    /// Signature hash checked by OP_CHECKSIG
    pub z: BigInt,
    pub locktime: u32,
    /// Sequence of the input being evaluated
    pub sequence: u32,
    pub version: u32,
}

impl ExecContext {
    /// Context for a final version 1 transaction
    pub fn new(z: BigInt) -> Self {
        ExecContext {
            z,
            locktime: 0,
            sequence: u32::MAX,
            version: 1,
        }
    }
}

/// Bitcoin Script
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub cmds: Vec<ScriptCmd>,
}

impl Script {
    pub fn new(cmds: Vec<ScriptCmd>) -> Self {
        Script { cmds }
    }

    pub fn empty() -> Self {
        Script { cmds: Vec::new() }
    }

    /// Parse a varint length-prefixed script
    pub fn parse(data: &mut Cursor<&[u8]>) -> Result<Self> {
        let length = decode_varint(data)? as usize;
        Self::parse_body(data, length)
    }

    /// Parse a script body with no length prefix
    pub fn parse_raw(raw: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(raw);
        Self::parse_body(&mut cursor, raw.len())
    }

    fn parse_body(data: &mut Cursor<&[u8]>, length: usize) -> Result<Self> {
        let mut cmds = Vec::new();
        let mut count = 0usize;

        while count < length {
            let [current] = read_array::<1>(data)?;
            count += 1;

            match current {
                1..=75 => {
                    let n = current as usize;
                    cmds.push(ScriptCmd::Data(read_bytes(data, n)?));
                    count += n;
                }
                OP_PUSHDATA1 => {
                    let [n] = read_array::<1>(data)?;
                    let n = n as usize;
                    cmds.push(ScriptCmd::Data(read_bytes(data, n)?));
                    count += 1 + n;
                }
                OP_PUSHDATA2 => {
                    let n = u16::from_le_bytes(read_array(data)?) as usize;
                    cmds.push(ScriptCmd::Data(read_bytes(data, n)?));
                    count += 2 + n;
                }
                op => cmds.push(ScriptCmd::Op(op)),
            }
        }

        if count != length {
            return Err(BitcoinError::ScriptParseFailed(format!(
                "consumed {count} bytes of a {length} byte script"
            )));
        }
        Ok(Script { cmds })
    }

    /// Script body with no length prefix
    pub fn raw_serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        for cmd in &self.cmds {
            match cmd {
                ScriptCmd::Op(opcode) => out.push(*opcode),
                ScriptCmd::Data(data) => {
                    let length = data.len();
                    match length {
                        0 => out.push(OP_0),
                        1..=75 => out.push(length as u8),
                        76..=255 => {
                            out.push(OP_PUSHDATA1);
                            out.push(length as u8);
                        }
                        256..=MAX_PUSH_SIZE => {
                            out.push(OP_PUSHDATA2);
                            out.extend_from_slice(&(length as u16).to_le_bytes());
                        }
                        _ => return Err(BitcoinError::ScriptTooLong(length)),
                    }
                    out.extend_from_slice(data);
                }
            }
        }
        Ok(out)
    }

    /// Encode script to bytes, prefixed with its varint length
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let body = self.raw_serialize()?;
        let mut result = encode_varint(body.len() as u64);
        result.extend(body);
        Ok(result)
    }

    /// Concatenate two scripts
    pub fn concat(&self, other: &Script) -> Script {
        let mut cmds = self.cmds.clone();
        cmds.extend(other.cmds.iter().cloned());
        Script { cmds }
    }

    /// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_p2pkh(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [
                ScriptCmd::Op(OP_DUP),
                ScriptCmd::Op(OP_HASH160),
                ScriptCmd::Data(h160),
                ScriptCmd::Op(OP_EQUALVERIFY),
                ScriptCmd::Op(OP_CHECKSIG),
            ] if h160.len() == 20
        )
    }

    /// OP_HASH160 <20 bytes> OP_EQUAL
    pub fn is_p2sh(&self) -> bool {
        is_p2sh_pattern(&self.cmds)
    }

    /// Build the locking script paying to a Base58Check address
    pub fn from_address(address: &str) -> Result<Self> {
        let payload = decode_base58_check(address)?;
        let (&prefix, h160) = payload
            .split_first()
            .ok_or_else(|| BitcoinError::Parse("empty address payload".to_string()))?;
        let h160: [u8; 20] = h160
            .try_into()
            .map_err(|_| BitcoinError::Parse(format!("bad hash length in {address}")))?;

        let is_p2pkh = [Network::Main, Network::Test]
            .iter()
            .any(|net| net.p2pkh_prefix() == prefix);
        let is_p2sh = [Network::Main, Network::Test]
            .iter()
            .any(|net| net.p2sh_prefix() == prefix);
        if is_p2pkh {
            Ok(p2pkh_script(&h160))
        } else if is_p2sh {
            Ok(p2sh_script(&h160))
        } else {
            Err(BitcoinError::Parse(format!(
                "unknown address prefix {prefix:#04x}"
            )))
        }
    }

    /// Address this locking script pays to, for the standard templates
    pub fn address(&self, net: Network) -> Option<String> {
        let h160 = |data: &[u8]| <[u8; 20]>::try_from(data).ok();
        if self.is_p2pkh() {
            if let ScriptCmd::Data(data) = &self.cmds[2] {
                return h160(data).map(|h| h160_to_p2pkh_address(&h, net));
            }
        } else if self.is_p2sh() {
            if let ScriptCmd::Data(data) = &self.cmds[1] {
                return h160(data).map(|h| h160_to_p2sh_address(&h, net));
            }
        }
        None
    }

    /// Run the script, reporting why it failed
    pub fn execute(&self, ctx: &ExecContext) -> std::result::Result<(), ScriptError> {
        let mut cmds: VecDeque<ScriptCmd> = self.cmds.iter().cloned().collect();
        let mut stack = Stack::new();
        let mut altstack = Stack::new();

        while let Some(cmd) = cmds.pop_front() {
            match cmd {
                ScriptCmd::Op(code) => {
                    execute_op(code, &mut stack, &mut altstack, &mut cmds, ctx)?;
                }
                ScriptCmd::Data(data) => {
                    stack.push(data);
                    if is_p2sh_pattern(cmds.make_contiguous()) {
                        redeem_p2sh(&mut stack, &mut cmds)?;
                    }
                }
            }
        }

        match stack.last() {
            None => Err(ScriptError::EmptyStack),
            Some(top) if decode_num(top).is_zero() => Err(ScriptError::FalseResult),
            Some(_) => Ok(()),
        }
    }

    /// Run the script; failures are logged and reported as `false`
    pub fn evaluate(&self, ctx: &ExecContext) -> bool {
        match self.execute(ctx) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, script = %self, "script evaluation failed");
                false
            }
        }
    }
}

fn is_p2sh_pattern(cmds: &[ScriptCmd]) -> bool {
    matches!(
        cmds,
        [ScriptCmd::Op(OP_HASH160), ScriptCmd::Data(h160), ScriptCmd::Op(OP_EQUAL)]
            if h160.len() == 20
    )
}

fn execute_op(
    code: u8,
    stack: &mut Stack,
    altstack: &mut Stack,
    cmds: &mut VecDeque<ScriptCmd>,
    ctx: &ExecContext,
) -> std::result::Result<(), ScriptError> {
    let name = op_name(code);
    let ok = match op_kind(code) {
        Some(OpKind::Push(n)) => {
            stack.push(encode_num(&BigInt::from(n)));
            true
        }
        Some(OpKind::Stack(handler)) => handler(stack),
        Some(OpKind::AltStack(handler)) => handler(stack, altstack),
        Some(OpKind::Flow(handler)) => handler(stack, cmds),
        Some(OpKind::Sig(handler)) => handler(stack, &ctx.z),
        Some(OpKind::Context(handler)) => handler(stack, ctx),
        Some(OpKind::Unsupported) => {
            warn!(op = name, "unsupported opcode");
            return Err(ScriptError::UnsupportedOpcode(name));
        }
        // ELSE/ENDIF are consumed by IF/NOTIF; reaching one means it is unbalanced
        None if matches!(code, OP_ELSE | OP_ENDIF) => false,
        None => return Err(ScriptError::UnknownOpcode(code)),
    };

    if !ok {
        debug!(op = name, depth = stack.len(), "bad op");
        return Err(ScriptError::OpFailed(name));
    }
    Ok(())
}

/// BIP16: the redeem script just pushed must hash to the committed value;
/// its commands then replace the rest of the locking script
fn redeem_p2sh(
    stack: &mut Stack,
    cmds: &mut VecDeque<ScriptCmd>,
) -> std::result::Result<(), ScriptError> {
    let redeem_script = stack.last().cloned().ok_or(ScriptError::EmptyStack)?;
    let Some(ScriptCmd::Data(h160)) = cmds.get(1).cloned() else {
        return Err(ScriptError::P2shHashMismatch);
    };
    cmds.clear();

    let matched = op_hash160(stack) && {
        stack.push(h160);
        op_equal(stack)
    } && op_verify(stack);
    if !matched {
        debug!("bad p2sh h160");
        return Err(ScriptError::P2shHashMismatch);
    }

    let redeem = Script::parse_raw(&redeem_script).map_err(|e| {
        debug!(error = %e, "could not parse redeem script");
        ScriptError::BadRedeemScript
    })?;
    cmds.extend(redeem.cmds);
    Ok(())
}

/// OP_DUP OP_HASH160 <h160> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(h160: &[u8; 20]) -> Script {
    Script::new(vec![
        ScriptCmd::Op(OP_DUP),
        ScriptCmd::Op(OP_HASH160),
        ScriptCmd::Data(h160.to_vec()),
        ScriptCmd::Op(OP_EQUALVERIFY),
        ScriptCmd::Op(OP_CHECKSIG),
    ])
}

/// OP_HASH160 <h160> OP_EQUAL
pub fn p2sh_script(h160: &[u8; 20]) -> Script {
    Script::new(vec![
        ScriptCmd::Op(OP_HASH160),
        ScriptCmd::Data(h160.to_vec()),
        ScriptCmd::Op(OP_EQUAL),
    ])
}

/// <DER signature + sighash byte> <SEC public key>
pub fn p2pkh_script_sig(signature: Vec<u8>, sec: Vec<u8>) -> Script {
    Script::new(vec![ScriptCmd::Data(signature), ScriptCmd::Data(sec)])
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .cmds
            .iter()
            .map(|cmd| match cmd {
                ScriptCmd::Op(op) => match op_name(*op) {
                    "OP_UNKNOWN" => format!("OP_[{op}]"),
                    name => name.to_string(),
                },
                ScriptCmd::Data(data) => hex::encode(data),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl std::ops::Add for Script {
    type Output = Script;

    fn add(self, other: Script) -> Script {
        self.concat(&other)
    }
}

impl std::ops::Add for &Script {
    type Output = Script;

    fn add(self, other: &Script) -> Script {
        self.concat(other)
    }
}
