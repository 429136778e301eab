//! Script opcodes: number encoding, the handler for each opcode and the
//! table that dispatches an opcode byte to its handler.
//! Reference: https://en.bitcoin.it/wiki/Script

use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use tracing::debug;

use crate::ecdsa::Signature;
use crate::hash::{hash160, hash256, ripemd160, sha1, sha256};
use crate::keys::S256Point;
use crate::script::{ExecContext, ScriptCmd};

/// The main and alt stacks hold raw byte strings
pub type Stack = Vec<Vec<u8>>;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_1: u8 = 0x51;
pub const OP_2: u8 = 0x52;
pub const OP_16: u8 = 0x60;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_ADD: u8 = 0x93;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;

const LOCKTIME_THRESHOLD: u32 = 500_000_000;
const SEQUENCE_DISABLE_FLAG: u32 = 1 << 31;
const SEQUENCE_TYPE_FLAG: u32 = 1 << 22;
const SEQUENCE_MASK: u32 = 0x0000_ffff;

/// Encode a Script number: little-endian magnitude with the sign in the
/// top bit of the last byte. Zero is the empty string.
pub fn encode_num(num: &BigInt) -> Vec<u8> {
    if num.is_zero() {
        return Vec::new();
    }
    let negative = num.is_negative();
    let mut result = num.magnitude().to_bytes_le();
    let last = result.len() - 1;
    if result[last] & 0x80 != 0 {
        result.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        result[last] |= 0x80;
    }
    result
}

/// Decode a Script number; the empty string is zero
pub fn decode_num(element: &[u8]) -> BigInt {
    let Some(&last) = element.last() else {
        return BigInt::zero();
    };
    let mut magnitude = element.to_vec();
    let end = magnitude.len() - 1;
    magnitude[end] = last & 0x7f;
    let value = BigInt::from_bytes_le(Sign::Plus, &magnitude);
    if last & 0x80 != 0 { -value } else { value }
}

#[inline]
fn is_true(element: &[u8]) -> bool {
    !decode_num(element).is_zero()
}

#[inline]
fn push_bool(stack: &mut Stack, value: bool) {
    stack.push(encode_num(&BigInt::from(value as u8)));
}

fn pop_num(stack: &mut Stack) -> Option<BigInt> {
    stack.pop().map(|element| decode_num(&element))
}

/// Pop `b` then `a`, returning `(a, b)` in script order
fn pop_pair(stack: &mut Stack) -> Option<(BigInt, BigInt)> {
    if stack.len() < 2 {
        return None;
    }
    let b = pop_num(stack)?;
    let a = pop_num(stack)?;
    Some((a, b))
}

fn unary(stack: &mut Stack, f: impl FnOnce(BigInt) -> BigInt) -> bool {
    match pop_num(stack) {
        Some(n) => {
            stack.push(encode_num(&f(n)));
            true
        }
        None => false,
    }
}

fn binary(stack: &mut Stack, f: impl FnOnce(BigInt, BigInt) -> BigInt) -> bool {
    match pop_pair(stack) {
        Some((a, b)) => {
            stack.push(encode_num(&f(a, b)));
            true
        }
        None => false,
    }
}

fn compare(stack: &mut Stack, f: impl FnOnce(&BigInt, &BigInt) -> bool) -> bool {
    match pop_pair(stack) {
        Some((a, b)) => {
            push_bool(stack, f(&a, &b));
            true
        }
        None => false,
    }
}

fn hash_top<const N: usize>(stack: &mut Stack, f: fn(&[u8]) -> [u8; N]) -> bool {
    match stack.pop() {
        Some(element) => {
            stack.push(f(&element).to_vec());
            true
        }
        None => false,
    }
}

/// Index of the n-th element from the top, taken from a popped Script number
fn depth_index(stack: &mut Stack) -> Option<usize> {
    let n = pop_num(stack)?.to_usize()?;
    (n < stack.len()).then(|| stack.len() - 1 - n)
}

pub fn op_nop(_stack: &mut Stack) -> bool {
    true
}

pub fn op_verify(stack: &mut Stack) -> bool {
    stack.pop().is_some_and(|element| is_true(&element))
}

pub fn op_return(_stack: &mut Stack) -> bool {
    false
}

pub fn op_toaltstack(stack: &mut Stack, altstack: &mut Stack) -> bool {
    match stack.pop() {
        Some(element) => {
            altstack.push(element);
            true
        }
        None => false,
    }
}

pub fn op_fromaltstack(stack: &mut Stack, altstack: &mut Stack) -> bool {
    match altstack.pop() {
        Some(element) => {
            stack.push(element);
            true
        }
        None => false,
    }
}

pub fn op_2drop(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    stack.truncate(stack.len() - 2);
    true
}

fn dup_top(stack: &mut Stack, count: usize) -> bool {
    if stack.len() < count {
        return false;
    }
    let start = stack.len() - count;
    stack.extend_from_within(start..);
    true
}

pub fn op_2dup(stack: &mut Stack) -> bool {
    dup_top(stack, 2)
}

pub fn op_3dup(stack: &mut Stack) -> bool {
    dup_top(stack, 3)
}

pub fn op_2over(stack: &mut Stack) -> bool {
    if stack.len() < 4 {
        return false;
    }
    let start = stack.len() - 4;
    stack.extend_from_within(start..start + 2);
    true
}

pub fn op_2rot(stack: &mut Stack) -> bool {
    if stack.len() < 6 {
        return false;
    }
    let start = stack.len() - 6;
    let moved: Vec<_> = stack.drain(start..start + 2).collect();
    stack.extend(moved);
    true
}

pub fn op_2swap(stack: &mut Stack) -> bool {
    if stack.len() < 4 {
        return false;
    }
    let start = stack.len() - 4;
    let moved: Vec<_> = stack.drain(start..start + 2).collect();
    stack.extend(moved);
    true
}

pub fn op_ifdup(stack: &mut Stack) -> bool {
    match stack.last() {
        Some(top) => {
            if is_true(top) {
                let top = top.clone();
                stack.push(top);
            }
            true
        }
        None => false,
    }
}

pub fn op_depth(stack: &mut Stack) -> bool {
    let depth = BigInt::from(stack.len());
    stack.push(encode_num(&depth));
    true
}

pub fn op_drop(stack: &mut Stack) -> bool {
    stack.pop().is_some()
}

pub fn op_dup(stack: &mut Stack) -> bool {
    dup_top(stack, 1)
}

pub fn op_nip(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    stack.remove(stack.len() - 2);
    true
}

pub fn op_over(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    let second = stack[stack.len() - 2].clone();
    stack.push(second);
    true
}

pub fn op_pick(stack: &mut Stack) -> bool {
    match depth_index(stack) {
        Some(index) => {
            let element = stack[index].clone();
            stack.push(element);
            true
        }
        None => false,
    }
}

pub fn op_roll(stack: &mut Stack) -> bool {
    match depth_index(stack) {
        Some(index) => {
            let element = stack.remove(index);
            stack.push(element);
            true
        }
        None => false,
    }
}

pub fn op_rot(stack: &mut Stack) -> bool {
    if stack.len() < 3 {
        return false;
    }
    let element = stack.remove(stack.len() - 3);
    stack.push(element);
    true
}

pub fn op_swap(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    let element = stack.remove(stack.len() - 2);
    stack.push(element);
    true
}

pub fn op_tuck(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    let top = stack[stack.len() - 1].clone();
    stack.insert(stack.len() - 2, top);
    true
}

pub fn op_size(stack: &mut Stack) -> bool {
    match stack.last() {
        Some(top) => {
            let size = BigInt::from(top.len());
            stack.push(encode_num(&size));
            true
        }
        None => false,
    }
}

pub fn op_equal(stack: &mut Stack) -> bool {
    if stack.len() < 2 {
        return false;
    }
    let b = stack.pop();
    let a = stack.pop();
    push_bool(stack, a == b);
    true
}

pub fn op_equalverify(stack: &mut Stack) -> bool {
    op_equal(stack) && op_verify(stack)
}

pub fn op_1add(stack: &mut Stack) -> bool {
    unary(stack, |n| n + 1)
}

pub fn op_1sub(stack: &mut Stack) -> bool {
    unary(stack, |n| n - 1)
}

pub fn op_negate(stack: &mut Stack) -> bool {
    unary(stack, |n| -n)
}

pub fn op_abs(stack: &mut Stack) -> bool {
    unary(stack, |n| n.abs())
}

pub fn op_not(stack: &mut Stack) -> bool {
    unary(stack, |n| BigInt::from(n.is_zero() as u8))
}

pub fn op_0notequal(stack: &mut Stack) -> bool {
    unary(stack, |n| BigInt::from(!n.is_zero() as u8))
}

pub fn op_add(stack: &mut Stack) -> bool {
    binary(stack, |a, b| a + b)
}

pub fn op_sub(stack: &mut Stack) -> bool {
    binary(stack, |a, b| a - b)
}

pub fn op_mul(stack: &mut Stack) -> bool {
    binary(stack, |a, b| a * b)
}

pub fn op_booland(stack: &mut Stack) -> bool {
    compare(stack, |a, b| !a.is_zero() && !b.is_zero())
}

pub fn op_boolor(stack: &mut Stack) -> bool {
    compare(stack, |a, b| !a.is_zero() || !b.is_zero())
}

pub fn op_numequal(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a == b)
}

pub fn op_numequalverify(stack: &mut Stack) -> bool {
    op_numequal(stack) && op_verify(stack)
}

pub fn op_numnotequal(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a != b)
}

pub fn op_lessthan(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a < b)
}

pub fn op_greaterthan(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a > b)
}

pub fn op_lessthanorequal(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a <= b)
}

pub fn op_greaterthanorequal(stack: &mut Stack) -> bool {
    compare(stack, |a, b| a >= b)
}

pub fn op_min(stack: &mut Stack) -> bool {
    binary(stack, |a, b| a.min(b))
}

pub fn op_max(stack: &mut Stack) -> bool {
    binary(stack, |a, b| a.max(b))
}

/// x min max -> min <= x < max
pub fn op_within(stack: &mut Stack) -> bool {
    if stack.len() < 3 {
        return false;
    }
    let (Some(maximum), Some(minimum), Some(element)) =
        (pop_num(stack), pop_num(stack), pop_num(stack))
    else {
        return false;
    };
    push_bool(stack, minimum <= element && element < maximum);
    true
}

pub fn op_ripemd160(stack: &mut Stack) -> bool {
    hash_top(stack, ripemd160)
}

pub fn op_sha1(stack: &mut Stack) -> bool {
    hash_top(stack, sha1)
}

pub fn op_sha256(stack: &mut Stack) -> bool {
    hash_top(stack, sha256)
}

pub fn op_hash160(stack: &mut Stack) -> bool {
    hash_top(stack, hash160)
}

pub fn op_hash256(stack: &mut Stack) -> bool {
    hash_top(stack, hash256)
}

/// Split the commands up to the matching OP_ENDIF into the two branches and
/// put the selected one back at the front of the command stream
fn branch(stack: &mut Stack, cmds: &mut VecDeque<ScriptCmd>, take_true_when: bool) -> bool {
    if stack.is_empty() {
        return false;
    }
    let mut true_items = Vec::new();
    let mut false_items = Vec::new();
    let mut in_else = false;
    let mut depth = 1usize;
    let mut found = false;

    while let Some(cmd) = cmds.pop_front() {
        let current = if in_else { &mut false_items } else { &mut true_items };
        match cmd {
            ScriptCmd::Op(OP_IF | OP_NOTIF) => {
                depth += 1;
                current.push(cmd);
            }
            ScriptCmd::Op(OP_ELSE) if depth == 1 => in_else = true,
            ScriptCmd::Op(OP_ENDIF) => {
                if depth == 1 {
                    found = true;
                    break;
                }
                depth -= 1;
                current.push(cmd);
            }
            _ => current.push(cmd),
        }
    }

    if !found {
        return false;
    }
    let Some(element) = stack.pop() else {
        return false;
    };
    let selected = if is_true(&element) == take_true_when {
        true_items
    } else {
        false_items
    };
    for cmd in selected.into_iter().rev() {
        cmds.push_front(cmd);
    }
    true
}

pub fn op_if(stack: &mut Stack, cmds: &mut VecDeque<ScriptCmd>) -> bool {
    branch(stack, cmds, true)
}

pub fn op_notif(stack: &mut Stack, cmds: &mut VecDeque<ScriptCmd>) -> bool {
    branch(stack, cmds, false)
}

/// Pop a public key then a signature (with its trailing sighash byte) and
/// push whether the signature is valid for `z`
pub fn op_checksig(stack: &mut Stack, z: &BigInt) -> bool {
    if stack.len() < 2 {
        return false;
    }
    let (Some(sec), Some(mut der)) = (stack.pop(), stack.pop()) else {
        return false;
    };
    // the sighash type
    der.pop();

    let pubkey = match S256Point::parse(&sec) {
        Ok(pubkey) => pubkey,
        Err(e) => {
            debug!(error = %e, "OP_CHECKSIG could not parse public key");
            return false;
        }
    };
    let sig = match Signature::parse(&der) {
        Ok(sig) => sig,
        Err(e) => {
            debug!(error = %e, "OP_CHECKSIG could not parse signature");
            return false;
        }
    };

    if pubkey.verify(z, &sig) {
        push_bool(stack, true);
    } else {
        stack.push(Vec::new());
    }
    true
}

pub fn op_checksigverify(stack: &mut Stack, z: &BigInt) -> bool {
    op_checksig(stack, z) && op_verify(stack)
}

/// BIP65: the top of the stack is a lock time the spending transaction must
/// have reached. The stack is left untouched.
pub fn op_checklocktimeverify(stack: &Stack, ctx: &ExecContext) -> bool {
    let Some(top) = stack.last() else {
        return false;
    };
    if ctx.sequence == u32::MAX {
        return false;
    }
    let element = decode_num(top);
    let Some(required) = element.to_u64() else {
        return false;
    };
    let locktime = u64::from(ctx.locktime);
    let threshold = u64::from(LOCKTIME_THRESHOLD);
    if (required < threshold) != (locktime < threshold) {
        return false;
    }
    required <= locktime
}

/// BIP112: the top of the stack is a relative lock time the input's
/// sequence must satisfy. The stack is left untouched.
pub fn op_checksequenceverify(stack: &Stack, ctx: &ExecContext) -> bool {
    let Some(top) = stack.last() else {
        return false;
    };
    let element = decode_num(top);
    if element.is_negative() {
        return false;
    }
    // only the low 32 bits carry flags and the lock value
    let low_bits = (&element & &BigInt::from(u32::MAX)).to_u32().unwrap_or_default();
    if low_bits & SEQUENCE_DISABLE_FLAG != 0 {
        return true;
    }
    // the version field is a signed 32-bit integer
    if (ctx.version as i32) < 2 || ctx.sequence & SEQUENCE_DISABLE_FLAG != 0 {
        return false;
    }
    let mask = SEQUENCE_TYPE_FLAG | SEQUENCE_MASK;
    let required = low_bits & mask;
    let actual = ctx.sequence & mask;
    if (required & SEQUENCE_TYPE_FLAG) != (actual & SEQUENCE_TYPE_FLAG) {
        return false;
    }
    required & SEQUENCE_MASK <= actual & SEQUENCE_MASK
}

/// How the interpreter must call an opcode's handler
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Push a small number (OP_0, OP_1NEGATE, OP_1..OP_16)
    Push(i8),
    Stack(fn(&mut Stack) -> bool),
    AltStack(fn(&mut Stack, &mut Stack) -> bool),
    Flow(fn(&mut Stack, &mut VecDeque<ScriptCmd>) -> bool),
    Sig(fn(&mut Stack, &BigInt) -> bool),
    Context(fn(&Stack, &ExecContext) -> bool),
    Unsupported,
}

/// Look up the handler for an opcode; `None` for opcodes that are unknown
/// or disabled
pub fn op_kind(code: u8) -> Option<OpKind> {
    use OpKind::*;
    let kind = match code {
        0x00 => Push(0),
        0x4f => Push(-1),
        0x51..=0x60 => Push((code - 0x50) as i8),
        0x61 => Stack(op_nop),
        0x63 => Flow(op_if),
        0x64 => Flow(op_notif),
        0x69 => Stack(op_verify),
        0x6a => Stack(op_return),
        0x6b => AltStack(op_toaltstack),
        0x6c => AltStack(op_fromaltstack),
        0x6d => Stack(op_2drop),
        0x6e => Stack(op_2dup),
        0x6f => Stack(op_3dup),
        0x70 => Stack(op_2over),
        0x71 => Stack(op_2rot),
        0x72 => Stack(op_2swap),
        0x73 => Stack(op_ifdup),
        0x74 => Stack(op_depth),
        0x75 => Stack(op_drop),
        0x76 => Stack(op_dup),
        0x77 => Stack(op_nip),
        0x78 => Stack(op_over),
        0x79 => Stack(op_pick),
        0x7a => Stack(op_roll),
        0x7b => Stack(op_rot),
        0x7c => Stack(op_swap),
        0x7d => Stack(op_tuck),
        0x82 => Stack(op_size),
        0x87 => Stack(op_equal),
        0x88 => Stack(op_equalverify),
        0x8b => Stack(op_1add),
        0x8c => Stack(op_1sub),
        0x8f => Stack(op_negate),
        0x90 => Stack(op_abs),
        0x91 => Stack(op_not),
        0x92 => Stack(op_0notequal),
        0x93 => Stack(op_add),
        0x94 => Stack(op_sub),
        0x95 => Stack(op_mul),
        0x9a => Stack(op_booland),
        0x9b => Stack(op_boolor),
        0x9c => Stack(op_numequal),
        0x9d => Stack(op_numequalverify),
        0x9e => Stack(op_numnotequal),
        0x9f => Stack(op_lessthan),
        0xa0 => Stack(op_greaterthan),
        0xa1 => Stack(op_lessthanorequal),
        0xa2 => Stack(op_greaterthanorequal),
        0xa3 => Stack(op_min),
        0xa4 => Stack(op_max),
        0xa5 => Stack(op_within),
        0xa6 => Stack(op_ripemd160),
        0xa7 => Stack(op_sha1),
        0xa8 => Stack(op_sha256),
        0xa9 => Stack(op_hash160),
        0xaa => Stack(op_hash256),
        // OP_CODESEPARATOR
        0xab => Stack(op_nop),
        0xac => Sig(op_checksig),
        0xad => Sig(op_checksigverify),
        0xae | 0xaf => Unsupported,
        0xb0 => Stack(op_nop),
        0xb1 => Context(op_checklocktimeverify),
        0xb2 => Context(op_checksequenceverify),
        0xb3..=0xb9 => Stack(op_nop),
        _ => return None,
    };
    Some(kind)
}

/// Opcode names
pub static OP_CODE_NAMES: LazyLock<HashMap<u8, &'static str>> = LazyLock::new(|| {
    [
        (0, "OP_0"),
        (76, "OP_PUSHDATA1"),
        (77, "OP_PUSHDATA2"),
        (78, "OP_PUSHDATA4"),
        (79, "OP_1NEGATE"),
        (80, "OP_RESERVED"),
        (81, "OP_1"),
        (82, "OP_2"),
        (83, "OP_3"),
        (84, "OP_4"),
        (85, "OP_5"),
        (86, "OP_6"),
        (87, "OP_7"),
        (88, "OP_8"),
        (89, "OP_9"),
        (90, "OP_10"),
        (91, "OP_11"),
        (92, "OP_12"),
        (93, "OP_13"),
        (94, "OP_14"),
        (95, "OP_15"),
        (96, "OP_16"),
        (97, "OP_NOP"),
        (98, "OP_VER"),
        (99, "OP_IF"),
        (100, "OP_NOTIF"),
        (101, "OP_VERIF"),
        (102, "OP_VERNOTIF"),
        (103, "OP_ELSE"),
        (104, "OP_ENDIF"),
        (105, "OP_VERIFY"),
        (106, "OP_RETURN"),
        (107, "OP_TOALTSTACK"),
        (108, "OP_FROMALTSTACK"),
        (109, "OP_2DROP"),
        (110, "OP_2DUP"),
        (111, "OP_3DUP"),
        (112, "OP_2OVER"),
        (113, "OP_2ROT"),
        (114, "OP_2SWAP"),
        (115, "OP_IFDUP"),
        (116, "OP_DEPTH"),
        (117, "OP_DROP"),
        (118, "OP_DUP"),
        (119, "OP_NIP"),
        (120, "OP_OVER"),
        (121, "OP_PICK"),
        (122, "OP_ROLL"),
        (123, "OP_ROT"),
        (124, "OP_SWAP"),
        (125, "OP_TUCK"),
        (126, "OP_CAT"),
        (127, "OP_SUBSTR"),
        (128, "OP_LEFT"),
        (129, "OP_RIGHT"),
        (130, "OP_SIZE"),
        (131, "OP_INVERT"),
        (132, "OP_AND"),
        (133, "OP_OR"),
        (134, "OP_XOR"),
        (135, "OP_EQUAL"),
        (136, "OP_EQUALVERIFY"),
        (137, "OP_RESERVED1"),
        (138, "OP_RESERVED2"),
        (139, "OP_1ADD"),
        (140, "OP_1SUB"),
        (141, "OP_2MUL"),
        (142, "OP_2DIV"),
        (143, "OP_NEGATE"),
        (144, "OP_ABS"),
        (145, "OP_NOT"),
        (146, "OP_0NOTEQUAL"),
        (147, "OP_ADD"),
        (148, "OP_SUB"),
        (149, "OP_MUL"),
        (150, "OP_DIV"),
        (151, "OP_MOD"),
        (152, "OP_LSHIFT"),
        (153, "OP_RSHIFT"),
        (154, "OP_BOOLAND"),
        (155, "OP_BOOLOR"),
        (156, "OP_NUMEQUAL"),
        (157, "OP_NUMEQUALVERIFY"),
        (158, "OP_NUMNOTEQUAL"),
        (159, "OP_LESSTHAN"),
        (160, "OP_GREATERTHAN"),
        (161, "OP_LESSTHANOREQUAL"),
        (162, "OP_GREATERTHANOREQUAL"),
        (163, "OP_MIN"),
        (164, "OP_MAX"),
        (165, "OP_WITHIN"),
        (166, "OP_RIPEMD160"),
        (167, "OP_SHA1"),
        (168, "OP_SHA256"),
        (169, "OP_HASH160"),
        (170, "OP_HASH256"),
        (171, "OP_CODESEPARATOR"),
        (172, "OP_CHECKSIG"),
        (173, "OP_CHECKSIGVERIFY"),
        (174, "OP_CHECKMULTISIG"),
        (175, "OP_CHECKMULTISIGVERIFY"),
        (176, "OP_NOP1"),
        (177, "OP_CHECKLOCKTIMEVERIFY"),
        (178, "OP_CHECKSEQUENCEVERIFY"),
        (179, "OP_NOP4"),
        (180, "OP_NOP5"),
        (181, "OP_NOP6"),
        (182, "OP_NOP7"),
        (183, "OP_NOP8"),
        (184, "OP_NOP9"),
        (185, "OP_NOP10"),
    ]
    .into_iter()
    .collect()
});

/// Name of an opcode, or "OP_UNKNOWN"
pub fn op_name(code: u8) -> &'static str {
    OP_CODE_NAMES.get(&code).copied().unwrap_or("OP_UNKNOWN")
}
