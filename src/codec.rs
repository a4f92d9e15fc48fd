//! 哈希字符串使用的文本编码
//!
//! - crypt "hash64"：`./0-9A-Za-z`，小端 6 位分组（SHA-crypt）
//! - bcrypt base64：`./A-Za-z0-9`，无填充
//! - adapted base64 (ab64)：标准 base64 以 `.` 代替 `+`，无填充（PBKDF2）
//! - 标准 base64（Argon2 无填充，LDAP 带填充）
//!
//! 所有解码函数只接受规范编码：重新编码必须得到完全相同的字符串。

use base64::Engine;
use base64::alphabet::{self, Alphabet};
use base64::engine::general_purpose::{self, GeneralPurpose};

use crate::error::DecodeError;

/// crypt hash64 字母表
pub const HASH64_ALPHABET: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// bcrypt 使用的 base64 引擎
pub const BCRYPT_B64: GeneralPurpose =
    GeneralPurpose::new(&alphabet::BCRYPT, general_purpose::NO_PAD);

const AB64_ALPHABET: Alphabet =
    match Alphabet::new("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789./") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("invalid ab64 alphabet"),
    };

/// adapted base64 引擎
pub const AB64: GeneralPurpose = GeneralPurpose::new(&AB64_ALPHABET, general_purpose::NO_PAD);

/// 标准 base64，无填充
pub const B64_NO_PAD: GeneralPurpose = general_purpose::STANDARD_NO_PAD;

/// 标准 base64，带填充
pub const B64_PAD: GeneralPurpose = general_purpose::STANDARD;

/// 以规范形式解码 base64 字段
pub fn decode_canonical(
    engine: &GeneralPurpose,
    field: &'static str,
    input: &str,
) -> Result<Vec<u8>, DecodeError> {
    let bytes = engine.decode(input).map_err(|e| match e {
        base64::DecodeError::InvalidByte(_, _) => DecodeError::InvalidAlphabet(field),
        _ => DecodeError::NonCanonical(field),
    })?;
    if engine.encode(&bytes) != input {
        return Err(DecodeError::NonCanonical(field));
    }
    Ok(bytes)
}

/// 字符是否属于 hash64 字母表
pub fn is_hash64(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.' || c == b'/'
}

fn hash64_value(c: u8) -> Option<u32> {
    let value = match c {
        b'.' => 0,
        b'/' => 1,
        b'0'..=b'9' => c - b'0' + 2,
        b'A'..=b'Z' => c - b'A' + 12,
        b'a'..=b'z' => c - b'a' + 38,
        _ => return None,
    };
    Some(u32::from(value))
}

/// 将 `value` 的低 `6 * chars` 位按小端 6 位分组编码
pub fn hash64_encode_int(out: &mut String, mut value: u32, chars: usize) {
    for _ in 0..chars {
        out.push(HASH64_ALPHABET[(value & 0x3f) as usize] as char);
        value >>= 6;
    }
}

/// [`hash64_encode_int`] 的逆运算；`chars` 最多 4 个字符
pub fn hash64_decode_int(chars: &[u8]) -> Option<u32> {
    if chars.len() > 4 {
        return None;
    }
    let mut value = 0u32;
    for (i, &c) in chars.iter().enumerate() {
        value |= hash64_value(c)? << (6 * i);
    }
    Some(value)
}

/// 解析不带前导零、不带符号的十进制整数
pub fn parse_decimal(field: &'static str, input: &str) -> Result<u32, DecodeError> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidStructure(field));
    }
    if input.len() > 1 && input.starts_with('0') {
        return Err(DecodeError::NonCanonical(field));
    }
    input
        .parse::<u32>()
        .map_err(|_| DecodeError::ParameterOutOfRange {
            param: field,
            value: input.to_string(),
        })
}
