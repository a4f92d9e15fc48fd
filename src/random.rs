//! 安全随机数与常量时间比较
//!
//! 提供密码学安全的 salt 生成功能，以及用于摘要校验的常量时间比较。

use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::error::{CryptoError, Error, Result};

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)
///
/// # Example
///
/// ```rust
/// use passlib::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(16).unwrap();
/// assert_eq!(bytes.len(), 16);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Crypto(CryptoError::RngFailed(format!("{:?}", e))))?;
    Ok(bytes)
}

/// 从 64 字符的字母表中生成随机字符串
///
/// crypt 系列哈希的 salt 以字符而非字节的形式存储。字母表恰好 64 个字符，
/// 因此取随机字节的低 6 位即可得到无偏的下标。
///
/// # Example
///
/// ```rust
/// use passlib::random::generate_salt_chars;
///
/// const ALPHABET: &[u8; 64] =
///     b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// let salt = generate_salt_chars(ALPHABET, 16).unwrap();
/// assert_eq!(salt.len(), 16);
/// assert!(salt.iter().all(|c| ALPHABET.contains(c)));
/// ```
pub fn generate_salt_chars(alphabet: &[u8; 64], length: usize) -> Result<Vec<u8>> {
    let mut bytes = generate_random_bytes(length)?;
    for b in bytes.iter_mut() {
        *b = alphabet[(*b & 0x3f) as usize];
    }
    Ok(bytes)
}

/// 常量时间比较两个字节切片
///
/// 长度不同时直接返回 `false`（长度不是秘密）；长度相同时比较耗时与
/// 第一个不同字节的位置无关。
///
/// # Example
///
/// ```rust
/// use passlib::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"digest", b"digest"));
/// assert!(!constant_time_compare(b"digest", b"digesT"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    #[test]
    fn test_generate_random_bytes() {
        let bytes = generate_random_bytes(32).unwrap();
        assert_eq!(bytes.len(), 32);

        // 两次生成不应相同
        let bytes2 = generate_random_bytes(32).unwrap();
        assert_ne!(bytes, bytes2);
    }

    #[test]
    fn test_generate_zero_length() {
        assert!(generate_random_bytes(0).unwrap().is_empty());
        assert!(generate_salt_chars(HASH64, 0).unwrap().is_empty());
    }

    #[test]
    fn test_generate_salt_chars_alphabet() {
        for _ in 0..20 {
            let salt = generate_salt_chars(HASH64, 16).unwrap();
            assert_eq!(salt.len(), 16);
            assert!(salt.iter().all(|c| HASH64.contains(c)));
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"hello", b"hell"));
        assert!(constant_time_compare(b"", b""));
    }

    #[test]
    fn test_constant_time_compare_reference_table() {
        // 不同位置的差异都必须被检测到
        let base = [0x5au8; 32];
        for pos in 0..base.len() {
            for flip in [0x01u8, 0x80, 0xff] {
                let mut other = base;
                other[pos] ^= flip;
                assert!(!constant_time_compare(&base, &other), "pos={pos} flip={flip:#x}");
            }
        }
        assert!(constant_time_compare(&base, &base.clone()));
    }
}
