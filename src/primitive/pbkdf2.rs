//! PBKDF2-HMAC-SHA256 原语
//!
//! 通过 `pbkdf2` crate 计算 PBKDF2-HMAC-SHA256（RFC 8018）。

use hmac::Hmac;
use sha2::Sha256;

use super::{PrimitiveProvider, PrimitiveResult, check_salt_len, require_rounds};
use crate::error::PrimitiveError;
use crate::params::HashParameters;

type HmacSha256 = Hmac<Sha256>;

/// 最小 rounds
pub const ROUNDS_MIN: u32 = 1;
/// 最大 rounds
pub const ROUNDS_MAX: u32 = u32::MAX - 1;
/// salt 最大长度（字节）
pub const SALT_MAX: usize = 1024;
/// 摘要长度（字节）
pub const DIGEST_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA256 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha256;

impl PrimitiveProvider for Pbkdf2Sha256 {
    fn name(&self) -> &'static str {
        "pbkdf2-sha256"
    }

    fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        check_salt_len(salt_len, 0, SALT_MAX)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        let rounds = require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        let mut out = vec![0u8; DIGEST_SIZE];
        pbkdf2_hmac_sha256(secret, salt, rounds, &mut out)?;
        Ok(out)
    }
}

/// 使用 PBKDF2-HMAC-SHA256 派生密钥，填满 `out`
///
/// # Example
///
/// ```rust
/// use passlib::primitive::pbkdf2_hmac_sha256;
///
/// let mut key = [0u8; 32];
/// pbkdf2_hmac_sha256(b"password", b"salt", 1, &mut key).unwrap();
/// assert_eq!(key[0], 0x12);
/// ```
pub fn pbkdf2_hmac_sha256(
    secret: &[u8],
    salt: &[u8],
    rounds: u32,
    out: &mut [u8],
) -> PrimitiveResult<()> {
    if rounds == 0 {
        return Err(PrimitiveError::RoundsOutOfRange {
            min: ROUNDS_MIN,
            max: ROUNDS_MAX,
            actual: rounds,
        });
    }

    ::pbkdf2::pbkdf2::<HmacSha256>(secret, salt, rounds, out)
        .map_err(|_| PrimitiveError::Backend("invalid HMAC key length".to_string()))?;

    Ok(())
}
