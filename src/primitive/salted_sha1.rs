//! 加盐 SHA-1 原语（LDAP `{SSHA}`）
//!
//! `digest = SHA1(secret || salt)`，单轮，仅用于校验和迁移遗留哈希。

use sha1::{Digest, Sha1};

use super::{PrimitiveProvider, PrimitiveResult, check_salt_len};
use crate::error::PrimitiveError;
use crate::params::HashParameters;

/// salt 最小长度（字节）
pub const SALT_MIN: usize = 4;
/// salt 最大长度（字节）
pub const SALT_MAX: usize = 16;
/// 摘要长度（字节）
pub const DIGEST_SIZE: usize = 20;

/// 加盐 SHA-1 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha1;

impl PrimitiveProvider for SaltedSha1 {
    fn name(&self) -> &'static str {
        "salted-sha1"
    }

    fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        if let Some(rounds) = params.rounds {
            return Err(PrimitiveError::InvalidParameter {
                name: "rounds",
                message: format!("salted SHA-1 is not iterated (got {})", rounds),
            });
        }
        check_salt_len(salt_len, SALT_MIN, SALT_MAX)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        _params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        let mut hasher = Sha1::new();
        hasher.update(secret);
        hasher.update(salt);
        Ok(hasher.finalize().to_vec())
    }
}
