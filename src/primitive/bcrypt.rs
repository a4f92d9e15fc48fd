//! bcrypt 原语
//!
//! 通过 `bcrypt` crate 计算 EksBlowfish 摘要。secret 按字节处理，
//! 超过 [`TRUNCATE_SIZE`] 字节时返回 [`PrimitiveError::SecretTooLong`]，
//! 不会静默截断。

use ::bcrypt::{Version, hash_with_salt};
use base64::Engine;

use super::{
    PrimitiveProvider, PrimitiveResult, check_salt_len, check_secret_len, require_rounds,
};
use crate::codec::BCRYPT_B64;
use crate::error::PrimitiveError;
use crate::params::HashParameters;

/// 最小 cost
pub const COST_MIN: u32 = 4;
/// 最大 cost
pub const COST_MAX: u32 = 31;
/// salt 长度（字节）
pub const SALT_SIZE: usize = 16;
/// 摘要长度（字节）
pub const DIGEST_SIZE: usize = 23;
/// EksBlowfish 密钥调度能使用的 secret 最大长度（字节）
pub const TRUNCATE_SIZE: usize = 72;

/// `$2b$NN$` 前缀加 22 字符 salt
const DIGEST_OFFSET: usize = 7 + 22;

/// bcrypt 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct Bcrypt;

impl PrimitiveProvider for Bcrypt {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        require_rounds(params, COST_MIN, COST_MAX)?;
        check_salt_len(salt_len, SALT_SIZE, SALT_SIZE)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        check_secret_len(secret.len(), TRUNCATE_SIZE)?;
        let cost = require_rounds(params, COST_MIN, COST_MAX)?;
        let salt: [u8; SALT_SIZE] = salt.try_into().map_err(|_| {
            PrimitiveError::SaltSizeOutOfRange {
                min: SALT_SIZE,
                max: SALT_SIZE,
                actual: salt.len(),
            }
        })?;

        // 长度已检查，追加的 NUL 之外不会丢弃任何 secret 字节
        let parts = hash_with_salt(secret, cost, salt)
            .map_err(|e| PrimitiveError::Backend(format!("bcrypt hash failed: {}", e)))?;
        let formatted = parts.format_for_version(Version::TwoB);

        let encoded = formatted
            .get(DIGEST_OFFSET..)
            .ok_or_else(|| PrimitiveError::Backend("bcrypt output too short".to_string()))?;
        let digest = BCRYPT_B64
            .decode(encoded)
            .map_err(|e| PrimitiveError::Backend(format!("bcrypt output not decodable: {}", e)))?;
        if digest.len() != DIGEST_SIZE {
            return Err(PrimitiveError::Backend(format!(
                "bcrypt digest has {} bytes",
                digest.len()
            )));
        }
        Ok(digest)
    }
}
