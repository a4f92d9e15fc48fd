//! 哈希原语
//!
//! 每个 [`PrimitiveProvider`] 封装一种具体算法的原始计算：
//! `secret + salt + params → digest`。原语是无状态的纯函数：
//!
//! - 相同输入总是得到相同输出
//! - 参数在任何昂贵计算开始之前校验，越界时返回 [`PrimitiveError`]
//! - 不记录日志，不缓存 secret；中间缓冲区在返回前清零（尽力而为）
//!
//! ## 示例
//!
//! ```rust
//! use passlib::primitive::{PrimitiveProvider, Sha256Crypt};
//! use passlib::HashParameters;
//!
//! let params = HashParameters::new(10).with_rounds(5000);
//! let digest = Sha256Crypt.compute(b"Hello world!", b"saltstring", &params).unwrap();
//! assert_eq!(digest.len(), 32);
//! ```

#[cfg(feature = "argon2")]
mod argon2;
#[cfg(feature = "bcrypt")]
mod bcrypt;
mod pbkdf2;
mod salted_sha1;
mod sha_crypt;

#[cfg(feature = "argon2")]
pub use self::argon2::{Argon2id, M_COST_MAX as ARGON2_M_COST_MAX};
#[cfg(feature = "bcrypt")]
pub use self::bcrypt::{Bcrypt, TRUNCATE_SIZE as BCRYPT_TRUNCATE_SIZE};
pub use self::pbkdf2::{Pbkdf2Sha256, pbkdf2_hmac_sha256};
pub use self::salted_sha1::SaltedSha1;
pub use self::sha_crypt::{Sha256Crypt, Sha512Crypt};

use crate::error::PrimitiveError;
use crate::params::HashParameters;

/// 原语计算结果类型
pub type PrimitiveResult<T> = std::result::Result<T, PrimitiveError>;

/// 任何原语接受的 secret 最大长度（字节）
///
/// SHA-crypt 的 P 序列构造与 secret 长度成平方关系，超长输入会长时间占用 CPU。
pub const MAX_SECRET_SIZE: usize = 4096;

/// 哈希原语接口
pub trait PrimitiveProvider: Send + Sync {
    /// 原语名称（用于日志与错误信息）
    fn name(&self) -> &'static str;

    /// 摘要长度（字节）
    fn digest_size(&self) -> usize;

    /// 校验 salt 长度与参数是否在算法允许范围内
    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()>;

    /// 执行原始计算，调用方保证参数已通过 [`check_params`](Self::check_params)
    fn derive(&self, secret: &[u8], salt: &[u8], params: &HashParameters)
    -> PrimitiveResult<Vec<u8>>;

    /// 校验 secret 长度与参数后计算摘要
    fn compute(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        check_secret_len(secret.len(), MAX_SECRET_SIZE)?;
        self.check_params(salt.len(), params)?;
        self.derive(secret, salt, params)
    }
}

/// 取出必需的 rounds 并检查范围
pub(crate) fn require_rounds(params: &HashParameters, min: u32, max: u32) -> PrimitiveResult<u32> {
    let rounds = params
        .rounds
        .ok_or(PrimitiveError::MissingParameter("rounds"))?;
    if !(min..=max).contains(&rounds) {
        return Err(PrimitiveError::RoundsOutOfRange {
            min,
            max,
            actual: rounds,
        });
    }
    Ok(rounds)
}

/// 检查 secret 长度上限
pub(crate) fn check_secret_len(actual: usize, max: usize) -> PrimitiveResult<()> {
    if actual > max {
        return Err(PrimitiveError::SecretTooLong { max, actual });
    }
    Ok(())
}

/// 检查 salt 长度范围
pub(crate) fn check_salt_len(actual: usize, min: usize, max: usize) -> PrimitiveResult<()> {
    if !(min..=max).contains(&actual) {
        return Err(PrimitiveError::SaltSizeOutOfRange { min, max, actual });
    }
    Ok(())
}
