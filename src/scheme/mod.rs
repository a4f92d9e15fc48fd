//! 哈希 scheme
//!
//! 每个 [`SchemeHandler`] 对应一个哈希算法家族，负责：
//!
//! - **identify**: 快速判断字符串是否属于本 scheme（只看前缀与结构，不做完整解析）
//! - **decode / encode**: 在规范文本格式与 [`ParsedHash`] 之间转换
//! - **hash / verify**: 生成随机 salt 并计算哈希；以常量时间比较校验摘要
//! - **needs_rehash**: 判断参数是否低于 Policy 要求的下限
//!
//! ## 内置 scheme
//!
//! | ID                 | 格式                                             |
//! |--------------------|--------------------------------------------------|
//! | `bcrypt`           | `$2b$12$<salt><digest>`                          |
//! | `sha256_crypt`     | `$5$rounds=535000$<salt>$<digest>`               |
//! | `sha512_crypt`     | `$6$rounds=656000$<salt>$<digest>`               |
//! | `pbkdf2_sha256`    | `$pbkdf2-sha256$29000$<salt>$<digest>`           |
//! | `argon2`           | `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<digest>` |
//! | `ldap_salted_sha1` | `{SSHA}<base64>`                                 |
//!
//! ## 示例
//!
//! ```rust
//! use passlib::scheme::{BuiltinScheme, SchemeHandler};
//! use passlib::HashParameters;
//!
//! let handler = BuiltinScheme::Pbkdf2Sha256.handler();
//! let params = HashParameters::new(16).with_rounds(1000);
//! let hash = handler.hash(b"password", &params).unwrap();
//!
//! assert!(handler.identify(&hash));
//! assert!(handler.verify(b"password", &hash).unwrap());
//! assert!(!handler.verify(b"wrong", &hash).unwrap());
//! ```

#[cfg(feature = "argon2")]
mod argon2;
#[cfg(feature = "bcrypt")]
mod bcrypt;
mod ldap;
mod pbkdf2;
mod sha_crypt;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[cfg(feature = "argon2")]
pub use self::argon2::Argon2Handler;
#[cfg(feature = "bcrypt")]
pub use self::bcrypt::BcryptHandler;
pub use self::ldap::LdapSaltedSha1Handler;
pub use self::pbkdf2::Pbkdf2Sha256Handler;
pub use self::sha_crypt::ShaCryptHandler;

use crate::error::{DecodeError, PrimitiveError, Result};
use crate::params::{HashParameters, ParameterFloor};
use crate::primitive::{MAX_SECRET_SIZE, PrimitiveProvider};
use crate::random::{constant_time_compare, generate_random_bytes};

/// scheme 标识
///
/// 在同一个 Registry 内全局唯一，且永远不会被复用于其他算法。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemeId(Cow<'static, str>);

impl SchemeId {
    /// bcrypt
    pub const BCRYPT: SchemeId = SchemeId::new("bcrypt");
    /// SHA-256 crypt
    pub const SHA256_CRYPT: SchemeId = SchemeId::new("sha256_crypt");
    /// SHA-512 crypt
    pub const SHA512_CRYPT: SchemeId = SchemeId::new("sha512_crypt");
    /// PBKDF2-HMAC-SHA256
    pub const PBKDF2_SHA256: SchemeId = SchemeId::new("pbkdf2_sha256");
    /// Argon2id
    pub const ARGON2: SchemeId = SchemeId::new("argon2");
    /// LDAP 加盐 SHA-1
    pub const LDAP_SALTED_SHA1: SchemeId = SchemeId::new("ldap_salted_sha1");

    /// 从静态字符串创建标识
    pub const fn new(name: &'static str) -> Self {
        SchemeId(Cow::Borrowed(name))
    }

    /// 标识字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SchemeId {
    fn from(name: String) -> Self {
        SchemeId(Cow::Owned(name))
    }
}

impl From<&str> for SchemeId {
    fn from(name: &str) -> Self {
        SchemeId(Cow::Owned(name.to_string()))
    }
}

/// 解析后的哈希：参数、salt 与摘要
///
/// crypt 系列 scheme 的 salt 以字符形式存储，`salt` 中保存的是这些字符的 ASCII 字节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHash {
    /// 哈希参数（`salt_size` 总是等于 `salt.len()`）
    pub params: HashParameters,
    /// salt
    pub salt: Vec<u8>,
    /// 摘要
    pub digest: Vec<u8>,
}

impl ParsedHash {
    /// 组合参数、salt 与摘要
    pub fn new(params: HashParameters, salt: Vec<u8>, digest: Vec<u8>) -> Self {
        Self {
            params,
            salt,
            digest,
        }
    }
}

/// scheme 处理器接口
///
/// 实现者必须是无状态的，可以被任意多个线程与 Context 共享。
pub trait SchemeHandler: Send + Sync {
    /// scheme 标识
    fn id(&self) -> SchemeId;

    /// 字符串是否具有本 scheme 的标识与结构
    ///
    /// 只做前缀 / 结构检查，对任何输入都不会 panic。
    fn identify(&self, candidate: &str) -> bool;

    /// 完整解析哈希字符串
    fn decode(&self, candidate: &str) -> std::result::Result<ParsedHash, DecodeError>;

    /// 序列化为唯一的规范字符串
    fn encode(&self, parsed: &ParsedHash) -> Result<String>;

    /// 新哈希使用的默认参数
    fn default_params(&self) -> HashParameters;

    /// 本 scheme 使用的原语
    fn primitive(&self) -> &dyn PrimitiveProvider;

    /// 生成指定长度的随机 salt
    fn generate_salt(&self, size: usize) -> Result<Vec<u8>> {
        generate_random_bytes(size)
    }

    /// 算法只使用 secret 的前若干字节时返回该长度
    ///
    /// 超过该长度的 secret 不会被截断：`hash` 返回错误，`verify` 返回 `false`。
    fn truncate_size(&self) -> Option<usize> {
        None
    }

    /// 本 scheme 接受的 secret 最大长度（字节）
    fn max_secret_size(&self) -> usize {
        self.truncate_size()
            .map_or(MAX_SECRET_SIZE, |size| size.min(MAX_SECRET_SIZE))
    }

    /// 计算成本最低的合法参数，用于自检
    fn probe_params(&self) -> HashParameters {
        self.default_params()
    }

    /// 使用随机 salt 计算哈希
    fn hash(&self, secret: &[u8], params: &HashParameters) -> Result<String> {
        // 生成 salt 之前先校验参数
        self.primitive().check_params(params.salt_size, params)?;
        let salt = self.generate_salt(params.salt_size)?;
        self.hash_with_salt(secret, &salt, params)
    }

    /// 使用给定 salt 计算哈希
    fn hash_with_salt(&self, secret: &[u8], salt: &[u8], params: &HashParameters) -> Result<String> {
        let max = self.max_secret_size();
        if secret.len() > max {
            return Err(PrimitiveError::SecretTooLong {
                max,
                actual: secret.len(),
            }
            .into());
        }
        let digest = self.primitive().compute(secret, salt, params)?;
        let params = HashParameters {
            salt_size: salt.len(),
            ..params.clone()
        };
        self.encode(&ParsedHash::new(params, salt.to_vec(), digest))
    }

    /// 校验 secret 是否与哈希匹配
    fn verify(&self, secret: &[u8], encoded: &str) -> Result<bool> {
        let parsed = self.decode(encoded)?;
        self.verify_parsed(secret, &parsed)
    }

    /// 校验 secret 是否与已解析的哈希匹配
    ///
    /// 使用存储的 salt 与参数重新计算摘要，并以常量时间比较。
    /// 超过 [`max_secret_size`](Self::max_secret_size) 的 secret 不可能由本 scheme 生成，
    /// 直接返回 `false`。
    fn verify_parsed(&self, secret: &[u8], parsed: &ParsedHash) -> Result<bool> {
        if secret.len() > self.max_secret_size() {
            return Ok(false);
        }
        let digest = self
            .primitive()
            .compute(secret, &parsed.salt, &parsed.params)?;
        Ok(constant_time_compare(&digest, &parsed.digest))
    }

    /// 参数是否低于 Policy 要求的下限
    fn needs_rehash(&self, params: &HashParameters, floor: &ParameterFloor) -> bool {
        floor.is_violated_by(params)
    }
}

/// encode 前检查 salt / 摘要长度与参数是否一致
pub(crate) fn check_parts(
    parsed: &ParsedHash,
    primitive: &dyn PrimitiveProvider,
) -> std::result::Result<(), PrimitiveError> {
    if parsed.params.salt_size != parsed.salt.len() {
        return Err(PrimitiveError::InvalidParameter {
            name: "salt_size",
            message: format!(
                "declared {} bytes but salt has {}",
                parsed.params.salt_size,
                parsed.salt.len()
            ),
        });
    }
    if parsed.digest.len() != primitive.digest_size() {
        return Err(PrimitiveError::InvalidParameter {
            name: "digest",
            message: format!(
                "expected {} bytes, got {}",
                primitive.digest_size(),
                parsed.digest.len()
            ),
        });
    }
    primitive.check_params(parsed.salt.len(), &parsed.params)
}

/// 内置 scheme 集合
///
/// 闭合枚举保证每个内置 scheme 都有处理器（穷尽匹配）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinScheme {
    /// bcrypt
    #[cfg(feature = "bcrypt")]
    Bcrypt,
    /// SHA-256 crypt
    Sha256Crypt,
    /// SHA-512 crypt
    Sha512Crypt,
    /// PBKDF2-HMAC-SHA256
    Pbkdf2Sha256,
    /// Argon2id
    #[cfg(feature = "argon2")]
    Argon2,
    /// LDAP 加盐 SHA-1
    LdapSaltedSha1,
}

impl BuiltinScheme {
    /// 所有已编译的内置 scheme，按注册顺序排列
    pub fn all() -> &'static [BuiltinScheme] {
        &[
            #[cfg(feature = "argon2")]
            BuiltinScheme::Argon2,
            #[cfg(feature = "bcrypt")]
            BuiltinScheme::Bcrypt,
            BuiltinScheme::Sha512Crypt,
            BuiltinScheme::Sha256Crypt,
            BuiltinScheme::Pbkdf2Sha256,
            BuiltinScheme::LdapSaltedSha1,
        ]
    }

    /// scheme 标识
    pub fn id(&self) -> SchemeId {
        match self {
            #[cfg(feature = "bcrypt")]
            BuiltinScheme::Bcrypt => SchemeId::BCRYPT,
            BuiltinScheme::Sha256Crypt => SchemeId::SHA256_CRYPT,
            BuiltinScheme::Sha512Crypt => SchemeId::SHA512_CRYPT,
            BuiltinScheme::Pbkdf2Sha256 => SchemeId::PBKDF2_SHA256,
            #[cfg(feature = "argon2")]
            BuiltinScheme::Argon2 => SchemeId::ARGON2,
            BuiltinScheme::LdapSaltedSha1 => SchemeId::LDAP_SALTED_SHA1,
        }
    }

    /// 按标识查找内置 scheme
    pub fn from_id(id: &SchemeId) -> Option<Self> {
        Self::all().iter().copied().find(|scheme| &scheme.id() == id)
    }

    /// 创建处理器
    pub fn handler(&self) -> Arc<dyn SchemeHandler> {
        match self {
            #[cfg(feature = "bcrypt")]
            BuiltinScheme::Bcrypt => Arc::new(BcryptHandler),
            BuiltinScheme::Sha256Crypt => Arc::new(ShaCryptHandler::sha256()),
            BuiltinScheme::Sha512Crypt => Arc::new(ShaCryptHandler::sha512()),
            BuiltinScheme::Pbkdf2Sha256 => Arc::new(Pbkdf2Sha256Handler),
            #[cfg(feature = "argon2")]
            BuiltinScheme::Argon2 => Arc::new(Argon2Handler),
            BuiltinScheme::LdapSaltedSha1 => Arc::new(LdapSaltedSha1Handler),
        }
    }
}
