//! # passlib
//!
//! 多算法密码哈希的存储、校验与迁移。
//!
//! ## 功能特性
//!
//! - **统一的 scheme 接口**: bcrypt、SHA-256/SHA-512 crypt、PBKDF2-SHA256、Argon2id、LDAP `{SSHA}`
//! - **规范编码**: 每个哈希只有唯一的合法文本形式，decode / encode 无损往返
//! - **确定性识别**: 哈希字符串必须被唯一的 scheme 识别，重叠的识别规则会被报告为错误
//! - **常量时间比较**: 摘要比较不会因首个不同字节的位置而提前返回
//! - **策略驱动的迁移**: 弃用的 scheme 或低于下限的参数在校验成功时自动生成替换哈希
//! - **原始字节 secret**: secret 始终按字节处理，不做任何文本编码转换
//!
//! ## Features
//!
//! - `argon2` - 启用 Argon2id scheme（默认启用）
//! - `bcrypt` - 启用 bcrypt scheme（默认启用）
//! - `full` - 启用所有功能
//!
//! SHA-crypt、PBKDF2 与 LDAP `{SSHA}` 始终可用。
//!
//! ## 哈希与校验
//!
//! ```rust
//! use passlib::{CryptContext, Policy, PolicyConfig, SchemeId};
//!
//! let policy = Policy::new(
//!     PolicyConfig::new([SchemeId::SHA512_CRYPT])
//!         .with_default_rounds(SchemeId::SHA512_CRYPT, 5000),
//! )
//! .unwrap();
//! let context = CryptContext::with_builtin_schemes(policy).unwrap();
//!
//! let hash = context.hash(b"my_secure_password").unwrap();
//! assert!(hash.starts_with("$6$"));
//!
//! let result = context.verify(b"my_secure_password", &hash);
//! assert!(result.is_valid());
//! assert!(!result.needs_update);
//! ```
//!
//! ## 迁移
//!
//! ```rust
//! use passlib::{CryptContext, Outcome, Policy, PolicyConfig, SchemeId};
//!
//! let policy = Policy::new(
//!     PolicyConfig::new([SchemeId::PBKDF2_SHA256, SchemeId::SHA256_CRYPT])
//!         .with_auto_deprecation()
//!         .with_default_rounds(SchemeId::PBKDF2_SHA256, 1000),
//! )
//! .unwrap();
//! let context = CryptContext::with_builtin_schemes(policy).unwrap();
//!
//! // 旧系统中的 SHA-256 crypt 哈希
//! let stored = "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5";
//!
//! let result = context.verify(b"Hello world!", stored);
//! assert_eq!(result.outcome, Outcome::Valid);
//! assert!(result.needs_update);
//!
//! // 调用方负责持久化替换哈希
//! let upgraded = result.replacement.unwrap();
//! assert!(upgraded.starts_with("$pbkdf2-sha256$"));
//! ```
//!
//! ## 识别
//!
//! ```rust
//! use passlib::{SchemeId, SchemeRegistry, identify_scheme};
//!
//! let registry = SchemeRegistry::with_builtin_schemes();
//! assert_eq!(
//!     identify_scheme("{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME", &registry),
//!     Some(SchemeId::LDAP_SALTED_SHA1)
//! );
//! assert_eq!(identify_scheme("plaintext", &registry), None);
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod params;
pub mod policy;
pub mod primitive;
pub mod random;
pub mod registry;
pub mod scheme;

pub use error::{Error, Result};

// ============================================================================
// 上下文与策略导出
// ============================================================================

pub use context::{CryptContext, Outcome, VerifyResult, hash, identify_scheme, verify};
pub use policy::{AUTO_DEPRECATION, Policy, PolicyConfig};

// ============================================================================
// scheme 与参数导出
// ============================================================================

pub use params::{HashParameters, ParameterFloor, Variant};
pub use registry::SchemeRegistry;
pub use scheme::{BuiltinScheme, ParsedHash, SchemeHandler, SchemeId};

// ============================================================================
// 错误类型导出
// ============================================================================

pub use error::{ConfigError, CryptoError, DecodeError, PrimitiveError};

// ============================================================================
// 随机数与比较函数导出
// ============================================================================

pub use random::{constant_time_compare, generate_random_bytes};
