//! 校验与迁移上下文
//!
//! [`CryptContext`] 把一个 [`Policy`] 与一个共享的 [`SchemeRegistry`] 组合起来，提供：
//!
//! - `hash`: 使用默认 scheme 生成新哈希
//! - `verify`: 校验 secret，并在哈希过时时给出替换哈希
//! - `needs_update`: 不需要 secret 的过时检查
//!
//! Context 从不写存储，替换哈希由调用方决定是否持久化。
//!
//! ## 示例
//!
//! ```rust
//! use passlib::{CryptContext, Outcome, Policy, PolicyConfig, SchemeId};
//!
//! let legacy = CryptContext::with_builtin_schemes(Policy::single(SchemeId::LDAP_SALTED_SHA1)).unwrap();
//! let old_hash = legacy.hash(b"hunter2").unwrap();
//!
//! let config = PolicyConfig::new([SchemeId::PBKDF2_SHA256, SchemeId::LDAP_SALTED_SHA1])
//!     .with_deprecated([SchemeId::LDAP_SALTED_SHA1])
//!     .with_default_rounds(SchemeId::PBKDF2_SHA256, 1000);
//! let context = CryptContext::with_builtin_schemes(Policy::new(config).unwrap()).unwrap();
//!
//! let result = context.verify(b"hunter2", &old_hash);
//! assert_eq!(result.outcome, Outcome::Valid);
//! assert!(result.needs_update);
//!
//! let new_hash = result.replacement.unwrap();
//! assert!(new_hash.starts_with("$pbkdf2-sha256$1000$"));
//! assert!(context.verify(b"hunter2", &new_hash).is_valid());
//! ```

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Error, Result};
use crate::params::HashParameters;
use crate::policy::Policy;
use crate::registry::SchemeRegistry;
use crate::scheme::{SchemeHandler, SchemeId};

const DUMMY_SECRET: &[u8] = b"too many secrets";

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// secret 与哈希匹配
    Valid,
    /// secret 与哈希不匹配
    Invalid,
    /// 哈希无法识别、无法解析，或其 scheme 不被策略允许
    Malformed,
}

/// `verify` 的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// 校验结果
    pub outcome: Outcome,
    /// 哈希是否应该被替换
    pub needs_update: bool,
    /// 使用当前默认 scheme 计算的替换哈希，只在 `Valid` 且需要更新时存在
    pub replacement: Option<String>,
}

impl VerifyResult {
    fn valid() -> Self {
        Self {
            outcome: Outcome::Valid,
            needs_update: false,
            replacement: None,
        }
    }

    fn invalid() -> Self {
        Self {
            outcome: Outcome::Invalid,
            needs_update: false,
            replacement: None,
        }
    }

    fn malformed() -> Self {
        Self {
            outcome: Outcome::Malformed,
            needs_update: false,
            replacement: None,
        }
    }

    /// 是否校验成功
    pub fn is_valid(&self) -> bool {
        self.outcome == Outcome::Valid
    }
}

/// 校验与迁移上下文
///
/// 构造后不可变；可以安全地在线程之间共享。
#[derive(Debug, Clone)]
pub struct CryptContext {
    policy: Policy,
    registry: Arc<SchemeRegistry>,
    dummy_hash: OnceLock<Option<String>>,
}

impl CryptContext {
    /// 创建上下文，并检查策略与 Registry 是否匹配
    ///
    /// - 每个允许的 scheme 都必须已注册
    /// - 默认 scheme 的有效参数必须被其原语接受
    /// - 默认参数不能低于策略为默认 scheme 设置的下限
    pub fn new(policy: Policy, registry: Arc<SchemeRegistry>) -> Result<Self> {
        if let Some(id) = policy.schemes().iter().find(|id| !registry.contains(id)) {
            return Err(ConfigError::UnknownScheme(id.clone()).into());
        }

        let default_id = policy.default_scheme();
        let handler = registry.resolve_by_identifier(default_id)?;
        let params = policy.apply_to(default_id, handler.default_params());
        handler
            .primitive()
            .check_params(params.salt_size, &params)
            .map_err(|e| ConfigError::InvalidValue {
                key: format!("default_rounds.{}", default_id),
                message: e.to_string(),
            })?;
        if handler.needs_rehash(&params, &policy.floor(default_id)) {
            return Err(ConfigError::InvalidValue {
                key: format!("min_rounds.{}", default_id),
                message: "default parameters are below the policy floor".to_string(),
            }
            .into());
        }

        info!(
            default = %default_id,
            schemes = policy.schemes().len(),
            "crypt context created"
        );
        Ok(Self {
            policy,
            registry,
            dummy_hash: OnceLock::new(),
        })
    }

    /// 使用所有内置 scheme 创建上下文
    pub fn with_builtin_schemes(policy: Policy) -> Result<Self> {
        Self::new(policy, Arc::new(SchemeRegistry::with_builtin_schemes()))
    }

    /// 策略
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Registry
    pub fn registry(&self) -> &Arc<SchemeRegistry> {
        &self.registry
    }

    /// 新哈希使用的参数
    fn params_for(&self, handler: &dyn SchemeHandler) -> HashParameters {
        self.policy.apply_to(&handler.id(), handler.default_params())
    }

    /// 使用默认 scheme 计算哈希
    pub fn hash(&self, secret: &[u8]) -> Result<String> {
        self.hash_with(self.policy.default_scheme(), secret)
    }

    /// 使用指定的（必须被策略允许的）scheme 计算哈希
    pub fn hash_with(&self, scheme: &SchemeId, secret: &[u8]) -> Result<String> {
        if !self.policy.is_allowed(scheme) {
            return Err(Error::SchemeNotFound(scheme.clone()));
        }
        let handler = self.registry.resolve_by_identifier(scheme)?;
        handler.hash(secret, &self.params_for(handler.as_ref()))
    }

    /// 查找能处理该哈希、且被策略允许的处理器
    fn resolve_allowed(&self, stored: &str) -> Result<Arc<dyn SchemeHandler>> {
        let handler = self.registry.resolve_by_encoding(stored)?;
        if !self.policy.is_allowed(&handler.id()) {
            debug!(scheme = %handler.id(), "stored hash uses a scheme outside the policy");
            return Err(Error::Unrecognized);
        }
        Ok(handler)
    }

    /// 识别哈希所属的 scheme（只考虑策略允许的 scheme）
    pub fn identify_scheme(&self, stored: &str) -> Option<SchemeId> {
        self.resolve_allowed(stored).ok().map(|handler| handler.id())
    }

    fn is_stale(&self, handler: &dyn SchemeHandler, params: &HashParameters) -> bool {
        let id = handler.id();
        self.policy.is_deprecated(&id) || handler.needs_rehash(params, &self.policy.floor(&id))
    }

    /// 校验 secret
    ///
    /// 对任何输入都不会返回错误：无法识别或无法解析的哈希得到 [`Outcome::Malformed`]。
    /// 校验成功且哈希已过时（scheme 被弃用或参数低于下限）时，
    /// 使用当前默认 scheme 计算替换哈希。
    pub fn verify(&self, secret: &[u8], stored: &str) -> VerifyResult {
        let handler = match self.resolve_allowed(stored) {
            Ok(handler) => handler,
            Err(e) => {
                debug!(error = %e, "stored hash not recognized");
                return VerifyResult::malformed();
            }
        };
        let id = handler.id();

        let parsed = match handler.decode(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(scheme = %id, error = %e, "stored hash is malformed");
                return VerifyResult::malformed();
            }
        };
        match handler.verify_parsed(secret, &parsed) {
            Ok(true) => {}
            Ok(false) => {
                debug!(scheme = %id, "password mismatch");
                return VerifyResult::invalid();
            }
            Err(e) => {
                debug!(scheme = %id, error = %e, "stored hash parameters rejected");
                return VerifyResult::malformed();
            }
        }

        if !self.is_stale(handler.as_ref(), &parsed.params) {
            return VerifyResult::valid();
        }

        let target = self.policy.default_scheme();
        let replacement = match self.hash(secret) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(from = %id, to = %target, error = %e, "failed to compute replacement hash");
                None
            }
        };
        info!(from = %id, to = %target, "stored hash needs update");
        VerifyResult {
            outcome: Outcome::Valid,
            needs_update: true,
            replacement,
        }
    }

    /// 校验并返回（是否匹配，替换哈希）
    pub fn verify_and_update(&self, secret: &[u8], stored: &str) -> (bool, Option<String>) {
        let result = self.verify(secret, stored);
        (result.is_valid(), result.replacement)
    }

    /// 不需要 secret 的过时检查
    ///
    /// 无法识别或无法解析的哈希总是需要更新；返回 `false` 并不代表哈希有效。
    pub fn needs_update(&self, stored: &str) -> bool {
        let Ok(handler) = self.resolve_allowed(stored) else {
            return true;
        };
        match handler.decode(stored) {
            Ok(parsed) => self.is_stale(handler.as_ref(), &parsed.params),
            Err(_) => true,
        }
    }

    /// 对默认 scheme 的一个固定哈希做一次完整校验，总是返回 `false`
    ///
    /// 用于"用户不存在"的分支，使其耗时与真实校验相当。
    pub fn dummy_verify(&self, secret: &[u8]) -> bool {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.hash(DUMMY_SECRET).ok());
        if let Some(stored) = dummy {
            let _ = self.verify(secret, stored);
        }
        false
    }
}

// ============================================================================
// 便捷函数（使用内置 Registry）
// ============================================================================

/// 按策略使用默认 scheme 计算哈希
pub fn hash(secret: &[u8], policy: &Policy) -> Result<String> {
    CryptContext::with_builtin_schemes(policy.clone())?.hash(secret)
}

/// 按策略校验 secret
///
/// 只有策略本身与内置 Registry 不匹配时才返回错误。
pub fn verify(secret: &[u8], stored: &str, policy: &Policy) -> Result<VerifyResult> {
    Ok(CryptContext::with_builtin_schemes(policy.clone())?.verify(secret, stored))
}

/// 识别哈希所属的 scheme
pub fn identify_scheme(stored: &str, registry: &SchemeRegistry) -> Option<SchemeId> {
    registry.identify_scheme(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyConfig;

    fn context() -> CryptContext {
        let config = PolicyConfig::new([
            SchemeId::SHA256_CRYPT,
            SchemeId::PBKDF2_SHA256,
            SchemeId::LDAP_SALTED_SHA1,
        ])
        .with_deprecated([SchemeId::LDAP_SALTED_SHA1])
        .with_default_rounds(SchemeId::SHA256_CRYPT, 1_000)
        .with_default_rounds(SchemeId::PBKDF2_SHA256, 1_000)
        .with_min_rounds(SchemeId::PBKDF2_SHA256, 500);
        CryptContext::with_builtin_schemes(Policy::new(config).unwrap()).unwrap()
    }

    #[test]
    fn test_hash_uses_default_scheme() {
        let ctx = context();
        let hash = ctx.hash(b"password").unwrap();
        assert!(hash.starts_with("$5$rounds=1000$"));
        assert_eq!(ctx.identify_scheme(&hash), Some(SchemeId::SHA256_CRYPT));

        let result = ctx.verify(b"password", &hash);
        assert_eq!(result, VerifyResult::valid());
        assert_eq!(ctx.verify(b"Password", &hash), VerifyResult::invalid());
        assert!(!ctx.needs_update(&hash));
    }

    #[test]
    fn test_deprecated_scheme_migrates() {
        let ctx = context();
        let old = ctx
            .hash_with(&SchemeId::LDAP_SALTED_SHA1, b"password")
            .unwrap();
        assert!(ctx.needs_update(&old));

        let result = ctx.verify(b"password", &old);
        assert_eq!(result.outcome, Outcome::Valid);
        assert!(result.needs_update);
        let replacement = result.replacement.unwrap();
        assert_eq!(
            ctx.identify_scheme(&replacement),
            Some(SchemeId::SHA256_CRYPT)
        );
        assert!(ctx.verify(b"password", &replacement).is_valid());

        // 校验失败时不产生替换哈希
        let wrong = ctx.verify(b"wrong", &old);
        assert_eq!(wrong, VerifyResult::invalid());
    }

    #[test]
    fn test_weak_rounds_need_update() {
        let ctx = context();
        let weak = "$pbkdf2-sha256$100$4vjV83LKPjQzk31VI4E0Vw$hsYF68OiOUPdDZ1Fg.fJPeq1h/gXXY7acBp9/6c.tmQ";
        assert!(ctx.needs_update(weak));
        let strong = ctx
            .hash_with(&SchemeId::PBKDF2_SHA256, b"password")
            .unwrap();
        assert!(!ctx.needs_update(&strong));
    }

    #[test]
    fn test_malformed_inputs() {
        let ctx = context();
        for stored in [
            "",
            "password",
            "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc!",
            "$5$rounds=10$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5",
        ] {
            assert_eq!(ctx.verify(b"Hello world!", stored), VerifyResult::malformed());
            assert!(ctx.needs_update(stored));
        }
    }

    #[test]
    fn test_scheme_outside_policy_is_malformed() {
        let ctx = context();
        let sha512 = "$6$saltstring$svn8UoSVapNtMuq1ukKS4tPQd8iKwSMHWjl/O817G3uBnIFNjnQJuesI68u4OTLiBFdcbYEdFCoEOfaS35inz1";
        assert_eq!(ctx.identify_scheme(sha512), None);
        assert_eq!(ctx.verify(b"Hello world!", sha512), VerifyResult::malformed());
        assert_eq!(
            ctx.hash_with(&SchemeId::SHA512_CRYPT, b"x").unwrap_err(),
            Error::SchemeNotFound(SchemeId::SHA512_CRYPT)
        );
    }

    #[test]
    fn test_new_rejects_unregistered_scheme() {
        let policy = Policy::single(SchemeId::new("md5_crypt"));
        let err = CryptContext::with_builtin_schemes(policy).unwrap_err();
        assert_eq!(
            err,
            Error::Config(ConfigError::UnknownScheme(SchemeId::new("md5_crypt")))
        );
    }

    #[test]
    fn test_new_rejects_invalid_default_rounds() {
        let config = PolicyConfig::new([SchemeId::SHA256_CRYPT])
            .with_default_rounds(SchemeId::SHA256_CRYPT, 10);
        let err = CryptContext::with_builtin_schemes(Policy::new(config).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_new_rejects_default_below_floor() {
        let config = PolicyConfig::new([SchemeId::SHA256_CRYPT])
            .with_default_rounds(SchemeId::SHA256_CRYPT, 1_000)
            .with_min_rounds(SchemeId::SHA256_CRYPT, 2_000);
        assert!(CryptContext::with_builtin_schemes(Policy::new(config).unwrap()).is_err());
    }

    #[test]
    fn test_verify_and_update() {
        let ctx = context();
        let old = ctx
            .hash_with(&SchemeId::LDAP_SALTED_SHA1, b"secret")
            .unwrap();
        let (valid, replacement) = ctx.verify_and_update(b"secret", &old);
        assert!(valid);
        assert!(replacement.is_some());

        let current = ctx.hash(b"secret").unwrap();
        assert_eq!(ctx.verify_and_update(b"secret", &current), (true, None));
        assert_eq!(ctx.verify_and_update(b"nope", &current), (false, None));
    }

    #[test]
    fn test_dummy_verify_always_false() {
        let ctx = context();
        assert!(!ctx.dummy_verify(b"anything"));
        assert!(!ctx.dummy_verify(DUMMY_SECRET));
    }

    #[test]
    fn test_free_functions() {
        let policy = Policy::new(
            PolicyConfig::new([SchemeId::PBKDF2_SHA256])
                .with_default_rounds(SchemeId::PBKDF2_SHA256, 1_000),
        )
        .unwrap();
        let stored = hash(b"pw", &policy).unwrap();
        assert!(verify(b"pw", &stored, &policy).unwrap().is_valid());
        assert_eq!(
            verify(b"pw", "garbage", &policy).unwrap().outcome,
            Outcome::Malformed
        );
        let registry = SchemeRegistry::with_builtin_schemes();
        assert_eq!(
            identify_scheme(&stored, &registry),
            Some(SchemeId::PBKDF2_SHA256)
        );
    }
}
