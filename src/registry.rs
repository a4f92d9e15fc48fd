//! Scheme Registry
//!
//! 保存标识 → [`SchemeHandler`] 的映射，并负责把哈希字符串路由到唯一的处理器。
//!
//! Registry 构造完成后只读，可以通过 `Arc` 在多个 Context 与线程之间共享。
//! 注册顺序会被保留，用于确定性的错误信息与 [`schemes`](SchemeRegistry::schemes) 输出。
//!
//! ## 示例
//!
//! ```rust
//! use passlib::{SchemeId, SchemeRegistry};
//!
//! let registry = SchemeRegistry::with_builtin_schemes();
//! let hash = "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5";
//!
//! assert_eq!(registry.identify_scheme(hash), Some(SchemeId::SHA256_CRYPT));
//! assert_eq!(registry.identify_scheme("not a hash"), None);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ConfigError, Error, Result};
use crate::scheme::{BuiltinScheme, SchemeHandler, SchemeId};

/// scheme 处理器注册表
#[derive(Clone, Default)]
pub struct SchemeRegistry {
    handlers: Vec<Arc<dyn SchemeHandler>>,
}

impl fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl SchemeRegistry {
    /// 创建空 Registry
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册所有已编译的内置 scheme
    pub fn with_builtin_schemes() -> Self {
        let handlers = BuiltinScheme::all()
            .iter()
            .map(|scheme| scheme.handler())
            .collect();
        Self { handlers }
    }

    /// 注册处理器
    ///
    /// 标识已存在时返回 [`ConfigError::DuplicateScheme`]，Registry 保持不变。
    pub fn register(&mut self, handler: Arc<dyn SchemeHandler>) -> Result<()> {
        let id = handler.id();
        if self.contains(&id) {
            return Err(ConfigError::DuplicateScheme(id).into());
        }
        debug!(scheme = %id, "registered scheme handler");
        self.handlers.push(handler);
        Ok(())
    }

    /// builder 风格的 [`register`](Self::register)
    pub fn with_scheme(mut self, handler: Arc<dyn SchemeHandler>) -> Result<Self> {
        self.register(handler)?;
        Ok(self)
    }

    /// 按标识查找处理器
    pub fn resolve_by_identifier(&self, id: &SchemeId) -> Result<Arc<dyn SchemeHandler>> {
        self.handlers
            .iter()
            .find(|handler| &handler.id() == id)
            .cloned()
            .ok_or_else(|| Error::SchemeNotFound(id.clone()))
    }

    /// 按哈希字符串查找唯一能识别它的处理器
    ///
    /// 对所有处理器调用 `identify`；零个匹配返回 [`Error::Unrecognized`]，
    /// 多个匹配返回 [`Error::Ambiguous`]，绝不会静默选择其中一个。
    pub fn resolve_by_encoding(&self, encoded: &str) -> Result<Arc<dyn SchemeHandler>> {
        let mut matches = self
            .handlers
            .iter()
            .filter(|handler| handler.identify(encoded));

        let Some(first) = matches.next() else {
            return Err(Error::Unrecognized);
        };
        let rest: Vec<_> = matches.collect();
        if rest.is_empty() {
            return Ok(Arc::clone(first));
        }

        let candidates: Vec<SchemeId> = std::iter::once(first)
            .chain(rest)
            .map(|handler| handler.id())
            .collect();
        warn!(
            candidates = ?candidates,
            "hash string identified by multiple schemes"
        );
        Err(Error::Ambiguous { candidates })
    }

    /// 识别哈希字符串所属的 scheme，无法唯一识别时返回 `None`
    pub fn identify_scheme(&self, encoded: &str) -> Option<SchemeId> {
        self.resolve_by_encoding(encoded)
            .ok()
            .map(|handler| handler.id())
    }

    /// 已注册的 scheme 标识，按注册顺序
    pub fn schemes(&self) -> Vec<SchemeId> {
        self.handlers.iter().map(|handler| handler.id()).collect()
    }

    /// 是否注册了指定 scheme
    pub fn contains(&self, id: &SchemeId) -> bool {
        self.handlers.iter().any(|handler| &handler.id() == id)
    }

    /// 已注册的处理器数量
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 自检：每个处理器使用最低成本参数生成的哈希都必须被唯一地路由回自身
    ///
    /// 用于在启动时发现 identify 规则互相重叠的自定义处理器。
    pub fn self_check(&self) -> Result<()> {
        for handler in &self.handlers {
            let id = handler.id();
            let sample = handler.hash(b"self-check", &handler.probe_params())?;
            let resolved = self.resolve_by_encoding(&sample)?;
            if resolved.id() != id {
                return Err(ConfigError::InvalidValue {
                    key: id.to_string(),
                    message: format!("sample hash resolved to {}", resolved.id()),
                }
                .into());
            }
            if !handler.verify(b"self-check", &sample)? {
                return Err(ConfigError::InvalidValue {
                    key: id.to_string(),
                    message: "sample hash failed to verify".to_string(),
                }
                .into());
            }
            debug!(scheme = %id, "scheme self-check passed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_HASH: &str = "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5";

    #[test]
    fn test_builtin_registry_order() {
        let registry = SchemeRegistry::with_builtin_schemes();
        let expected: Vec<SchemeId> = BuiltinScheme::all().iter().map(|s| s.id()).collect();
        assert_eq!(registry.schemes(), expected);
        assert_eq!(registry.len(), BuiltinScheme::all().len());
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = SchemeRegistry::new();
        registry
            .register(BuiltinScheme::Sha256Crypt.handler())
            .unwrap();
        let err = registry
            .register(BuiltinScheme::Sha256Crypt.handler())
            .unwrap_err();
        assert_eq!(
            err,
            Error::Config(ConfigError::DuplicateScheme(SchemeId::SHA256_CRYPT))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_by_identifier() {
        let registry = SchemeRegistry::with_builtin_schemes();
        let handler = registry
            .resolve_by_identifier(&SchemeId::PBKDF2_SHA256)
            .unwrap();
        assert_eq!(handler.id(), SchemeId::PBKDF2_SHA256);

        let missing = SchemeId::new("md5_crypt");
        assert_eq!(
            registry.resolve_by_identifier(&missing).err(),
            Some(Error::SchemeNotFound(missing))
        );
    }

    #[test]
    fn test_resolve_by_encoding() {
        let registry = SchemeRegistry::with_builtin_schemes();
        assert_eq!(
            registry.identify_scheme(SHA256_HASH),
            Some(SchemeId::SHA256_CRYPT)
        );
        assert_eq!(
            registry.resolve_by_encoding("").err(),
            Some(Error::Unrecognized)
        );
        assert_eq!(registry.identify_scheme("plaintext"), None);
    }

    #[test]
    fn test_empty_registry() {
        let registry = SchemeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve_by_encoding(SHA256_HASH).err(),
            Some(Error::Unrecognized)
        );
    }

    #[test]
    fn test_self_check_builtin() {
        SchemeRegistry::with_builtin_schemes().self_check().unwrap();
    }
}
