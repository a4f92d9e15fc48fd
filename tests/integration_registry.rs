//! Registry 集成测试
//!
//! 测试自定义处理器注册、识别冲突检测与自检。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use passlib::primitive::PrimitiveProvider;
use passlib::{
    BuiltinScheme, ConfigError, CryptContext, DecodeError, Error, HashParameters, Outcome,
    ParsedHash, Policy, PolicyConfig, SchemeHandler, SchemeId, SchemeRegistry,
};

/// 以新标识包装一个内置处理器，识别规则与原处理器完全相同
struct Alias {
    id: &'static str,
    inner: Arc<dyn SchemeHandler>,
}

impl Alias {
    fn of(id: &'static str, scheme: BuiltinScheme) -> Arc<dyn SchemeHandler> {
        Arc::new(Self {
            id,
            inner: scheme.handler(),
        })
    }
}

impl SchemeHandler for Alias {
    fn id(&self) -> SchemeId {
        SchemeId::new(self.id)
    }

    fn identify(&self, candidate: &str) -> bool {
        self.inner.identify(candidate)
    }

    fn decode(&self, candidate: &str) -> Result<ParsedHash, DecodeError> {
        self.inner.decode(candidate)
    }

    fn encode(&self, parsed: &ParsedHash) -> passlib::Result<String> {
        self.inner.encode(parsed)
    }

    fn default_params(&self) -> HashParameters {
        self.inner.default_params()
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        self.inner.primitive()
    }

    fn probe_params(&self) -> HashParameters {
        self.inner.probe_params()
    }
}

/// 只接受固定字面量的处理器
struct Literal {
    id: &'static str,
    literal: &'static str,
}

impl SchemeHandler for Literal {
    fn id(&self) -> SchemeId {
        SchemeId::new(self.id)
    }

    fn identify(&self, candidate: &str) -> bool {
        candidate == self.literal
    }

    fn decode(&self, _candidate: &str) -> Result<ParsedHash, DecodeError> {
        Err(DecodeError::InvalidStructure("literal"))
    }

    fn encode(&self, _parsed: &ParsedHash) -> passlib::Result<String> {
        Ok(self.literal.to_string())
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(4)
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        &passlib::primitive::SaltedSha1
    }
}

/// 记录 decode 调用次数的内置处理器包装
struct CountingDecode {
    inner: Arc<dyn SchemeHandler>,
    decodes: AtomicUsize,
}

impl SchemeHandler for CountingDecode {
    fn id(&self) -> SchemeId {
        self.inner.id()
    }

    fn identify(&self, candidate: &str) -> bool {
        self.inner.identify(candidate)
    }

    fn decode(&self, candidate: &str) -> Result<ParsedHash, DecodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(candidate)
    }

    fn encode(&self, parsed: &ParsedHash) -> passlib::Result<String> {
        self.inner.encode(parsed)
    }

    fn default_params(&self) -> HashParameters {
        self.inner.default_params()
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        self.inner.primitive()
    }
}

const SHA256_HASH: &str = "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5";

/// 测试两个处理器识别同一个字面量时报告冲突
#[test]
fn test_ambiguous_literal() {
    let registry = SchemeRegistry::new()
        .with_scheme(Arc::new(Literal {
            id: "scheme-a",
            literal: "$shared$",
        }))
        .unwrap()
        .with_scheme(Arc::new(Literal {
            id: "scheme-b",
            literal: "$shared$",
        }))
        .unwrap();

    assert_eq!(
        registry.resolve_by_encoding("$shared$").err(),
        Some(Error::Ambiguous {
            candidates: vec![SchemeId::new("scheme-a"), SchemeId::new("scheme-b")],
        })
    );
    assert_eq!(registry.identify_scheme("$shared$"), None);
    assert_eq!(
        registry.resolve_by_encoding("$other$").err(),
        Some(Error::Unrecognized)
    );
}

/// 测试冲突错误的显示信息
#[test]
fn test_ambiguous_error_display() {
    let err = Error::Ambiguous {
        candidates: vec![SchemeId::new("scheme-a"), SchemeId::new("scheme-b")],
    };
    assert!(err.to_string().contains("scheme-a, scheme-b"));
    assert!(err.is_malformed_input());
}

/// 测试与内置 scheme 识别规则重叠的自定义处理器
#[test]
fn test_alias_overlaps_builtin() {
    let mut registry = SchemeRegistry::with_builtin_schemes();
    registry
        .register(Alias::of("sha256_alias", BuiltinScheme::Sha256Crypt))
        .unwrap();

    match registry.resolve_by_encoding(SHA256_HASH) {
        Err(Error::Ambiguous { candidates }) => {
            assert_eq!(
                candidates,
                vec![SchemeId::SHA256_CRYPT, SchemeId::new("sha256_alias")]
            );
        }
        Err(other) => panic!("expected ambiguity, got {other}"),
        Ok(handler) => panic!("expected ambiguity, resolved to {}", handler.id()),
    }

    // 其他 scheme 不受影响
    assert_eq!(
        registry.identify_scheme("{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME"),
        Some(SchemeId::LDAP_SALTED_SHA1)
    );
}

/// 测试自检能够发现识别冲突
#[test]
fn test_self_check_detects_overlap() {
    let registry = SchemeRegistry::new()
        .with_scheme(BuiltinScheme::Pbkdf2Sha256.handler())
        .unwrap()
        .with_scheme(Alias::of("pbkdf2_alias", BuiltinScheme::Pbkdf2Sha256))
        .unwrap();
    assert!(matches!(
        registry.self_check(),
        Err(Error::Ambiguous { .. })
    ));

    let clean = SchemeRegistry::new()
        .with_scheme(BuiltinScheme::Pbkdf2Sha256.handler())
        .unwrap()
        .with_scheme(BuiltinScheme::LdapSaltedSha1.handler())
        .unwrap();
    clean.self_check().unwrap();
}

/// 测试冲突在 Context 中表现为 Malformed 而不是错误
#[test]
fn test_ambiguity_is_malformed_in_context() {
    let registry = SchemeRegistry::new()
        .with_scheme(BuiltinScheme::Sha256Crypt.handler())
        .unwrap()
        .with_scheme(Alias::of("sha256_alias", BuiltinScheme::Sha256Crypt))
        .unwrap();
    let policy = Policy::new(
        PolicyConfig::new([SchemeId::SHA256_CRYPT, SchemeId::new("sha256_alias")])
            .with_default_rounds(SchemeId::SHA256_CRYPT, 1000),
    )
    .unwrap();
    let context = CryptContext::new(policy, Arc::new(registry)).unwrap();

    let result = context.verify(b"Hello world!", SHA256_HASH);
    assert_eq!(result.outcome, Outcome::Malformed);
    assert!(context.needs_update(SHA256_HASH));
}

/// 测试重复注册被拒绝
#[test]
fn test_duplicate_registration() {
    let result = SchemeRegistry::with_builtin_schemes()
        .with_scheme(Alias::of("bcrypt", BuiltinScheme::Pbkdf2Sha256));
    assert_eq!(
        result.err(),
        Some(Error::Config(ConfigError::DuplicateScheme(SchemeId::BCRYPT)))
    );
}

/// 测试同一个 Registry 被多个 Context 共享
#[test]
fn test_registry_shared_between_contexts() {
    let registry = Arc::new(SchemeRegistry::with_builtin_schemes());

    let legacy = CryptContext::new(
        Policy::single(SchemeId::LDAP_SALTED_SHA1),
        Arc::clone(&registry),
    )
    .unwrap();
    let modern = CryptContext::new(
        Policy::new(
            PolicyConfig::new([SchemeId::PBKDF2_SHA256, SchemeId::LDAP_SALTED_SHA1])
                .with_auto_deprecation()
                .with_default_rounds(SchemeId::PBKDF2_SHA256, 1000),
        )
        .unwrap(),
        Arc::clone(&registry),
    )
    .unwrap();

    let stored = legacy.hash(b"shared").unwrap();
    assert!(!legacy.needs_update(&stored));
    assert!(modern.needs_update(&stored));
    assert_eq!(Arc::strong_count(&registry), 3);
}

/// 测试 Context 校验时只解析一次存储的哈希
#[test]
fn test_context_decodes_stored_hash_once() {
    let counting = Arc::new(CountingDecode {
        inner: BuiltinScheme::Sha256Crypt.handler(),
        decodes: AtomicUsize::new(0),
    });
    let registry = SchemeRegistry::new()
        .with_scheme(Arc::clone(&counting) as Arc<dyn SchemeHandler>)
        .unwrap();
    let policy = Policy::new(
        PolicyConfig::new([SchemeId::SHA256_CRYPT])
            .with_default_rounds(SchemeId::SHA256_CRYPT, 1000),
    )
    .unwrap();
    let context = CryptContext::new(policy, Arc::new(registry)).unwrap();

    // 隐式 rounds=5000 高于默认值，哈希保持有效且不需要更新
    let result = context.verify(b"Hello world!", SHA256_HASH);
    assert!(result.is_valid());
    assert!(!result.needs_update);
    assert_eq!(counting.decodes.load(Ordering::SeqCst), 1);

    assert_eq!(context.verify(b"wrong", SHA256_HASH).outcome, Outcome::Invalid);
    assert_eq!(counting.decodes.load(Ordering::SeqCst), 2);
}
