//! 哈希策略
//!
//! [`PolicyConfig`] 是可序列化的原始配置；[`Policy`] 是经过校验、构造后不可变的策略：
//!
//! - 允许的 scheme（有序）
//! - 新哈希使用的默认 scheme
//! - 已弃用的 scheme（仍可校验，不再用于生成新哈希）
//! - 每个 scheme 的参数下限与新哈希使用的 rounds
//!
//! ## 示例
//!
//! ```rust
//! use passlib::{Policy, PolicyConfig, SchemeId};
//!
//! let policy = Policy::new(
//!     PolicyConfig::new([SchemeId::SHA512_CRYPT, SchemeId::LDAP_SALTED_SHA1])
//!         .with_auto_deprecation()
//!         .with_min_rounds(SchemeId::SHA512_CRYPT, 100_000),
//! )
//! .unwrap();
//!
//! assert_eq!(policy.default_scheme(), &SchemeId::SHA512_CRYPT);
//! assert!(policy.is_deprecated(&SchemeId::LDAP_SALTED_SHA1));
//! ```
//!
//! 也可以从 JSON 加载：
//!
//! ```rust
//! use passlib::{Policy, SchemeId};
//!
//! let policy = Policy::from_json(
//!     r#"{"schemes": ["pbkdf2_sha256", "sha256_crypt"], "deprecated": ["sha256_crypt"]}"#,
//! )
//! .unwrap();
//! assert_eq!(policy.default_scheme(), &SchemeId::PBKDF2_SHA256);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::params::{HashParameters, ParameterFloor};
use crate::scheme::SchemeId;

/// `deprecated` 中表示"除默认 scheme 外全部弃用"的特殊值
pub const AUTO_DEPRECATION: &str = "auto";

/// 策略的原始配置
///
/// 所有字段都有默认值，缺省字段在反序列化时为空。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// 允许的 scheme，按优先级排列
    pub schemes: Vec<SchemeId>,
    /// 新哈希使用的 scheme；缺省为第一个未弃用的 scheme
    pub default: Option<SchemeId>,
    /// 弃用的 scheme 名称，或单独一个 `"auto"`
    pub deprecated: Vec<String>,
    /// 每个 scheme 的最小 rounds
    pub min_rounds: BTreeMap<SchemeId, u32>,
    /// 每个 scheme 的最小 salt 长度
    pub min_salt_size: BTreeMap<SchemeId, usize>,
    /// 新哈希使用的 rounds，覆盖 scheme 自身的默认值
    pub default_rounds: BTreeMap<SchemeId, u32>,
}

impl PolicyConfig {
    /// 以允许的 scheme 列表创建配置
    pub fn new(schemes: impl IntoIterator<Item = SchemeId>) -> Self {
        Self {
            schemes: schemes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// 设置默认 scheme
    pub fn with_default(mut self, scheme: SchemeId) -> Self {
        self.default = Some(scheme);
        self
    }

    /// 设置弃用的 scheme
    pub fn with_deprecated(mut self, schemes: impl IntoIterator<Item = SchemeId>) -> Self {
        self.deprecated = schemes.into_iter().map(|id| id.to_string()).collect();
        self
    }

    /// 弃用除默认 scheme 外的所有 scheme
    pub fn with_auto_deprecation(mut self) -> Self {
        self.deprecated = vec![AUTO_DEPRECATION.to_string()];
        self
    }

    /// 设置最小 rounds
    pub fn with_min_rounds(mut self, scheme: SchemeId, rounds: u32) -> Self {
        self.min_rounds.insert(scheme, rounds);
        self
    }

    /// 设置最小 salt 长度
    pub fn with_min_salt_size(mut self, scheme: SchemeId, size: usize) -> Self {
        self.min_salt_size.insert(scheme, size);
        self
    }

    /// 设置新哈希使用的 rounds
    pub fn with_default_rounds(mut self, scheme: SchemeId, rounds: u32) -> Self {
        self.default_rounds.insert(scheme, rounds);
        self
    }
}

/// 经过校验的不可变策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    schemes: Vec<SchemeId>,
    default: SchemeId,
    deprecated: BTreeSet<SchemeId>,
    floors: BTreeMap<SchemeId, ParameterFloor>,
    default_rounds: BTreeMap<SchemeId, u32>,
}

impl Policy {
    /// 校验配置并构造策略
    pub fn new(config: PolicyConfig) -> Result<Self> {
        let PolicyConfig {
            schemes,
            default,
            deprecated,
            min_rounds,
            min_salt_size,
            default_rounds,
        } = config;

        if schemes.is_empty() {
            return Err(ConfigError::EmptySchemeList.into());
        }
        let mut seen = HashSet::with_capacity(schemes.len());
        for id in &schemes {
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateScheme(id.clone()).into());
            }
        }

        let auto = deprecated.iter().any(|name| name == AUTO_DEPRECATION);
        if auto && deprecated.len() > 1 {
            return Err(ConfigError::AutoDeprecationMixed.into());
        }

        let explicit: BTreeSet<SchemeId> = if auto {
            BTreeSet::new()
        } else {
            deprecated.into_iter().map(SchemeId::from).collect()
        };
        if let Some(id) = explicit.iter().find(|id| !schemes.contains(id)) {
            return Err(ConfigError::DeprecatedNotAllowed(id.clone()).into());
        }

        let default = match default {
            Some(id) => {
                if !schemes.contains(&id) {
                    return Err(ConfigError::DefaultNotAllowed(id).into());
                }
                if explicit.contains(&id) {
                    return Err(ConfigError::DefaultDeprecated(id).into());
                }
                id
            }
            None => schemes
                .iter()
                .find(|id| !explicit.contains(*id))
                .cloned()
                .ok_or(ConfigError::NoDefaultScheme)?,
        };

        let deprecated = if auto {
            schemes
                .iter()
                .filter(|id| **id != default)
                .cloned()
                .collect()
        } else {
            explicit
        };

        for id in min_rounds
            .keys()
            .chain(min_salt_size.keys())
            .chain(default_rounds.keys())
        {
            if !schemes.contains(id) {
                return Err(ConfigError::UnknownScheme(id.clone()).into());
            }
        }

        let mut floors: BTreeMap<SchemeId, ParameterFloor> = BTreeMap::new();
        for (id, rounds) in min_rounds {
            floors.entry(id).or_default().min_rounds = Some(rounds);
        }
        for (id, size) in min_salt_size {
            floors.entry(id).or_default().min_salt_size = Some(size);
        }

        Ok(Self {
            schemes,
            default,
            deprecated,
            floors,
            default_rounds,
        })
    }

    /// 从 JSON 配置构造策略
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PolicyConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
                key: "policy".to_string(),
                message: e.to_string(),
            })?;
        Self::new(config)
    }

    /// 只允许单个 scheme 且无任何下限的策略
    pub fn single(scheme: SchemeId) -> Self {
        Self {
            schemes: vec![scheme.clone()],
            default: scheme,
            deprecated: BTreeSet::new(),
            floors: BTreeMap::new(),
            default_rounds: BTreeMap::new(),
        }
    }

    /// 还原为原始配置（`deprecated` 以显式名称列出）
    pub fn to_config(&self) -> PolicyConfig {
        PolicyConfig {
            schemes: self.schemes.clone(),
            default: Some(self.default.clone()),
            deprecated: self.deprecated.iter().map(|id| id.to_string()).collect(),
            min_rounds: self
                .floors
                .iter()
                .filter_map(|(id, floor)| floor.min_rounds.map(|r| (id.clone(), r)))
                .collect(),
            min_salt_size: self
                .floors
                .iter()
                .filter_map(|(id, floor)| floor.min_salt_size.map(|s| (id.clone(), s)))
                .collect(),
            default_rounds: self.default_rounds.clone(),
        }
    }

    /// 允许的 scheme，按优先级排列
    pub fn schemes(&self) -> &[SchemeId] {
        &self.schemes
    }

    /// 默认 scheme
    pub fn default_scheme(&self) -> &SchemeId {
        &self.default
    }

    /// scheme 是否被允许
    pub fn is_allowed(&self, id: &SchemeId) -> bool {
        self.schemes.contains(id)
    }

    /// scheme 是否已弃用
    pub fn is_deprecated(&self, id: &SchemeId) -> bool {
        self.deprecated.contains(id)
    }

    /// scheme 的参数下限
    pub fn floor(&self, id: &SchemeId) -> ParameterFloor {
        self.floors.get(id).copied().unwrap_or_default()
    }

    /// 新哈希使用的 rounds（未配置时为 `None`）
    pub fn default_rounds(&self, id: &SchemeId) -> Option<u32> {
        self.default_rounds.get(id).copied()
    }

    /// 在 scheme 默认参数上应用策略中的 rounds 覆盖
    pub fn apply_to(&self, id: &SchemeId, mut params: HashParameters) -> HashParameters {
        if let Some(rounds) = self.default_rounds(id) {
            params.rounds = Some(rounds);
        }
        params
    }
}
