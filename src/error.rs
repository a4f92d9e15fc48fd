//! 统一错误类型模块
//!
//! 提供 passlib 库中所有操作的错误类型定义。
//!
//! 错误分为四类：
//!
//! - [`ConfigError`]: Policy / Registry 配置错误，构造时立即暴露，重试无法恢复
//! - [`DecodeError`]: 存储的哈希字符串损坏或格式不合法
//! - [`PrimitiveError`]: 无效的算法参数到达底层原语（上游配置错误）
//! - [`CryptoError`]: 随机数生成等底层密码学设施失败

use std::fmt;

use crate::scheme::SchemeId;

/// passlib 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// passlib 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 配置错误
    Config(ConfigError),

    /// 哈希字符串解析错误
    Decode(DecodeError),

    /// 原语参数错误
    Primitive(PrimitiveError),

    /// 加密设施错误
    Crypto(CryptoError),

    /// 多个 scheme 同时识别了同一个哈希字符串
    Ambiguous {
        /// 匹配到的所有 scheme（按注册顺序）
        candidates: Vec<SchemeId>,
    },

    /// 没有任何 scheme 能识别该哈希字符串
    Unrecognized,

    /// 未注册的 scheme
    SchemeNotFound(SchemeId),
}

impl Error {
    /// 该错误是否表示存储的哈希本身不可用（而非配置问题）
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::Unrecognized | Error::Ambiguous { .. }
        )
    }
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 允许的 scheme 列表为空
    EmptySchemeList,
    /// 允许的 scheme 列表中出现重复项
    DuplicateScheme(SchemeId),
    /// 默认 scheme 不在允许列表中
    DefaultNotAllowed(SchemeId),
    /// 默认 scheme 同时被标记为弃用
    DefaultDeprecated(SchemeId),
    /// 弃用的 scheme 不在允许列表中
    DeprecatedNotAllowed(SchemeId),
    /// 所有 scheme 都已弃用，无法推断默认 scheme
    NoDefaultScheme,
    /// `auto` 与显式 scheme 名称混用
    AutoDeprecationMixed,
    /// 引用了未注册到 Registry 的 scheme
    UnknownScheme(SchemeId),
    /// 无效的配置值
    InvalidValue { key: String, message: String },
}

/// 哈希字符串解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// 输入为空
    Empty,
    /// 缺少或不匹配 scheme 标识
    WrongScheme,
    /// 字段数量或结构不正确
    InvalidStructure(&'static str),
    /// 字段长度不正确
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// 字段中包含字母表以外的字符
    InvalidAlphabet(&'static str),
    /// 参数超出允许范围
    ParameterOutOfRange { param: &'static str, value: String },
    /// 非规范编码（前导零、非零填充位等）
    NonCanonical(&'static str),
}

/// 原语参数错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// rounds / cost 超出算法范围
    RoundsOutOfRange { min: u32, max: u32, actual: u32 },
    /// salt 长度超出算法范围
    SaltSizeOutOfRange {
        min: usize,
        max: usize,
        actual: usize,
    },
    /// secret 超过算法能无损处理的长度
    SecretTooLong { max: usize, actual: usize },
    /// 缺少算法必需的参数
    MissingParameter(&'static str),
    /// 其他无效参数
    InvalidParameter { name: &'static str, message: String },
    /// 底层实现报告的失败
    Backend(String),
}

/// 加密设施相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Decode(e) => write!(f, "Decode error: {}", e),
            Error::Primitive(e) => write!(f, "Primitive error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
            Error::Ambiguous { candidates } => {
                let names: Vec<&str> = candidates.iter().map(SchemeId::as_str).collect();
                write!(f, "hash matches multiple schemes: {}", names.join(", "))
            }
            Error::Unrecognized => write!(f, "hash could not be identified"),
            Error::SchemeNotFound(id) => write!(f, "scheme not registered: {}", id),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptySchemeList => write!(f, "at least one scheme must be allowed"),
            ConfigError::DuplicateScheme(id) => write!(f, "scheme listed more than once: {}", id),
            ConfigError::DefaultNotAllowed(id) => {
                write!(f, "default scheme is not in the allowed list: {}", id)
            }
            ConfigError::DefaultDeprecated(id) => {
                write!(f, "default scheme cannot be deprecated: {}", id)
            }
            ConfigError::DeprecatedNotAllowed(id) => {
                write!(f, "deprecated scheme is not in the allowed list: {}", id)
            }
            ConfigError::NoDefaultScheme => {
                write!(f, "no default scheme: every allowed scheme is deprecated")
            }
            ConfigError::AutoDeprecationMixed => write!(
                f,
                "'auto' cannot be used together with explicit scheme names in 'deprecated'"
            ),
            ConfigError::UnknownScheme(id) => write!(f, "scheme is not registered: {}", id),
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid configuration value for '{}': {}", key, message)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty hash string"),
            DecodeError::WrongScheme => write!(f, "missing or mismatched scheme tag"),
            DecodeError::InvalidStructure(msg) => write!(f, "malformed hash: {}", msg),
            DecodeError::InvalidLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "invalid {} length: expected {}, got {}",
                field, expected, actual
            ),
            DecodeError::InvalidAlphabet(field) => {
                write!(f, "invalid character in {}", field)
            }
            DecodeError::ParameterOutOfRange { param, value } => {
                write!(f, "parameter {} out of range: {}", param, value)
            }
            DecodeError::NonCanonical(field) => write!(f, "non-canonical encoding of {}", field),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveError::RoundsOutOfRange { min, max, actual } => write!(
                f,
                "rounds out of range: expected {}..={}, got {}",
                min, max, actual
            ),
            PrimitiveError::SaltSizeOutOfRange { min, max, actual } => write!(
                f,
                "salt size out of range: expected {}..={} bytes, got {}",
                min, max, actual
            ),
            PrimitiveError::SecretTooLong { max, actual } => write!(
                f,
                "secret too long: at most {} bytes, got {}",
                max, actual
            ),
            PrimitiveError::MissingParameter(name) => {
                write!(f, "missing required parameter: {}", name)
            }
            PrimitiveError::InvalidParameter { name, message } => {
                write!(f, "invalid parameter {}: {}", name, message)
            }
            PrimitiveError::Backend(msg) => write!(f, "primitive failed: {}", msg),
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Primitive(e) => Some(e),
            Error::Crypto(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for PrimitiveError {}
impl std::error::Error for CryptoError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<PrimitiveError> for Error {
    fn from(err: PrimitiveError) -> Self {
        Error::Primitive(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}
