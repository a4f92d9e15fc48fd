//! 哈希参数
//!
//! [`HashParameters`] 是一个 scheme 实例的全部可调参数：salt 长度、rounds / cost、
//! 以及算法变体标识。同一组参数在 encode / decode 之间必须无损往返。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 算法变体标识
///
/// 目前只有 bcrypt 存在多个变体前缀，其余 scheme 不使用该字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    /// `$2a$`，早期 OpenBSD 实现，存在长密码回绕缺陷
    Bcrypt2a,
    /// `$2b$`，当前标准变体
    Bcrypt2b,
    /// `$2y$`，crypt_blowfish 的修正版本，与 `$2b$` 等价
    Bcrypt2y,
}

impl Variant {
    /// 变体在哈希字符串中的标识（不含 `$`）
    pub fn ident(&self) -> &'static str {
        match self {
            Variant::Bcrypt2a => "2a",
            Variant::Bcrypt2b => "2b",
            Variant::Bcrypt2y => "2y",
        }
    }

    /// 该变体是否已被视为过时
    pub fn is_legacy(&self) -> bool {
        matches!(self, Variant::Bcrypt2a)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

/// 哈希参数
///
/// `rounds` 的含义由 scheme 决定：bcrypt 为 log2 cost，SHA-crypt 与 PBKDF2 为线性迭代次数，
/// Argon2 为时间成本 `t`。不适用的字段为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HashParameters {
    /// rounds / cost
    pub rounds: Option<u32>,
    /// salt 长度（字节；crypt 系列为字符数）
    pub salt_size: usize,
    /// 内存成本（KiB），仅 Argon2 使用
    pub memory_cost: Option<u32>,
    /// 并行度，仅 Argon2 使用
    pub parallelism: Option<u32>,
    /// 算法变体
    pub variant: Option<Variant>,
}

impl HashParameters {
    /// 创建只包含 salt 长度的参数
    pub fn new(salt_size: usize) -> Self {
        Self {
            salt_size,
            ..Self::default()
        }
    }

    /// 设置 rounds
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// 设置 salt 长度
    pub fn with_salt_size(mut self, salt_size: usize) -> Self {
        self.salt_size = salt_size;
        self
    }

    /// 设置内存成本（KiB）
    pub fn with_memory_cost(mut self, memory_cost: u32) -> Self {
        self.memory_cost = Some(memory_cost);
        self
    }

    /// 设置并行度
    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// 设置算法变体
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }
}

/// Policy 对单个 scheme 要求的参数下限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterFloor {
    /// 最小 rounds
    pub min_rounds: Option<u32>,
    /// 最小 salt 长度
    pub min_salt_size: Option<usize>,
}

impl ParameterFloor {
    /// 没有任何下限
    pub fn none() -> Self {
        Self::default()
    }

    /// 设置最小 rounds
    pub fn with_min_rounds(mut self, rounds: u32) -> Self {
        self.min_rounds = Some(rounds);
        self
    }

    /// 设置最小 salt 长度
    pub fn with_min_salt_size(mut self, size: usize) -> Self {
        self.min_salt_size = Some(size);
        self
    }

    /// 参数是否低于下限
    ///
    /// 对没有 rounds 的 scheme，`min_rounds` 不起作用。
    pub fn is_violated_by(&self, params: &HashParameters) -> bool {
        let rounds_stale = match (self.min_rounds, params.rounds) {
            (Some(min), Some(actual)) => actual < min,
            _ => false,
        };
        let salt_stale = self
            .min_salt_size
            .is_some_and(|min| params.salt_size < min);
        rounds_stale || salt_stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let params = HashParameters::new(16)
            .with_rounds(12)
            .with_variant(Variant::Bcrypt2b);
        assert_eq!(params.salt_size, 16);
        assert_eq!(params.rounds, Some(12));
        assert_eq!(params.variant, Some(Variant::Bcrypt2b));
        assert_eq!(params.memory_cost, None);
    }

    #[test]
    fn test_floor_rounds() {
        let floor = ParameterFloor::none().with_min_rounds(12);
        assert!(floor.is_violated_by(&HashParameters::new(16).with_rounds(10)));
        assert!(!floor.is_violated_by(&HashParameters::new(16).with_rounds(12)));
        // 没有 rounds 的 scheme 不受 rounds 下限影响
        assert!(!floor.is_violated_by(&HashParameters::new(4)));
    }

    #[test]
    fn test_floor_salt_size() {
        let floor = ParameterFloor::none().with_min_salt_size(8);
        assert!(floor.is_violated_by(&HashParameters::new(4)));
        assert!(!floor.is_violated_by(&HashParameters::new(8)));
    }

    #[test]
    fn test_variant_ident() {
        assert_eq!(Variant::Bcrypt2a.to_string(), "2a");
        assert!(Variant::Bcrypt2a.is_legacy());
        assert!(!Variant::Bcrypt2y.is_legacy());
    }
}
