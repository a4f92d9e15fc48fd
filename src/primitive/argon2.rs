//! Argon2id 原语
//!
//! 通过 `argon2` crate 计算 Argon2id (v=0x13) 原始摘要。

use ::argon2::{Algorithm, Argon2, Params, Version};

use super::{PrimitiveProvider, PrimitiveResult, check_salt_len, require_rounds};
use crate::error::PrimitiveError;
use crate::params::HashParameters;

/// 最小时间成本
pub const T_COST_MIN: u32 = 1;
/// 最大并行度
pub const P_COST_MAX: u32 = 0x00ff_ffff;
/// 最大内存成本（KiB，即 1 GiB）
///
/// 存储的哈希可能被篡改，内存成本不设上限时一次校验就可能耗尽进程内存。
pub const M_COST_MAX: u32 = 1 << 20;
/// salt 最小长度（字节）
pub const SALT_MIN: usize = 8;
/// salt 最大长度（字节）
pub const SALT_MAX: usize = 64;
/// 摘要长度（字节）
pub const DIGEST_SIZE: usize = 32;

/// Argon2id 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2id;

impl Argon2id {
    fn cost_params(params: &HashParameters) -> PrimitiveResult<(u32, u32, u32)> {
        let t_cost = require_rounds(params, T_COST_MIN, u32::MAX)?;
        let m_cost = params
            .memory_cost
            .ok_or(PrimitiveError::MissingParameter("memory_cost"))?;
        let p_cost = params
            .parallelism
            .ok_or(PrimitiveError::MissingParameter("parallelism"))?;

        if !(1..=P_COST_MAX).contains(&p_cost) {
            return Err(PrimitiveError::InvalidParameter {
                name: "parallelism",
                message: format!("expected 1..={}, got {}", P_COST_MAX, p_cost),
            });
        }
        // 每条 lane 至少需要 8 KiB
        if u64::from(m_cost) < 8 * u64::from(p_cost) {
            return Err(PrimitiveError::InvalidParameter {
                name: "memory_cost",
                message: format!("expected at least {} KiB, got {}", 8 * p_cost, m_cost),
            });
        }
        if m_cost > M_COST_MAX {
            return Err(PrimitiveError::InvalidParameter {
                name: "memory_cost",
                message: format!("expected at most {} KiB, got {}", M_COST_MAX, m_cost),
            });
        }
        Ok((m_cost, t_cost, p_cost))
    }
}

impl PrimitiveProvider for Argon2id {
    fn name(&self) -> &'static str {
        "argon2id"
    }

    fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        Self::cost_params(params)?;
        check_salt_len(salt_len, SALT_MIN, SALT_MAX)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        let (m_cost, t_cost, p_cost) = Self::cost_params(params)?;
        let params = Params::new(m_cost, t_cost, p_cost, Some(DIGEST_SIZE))
            .map_err(|e| PrimitiveError::Backend(format!("invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut out = vec![0u8; DIGEST_SIZE];
        argon2
            .hash_password_into(secret, salt, &mut out)
            .map_err(|e| PrimitiveError::Backend(format!("Argon2 hash failed: {}", e)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashParameters {
        HashParameters::new(16)
            .with_rounds(1)
            .with_memory_cost(64)
            .with_parallelism(1)
    }

    #[test]
    fn test_compute() {
        let salt = [3u8; 16];
        let a = Argon2id.compute(b"password", &salt, &cheap()).unwrap();
        let b = Argon2id.compute(b"password", &salt, &cheap()).unwrap();
        assert_eq!(a.len(), DIGEST_SIZE);
        assert_eq!(a, b);
        let c = Argon2id.compute(b"passwore", &salt, &cheap()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_memory_cost() {
        let params = HashParameters::new(16).with_rounds(1).with_parallelism(1);
        assert_eq!(
            Argon2id.check_params(16, &params),
            Err(PrimitiveError::MissingParameter("memory_cost"))
        );
    }

    #[test]
    fn test_memory_below_lane_minimum() {
        let params = cheap().with_memory_cost(15).with_parallelism(2);
        assert!(matches!(
            Argon2id.check_params(16, &params),
            Err(PrimitiveError::InvalidParameter {
                name: "memory_cost",
                ..
            })
        ));
    }

    #[test]
    fn test_memory_above_maximum() {
        assert!(Argon2id.check_params(16, &cheap().with_memory_cost(M_COST_MAX)).is_ok());
        let params = cheap().with_memory_cost(u32::MAX);
        assert!(matches!(
            Argon2id.compute(b"pw", &[0u8; 16], &params),
            Err(PrimitiveError::InvalidParameter {
                name: "memory_cost",
                ..
            })
        ));
    }

    #[test]
    fn test_salt_too_short() {
        assert!(matches!(
            Argon2id.check_params(4, &cheap()),
            Err(PrimitiveError::SaltSizeOutOfRange { actual: 4, .. })
        ));
    }
}
