//! Argon2id scheme（PHC 字符串格式）
//!
//! 格式：`$argon2id$v=19$m=<KiB>,t=<passes>,p=<lanes>$<b64 salt>$<b64 digest>`
//!
//! 只接受 Argon2id 与版本 19；`keyid` / `data` 等扩展字段不受支持。
//! 内存成本超过 [`ARGON2_M_COST_MAX`] 的哈希在解析阶段即被拒绝。

use base64::Engine;

use crate::codec::{B64_NO_PAD, decode_canonical, parse_decimal};
use crate::error::{DecodeError, PrimitiveError, Result};
use crate::params::HashParameters;
use crate::primitive::{ARGON2_M_COST_MAX, Argon2id, PrimitiveProvider};

use super::{ParsedHash, SchemeHandler, SchemeId, check_parts};

const PREFIX: &str = "$argon2id$";
const VERSION_FIELD: &str = "v=19";
const SALT_MIN: usize = 8;
const SALT_MAX: usize = 64;
const DIGEST_SIZE: usize = 32;
const P_COST_MAX: u32 = 0x00ff_ffff;

// OWASP 推荐的最低配置
const DEFAULT_M_COST: u32 = 19_456;
const DEFAULT_T_COST: u32 = 2;
const DEFAULT_P_COST: u32 = 1;
const DEFAULT_SALT_SIZE: usize = 16;

/// Argon2id 处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Handler;

fn parse_cost(field: &'static str, input: Option<&str>) -> std::result::Result<u32, DecodeError> {
    let prefix = match field {
        "m" => "m=",
        "t" => "t=",
        _ => "p=",
    };
    let value = input
        .and_then(|s| s.strip_prefix(prefix))
        .ok_or(DecodeError::InvalidStructure("expected m=,t=,p="))?;
    parse_decimal(field, value)
}

fn out_of_range(param: &'static str, value: impl ToString) -> DecodeError {
    DecodeError::ParameterOutOfRange {
        param,
        value: value.to_string(),
    }
}

impl SchemeHandler for Argon2Handler {
    fn id(&self) -> SchemeId {
        SchemeId::ARGON2
    }

    fn identify(&self, candidate: &str) -> bool {
        candidate.starts_with(PREFIX)
    }

    fn decode(&self, candidate: &str) -> std::result::Result<ParsedHash, DecodeError> {
        if candidate.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rest = candidate
            .strip_prefix(PREFIX)
            .ok_or(DecodeError::WrongScheme)?;

        let fields: Vec<&str> = rest.split('$').collect();
        let [version, costs, salt, digest] = fields.as_slice() else {
            return Err(DecodeError::InvalidStructure(
                "expected v=19$m=,t=,p=$salt$checksum",
            ));
        };
        if *version != VERSION_FIELD {
            return Err(DecodeError::InvalidStructure("unsupported version"));
        }

        let mut costs = costs.split(',');
        let m_cost = parse_cost("m", costs.next())?;
        let t_cost = parse_cost("t", costs.next())?;
        let p_cost = parse_cost("p", costs.next())?;
        if costs.next().is_some() {
            return Err(DecodeError::InvalidStructure("unexpected parameter"));
        }
        if t_cost < 1 {
            return Err(out_of_range("t", t_cost));
        }
        if !(1..=P_COST_MAX).contains(&p_cost) {
            return Err(out_of_range("p", p_cost));
        }
        if u64::from(m_cost) < 8 * u64::from(p_cost) || m_cost > ARGON2_M_COST_MAX {
            return Err(out_of_range("m", m_cost));
        }

        let salt = decode_canonical(&B64_NO_PAD, "salt", salt)?;
        if !(SALT_MIN..=SALT_MAX).contains(&salt.len()) {
            return Err(out_of_range("salt_size", salt.len()));
        }
        let digest = decode_canonical(&B64_NO_PAD, "checksum", digest)?;
        if digest.len() != DIGEST_SIZE {
            return Err(DecodeError::InvalidLength {
                field: "checksum",
                expected: DIGEST_SIZE,
                actual: digest.len(),
            });
        }

        let params = HashParameters::new(salt.len())
            .with_rounds(t_cost)
            .with_memory_cost(m_cost)
            .with_parallelism(p_cost);
        Ok(ParsedHash::new(params, salt, digest))
    }

    fn encode(&self, parsed: &ParsedHash) -> Result<String> {
        check_parts(parsed, self.primitive())?;
        let params = &parsed.params;
        let t_cost = params
            .rounds
            .ok_or(PrimitiveError::MissingParameter("rounds"))?;
        let m_cost = params
            .memory_cost
            .ok_or(PrimitiveError::MissingParameter("memory_cost"))?;
        let p_cost = params
            .parallelism
            .ok_or(PrimitiveError::MissingParameter("parallelism"))?;
        Ok(format!(
            "{}{}$m={},t={},p={}${}${}",
            PREFIX,
            VERSION_FIELD,
            m_cost,
            t_cost,
            p_cost,
            B64_NO_PAD.encode(&parsed.salt),
            B64_NO_PAD.encode(&parsed.digest)
        ))
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(DEFAULT_SALT_SIZE)
            .with_rounds(DEFAULT_T_COST)
            .with_memory_cost(DEFAULT_M_COST)
            .with_parallelism(DEFAULT_P_COST)
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        &Argon2id
    }

    fn probe_params(&self) -> HashParameters {
        HashParameters::new(DEFAULT_SALT_SIZE)
            .with_rounds(1)
            .with_memory_cost(8)
            .with_parallelism(1)
    }
}
