//! bcrypt scheme
//!
//! 格式：`$2b$<cost>$<22 字符 salt><31 字符 digest>`
//!
//! 接受 `2a`、`2b`、`2y` 三种变体前缀，cost 固定为两位十进制数字。
//! `2a` 被视为过时变体，校验成功后 [`needs_rehash`](SchemeHandler::needs_rehash) 返回 `true`。
//!
//! 算法只使用 secret 的前 72 字节；更长的 secret 在哈希时报错、校验时不匹配，
//! 因此共享前 72 字节的不同 secret 不会互相通过校验。

use base64::Engine;

use crate::codec::{BCRYPT_B64, decode_canonical};
use crate::error::{DecodeError, PrimitiveError, Result};
use crate::params::{HashParameters, ParameterFloor, Variant};
use crate::primitive::{BCRYPT_TRUNCATE_SIZE, Bcrypt, PrimitiveProvider};

use super::{ParsedHash, SchemeHandler, SchemeId, check_parts};

const COST_MIN: u32 = 4;
const COST_MAX: u32 = 31;
const DEFAULT_COST: u32 = 12;
const SALT_SIZE: usize = 16;
const SALT_CHARS: usize = 22;
const DIGEST_CHARS: usize = 31;

/// bcrypt 处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptHandler;

fn parse_variant(candidate: &str) -> Option<Variant> {
    match candidate.get(..4)? {
        "$2a$" => Some(Variant::Bcrypt2a),
        "$2b$" => Some(Variant::Bcrypt2b),
        "$2y$" => Some(Variant::Bcrypt2y),
        _ => None,
    }
}

impl SchemeHandler for BcryptHandler {
    fn id(&self) -> SchemeId {
        SchemeId::BCRYPT
    }

    fn identify(&self, candidate: &str) -> bool {
        parse_variant(candidate).is_some()
    }

    fn decode(&self, candidate: &str) -> std::result::Result<ParsedHash, DecodeError> {
        if candidate.is_empty() {
            return Err(DecodeError::Empty);
        }
        let variant = parse_variant(candidate).ok_or(DecodeError::WrongScheme)?;
        let (cost, body) = candidate[4..]
            .split_once('$')
            .ok_or(DecodeError::InvalidStructure("missing cost"))?;

        if cost.is_empty() || !cost.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidStructure("cost"));
        }
        if cost.len() != 2 {
            return Err(DecodeError::NonCanonical("cost"));
        }
        let cost: u32 = cost
            .parse()
            .map_err(|_| DecodeError::InvalidStructure("cost"))?;
        if !(COST_MIN..=COST_MAX).contains(&cost) {
            return Err(DecodeError::ParameterOutOfRange {
                param: "cost",
                value: cost.to_string(),
            });
        }

        if !body.is_ascii() {
            return Err(DecodeError::InvalidAlphabet("salt"));
        }
        if body.len() != SALT_CHARS + DIGEST_CHARS {
            return Err(DecodeError::InvalidLength {
                field: "checksum",
                expected: SALT_CHARS + DIGEST_CHARS,
                actual: body.len(),
            });
        }
        let (salt, digest) = body.split_at(SALT_CHARS);
        let salt = decode_canonical(&BCRYPT_B64, "salt", salt)?;
        let digest = decode_canonical(&BCRYPT_B64, "checksum", digest)?;

        let params = HashParameters::new(SALT_SIZE)
            .with_rounds(cost)
            .with_variant(variant);
        Ok(ParsedHash::new(params, salt, digest))
    }

    fn encode(&self, parsed: &ParsedHash) -> Result<String> {
        check_parts(parsed, self.primitive())?;
        let cost = parsed
            .params
            .rounds
            .ok_or(PrimitiveError::MissingParameter("rounds"))?;
        let variant = parsed.params.variant.unwrap_or(Variant::Bcrypt2b);
        Ok(format!(
            "${}${:02}${}{}",
            variant.ident(),
            cost,
            BCRYPT_B64.encode(&parsed.salt),
            BCRYPT_B64.encode(&parsed.digest)
        ))
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(SALT_SIZE)
            .with_rounds(DEFAULT_COST)
            .with_variant(Variant::Bcrypt2b)
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        &Bcrypt
    }

    fn truncate_size(&self) -> Option<usize> {
        Some(BCRYPT_TRUNCATE_SIZE)
    }

    fn probe_params(&self) -> HashParameters {
        HashParameters::new(SALT_SIZE)
            .with_rounds(COST_MIN)
            .with_variant(Variant::Bcrypt2b)
    }

    fn needs_rehash(&self, params: &HashParameters, floor: &ParameterFloor) -> bool {
        floor.is_violated_by(params) || params.variant.is_some_and(|v| v.is_legacy())
    }
}
