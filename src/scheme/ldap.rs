//! LDAP 加盐 SHA-1 scheme（`{SSHA}`）
//!
//! 格式：`{SSHA}<base64(digest || salt)>`，标准 base64 带填充。
//! 没有 rounds，强度很低，通常只作为迁移来源出现在 Policy 的 deprecated 列表中。

use base64::Engine;

use crate::codec::{B64_PAD, decode_canonical};
use crate::error::{DecodeError, Result};
use crate::params::HashParameters;
use crate::primitive::{PrimitiveProvider, SaltedSha1};

use super::{ParsedHash, SchemeHandler, SchemeId, check_parts};

const PREFIX: &str = "{SSHA}";
const DIGEST_SIZE: usize = 20;
const SALT_MIN: usize = 4;
const SALT_MAX: usize = 16;

/// LDAP `{SSHA}` 处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapSaltedSha1Handler;

impl SchemeHandler for LdapSaltedSha1Handler {
    fn id(&self) -> SchemeId {
        SchemeId::LDAP_SALTED_SHA1
    }

    fn identify(&self, candidate: &str) -> bool {
        candidate.starts_with(PREFIX)
    }

    fn decode(&self, candidate: &str) -> std::result::Result<ParsedHash, DecodeError> {
        if candidate.is_empty() {
            return Err(DecodeError::Empty);
        }
        let payload = candidate
            .strip_prefix(PREFIX)
            .ok_or(DecodeError::WrongScheme)?;
        let mut raw = decode_canonical(&B64_PAD, "checksum", payload)?;

        let salt_len = raw.len().saturating_sub(DIGEST_SIZE);
        if raw.len() <= DIGEST_SIZE || !(SALT_MIN..=SALT_MAX).contains(&salt_len) {
            return Err(DecodeError::ParameterOutOfRange {
                param: "salt_size",
                value: salt_len.to_string(),
            });
        }
        let salt = raw.split_off(DIGEST_SIZE);
        Ok(ParsedHash::new(HashParameters::new(salt.len()), salt, raw))
    }

    fn encode(&self, parsed: &ParsedHash) -> Result<String> {
        check_parts(parsed, self.primitive())?;
        let mut raw = Vec::with_capacity(parsed.digest.len() + parsed.salt.len());
        raw.extend_from_slice(&parsed.digest);
        raw.extend_from_slice(&parsed.salt);
        Ok(format!("{}{}", PREFIX, B64_PAD.encode(raw)))
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(SALT_MIN)
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        &SaltedSha1
    }
}
