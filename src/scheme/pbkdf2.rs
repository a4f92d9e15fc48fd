//! PBKDF2-HMAC-SHA256 scheme
//!
//! 格式：`$pbkdf2-sha256$<rounds>$<ab64 salt>$<ab64 digest>`

use base64::Engine;

use crate::codec::{AB64, decode_canonical, parse_decimal};
use crate::error::{DecodeError, PrimitiveError, Result};
use crate::params::HashParameters;
use crate::primitive::{Pbkdf2Sha256, PrimitiveProvider};

use super::{ParsedHash, SchemeHandler, SchemeId, check_parts};

const PREFIX: &str = "$pbkdf2-sha256$";
const ROUNDS_MIN: u32 = 1;
const ROUNDS_MAX: u32 = u32::MAX - 1;
const SALT_MAX: usize = 1024;
const DIGEST_SIZE: usize = 32;
const DEFAULT_ROUNDS: u32 = 29_000;
const DEFAULT_SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha256Handler;

impl SchemeHandler for Pbkdf2Sha256Handler {
    fn id(&self) -> SchemeId {
        SchemeId::PBKDF2_SHA256
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

        let mut fields = rest.splitn(3, '$');
        let (Some(rounds), Some(salt), Some(digest)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(DecodeError::InvalidStructure("expected rounds$salt$checksum"));
        };

        let rounds = parse_decimal("rounds", rounds)?;
        if !(ROUNDS_MIN..=ROUNDS_MAX).contains(&rounds) {
            return Err(DecodeError::ParameterOutOfRange {
                param: "rounds",
                value: rounds.to_string(),
            });
        }

        let salt = decode_canonical(&AB64, "salt", salt)?;
        if salt.len() > SALT_MAX {
            return Err(DecodeError::InvalidLength {
                field: "salt",
                expected: SALT_MAX,
                actual: salt.len(),
            });
        }
        let digest = decode_canonical(&AB64, "checksum", digest)?;
        if digest.len() != DIGEST_SIZE {
            return Err(DecodeError::InvalidLength {
                field: "checksum",
                expected: DIGEST_SIZE,
                actual: digest.len(),
            });
        }

        let params = HashParameters::new(salt.len()).with_rounds(rounds);
        Ok(ParsedHash::new(params, salt, digest))
    }

    fn encode(&self, parsed: &ParsedHash) -> Result<String> {
        check_parts(parsed, self.primitive())?;
        let rounds = parsed
            .params
            .rounds
            .ok_or(PrimitiveError::MissingParameter("rounds"))?;
        Ok(format!(
            "{}{}${}${}",
            PREFIX,
            rounds,
            AB64.encode(&parsed.salt),
            AB64.encode(&parsed.digest)
        ))
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(DEFAULT_SALT_SIZE).with_rounds(DEFAULT_ROUNDS)
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        &Pbkdf2Sha256
    }

    fn probe_params(&self) -> HashParameters {
        HashParameters::new(DEFAULT_SALT_SIZE).with_rounds(ROUNDS_MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR: &str =
        "$pbkdf2-sha256$1212$4vjV83LKPjQzk31VI4E0Vw$hsYF68OiOUPdDZ1Fg.fJPeq1h/gXXY7acBp9/6c.tmQ";

    #[test]
    fn test_known_vector() {
        assert!(Pbkdf2Sha256Handler.verify(b"password", VECTOR).unwrap());
        assert!(!Pbkdf2Sha256Handler.verify(b"Password", VECTOR).unwrap());
    }

    #[test]
    fn test_decode_and_reencode() {
        let parsed = Pbkdf2Sha256Handler.decode(VECTOR).unwrap();
        assert_eq!(parsed.params.rounds, Some(1212));
        assert_eq!(parsed.params.salt_size, 16);
        assert_eq!(Pbkdf2Sha256Handler.encode(&parsed).unwrap(), VECTOR);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Pbkdf2Sha256Handler.decode("$pbkdf2-sha256$1212$4vjV83LKPjQzk31VI4E0Vw"),
            Err(DecodeError::InvalidStructure("expected rounds$salt$checksum"))
        );
        assert_eq!(
            Pbkdf2Sha256Handler.decode(&VECTOR.replacen("$1212$", "$01212$", 1)),
            Err(DecodeError::NonCanonical("rounds"))
        );
        assert!(matches!(
            Pbkdf2Sha256Handler.decode(&VECTOR.replacen("$1212$", "$0$", 1)),
            Err(DecodeError::ParameterOutOfRange { .. })
        ));
        // 标准 base64 的 '+' 不属于 ab64 字母表
        assert_eq!(
            Pbkdf2Sha256Handler.decode(&VECTOR.replacen("4vjV", "4v+V", 1)),
            Err(DecodeError::InvalidAlphabet("salt"))
        );
        assert!(matches!(
            Pbkdf2Sha256Handler.decode(&VECTOR[..VECTOR.len() - 4]),
            Err(DecodeError::InvalidLength { .. }) | Err(DecodeError::NonCanonical(_))
        ));
        assert_eq!(
            Pbkdf2Sha256Handler.decode("$pbkdf2$1212$salt$digest"),
            Err(DecodeError::WrongScheme)
        );
    }

    #[test]
    fn test_hash_roundtrip_with_default_params() {
        let hash = Pbkdf2Sha256Handler
            .hash(b"s3cret", &Pbkdf2Sha256Handler.probe_params())
            .unwrap();
        assert!(hash.starts_with("$pbkdf2-sha256$1$"));
        assert!(Pbkdf2Sha256Handler.identify(&hash));
        assert!(Pbkdf2Sha256Handler.verify(b"s3cret", &hash).unwrap());
    }
}
