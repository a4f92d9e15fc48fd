//! SHA-crypt scheme（`$5$` / `$6$`）
//!
//! 格式：`$5$[rounds=N$]<salt>$<checksum>`
//!
//! - rounds 为 5000 时省略 `rounds=` 字段；显式写出 `rounds=5000` 视为非规范编码
//! - salt 最多 16 个 hash64 字符
//! - checksum 为摘要经字节换位后的 hash64 编码（SHA-256 为 43 字符，SHA-512 为 86 字符）

use std::fmt::Write as _;

use crate::codec::{HASH64_ALPHABET, hash64_decode_int, hash64_encode_int, is_hash64, parse_decimal};
use crate::error::{DecodeError, PrimitiveError, Result};
use crate::params::HashParameters;
use crate::primitive::{PrimitiveProvider, Sha256Crypt, Sha512Crypt};
use crate::random::generate_salt_chars;

use super::{ParsedHash, SchemeHandler, SchemeId, check_parts};

const IMPLICIT_ROUNDS: u32 = 5_000;
const ROUNDS_MIN: u32 = 1_000;
const ROUNDS_MAX: u32 = 999_999_999;
const SALT_MAX: usize = 16;
const DEFAULT_SALT_SIZE: usize = 16;

const SHA256_GROUPS: [(usize, usize, usize); 10] = [
    (0, 10, 20),
    (21, 1, 11),
    (12, 22, 2),
    (3, 13, 23),
    (24, 4, 14),
    (15, 25, 5),
    (6, 16, 26),
    (27, 7, 17),
    (18, 28, 8),
    (9, 19, 29),
];

const SHA512_GROUPS: [(usize, usize, usize); 21] = [
    (0, 21, 42),
    (22, 43, 1),
    (44, 2, 23),
    (3, 24, 45),
    (25, 46, 4),
    (47, 5, 26),
    (6, 27, 48),
    (28, 49, 7),
    (50, 8, 29),
    (9, 30, 51),
    (31, 52, 10),
    (53, 11, 32),
    (12, 33, 54),
    (34, 55, 13),
    (56, 14, 35),
    (15, 36, 57),
    (37, 58, 16),
    (59, 17, 38),
    (18, 39, 60),
    (40, 61, 19),
    (62, 20, 41),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShaKind {
    Sha256,
    Sha512,
}

/// SHA-crypt 处理器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaCryptHandler {
    kind: ShaKind,
}

impl ShaCryptHandler {
    /// `sha256_crypt`
    pub const fn sha256() -> Self {
        Self {
            kind: ShaKind::Sha256,
        }
    }

    /// `sha512_crypt`
    pub const fn sha512() -> Self {
        Self {
            kind: ShaKind::Sha512,
        }
    }

    fn prefix(&self) -> &'static str {
        match self.kind {
            ShaKind::Sha256 => "$5$",
            ShaKind::Sha512 => "$6$",
        }
    }

    fn default_rounds(&self) -> u32 {
        match self.kind {
            ShaKind::Sha256 => 535_000,
            ShaKind::Sha512 => 656_000,
        }
    }

    fn checksum_chars(&self) -> usize {
        match self.kind {
            ShaKind::Sha256 => 43,
            ShaKind::Sha512 => 86,
        }
    }

    fn groups(&self) -> &'static [(usize, usize, usize)] {
        match self.kind {
            ShaKind::Sha256 => &SHA256_GROUPS,
            ShaKind::Sha512 => &SHA512_GROUPS,
        }
    }

    /// 末尾不足 3 字节的分组：参与的字节（高位在前）与字符数
    fn tail(&self) -> (&'static [usize], usize) {
        match self.kind {
            ShaKind::Sha256 => (&[31, 30], 3),
            ShaKind::Sha512 => (&[63], 2),
        }
    }

    fn encode_checksum(&self, digest: &[u8], out: &mut String) {
        for &(a, b, c) in self.groups() {
            let value =
                (u32::from(digest[a]) << 16) | (u32::from(digest[b]) << 8) | u32::from(digest[c]);
            hash64_encode_int(out, value, 4);
        }
        let (tail, chars) = self.tail();
        let value = tail
            .iter()
            .fold(0u32, |acc, &i| (acc << 8) | u32::from(digest[i]));
        hash64_encode_int(out, value, chars);
    }

    fn decode_checksum(&self, checksum: &[u8]) -> std::result::Result<Vec<u8>, DecodeError> {
        let (tail, tail_chars) = self.tail();
        let mut digest = vec![0u8; self.primitive().digest_size()];

        let mut chunks = checksum.chunks(4);
        for &(a, b, c) in self.groups() {
            let chunk = chunks
                .next()
                .ok_or(DecodeError::InvalidStructure("checksum"))?;
            let value = hash64_decode_int(chunk).ok_or(DecodeError::InvalidAlphabet("checksum"))?;
            digest[a] = (value >> 16) as u8;
            digest[b] = (value >> 8) as u8;
            digest[c] = value as u8;
        }

        let last = chunks
            .next()
            .filter(|chunk| chunk.len() == tail_chars)
            .ok_or(DecodeError::InvalidStructure("checksum"))?;
        let value = hash64_decode_int(last).ok_or(DecodeError::InvalidAlphabet("checksum"))?;
        // 末尾字符的多余高位必须为零
        if value >> (8 * tail.len()) != 0 {
            return Err(DecodeError::NonCanonical("checksum"));
        }
        for (shift, &i) in tail.iter().rev().enumerate() {
            digest[i] = (value >> (8 * shift)) as u8;
        }
        Ok(digest)
    }
}

impl SchemeHandler for ShaCryptHandler {
    fn id(&self) -> SchemeId {
        match self.kind {
            ShaKind::Sha256 => SchemeId::SHA256_CRYPT,
            ShaKind::Sha512 => SchemeId::SHA512_CRYPT,
        }
    }

    fn identify(&self, candidate: &str) -> bool {
        candidate.starts_with(self.prefix())
    }

    fn decode(&self, candidate: &str) -> std::result::Result<ParsedHash, DecodeError> {
        if candidate.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rest = candidate
            .strip_prefix(self.prefix())
            .ok_or(DecodeError::WrongScheme)?;

        let (rounds, rest) = match rest.strip_prefix("rounds=") {
            Some(tail) => {
                let (digits, rest) = tail
                    .split_once('$')
                    .ok_or(DecodeError::InvalidStructure("missing salt"))?;
                let rounds = parse_decimal("rounds", digits)?;
                if rounds == IMPLICIT_ROUNDS {
                    return Err(DecodeError::NonCanonical("rounds"));
                }
                (rounds, rest)
            }
            None => (IMPLICIT_ROUNDS, rest),
        };
        if !(ROUNDS_MIN..=ROUNDS_MAX).contains(&rounds) {
            return Err(DecodeError::ParameterOutOfRange {
                param: "rounds",
                value: rounds.to_string(),
            });
        }

        let (salt, checksum) = rest
            .split_once('$')
            .ok_or(DecodeError::InvalidStructure("missing checksum"))?;
        if salt.len() > SALT_MAX {
            return Err(DecodeError::InvalidLength {
                field: "salt",
                expected: SALT_MAX,
                actual: salt.len(),
            });
        }
        if !salt.bytes().all(is_hash64) {
            return Err(DecodeError::InvalidAlphabet("salt"));
        }
        if checksum.len() != self.checksum_chars() {
            return Err(DecodeError::InvalidLength {
                field: "checksum",
                expected: self.checksum_chars(),
                actual: checksum.len(),
            });
        }
        let digest = self.decode_checksum(checksum.as_bytes())?;

        let params = HashParameters::new(salt.len()).with_rounds(rounds);
        Ok(ParsedHash::new(params, salt.as_bytes().to_vec(), digest))
    }

    fn encode(&self, parsed: &ParsedHash) -> Result<String> {
        check_parts(parsed, self.primitive())?;
        if !parsed.salt.iter().copied().all(is_hash64) {
            return Err(PrimitiveError::InvalidParameter {
                name: "salt",
                message: "salt must use the hash64 alphabet".to_string(),
            }
            .into());
        }
        let rounds = parsed
            .params
            .rounds
            .ok_or(PrimitiveError::MissingParameter("rounds"))?;

        let mut out = String::with_capacity(3 + 17 + SALT_MAX + 1 + self.checksum_chars());
        out.push_str(self.prefix());
        if rounds != IMPLICIT_ROUNDS {
            let _ = write!(out, "rounds={}$", rounds);
        }
        out.extend(parsed.salt.iter().map(|&c| c as char));
        out.push('$');
        self.encode_checksum(&parsed.digest, &mut out);
        Ok(out)
    }

    fn default_params(&self) -> HashParameters {
        HashParameters::new(DEFAULT_SALT_SIZE).with_rounds(self.default_rounds())
    }

    fn primitive(&self) -> &dyn PrimitiveProvider {
        match self.kind {
            ShaKind::Sha256 => &Sha256Crypt,
            ShaKind::Sha512 => &Sha512Crypt,
        }
    }

    fn generate_salt(&self, size: usize) -> Result<Vec<u8>> {
        generate_salt_chars(HASH64_ALPHABET, size)
    }

    fn probe_params(&self) -> HashParameters {
        HashParameters::new(8).with_rounds(ROUNDS_MIN)
    }
}
