//! SHA-crypt 原语（SHA-256 / SHA-512）
//!
//! 实现 Ulrich Drepper 的 SHA-crypt 摘要计算。输出为原始摘要字节，
//! 字节换位与 hash64 编码由 scheme 层负责。

use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use super::{PrimitiveProvider, PrimitiveResult, check_salt_len, require_rounds};
use crate::params::HashParameters;

/// 最小 rounds
pub const ROUNDS_MIN: u32 = 1_000;
/// 最大 rounds
pub const ROUNDS_MAX: u32 = 999_999_999;
/// salt 最大长度（字符）
pub const SALT_MAX: usize = 16;

/// SHA-256 crypt 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Crypt;

/// SHA-512 crypt 原语
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512Crypt;

impl PrimitiveProvider for Sha256Crypt {
    fn name(&self) -> &'static str {
        "sha256-crypt"
    }

    fn digest_size(&self) -> usize {
        32
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        check_salt_len(salt_len, 0, SALT_MAX)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        let rounds = require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        Ok(sha_crypt::<Sha256>(secret, salt, rounds))
    }
}

impl PrimitiveProvider for Sha512Crypt {
    fn name(&self) -> &'static str {
        "sha512-crypt"
    }

    fn digest_size(&self) -> usize {
        64
    }

    fn check_params(&self, salt_len: usize, params: &HashParameters) -> PrimitiveResult<()> {
        require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        check_salt_len(salt_len, 0, SALT_MAX)
    }

    fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &HashParameters,
    ) -> PrimitiveResult<Vec<u8>> {
        let rounds = require_rounds(params, ROUNDS_MIN, ROUNDS_MAX)?;
        Ok(sha_crypt::<Sha512>(secret, salt, rounds))
    }
}

/// 将 `block` 循环展开到 `len` 字节
fn repeat_to(block: &[u8], len: usize) -> Vec<u8> {
    block.iter().copied().cycle().take(len).collect()
}

fn sha_crypt<D: Digest>(secret: &[u8], salt: &[u8], rounds: u32) -> Vec<u8> {
    let n = <D as Digest>::output_size();

    // 摘要 B = H(secret + salt + secret)
    let mut ctx = D::new();
    ctx.update(secret);
    ctx.update(salt);
    ctx.update(secret);
    let b = Zeroizing::new(ctx.finalize().to_vec());

    // 摘要 A
    let mut ctx = D::new();
    ctx.update(secret);
    ctx.update(salt);
    let mut remaining = secret.len();
    while remaining > n {
        ctx.update(&b[..]);
        remaining -= n;
    }
    ctx.update(&b[..remaining]);
    let mut bits = secret.len();
    while bits > 0 {
        if bits & 1 != 0 {
            ctx.update(&b[..]);
        } else {
            ctx.update(secret);
        }
        bits >>= 1;
    }
    let a = ctx.finalize().to_vec();

    // 序列 P
    let mut ctx = D::new();
    for _ in 0..secret.len() {
        ctx.update(secret);
    }
    let dp = Zeroizing::new(ctx.finalize().to_vec());
    let p = Zeroizing::new(repeat_to(&dp, secret.len()));

    // 序列 S
    let mut ctx = D::new();
    for _ in 0..(16 + a[0] as usize) {
        ctx.update(salt);
    }
    let ds = ctx.finalize().to_vec();
    let s = repeat_to(&ds, salt.len());

    let mut c = a;
    for round in 0..rounds {
        let mut ctx = D::new();
        if round & 1 != 0 {
            ctx.update(&p[..]);
        } else {
            ctx.update(&c);
        }
        if round % 3 != 0 {
            ctx.update(&s);
        }
        if round % 7 != 0 {
            ctx.update(&p[..]);
        }
        if round & 1 != 0 {
            ctx.update(&c);
        } else {
            ctx.update(&p[..]);
        }
        c = ctx.finalize().to_vec();
    }
    c
}
