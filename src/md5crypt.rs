//! Salted MD5-crypt password hashing
//!
//! Webshare verifies logins against the classic `$1$` MD5-crypt construction,
//! and expects the client to send the SHA-1 hex digest of that crypt string
//! instead of the plain password.

use md5::{Digest, Md5};
use sha1::Sha1;

/// Default magic prefix for MD5-crypt strings
pub const MAGIC: &str = "$1$";

/// Custom base-64 alphabet used by crypt(3)
const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number of stretching rounds dictated by the algorithm
const ROUNDS: usize = 1000;

/// Maximum number of salt characters taken into account
const MAX_SALT_CHARS: usize = 8;

/// Derives the MD5-crypt string for `password` with the given `salt`
///
/// The salt is truncated to its first eight characters. The returned string has
/// the form `{magic}{salt}${hash}` where `hash` is always 22 characters from the
/// crypt alphabet.
///
/// Callers are responsible for rejecting empty passwords or salts before
/// calling this; the function itself never fails.
///
/// # Examples
///
/// ```
/// use simple_stream::md5crypt;
///
/// let crypted = md5crypt::derive("password", "3azHgidD", md5crypt::MAGIC);
/// assert_eq!(crypted, "$1$3azHgidD$SrJPt7B.9rekpmwJwtON31");
/// ```
pub fn derive(password: &str, salt: &str, magic: &str) -> String {
    let salt: String = salt.chars().take(MAX_SALT_CHARS).collect();
    let pw = password.as_bytes();
    let salt_bytes = salt.as_bytes();

    let mut ctx = Md5::new();
    ctx.update(pw);
    ctx.update(magic.as_bytes());
    ctx.update(salt_bytes);

    let mut alt_ctx = Md5::new();
    alt_ctx.update(pw);
    alt_ctx.update(salt_bytes);
    alt_ctx.update(pw);
    let alt = alt_ctx.finalize();

    // One byte of the alternate digest per password byte, wrapping every 16
    for i in 0..pw.len() {
        ctx.update([alt[i % 16]]);
    }

    let first = pw.first().copied().unwrap_or_default();
    let mut bits = pw.len();
    while bits != 0 {
        if bits & 1 == 1 {
            ctx.update([0u8]);
        } else {
            ctx.update([first]);
        }
        bits >>= 1;
    }

    let mut digest = [0u8; 16];
    digest.copy_from_slice(&ctx.finalize());

    for round in 0..ROUNDS {
        let mut round_ctx = Md5::new();
        if round % 2 == 1 {
            round_ctx.update(pw);
        } else {
            round_ctx.update(digest);
        }
        if round % 3 != 0 {
            round_ctx.update(salt_bytes);
        }
        if round % 7 != 0 {
            round_ctx.update(pw);
        }
        if round % 2 == 1 {
            round_ctx.update(digest);
        } else {
            round_ctx.update(pw);
        }
        digest.copy_from_slice(&round_ctx.finalize());
    }

    let mut out = String::with_capacity(magic.len() + salt.len() + 1 + 22);
    out.push_str(magic);
    out.push_str(&salt);
    out.push('$');
    for (a, b, c) in [(0, 6, 12), (1, 7, 13), (2, 8, 14), (3, 9, 15), (4, 10, 5)] {
        let value =
            (u32::from(digest[a]) << 16) | (u32::from(digest[b]) << 8) | u32::from(digest[c]);
        push_base64(&mut out, value, 4);
    }
    push_base64(&mut out, u32::from(digest[11]), 2);

    out
}

/// Hashes a password the way Webshare's login endpoint expects it
///
/// This is the lowercase SHA-1 hex digest of the MD5-crypt string.
pub fn login_digest(password: &str, salt: &str) -> String {
    let crypted = derive(password, salt, MAGIC);
    hex::encode(Sha1::digest(crypted.as_bytes()))
}

/// Appends `count` crypt-alphabet characters for the low bits of `value`
fn push_base64(out: &mut String, mut value: u32, count: usize) {
    for _ in 0..count {
        out.push(char::from(ITOA64[(value & 0x3f) as usize]));
        value >>= 6;
    }
}
