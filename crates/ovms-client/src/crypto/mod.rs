//! Session crypto: tokens, HMAC-MD5 digests and the RC4 stream cipher

mod stream_cipher;

pub use stream_cipher::{CipherError, StreamCipher, PRIME_BYTES};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::Md5;
use rand::Rng;

type HmacMd5 = Hmac<Md5>;

/// Alphabet handshake tokens are drawn from
pub const TOKEN_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Handshake token length in characters
pub const TOKEN_LEN: usize = 22;

/// Generate a fresh handshake token
///
/// Tokens only need to be unique per attempt, so any RNG will do.
pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// HMAC-MD5 of `message` keyed with `key`
pub fn hmac_md5(key: &[u8], message: &[u8]) -> Result<[u8; 16], CipherError> {
    let mut mac =
        HmacMd5::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    mac.update(message);
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Ok(digest)
}

/// Base64 form of `hmac_md5`, as carried in the handshake lines
pub fn digest_b64(key: &[u8], message: &[u8]) -> Result<String, CipherError> {
    Ok(BASE64.encode(hmac_md5(key, message)?))
}

pub(crate) fn b64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

pub(crate) fn b64_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(data)
}
