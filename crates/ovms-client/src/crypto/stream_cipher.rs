//! RC4-compatible stream cipher

use thiserror::Error;

/// Keystream bytes discarded right after key setup
pub const PRIME_BYTES: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid key length: {0} (expected 1..=256 bytes)")]
    InvalidKeyLength(usize),
}

/// Single-direction RC4 state
///
/// The two indices carry over between calls, so one instance encrypts or
/// decrypts one continuous stream. There is no reset; build a new instance
/// for a new stream.
#[derive(Clone)]
pub struct StreamCipher {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl StreamCipher {
    /// Run the key schedule without priming
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.is_empty() || key.len() > 256 {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }

        let mut state = [0u8; 256];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut j: u8 = 0;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        Ok(Self { state, i: 0, j: 0 })
    }

    /// Key schedule followed by discarding `PRIME_BYTES` of keystream
    pub fn primed(key: &[u8]) -> Result<Self, CipherError> {
        let mut cipher = Self::new(key)?;
        cipher.prime();
        Ok(cipher)
    }

    pub fn prime(&mut self) {
        let mut discard = [0u8; PRIME_BYTES];
        self.apply_keystream(&mut discard);
    }

    /// XOR `data` in place with the next keystream bytes
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let k = self.state
                [self.state[self.i as usize].wrapping_add(self.state[self.j as usize]) as usize];
            *byte ^= k;
        }
    }

    pub fn crypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out);
        out
    }
}

impl std::fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc4_hex(key: &str, plaintext: &str) -> String {
        let mut cipher = StreamCipher::new(key.as_bytes()).unwrap();
        hex::encode_upper(cipher.crypt(plaintext.as_bytes()))
    }

    #[test]
    fn test_known_answer_vectors() {
        assert_eq!(rc4_hex("Key", "Plaintext"), "BBF316E8D940AF0AD3");
        assert_eq!(rc4_hex("Wiki", "pedia"), "1021BF0420");
        assert_eq!(
            rc4_hex("Secret", "Attack at dawn"),
            "45A01F645FC35B383552544B9BF5"
        );
    }

    #[test]
    fn test_state_continues_across_calls() {
        let mut whole = StreamCipher::new(b"Secret").unwrap();
        let expected = whole.crypt(b"Attack at dawn");

        let mut split = StreamCipher::new(b"Secret").unwrap();
        let mut joined = split.crypt(b"Attack");
        joined.extend(split.crypt(b" at dawn"));
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_matched_priming_round_trip() {
        let key = [0x5au8; 16];
        let mut tx = StreamCipher::primed(&key).unwrap();
        let mut rx = StreamCipher::primed(&key).unwrap();
        let ciphertext = tx.crypt(b"MP-0 S80,K");
        assert_ne!(ciphertext, b"MP-0 S80,K");
        assert_eq!(rx.crypt(&ciphertext), b"MP-0 S80,K");

        // Priming only one side breaks the stream alignment
        let mut unprimed = StreamCipher::new(&key).unwrap();
        let mut tx = StreamCipher::primed(&key).unwrap();
        assert_ne!(unprimed.crypt(&tx.crypt(b"hello")), b"hello");
    }

    #[test]
    fn test_primed_equals_discarding_1024_bytes() {
        let mut primed = StreamCipher::primed(b"Key").unwrap();
        let mut manual = StreamCipher::new(b"Key").unwrap();
        manual.crypt(&[0u8; 1024]);
        assert_eq!(primed.crypt(b"abc"), manual.crypt(b"abc"));
    }

    #[test]
    fn test_key_length_bounds() {
        assert_eq!(
            StreamCipher::new(&[]).unwrap_err(),
            CipherError::InvalidKeyLength(0)
        );
        assert!(StreamCipher::new(&[1u8; 256]).is_ok());
        assert_eq!(
            StreamCipher::new(&[1u8; 257]).unwrap_err(),
            CipherError::InvalidKeyLength(257)
        );
    }
}
