//! Base-58 codec for the human-readable boundary
//!
//! Every value that leaves the binary domain (keys, encapsulated-key blob,
//! ciphertext blob) is rendered with the Bitcoin base-58 alphabet, which
//! avoids visually ambiguous characters and needs no escaping in shells or
//! chat clients.

use crate::error::{Error, Result};

/// Encode raw bytes as a base-58 string
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base-58 string back into raw bytes
///
/// Fails on any character outside the alphabet.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_round_trip() {
        let data = b"hello envault";
        let encoded = encode(data);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(data.as_slice(), decoded.as_slice());
    }

    #[test]
    fn test_empty_round_trip() {
        let encoded = encode(b"");
        let decoded = decode(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_large_round_trip() {
        // Payloads well past the 10 KB mark
        let mut data = vec![0u8; 16 * 1024];
        rand::thread_rng().fill_bytes(&mut data);

        let encoded = encode(&data);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn test_leading_zeros_round_trip() {
        let data = [0u8, 0, 0, 1, 2, 3];
        let decoded = decode(&encode(&data)).unwrap();
        assert_eq!(data.as_slice(), decoded.as_slice());
    }

    #[test]
    fn test_rejects_characters_outside_alphabet() {
        // 0, O, I and l are excluded from the base-58 alphabet
        for input in ["0", "O", "I", "l", "abc!def", "with space"] {
            assert!(decode(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_output_is_shell_safe() {
        let mut data = vec![0u8; 512];
        rand::thread_rng().fill_bytes(&mut data);

        let encoded = encode(&data);
        assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
