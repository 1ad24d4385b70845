//! Mini-program payload decryption.
//!
//! QQ and WeChat mini-programs hand sensitive user data to the client
//! encrypted with AES-128-CBC under the login session key. Key, IV and
//! ciphertext all travel as base64 text.

use {
    aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7},
    base64::{Engine as _, engine::general_purpose::STANDARD},
    serde_json::Value,
    socialite_common::{SocialError, SocialResult},
};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Base64 text length of a 16-byte value.
const ENCODED_BLOCK_LEN: usize = 24;

/// Decrypt a mini-program payload and parse it as JSON.
pub fn decrypt_payload(encrypted_data: &str, iv: &str, session_key: &str) -> SocialResult<Value> {
    let key = decode_block(session_key, "session key")?;
    let iv = decode_block(iv, "iv")?;
    let ciphertext = STANDARD
        .decode(encrypted_data.trim())
        .map_err(|e| SocialError::invalid_argument(format!("encrypted data is not base64: {e}")))?;

    let plaintext = Aes128CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| SocialError::invalid_argument("failed to decrypt payload"))?;

    if plaintext.is_empty() {
        return Err(SocialError::invalid_argument("payload decrypted to nothing"));
    }

    let value: Value = serde_json::from_slice(&plaintext)
        .map_err(|e| SocialError::invalid_argument(format!("payload is not JSON: {e}")))?;

    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(SocialError::invalid_argument("payload decrypted to an empty document"));
    }
    Ok(value)
}

fn decode_block(encoded: &str, what: &str) -> SocialResult<[u8; 16]> {
    if encoded.len() != ENCODED_BLOCK_LEN {
        return Err(SocialError::invalid_argument(format!(
            "{what} must be {ENCODED_BLOCK_LEN} base64 characters, got {}",
            encoded.len()
        )));
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| SocialError::invalid_argument(format!("{what} is not base64: {e}")))?;
    <[u8; 16]>::try_from(bytes.as_slice())
        .map_err(|_| SocialError::invalid_argument(format!("{what} must decode to 16 bytes")))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        aes::cipher::BlockEncryptMut,
        rstest::rstest,
        serde_json::json,
        socialite_common::ErrorKind,
    };

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    const KEY: [u8; 16] = *b"0123456789abcdef";
    const IV: [u8; 16] = *b"fedcba9876543210";

    fn encrypt(plaintext: &[u8]) -> String {
        let ciphertext =
            Aes128CbcEnc::new(&KEY.into(), &IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        STANDARD.encode(ciphertext)
    }

    fn key_b64() -> String {
        STANDARD.encode(KEY)
    }

    fn iv_b64() -> String {
        STANDARD.encode(IV)
    }

    #[test]
    fn test_round_trip() {
        let original = json!({
            "openId": "oGZUI0egBJY1zhBYw2KhdUfwVJJE",
            "nickName": "Band",
            "gender": 1,
            "watermark": {"timestamp": 1_477_314_187, "appid": "wx4f4bc4dec97d474b"},
        });
        let encrypted = encrypt(original.to_string().as_bytes());

        let decrypted = decrypt_payload(&encrypted, &iv_b64(), &key_b64()).unwrap();
        assert_eq!(decrypted, original);
    }

    #[test]
    fn test_rejects_bad_key_length() {
        let encrypted = encrypt(b"{\"a\":1}");
        let short_key = STANDARD.encode(&KEY[..12]);
        let err = decrypt_payload(&encrypted, &iv_b64(), &short_key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("session key"));
    }

    #[test]
    fn test_rejects_bad_iv_length() {
        let encrypted = encrypt(b"{\"a\":1}");
        let long_iv = format!("{}AAAA", iv_b64());
        let err = decrypt_payload(&encrypted, &long_iv, &key_b64()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("iv"));
    }

    #[test]
    fn test_rejects_non_base64_key_of_right_length() {
        let encrypted = encrypt(b"{\"a\":1}");
        let err = decrypt_payload(&encrypted, &iv_b64(), "!!!!!!!!!!!!!!!!!!!!!!!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rejects_non_json_plaintext() {
        let encrypted = encrypt(b"definitely not json");
        let err = decrypt_payload(&encrypted, &iv_b64(), &key_b64()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    #[case::empty_object(b"{}")]
    #[case::null(b"null")]
    #[case::empty_array(b"[]")]
    #[case::blank(b"   ")]
    fn test_rejects_empty_document(#[case] plaintext: &[u8]) {
        let encrypted = encrypt(plaintext);
        let err = decrypt_payload(&encrypted, &iv_b64(), &key_b64()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rejects_wrong_key() {
        let encrypted = encrypt(b"{\"a\":1}");
        let other_key = STANDARD.encode(*b"ffffffffffffffff");
        // Either the padding check or the JSON parse must fail.
        assert!(decrypt_payload(&encrypted, &iv_b64(), &other_key).is_err());
    }
}
