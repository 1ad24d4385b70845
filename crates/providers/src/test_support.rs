use {
    aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7},
    base64::{Engine as _, engine::general_purpose::STANDARD},
    socialite_config::HttpConfig,
    socialite_oauth::ApiClient,
};

pub const SESSION_KEY: [u8; 16] = *b"tiihtNczf5v6AKRy";
pub const IV: [u8; 16] = *b"r7BXXKkLb8qrSNn0";

pub fn api() -> ApiClient {
    ApiClient::new(&HttpConfig::default()).unwrap()
}

/// Encrypt the way the mini-program platform does, returning
/// `(encrypted_data, iv, session_key)` in base64.
pub fn encrypt_payload(plaintext: &str) -> (String, String, String) {
    let ciphertext = cbc::Encryptor::<aes::Aes128>::new(&SESSION_KEY.into(), &IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    (
        STANDARD.encode(ciphertext),
        STANDARD.encode(IV),
        STANDARD.encode(SESSION_KEY),
    )
}
