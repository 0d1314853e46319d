//! Sealed access tokens for the external media-session provider.
//!
//! Wire format (big-endian), base64 encoded and prefixed with `"04"`:
//!
//! ```text
//! [i64 expire][u16 iv_len][iv][u16 cipher_len][cipher]
//! ```
//!
//! `cipher` is AES-256-CBC/PKCS7 over the JSON claims. The verifier expects
//! the claim fields in declaration order of [`SessionClaims`].

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use base64::{Engine as _, engine::general_purpose};
use rand::{rngs::OsRng, Rng};
use serde::Serialize;

use crate::error::{AppError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// The size of the shared secret (AES-256 key) in bytes.
pub const SECRET_SIZE: usize = 32;
/// The length of the per-token initialization vector.
pub const IV_SIZE: usize = 16;
/// Version tag prepended to every token.
pub const TOKEN_VERSION: &str = "04";

const IV_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Claims sealed inside a token. Field order is part of the wire contract.
#[derive(Debug, Serialize)]
struct SessionClaims<'a> {
    app_id: u32,
    user_id: &'a str,
    nonce: i32,
    ctime: i64,
    expire: i64,
    payload: &'a str,
}

/// Issues a sealed token valid for `lifetime_secs` from now.
///
/// # Arguments
///
/// * `app_id` - The provider application id.
/// * `user_id` - The user the token is issued to.
/// * `secret` - The 32-byte shared secret.
/// * `lifetime_secs` - How long the token stays valid.
/// * `payload` - Opaque payload for the verifier, may be empty.
///
/// # Returns
///
/// The version-tagged base64 token.
pub fn issue_token(
    app_id: u32,
    user_id: &str,
    secret: &[u8],
    lifetime_secs: i64,
    payload: &str,
) -> Result<String> {
    issue_token_at(
        chrono::Utc::now().timestamp(),
        app_id,
        user_id,
        secret,
        lifetime_secs,
        payload,
    )
}

fn issue_token_at(
    now: i64,
    app_id: u32,
    user_id: &str,
    secret: &[u8],
    lifetime_secs: i64,
    payload: &str,
) -> Result<String> {
    if app_id == 0 {
        return Err(AppError::Validation("app_id must be a positive integer".to_string()));
    }
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if secret.len() != SECRET_SIZE {
        return Err(AppError::Validation(format!(
            "secret must be exactly {} bytes",
            SECRET_SIZE
        )));
    }
    if lifetime_secs <= 0 {
        return Err(AppError::Validation(
            "lifetime_secs must be a positive integer".to_string(),
        ));
    }

    let expire = now
        .checked_add(lifetime_secs)
        .ok_or_else(|| AppError::Validation("lifetime_secs is too large".to_string()))?;

    let claims = SessionClaims {
        app_id,
        user_id,
        nonce: rand::thread_rng().r#gen(),
        ctime: now,
        expire,
        payload,
    };
    let plaintext = sonic_rs::to_string(&claims)
        .map_err(|e| AppError::Internal(format!("Failed to serialize claims: {}", e)))?;

    let iv = generate_iv();
    let cipher = encrypt(secret, &iv, plaintext.as_bytes())?;
    let envelope = pack(expire, &iv, &cipher)?;

    Ok(format!(
        "{}{}",
        TOKEN_VERSION,
        general_purpose::STANDARD.encode(envelope)
    ))
}

/// Generates a fresh lowercase alphanumeric IV from the OS RNG.
fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    for byte in iv.iter_mut() {
        *byte = IV_ALPHABET[OsRng.gen_range(0..IV_ALPHABET.len())];
    }
    iv
}

/// Encrypts with AES-256-CBC and PKCS7 padding.
fn encrypt(secret: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let encryptor = Aes256CbcEnc::new_from_slices(secret, iv)
        .map_err(|e| AppError::Encryption(format!("Invalid key or IV: {}", e)))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn pack(expire: i64, iv: &[u8], cipher: &[u8]) -> Result<Vec<u8>> {
    let iv_len = u16::try_from(iv.len())
        .map_err(|_| AppError::Internal("IV too long".to_string()))?;
    let cipher_len = u16::try_from(cipher.len())
        .map_err(|_| AppError::Validation("payload is too large".to_string()))?;

    let mut envelope = Vec::with_capacity(8 + 2 + iv.len() + 2 + cipher.len());
    envelope.extend_from_slice(&expire.to_be_bytes());
    envelope.extend_from_slice(&iv_len.to_be_bytes());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(&cipher_len.to_be_bytes());
    envelope.extend_from_slice(cipher);
    Ok(envelope)
}
