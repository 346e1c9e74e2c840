//! Cryptographic load generation
//!
//! Each invocation generates two fresh AES keys, keys a block cipher with the
//! first one and encrypts the second one's bytes. The output is discarded.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::work::WorkUnit;
use crate::{Error, Result};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Supported symmetric key lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyLength {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl KeyLength {
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            128 => Ok(KeyLength::Aes128),
            192 => Ok(KeyLength::Aes192),
            256 => Ok(KeyLength::Aes256),
            other => Err(Error::InvalidConfig(format!(
                "Unsupported key length: {} bits",
                other
            ))),
        }
    }

    pub fn bits(&self) -> u16 {
        match self {
            KeyLength::Aes128 => 128,
            KeyLength::Aes192 => 192,
            KeyLength::Aes256 => 256,
        }
    }

    pub fn bytes(&self) -> usize {
        usize::from(self.bits() / 8)
    }
}

/// Generate a random key of the given length from the OS RNG
pub fn generate_key(length: KeyLength) -> Result<Vec<u8>> {
    let mut key = vec![0u8; length.bytes()];
    OsRng.try_fill_bytes(&mut key)?;
    Ok(key)
}

/// AES encryption context in ECB mode
enum BlockCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockCipher {
    fn new(length: KeyLength, key: &[u8]) -> Result<Self> {
        let cipher = match length {
            KeyLength::Aes128 => BlockCipher::Aes128(Aes128::new_from_slice(key)?),
            KeyLength::Aes192 => BlockCipher::Aes192(Aes192::new_from_slice(key)?),
            KeyLength::Aes256 => BlockCipher::Aes256(Aes256::new_from_slice(key)?),
        };
        Ok(cipher)
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            BlockCipher::Aes128(c) => c.encrypt_block(block),
            BlockCipher::Aes192(c) => c.encrypt_block(block),
            BlockCipher::Aes256(c) => c.encrypt_block(block),
        }
    }

    /// Encrypt every complete block of `data`; a trailing partial block stays
    /// buffered and produces no output.
    fn update(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() - data.len() % BLOCK_SIZE);
        for chunk in data.chunks_exact(BLOCK_SIZE) {
            let mut block = Block::clone_from_slice(chunk);
            self.encrypt_block(&mut block);
            out.extend_from_slice(&block);
        }
        out
    }
}

/// Encrypt `plaintext` once under a cipher keyed with `key`
pub fn encrypt_once(length: KeyLength, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = BlockCipher::new(length, key)?;
    Ok(cipher.update(plaintext))
}

/// CPU-bound work unit
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoLoad {
    key_length: KeyLength,
}

impl CryptoLoad {
    pub fn new(key_length: KeyLength) -> Self {
        Self { key_length }
    }

    pub fn key_length(&self) -> KeyLength {
        self.key_length
    }

    /// One iteration; returns the ciphertext
    pub fn run(&self) -> Result<Vec<u8>> {
        let cipher_key = generate_key(self.key_length)?;
        let payload = generate_key(self.key_length)?;
        encrypt_once(self.key_length, &cipher_key, &payload)
    }
}

impl WorkUnit for CryptoLoad {
    fn name(&self) -> &str {
        "crypto-load"
    }

    fn execute(&self) -> Result<()> {
        self.run().map(|_| ())
    }
}
