//! `WireGuard` key material.
//!
//! `WireGuard` uses Curve25519 for key exchange. Private, public and preshared
//! keys are all 32 bytes and share one representation; the all-zero value is
//! the "unset" sentinel and is never a usable key.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{Result, WireGuardError};

/// `WireGuard` key size in bytes (256-bit Curve25519 keys).
pub const KEY_SIZE: usize = 32;

/// A 32-byte `WireGuard` key.
#[derive(Clone, Copy, Default)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes_array(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a key from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            WireGuardError::parse(
                "Keys must decode to exactly 32 bytes",
                format!("{} bytes", bytes.len()),
            )
        })?;
        Ok(Self(arr))
    }

    /// Returns the raw bytes of the key.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Encodes the key as base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// Decodes a key from base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid base64 or does not decode
    /// to exactly 32 bytes.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|e| WireGuardError::parse(format!("Invalid key: {e}"), s))?;
        Self::from_bytes(&bytes)
            .map_err(|_| WireGuardError::parse("Keys must decode to exactly 32 bytes", s))
    }

    /// Returns true for the all-zero "unset" key. Runs in constant time.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.ct_eq(&[0u8; KEY_SIZE]).into()
    }

    /// Generates a random preshared key from the OS CSPRNG.
    #[must_use]
    pub fn generate_preshared() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Generates a random, clamped Curve25519 private key.
    #[must_use]
    pub fn generate_private() -> Self {
        let mut key = Self::generate_preshared();
        key.clamp();
        key
    }

    /// Derives the public key by scalar base multiplication.
    #[must_use]
    pub fn public_key(&self) -> Self {
        let secret = StaticSecret::from(self.0);
        Self(X25519PublicKey::from(&secret).to_bytes())
    }

    fn clamp(&mut self) {
        self.0[0] &= 248;
        self.0[KEY_SIZE - 1] = (self.0[KEY_SIZE - 1] & 127) | 64;
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "Key(<zero>)")
        } else {
            write!(f, "Key([REDACTED])")
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for Key {
    type Err = WireGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base64(s)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Key {}
