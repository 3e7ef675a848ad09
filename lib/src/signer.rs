//! Signer management for loading the payer's key from various sources
//!
//! A Stacks private key is 32 bytes of hex. A 33-byte form ending in `01`
//! marks the key as using a compressed public key, which changes the derived
//! address. The key material is never printed or written anywhere.

use crate::constants::PRIVATE_KEY_ENV;
use crate::error::{Result, Stx402Error};
use crate::network::StacksNetwork;
use crate::stacks::StacksAddress;
use crate::utils::strip_0x_prefix;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use std::fmt;

/// Trait for types that can provide a signer
pub trait WalletSource {
    /// Load a signer from this wallet source
    fn load_signer(&self) -> Result<StacksSigner>;
}

/// Where the signing key comes from
#[derive(Clone)]
pub enum WalletOpts {
    /// A raw private key (hex string, with or without 0x prefix)
    PrivateKey { key: String },
    /// An environment variable holding the hex key
    Env { var: String },
}

impl WalletOpts {
    /// Key from the `CLIENT_PRIVATE_KEY` environment variable
    pub fn from_default_env() -> Self {
        WalletOpts::Env {
            var: PRIVATE_KEY_ENV.to_string(),
        }
    }
}

impl fmt::Debug for WalletOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletOpts::PrivateKey { .. } => f.write_str("PrivateKey { key: <redacted> }"),
            WalletOpts::Env { var } => f.debug_struct("Env").field("var", var).finish(),
        }
    }
}

impl WalletSource for WalletOpts {
    fn load_signer(&self) -> Result<StacksSigner> {
        match self {
            WalletOpts::PrivateKey { key } => StacksSigner::from_hex(key),
            WalletOpts::Env { var } => {
                let key = std::env::var(var).map_err(|_| {
                    Stx402Error::config_missing(format!(
                        "No private key configured. Set {var} or pass --private-key."
                    ))
                })?;
                StacksSigner::from_hex(&key)
            }
        }
    }
}

/// A secp256k1 signing key for Stacks transactions.
#[derive(Clone)]
pub struct StacksSigner {
    secp: Secp256k1<All>,
    secret: SecretKey,
    public: PublicKey,
    compressed: bool,
}

impl StacksSigner {
    /// Parse a hex private key.
    ///
    /// 64 hex characters select an uncompressed public key, 66 characters
    /// ending in `01` a compressed one.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let key = strip_0x_prefix(private_key);
        if !key.is_ascii() {
            return Err(Stx402Error::InvalidKey(
                "Invalid private key: expected hex characters".to_string(),
            ));
        }

        let compressed = match key.len() {
            64 => false,
            66 if key.ends_with("01") => true,
            66 => {
                return Err(Stx402Error::InvalidKey(
                    "Invalid private key: a 33-byte key must end in 01 (compressed marker)"
                        .to_string(),
                ))
            }
            n => {
                return Err(Stx402Error::InvalidKey(format!(
                    "Invalid private key: expected 64 or 66 hex characters, got {n}"
                )))
            }
        };

        let bytes = hex::decode(&key[..64])
            .map_err(|e| Stx402Error::InvalidKey(format!("Invalid private key: {e}")))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| Stx402Error::InvalidKey(format!("Invalid private key: {e}")))?;

        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self {
            secp,
            secret,
            public,
            compressed,
        })
    }

    /// Serialized public key (33 bytes compressed, 65 uncompressed).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        if self.compressed {
            self.public.serialize().to_vec()
        } else {
            self.public.serialize_uncompressed().to_vec()
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Sender address on `network`.
    pub fn address(&self, network: StacksNetwork) -> StacksAddress {
        StacksAddress::from_public_key(network, &self.public_key_bytes())
    }

    /// Recoverable signature over a 32-byte digest, laid out as
    /// recovery id followed by r and s.
    pub fn sign_digest(&self, digest: [u8; 32]) -> [u8; 65] {
        let message = Message::from_digest(digest);
        let signature = self.secp.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut out = [0u8; 65];
        // Recovery ids are 0..=3.
        out[0] = recovery_id.to_i32() as u8;
        out[1..].copy_from_slice(&compact);
        out
    }
}

impl fmt::Debug for StacksSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StacksSigner")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .field("secret", &"<redacted>")
            .finish()
    }
}
