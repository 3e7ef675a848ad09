//! STX token transfer transactions.
//!
//! Only the shape a payment needs is supported: single-signature standard
//! authorization, anchor mode `Any`, post-condition mode `Deny` with no
//! post-conditions, and a token transfer payload.

use super::address::Principal;
use super::sha512_256;
use crate::constants::{MEMO_MAX_LENGTH_BYTES, MEMO_PREFIX};
use crate::error::{Result, Stx402Error};
use crate::network::StacksNetwork;
use crate::signer::StacksSigner;
use crate::utils::{to_base36, truncate_to_bytes};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

const AUTH_STANDARD: u8 = 0x04;
const HASH_MODE_P2PKH: u8 = 0x00;
const ANCHOR_MODE_ANY: u8 = 0x03;
const POST_CONDITION_MODE_DENY: u8 = 0x02;
const PAYLOAD_TOKEN_TRANSFER: u8 = 0x00;
const SIGNATURE_LEN: usize = 65;

/// How the signer's public key is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Compressed = 0x00,
    Uncompressed = 0x01,
}

/// Transfer memo, at most 34 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memo(String);

impl Memo {
    /// Longer text is cut at the last character boundary that fits.
    pub fn new(text: impl AsRef<str>) -> Self {
        Memo(truncate_to_bytes(text.as_ref(), MEMO_MAX_LENGTH_BYTES).to_string())
    }

    /// Memo tagging a payment made at `millis` since the epoch.
    pub fn for_payment(millis: u128) -> Self {
        Memo::new(format!("{MEMO_PREFIX}{}", to_base36(millis)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-padded wire form.
    pub fn to_bytes(&self) -> [u8; MEMO_MAX_LENGTH_BYTES] {
        let mut out = [0u8; MEMO_MAX_LENGTH_BYTES];
        out[..self.0.len()].copy_from_slice(self.0.as_bytes());
        out
    }
}

/// Builder for an STX transfer.
///
/// # Examples
///
/// ```
/// use stx402_lib::network::StacksNetwork;
/// use stx402_lib::signer::StacksSigner;
/// use stx402_lib::stacks::{Memo, TokenTransfer};
///
/// let signer = StacksSigner::from_hex(
///     "000000000000000000000000000000000000000000000000000000000000000101",
/// ).unwrap();
/// let tx = TokenTransfer::new("ST1TKZ1BA0Q7JGY10MSQX1FHBWZKSX3M7X3EZE9FS".parse().unwrap(), 100_000)
///     .network(StacksNetwork::Testnet)
///     .memo(Memo::new("x402:demo"))
///     .nonce(0)
///     .fee(180)
///     .sign(&signer)
///     .unwrap();
/// assert_eq!(tx.serialize().len(), 180);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TokenTransfer {
    recipient: Principal,
    amount: u64,
    memo: Memo,
    network: StacksNetwork,
    nonce: u64,
    fee: u64,
}

impl TokenTransfer {
    pub fn new(recipient: Principal, amount: u64) -> Self {
        Self {
            recipient,
            amount,
            memo: Memo::default(),
            network: StacksNetwork::default(),
            nonce: 0,
            fee: 0,
        }
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    pub fn network(mut self, network: StacksNetwork) -> Self {
        self.network = network;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Fee in micro-STX.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Unsigned transaction sent from `signer`'s account.
    pub fn build(self, signer: &StacksSigner) -> StacksTransaction {
        let key_encoding = if signer.is_compressed() {
            KeyEncoding::Compressed
        } else {
            KeyEncoding::Uncompressed
        };
        StacksTransaction {
            version: self.network.transaction_version(),
            chain_id: self.network.chain_id(),
            condition: SpendingCondition {
                signer: signer.address(self.network).hash160,
                nonce: self.nonce,
                fee: self.fee,
                key_encoding,
                signature: [0u8; SIGNATURE_LEN],
            },
            recipient: self.recipient,
            amount: self.amount,
            memo: self.memo,
        }
    }

    /// Build and sign in one step.
    pub fn sign(self, signer: &StacksSigner) -> Result<StacksTransaction> {
        let mut tx = self.build(signer);
        tx.sign(signer)?;
        Ok(tx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpendingCondition {
    signer: [u8; 20],
    nonce: u64,
    fee: u64,
    key_encoding: KeyEncoding,
    signature: [u8; SIGNATURE_LEN],
}

impl SpendingCondition {
    /// Form committed to by the initial signature hash.
    fn cleared(&self) -> Self {
        Self {
            nonce: 0,
            fee: 0,
            key_encoding: KeyEncoding::Compressed,
            signature: [0u8; SIGNATURE_LEN],
            ..self.clone()
        }
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(HASH_MODE_P2PKH);
        out.extend_from_slice(&self.signer);
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.push(self.key_encoding as u8);
        out.extend_from_slice(&self.signature);
    }
}

/// A single-signature STX token transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StacksTransaction {
    version: u8,
    chain_id: u32,
    condition: SpendingCondition,
    recipient: Principal,
    amount: u64,
    memo: Memo,
}

impl StacksTransaction {
    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn recipient(&self) -> &Principal {
        &self.recipient
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    pub fn nonce(&self) -> u64 {
        self.condition.nonce
    }

    pub fn fee(&self) -> u64 {
        self.condition.fee
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Hash160 of the sender's public key.
    pub fn signer_hash(&self) -> [u8; 20] {
        self.condition.signer
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.condition.signature
    }

    /// Changing the fee invalidates any existing signature.
    pub fn set_fee(&mut self, fee: u64) {
        self.condition.fee = fee;
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        self.condition.nonce = nonce;
    }

    /// Canonical wire encoding.
    pub fn serialize(&self) -> Vec<u8> {
        self.serialize_with(&self.condition)
    }

    fn serialize_with(&self, condition: &SpendingCondition) -> Vec<u8> {
        let mut out = Vec::with_capacity(180);
        out.push(self.version);
        out.extend_from_slice(&self.chain_id.to_be_bytes());
        out.push(AUTH_STANDARD);
        condition.serialize_into(&mut out);
        out.push(ANCHOR_MODE_ANY);
        out.push(POST_CONDITION_MODE_DENY);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.push(PAYLOAD_TOKEN_TRANSFER);
        self.recipient.serialize_into(&mut out);
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.extend_from_slice(&self.memo.to_bytes());
        out
    }

    /// Lowercase hex of the wire encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id: SHA-512/256 of the wire encoding.
    pub fn txid(&self) -> String {
        hex::encode(sha512_256(&self.serialize()))
    }

    /// Digest the signature commits to.
    fn presign_hash(&self) -> [u8; 32] {
        let initial = sha512_256(&self.serialize_with(&self.condition.cleared()));

        let mut buf = Vec::with_capacity(32 + 1 + 16);
        buf.extend_from_slice(&initial);
        buf.push(AUTH_STANDARD);
        buf.extend_from_slice(&self.condition.fee.to_be_bytes());
        buf.extend_from_slice(&self.condition.nonce.to_be_bytes());
        sha512_256(&buf)
    }

    /// Sign with `signer`, which must own the sending account.
    pub fn sign(&mut self, signer: &StacksSigner) -> Result<()> {
        let network = StacksNetwork::from_transaction_version(self.version)
            .ok_or_else(|| Stx402Error::construction("unknown transaction version"))?;
        if signer.address(network).hash160 != self.condition.signer {
            return Err(Stx402Error::construction(
                "signing key does not match the sending account",
            ));
        }
        self.condition.signature = signer.sign_digest(self.presign_hash());
        Ok(())
    }

    /// Recover the signing key and check it owns the sending account.
    pub fn verify(&self) -> Result<bool> {
        let signature = &self.condition.signature;
        let recovery_id = RecoveryId::from_i32(i32::from(signature[0]))
            .map_err(|e| Stx402Error::construction(format!("bad recovery id: {e}")))?;
        let recoverable = RecoverableSignature::from_compact(&signature[1..], recovery_id)
            .map_err(|e| Stx402Error::construction(format!("bad signature: {e}")))?;

        let message = Message::from_digest(self.presign_hash());
        let public_key = match Secp256k1::verification_only().recover_ecdsa(&message, &recoverable)
        {
            Ok(key) => key,
            Err(_) => return Ok(false),
        };
        let serialized = match self.condition.key_encoding {
            KeyEncoding::Compressed => public_key.serialize().to_vec(),
            KeyEncoding::Uncompressed => public_key.serialize_uncompressed().to_vec(),
        };
        Ok(super::hash160(&serialized) == self.condition.signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::StacksAddress;

    const KEY_ONE_COMPRESSED: &str =
        "000000000000000000000000000000000000000000000000000000000000000101";
    const RECIPIENT: &str = "ST1TKZ1BA0Q7JGY10MSQX1FHBWZKSX3M7X3EZE9FS";

    fn signer() -> StacksSigner {
        StacksSigner::from_hex(KEY_ONE_COMPRESSED).unwrap()
    }

    fn transfer() -> TokenTransfer {
        TokenTransfer::new(RECIPIENT.parse().unwrap(), 100_000)
            .network(StacksNetwork::Testnet)
            .memo(Memo::new("x402:test"))
            .nonce(7)
            .fee(180)
    }

    #[test]
    fn test_memo_truncates_on_char_boundary() {
        assert_eq!(Memo::new("short").as_str(), "short");
        let long = "x".repeat(40);
        assert_eq!(Memo::new(&long).as_str().len(), 34);
        // 33 ASCII bytes then a 2-byte char: the char does not fit
        let text = format!("{}é", "a".repeat(33));
        assert_eq!(Memo::new(&text).as_str(), "a".repeat(33));
    }

    #[test]
    fn test_memo_for_payment() {
        let memo = Memo::for_payment(1_700_000_000_000);
        assert_eq!(memo.as_str(), "x402:loyw3v28");
        let bytes = memo.to_bytes();
        assert_eq!(&bytes[..13], b"x402:loyw3v28");
        assert!(bytes[13..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_unsigned_layout() {
        let tx = transfer().build(&signer());
        let bytes = tx.serialize();
        assert_eq!(bytes.len(), 180);

        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[1..5], &[0x80, 0x00, 0x00, 0x00]);
        assert_eq!(bytes[5], 0x04);
        assert_eq!(bytes[6], 0x00);
        assert_eq!(
            hex::encode(&bytes[7..27]),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
        assert_eq!(&bytes[27..35], &7u64.to_be_bytes());
        assert_eq!(&bytes[35..43], &180u64.to_be_bytes());
        assert_eq!(bytes[43], 0x00);
        assert!(bytes[44..109].iter().all(|b| *b == 0));
        assert_eq!(bytes[109], 0x03);
        assert_eq!(bytes[110], 0x02);
        assert_eq!(&bytes[111..115], &[0, 0, 0, 0]);
        assert_eq!(bytes[115], 0x00);
        assert_eq!(bytes[116], 0x05);
        assert_eq!(bytes[117], 26);
        assert_eq!(
            hex::encode(&bytes[118..138]),
            "753f856a05cf287820a66fd0be2be7e79e8e87e8"
        );
        assert_eq!(&bytes[138..146], &100_000u64.to_be_bytes());
        assert_eq!(&bytes[146..155], b"x402:test");
    }

    #[test]
    fn test_mainnet_header() {
        let tx = transfer()
            .network(StacksNetwork::Mainnet)
            .build(&signer());
        let bytes = tx.serialize();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(&bytes[1..5], &[0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_sign_and_verify() {
        let tx = transfer().sign(&signer()).unwrap();
        assert!(tx.verify().unwrap());
        assert!(tx.signature()[0] <= 3);
        assert_eq!(tx.txid().len(), 64);
        assert_eq!(tx.to_hex().len(), 360);

        // Signing is deterministic (RFC 6979)
        let again = transfer().sign(&signer()).unwrap();
        assert_eq!(tx.to_hex(), again.to_hex());
    }

    #[test]
    fn test_signature_commits_to_fee_and_nonce() {
        let mut tx = transfer().sign(&signer()).unwrap();
        tx.set_fee(181);
        assert!(!tx.verify().unwrap());

        let mut tx = transfer().sign(&signer()).unwrap();
        tx.set_nonce(8);
        assert!(!tx.verify().unwrap());
    }

    #[test]
    fn test_uncompressed_signer() {
        let signer = StacksSigner::from_hex(&KEY_ONE_COMPRESSED[..64]).unwrap();
        let tx = transfer().sign(&signer).unwrap();
        assert_eq!(tx.serialize()[43], 0x01);
        assert!(tx.verify().unwrap());
    }

    #[test]
    fn test_sign_rejects_foreign_key() {
        let mut tx = transfer().build(&signer());
        let other = StacksSigner::from_hex(
            "000000000000000000000000000000000000000000000000000000000000000201",
        )
        .unwrap();
        assert!(matches!(
            tx.sign(&other),
            Err(Stx402Error::TransactionConstructionFailed(_))
        ));
    }

    #[test]
    fn test_contract_recipient_length() {
        let address: StacksAddress = RECIPIENT.parse().unwrap();
        let recipient = Principal::Contract {
            address,
            name: "vault".to_string(),
        };
        let tx = TokenTransfer::new(recipient, 1).build(&signer());
        // Name length byte plus the name itself
        assert_eq!(tx.serialize().len(), 180 + 1 + 5);
    }

    #[test]
    fn test_signed_transfer_known_answer() {
        let signer = StacksSigner::from_hex(
            "b244296d5907de9864c0b0d51f98a13c52890be0404e83f273144cd5b9960eed01",
        )
        .unwrap();
        let tx = transfer().sign(&signer).unwrap();

        assert_eq!(
            tx.to_hex(),
            "80800000000400bed38c2aadffa348931bcb542880ff79d607afec00000000000000070000000000\
             0000b4000086b59991e662ad907e72bd406c689e6569510c271b401ee3161a5a92d1d1ad4946107f\
             8282988b14b65b541269ec6a5fa40d78db99b822ea360908cfc355e75903020000000000051a753f\
             856a05cf287820a66fd0be2be7e79e8e87e800000000000186a0783430323a746573740000000000\
             0000000000000000000000000000000000000000"
        );
    }
}
