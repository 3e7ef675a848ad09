//! c32 and c32check encoding used by Stacks addresses.
//!
//! The alphabet is Crockford's base32 without `I`, `L`, `O` and `U`. Values
//! are converted as big-endian integers, and every leading zero byte of the
//! input is written as one `0` character so that round trips preserve length.

use crate::error::{Result, Stx402Error};
use sha2::{Digest, Sha256};

pub const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const CHECKSUM_LEN: usize = 4;

/// Encode bytes as a c32 string.
pub fn c32_encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|b| **b == 0).count();

    // Repeated division of the big-endian number by 32.
    let mut number: Vec<u8> = data[zeros..].to_vec();
    let mut digits = Vec::new();
    while !number.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for byte in &number {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = acc / 32;
            remainder = acc % 32;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q as u8);
            }
        }
        digits.push(C32_ALPHABET[remainder as usize]);
        number = quotient;
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('0').take(zeros));
    out.extend(digits.iter().rev().map(|d| char::from(*d)));
    out
}

/// Decode a c32 string into bytes.
///
/// Input is case-insensitive; `O` reads as `0` and `I`/`L` read as `1`.
pub fn c32_decode(input: &str) -> Result<Vec<u8>> {
    let normalized = normalize(input)?;
    let zeros = normalized.iter().take_while(|d| **d == 0).count();

    // Big-endian base-256 accumulator.
    let mut number: Vec<u8> = Vec::new();
    for digit in &normalized[zeros..] {
        let mut carry = u32::from(*digit);
        for byte in number.iter_mut().rev() {
            let acc = (u32::from(*byte) << 5) | carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            number.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(number);
    Ok(out)
}

fn normalize(input: &str) -> Result<Vec<u8>> {
    input
        .chars()
        .map(|c| {
            let c = match c.to_ascii_uppercase() {
                'O' => '0',
                'I' | 'L' => '1',
                other => other,
            };
            C32_ALPHABET
                .iter()
                .position(|a| char::from(*a) == c)
                .map(|p| p as u8)
                .ok_or_else(|| {
                    Stx402Error::invalid_address(format!(
                        "Invalid c32 character '{c}' in '{input}'"
                    ))
                })
        })
        .collect()
}

/// First four bytes of the double SHA-256 of `version || data`.
pub fn c32_checksum(version: u8, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let once = hasher.finalize();
    let twice = Sha256::digest(once);

    let mut checksum = [0u8; CHECKSUM_LEN];
    checksum.copy_from_slice(&twice[..CHECKSUM_LEN]);
    checksum
}

/// c32check encoding: version character followed by c32(data || checksum).
pub fn c32check_encode(version: u8, data: &[u8]) -> Result<String> {
    if version >= 32 {
        return Err(Stx402Error::invalid_address(format!(
            "Address version {version} does not fit in one c32 character"
        )));
    }

    let mut payload = data.to_vec();
    payload.extend_from_slice(&c32_checksum(version, data));

    let mut out = String::new();
    out.push(char::from(C32_ALPHABET[version as usize]));
    out.push_str(&c32_encode(&payload));
    Ok(out)
}

/// Inverse of [`c32check_encode`]; verifies the checksum.
pub fn c32check_decode(input: &str) -> Result<(u8, Vec<u8>)> {
    let mut chars = input.chars();
    let version_char = chars
        .next()
        .ok_or_else(|| Stx402Error::invalid_address("Empty c32check string"))?;
    let version = normalize(&version_char.to_string())?[0];

    let mut payload = c32_decode(chars.as_str())?;
    if payload.len() < CHECKSUM_LEN {
        return Err(Stx402Error::invalid_address(format!(
            "c32check string '{input}' is too short"
        )));
    }
    let checksum = payload.split_off(payload.len() - CHECKSUM_LEN);
    if checksum != c32_checksum(version, &payload) {
        return Err(Stx402Error::invalid_address(format!(
            "Checksum mismatch in '{input}'"
        )));
    }
    Ok((version, payload))
}
