// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keyed Lookup Digests
//!
//! Identifiers are never stored in plaintext. Each indexed column holds
//! an HMAC-SHA256 digest keyed with a store-local secret, so equality
//! probes and unique constraints keep working while the identifiers
//! themselves stay confidential. Without the key, digests cannot be
//! correlated back to peers or records.
//!
//! Digest inputs must be canonical byte encodings. Callers encode
//! tuples with bincode so that distinct identifier tuples can never
//! produce the same input bytes.

use ring::hmac;
use zeroize::Zeroize;

/// 256-bit key for lookup digests.
///
/// Derived from the master key, independent from the sealing key.
pub struct LookupKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("LookupKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for LookupKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl LookupKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        LookupKey { bytes }
    }

    /// Computes the keyed digest of a canonical message.
    pub fn digest(&self, message: &[u8]) -> [u8; 32] {
        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.bytes);
        let tag = hmac::sign(&key, message);

        let mut out = [0u8; 32];
        out.copy_from_slice(tag.as_ref());
        out
    }
}

/// Short hex prefix of a digest, safe to put in log output.
///
/// Eight hex characters are enough to follow a record through a debug
/// session without reproducing the full digest.
pub fn digest_prefix(digest: &[u8]) -> String {
    hex::encode(&digest[..digest.len().min(4)])
}
