// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key Derivation (HKDF-SHA256)
//!
//! Splits one master key into independent subkeys via HKDF with
//! domain-separation info strings. Callers define their own info
//! constants next to the keys they derive.

use ring::hkdf;

/// HKDF-SHA256 key derivation.
pub struct HKDF;

impl HKDF {
    /// Derives a 32-byte key from input key material.
    ///
    /// `salt` defaults to a zero-filled salt when `None` (RFC 5869).
    /// The `info` string domain-separates keys derived from the same input.
    pub fn derive_key(salt: Option<&[u8]>, ikm: &[u8], info: &[u8]) -> [u8; 32] {
        let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, salt.unwrap_or(&[]));
        let prk = salt.extract(ikm);

        let mut out = [0u8; 32];
        prk.expand(&[info], hkdf::HKDF_SHA256)
            .expect("HKDF-SHA256 expand accepts 32-byte output")
            .fill(&mut out)
            .expect("HKDF-SHA256 fill accepts 32-byte output");
        out
    }
}
