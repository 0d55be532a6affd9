// SPDX-FileCopyrightText: 2026 FieldSync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod encryption;
pub mod kdf;
pub mod lookup;
pub mod password_kdf;

pub use encryption::{decrypt, encrypt, EncryptionError, SymmetricKey};
pub use kdf::HKDF;
pub use lookup::{digest_prefix, LookupKey};
pub use password_kdf::{derive_key_argon2id, PasswordKdfError};
