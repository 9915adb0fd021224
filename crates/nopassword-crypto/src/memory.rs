//! Secure memory for derived passwords and scratch buffers.
//!
//! - [`SecretBuffer`] owns a derived password handed back to callers. It is
//!   zeroed on drop, best-effort `mlock`ed and masked in `Debug`/`Display`.
//! - [`random_bytes`] fills a [`Zeroizing`] buffer from the OS CSPRNG, used
//!   for fresh salts and tuner probe passwords.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

// ---------------------------------------------------------------------------
// Page locking
// ---------------------------------------------------------------------------

/// Unlocks the pages it covers on drop.
///
/// Only ever points into the heap allocation owned by the enclosing
/// [`SecretBuffer`], which never reallocates.
struct LockedRegion {
    ptr: *const u8,
    len: usize,
    locked: bool,
}

// SAFETY: the pointer is only passed to mlock/munlock, never dereferenced.
unsafe impl Send for LockedRegion {}
unsafe impl Sync for LockedRegion {}

impl LockedRegion {
    fn try_lock(bytes: &[u8]) -> Self {
        let locked = platform::try_mlock(bytes.as_ptr(), bytes.len());
        if !locked && !bytes.is_empty() {
            static WARNED: std::sync::Once = std::sync::Once::new();
            WARNED.call_once(|| {
                tracing::warn!(
                    "mlock failed, derived passwords may be swapped to disk; \
                     consider raising RLIMIT_MEMLOCK"
                );
            });
        }
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
            locked,
        }
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.locked {
            platform::try_munlock(self.ptr, self.len);
        }
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Owned, variable-length secret bytes.
///
/// Wraps a [`SecretSlice<u8>`], which zeroes its allocation when dropped.
pub struct SecretBuffer {
    // Declared first so the pages are unlocked before the slice is freed.
    lock: LockedRegion,
    inner: SecretSlice<u8>,
}

impl SecretBuffer {
    /// Copy `data` into a new secret allocation.
    ///
    /// The caller remains responsible for scrubbing `data`.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Take ownership of `data`, copying only when it has spare capacity.
    #[must_use]
    pub fn from_vec(mut data: Vec<u8>) -> Self {
        // Boxing a vector with spare capacity reallocates and would free the
        // old allocation unscrubbed.
        if data.capacity() != data.len() {
            let exact = data.as_slice().to_vec();
            data.zeroize();
            return Self::from_vec(exact);
        }
        let inner: SecretSlice<u8> = data.into();
        let lock = LockedRegion::try_lock(inner.expose_secret());
        Self { lock, inner }
    }

    /// Borrow the secret bytes. Keep the borrow short-lived.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the pages backing the buffer are locked in RAM.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.locked
    }
}

impl Clone for SecretBuffer {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl PartialEq for SecretBuffer {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.expose(), other.expose());
        if a.len() != b.len() {
            return false;
        }
        // Length is not secret; the contents are compared without early exit.
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl Eq for SecretBuffer {}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Fill a fresh `len`-byte buffer from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomSource`] if the OS generator fails. This is
/// an environment failure and is never retried.
pub fn random_bytes(len: usize) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomSource(format!("CSPRNG fill failed: {e}")))?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Platform-specific implementations
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod platform {
    pub(super) fn try_mlock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: mlock only inspects the address range; an invalid range
        // yields ENOMEM, which is reported as `false`.
        unsafe { libc::mlock(ptr.cast(), len) == 0 }
    }

    pub(super) fn try_munlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: munlock on a range we previously locked. Failure is ignored.
        unsafe {
            libc::munlock(ptr.cast(), len);
        }
    }
}

#[cfg(not(unix))]
mod platform {
    pub(super) fn try_mlock(_ptr: *const u8, _len: usize) -> bool {
        false
    }

    pub(super) fn try_munlock(_ptr: *const u8, _len: usize) {}
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
