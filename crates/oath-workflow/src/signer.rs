//! # Report Signing
//!
//! Turns an encoded contract call into a [`Report`]: the payload, the
//! execution context, and one Ed25519 signature per executor over
//! `keccak256(payload || context)`. A report needs at least `quorum`
//! signatures to leave the signer.
//!
//! The local host holds one key per executor in process. A production host
//! aggregates signatures from remote executors behind the same trait.

use std::collections::HashSet;

use alloy_primitives::{Bytes, B256};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use oath_ledger::{Report, ReportContext, ReportSignature};
use rand_core::OsRng;

use crate::error::{ConfigError, SubmitError};

/// Host capability that produces signed reports.
pub trait ReportSigner: Send + Sync {
    /// Sign `payload` under `context`.
    fn sign(&self, payload: Bytes, context: ReportContext) -> Result<Report, SubmitError>;
}

/// `f + 1` for `n = 3f + 1` executors, rounding `f` down.
pub fn default_quorum(executors: usize) -> usize {
    executors.saturating_sub(1) / 3 + 1
}

/// One signing key per executor with a fixed quorum.
pub struct QuorumSigner {
    keys: Vec<SigningKey>,
    quorum: usize,
}

impl QuorumSigner {
    /// Requires `1 <= quorum <= keys.len()`.
    pub fn new(keys: Vec<SigningKey>, quorum: usize) -> Result<Self, ConfigError> {
        if quorum == 0 || quorum > keys.len() {
            return Err(ConfigError::InvalidValue {
                field: "quorum",
                reason: format!("must be between 1 and {} (executor count)", keys.len()),
            });
        }
        Ok(Self { keys, quorum })
    }

    /// Fresh random keys for `executors` signers.
    pub fn generate(executors: usize, quorum: usize) -> Result<Self, ConfigError> {
        let keys = (0..executors)
            .map(|_| SigningKey::generate(&mut OsRng))
            .collect();
        Self::new(keys, quorum)
    }

    /// Deterministic keys from 32-byte seeds.
    pub fn from_seeds(seeds: &[[u8; 32]], quorum: usize) -> Result<Self, ConfigError> {
        Self::new(seeds.iter().map(SigningKey::from_bytes).collect(), quorum)
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Public keys of every signer, in executor order.
    pub fn signers(&self) -> Vec<VerifyingKey> {
        self.keys.iter().map(SigningKey::verifying_key).collect()
    }
}

impl std::fmt::Debug for QuorumSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuorumSigner")
            .field("signers", &self.keys.len())
            .field("quorum", &self.quorum)
            .finish()
    }
}

impl ReportSigner for QuorumSigner {
    fn sign(&self, payload: Bytes, context: ReportContext) -> Result<Report, SubmitError> {
        let digest = Report::digest_of(&payload, &context);
        let signatures: Vec<ReportSignature> = self
            .keys
            .iter()
            .map(|key| ReportSignature {
                signer: B256::from(key.verifying_key().to_bytes()),
                signature: Bytes::copy_from_slice(&key.sign(digest.as_slice()).to_bytes()),
            })
            .collect();

        if signatures.len() < self.quorum {
            return Err(SubmitError::Signing(format!(
                "{} signatures, quorum is {}",
                signatures.len(),
                self.quorum
            )));
        }

        Ok(Report {
            payload,
            context,
            signatures,
        })
    }
}

/// Count valid signatures from distinct trusted signers and require at
/// least `quorum` of them. Returns the count.
pub fn verify_report(
    report: &Report,
    trusted: &[VerifyingKey],
    quorum: usize,
) -> Result<usize, SubmitError> {
    let digest = report.digest();
    let mut seen = HashSet::new();

    for sig in &report.signatures {
        let Ok(key) = VerifyingKey::from_bytes(&sig.signer.0) else {
            continue;
        };
        if !trusted.contains(&key) || seen.contains(&sig.signer) {
            continue;
        }
        let Ok(signature) = Signature::from_slice(&sig.signature) else {
            continue;
        };
        if key.verify(digest.as_slice(), &signature).is_ok() {
            seen.insert(sig.signer);
        }
    }

    if seen.len() < quorum {
        return Err(SubmitError::Signing(format!(
            "{} valid signatures, quorum is {quorum}",
            seen.len()
        )));
    }
    Ok(seen.len())
}
