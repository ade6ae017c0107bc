//! # Relay Decoder
//!
//! Decodes identity-registry registration events into [`RelayRequest`]s.
//! The log must have exactly three topics, `[signature, user, nullifierHash]`,
//! and data that decodes as `(uint256 root, uint256 timestamp)`. The
//! subject is the right-most 20 bytes of `topics[1]`.
//!
//! Anything else fails the handler. Beyond the shape check the decoder
//! trusts the log: verification already happened on the origin ledger.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use oath_core::{RelayRequest, Role};
use oath_ledger::abi::IIdentityRegistry;
use oath_ledger::EvmLog;

use crate::error::RelayError;

/// The registry event that requests registration for `role`.
pub fn event_signature(role: Role) -> B256 {
    match role {
        Role::Provider => IIdentityRegistry::ProviderRegistrationRequested::SIGNATURE_HASH,
        Role::Arbitrator => IIdentityRegistry::ArbitratorRegistrationRequested::SIGNATURE_HASH,
    }
}

fn event_name(role: Role) -> &'static str {
    match role {
        Role::Provider => "ProviderRegistrationRequested",
        Role::Arbitrator => "ArbitratorRegistrationRequested",
    }
}

/// Decode one registration log.
pub fn decode_registration(role: Role, log: &EvmLog) -> Result<RelayRequest, RelayError> {
    if log.topics.len() != 3 {
        return Err(RelayError::TopicCount {
            expected: 3,
            found: log.topics.len(),
        });
    }
    if log.topics[0] != event_signature(role) {
        return Err(RelayError::WrongEvent {
            expected: event_name(role),
        });
    }

    // Both events share the (root, timestamp) data layout.
    let (root, _timestamp) =
        IIdentityRegistry::ProviderRegistrationRequested::abi_decode_data(&log.data, true)
            .map_err(|e| RelayError::Data(e.to_string()))?;

    Ok(RelayRequest {
        role,
        subject_address: Address::from_word(log.topics[1]),
        nullifier_hash: U256::from_be_bytes(log.topics[2].0),
        source_root: root,
    })
}

/// The logs in `logs` emitted by `registry` with `role`'s signature.
pub fn registration_logs<'a>(
    role: Role,
    registry: Address,
    logs: &'a [EvmLog],
) -> impl Iterator<Item = &'a EvmLog> + 'a {
    let signature = event_signature(role);
    logs.iter()
        .filter(move |l| l.address == registry && l.topic0() == Some(signature))
}
