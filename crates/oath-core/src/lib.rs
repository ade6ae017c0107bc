//! # oath-core: Foundational Types for OathLayer
//!
//! OathLayer enforces uptime SLAs for tokenized real-world assets. Providers
//! bond collateral against an on-chain agreement; the enforcement workflow
//! compares externally reported uptime against the agreement threshold and
//! slashes the bond when the threshold is missed.
//!
//! This crate holds the vocabulary every other crate shares. It depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Basis points, never floats, at the decision boundary.** Reported
//!    percentages are converted once, through [`Bps::from_percent`], and all
//!    comparisons happen on integers.
//!
//! 2. **Newtype wrappers for domain primitives.** [`AgreementId`] and [`Bps`]
//!    are distinct types with validated constructors.
//!
//! 3. **Read-only agreements.** [`Agreement`] mirrors the ledger record; the
//!    workflow never mutates it, it only derives a [`BreachDecision`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `oath-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod agreement;
pub mod bps;
pub mod breach;
pub mod error;
pub mod relay;
pub mod uptime;

pub use agreement::{Agreement, AgreementId};
pub use alloy_primitives::{Address, U256};
pub use bps::{Bps, MAX_BPS};
pub use breach::{evaluate, is_breach, BreachDecision, Evaluation};
pub use error::ValidationError;
pub use relay::{RelayRequest, Role};
pub use uptime::UptimeSample;
