//! # oath-cli: Local Host for OathLayer
//!
//! Provides the `oath` binary: a single-process host for the enforcement
//! workflow.
//!
//! ## Subcommands
//!
//! - `oath run`: serve all four bindings until Ctrl-C.
//! - `oath scan`: one proactive scan; prints the summary as JSON.
//! - `oath relay --role <role> --tx-hash <hash>`: relay the registrations
//!   emitted by one origin-chain transaction. Exits 2 if it emitted none.
//! - `oath triggers`: print the bindings the workflow registers.
//! - `oath validate`: check the settings file and exit.
//!
//! ```bash
//! UPTIME_API_KEY=... oath --config config/oath.example.yaml scan
//! ```

pub mod commands;
pub mod dispatch;
pub mod host;
pub mod settings;
