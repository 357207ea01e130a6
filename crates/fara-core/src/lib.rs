//! # fara-core — Foundational Types for the Execution Governor
//!
//! Every other crate in the workspace depends on `fara-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** ALL digest/pattern-matching computation
//!    over params/context flows through `CanonicalBytes::new()`. No raw
//!    `serde_json::to_vec()`. This prevents policy matching or audit
//!    hash-chaining from drifting between two slightly different
//!    serializations of the same logical value.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that all digest paths flow through canonicalization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fara-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod model;
pub mod temporal;
pub mod transition;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, GovernorError};
pub use model::{Action, ActionEvent, Decision, RiskLevel, Status};
pub use temporal::Timestamp;
pub use transition::validate_transition;
