//! # Build-run request construction.
//!
//! Builds the spec of a build-run request from command-line flags ([`BuildRunArgs`]) and strips
//! optional sub-structures left at their zero value ([`BuildRunSpec::sanitize`]), so an empty
//! structure is omitted from the request instead of being sent as an explicit empty object.

mod buildrun;
mod error;

pub use buildrun::{
    BuildRef, BuildRunArgs, BuildRunSpec, EnvVar, Image, LocalObjectReference, ServiceAccount,
    parse_key_value,
};
pub use error::RequestError;
