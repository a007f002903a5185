//! Batch composition: request fingerprints, the result cache, image sources and the
//! parallel orchestrator.

pub mod cache;
pub mod orchestrator;
pub mod request;
pub mod source;
