//! Templates, packs and their persisted forms.

pub mod config_format;
pub mod pack;
#[allow(clippy::module_inception)]
pub mod store;
pub mod template;
