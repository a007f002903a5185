//! Interactive placement of a template's four corners over its scene photo.

pub mod session;
