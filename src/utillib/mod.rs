//! Various utilities

pub mod home;
pub mod logging;
