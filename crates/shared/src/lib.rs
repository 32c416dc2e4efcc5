//! Wire types shared between the CRM API client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
