//! External delivery channels for automation alerts.

pub mod email;
pub mod webhook;
