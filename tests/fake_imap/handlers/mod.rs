//! IMAP command handlers for the fake server.
//!
//! Covers what the client sends after STARTTLS: LOGIN and LOGOUT
//! (`lifecycle`), SELECT and FETCH.

mod lifecycle;

pub use fetch::handle_fetch;
pub use lifecycle::{handle_login, handle_logout};
pub use select::handle_select;
