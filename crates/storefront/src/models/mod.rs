//! Domain models for storefront.
//!
//! Only session-held state lives here; product and cart models come from
//! `medicart_core`.

pub mod session;

pub use session::{Notice, NoticeKind, keys as session_keys};
