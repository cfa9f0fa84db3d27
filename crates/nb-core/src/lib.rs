//! New Books Notification Core Library
//!
//! This crate provides the in-memory pieces of the new-books batch job: the
//! book record model, the C-code classification decoder and the notification
//! filter engine. Nothing here performs network I/O.
//!
//! # Architecture
//!
//! A [`NotificationFilter`] is built once at startup (see the `nb-compiler`
//! crate) and is immutable afterwards. It holds an AND-sequence of
//! [`ConditionBlock`]s, each an OR-group of [`Condition`]s. Conditions read
//! record fields by name through the table in [`record`], so a rules file can
//! target any field without the engine knowing which ones are in use.
//!
//! # Modules
//!
//! - `record`: Book record, book list and the field-name table
//! - `ccode`: C-code decoder (audience / format / content tables)
//! - `filter`: Conditions, condition blocks and the notification filter
//! - `types`: Shared small types (condition kinds, decoded subjects)

pub mod ccode;
pub mod filter;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use ccode::{CcodeDecoder, CcodeError};
pub use filter::{Condition, ConditionBlock, NotificationFilter};
pub use record::{
    canonical_field_name, field_value, jst, record_fields, Book, BookDetail, BookList,
};
pub use types::{ConditionKind, Subject};
