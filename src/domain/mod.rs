//! Domain layer modules
//!
//! - `todo`: Todo items and their storage backends

pub mod todo;
