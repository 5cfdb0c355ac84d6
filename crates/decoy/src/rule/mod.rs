//! Stub rules, response sequencing and the rule repository.

mod core;
mod cursor;
mod repository;
mod response;

pub use self::core::{Rule, RuleHandle};
pub use cursor::ResponseCursor;
pub use repository::RuleRepository;
pub use response::{ResponseDefinition, DEFAULT_STATUS};
