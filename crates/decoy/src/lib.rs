//! Programmable HTTP test double.
//!
//! Register stub rules on a [`MockSession`] ("when a request matches these
//! predicates, answer with these responses"), send traffic at it directly or
//! through the embedded [`MockServer`], then verify how many received
//! requests matched a condition.
//!
//! ```no_run
//! use decoy::predicate::{method, path_eq};
//! use decoy::{MockSession, PredicateSet, ResponseDefinition};
//!
//! let session = MockSession::new();
//! session
//!     .register(
//!         PredicateSet::new().with(method("GET")).with(path_eq("/users")),
//!         vec![
//!             ResponseDefinition::ok().with_body("[]"),
//!             ResponseDefinition::new().with_status(503),
//!         ],
//!     )
//!     .unwrap();
//!
//! // ... exercise the code under test ...
//!
//! session
//!     .received_once(&PredicateSet::new().with(path_eq("/users")))
//!     .unwrap();
//! ```
//!
//! Rules are tried in registration order and the first full match wins.
//! Each rule walks through its responses once per dispatch and then keeps
//! returning the last one.

pub mod config;
pub mod error;
pub mod history;
pub mod predicate;
pub mod request;
pub mod rule;
pub mod server;
pub mod session;
pub mod verify;

pub use error::{NearMiss, NoMatchingRule, RegistrationError, ServerError, VerificationError};
pub use history::{RecordedRequest, RequestHistory};
pub use predicate::{CountMatcher, Predicate, PredicateSet};
pub use request::{MultiMap, Request, RequestBuilder};
pub use rule::{ResponseDefinition, Rule, RuleHandle, RuleRepository};
pub use server::{DefaultResponse, MockServer};
pub use session::MockSession;
pub use verify::VerificationEngine;
