//! Ordered rule repository and first-match dispatch.

use super::core::{Rule, RuleHandle};
use super::response::ResponseDefinition;
use crate::error::{NearMiss, NoMatchingRule, RegistrationError};
use crate::predicate::PredicateSet;
use crate::request::Request;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rules in registration order.
///
/// Registration is copy-on-write: dispatch works on an `Arc` snapshot of
/// the rule list, so a registration racing a dispatch never disturbs the
/// scan in progress. Rules are never removed or reordered.
#[derive(Debug, Default)]
pub struct RuleRepository {
    rules: RwLock<Arc<Vec<Arc<Rule>>>>,
}

impl RuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule after every rule registered so far.
    pub fn register(
        &self,
        predicates: PredicateSet,
        responses: Vec<ResponseDefinition>,
    ) -> Result<RuleHandle, RegistrationError> {
        self.register_with_id(None, predicates, responses)
    }

    /// Like [`RuleRepository::register`], tagging the rule with an id used in diagnostics.
    pub fn register_with_id(
        &self,
        id: Option<String>,
        predicates: PredicateSet,
        responses: Vec<ResponseDefinition>,
    ) -> Result<RuleHandle, RegistrationError> {
        let mut rules = self.rules.write();
        let index = rules.len();
        let rule = Arc::new(Rule::new(index, id, predicates, responses)?);

        info!(
            "Registered rule #{} ({} response(s)): {}",
            index,
            rule.responses().len(),
            rule.predicates().describe()
        );

        Arc::make_mut(&mut *rules).push(Arc::clone(&rule));
        Ok(RuleHandle(rule))
    }

    /// Point-in-time view of the registered rules.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Rule>>> {
        Arc::clone(&self.rules.read())
    }

    /// Response of the first rule, in registration order, whose predicates
    /// all match `request`.
    pub fn dispatch(&self, request: &Request) -> Result<ResponseDefinition, NoMatchingRule> {
        let rules = self.snapshot();

        let Some(rule) = rules.iter().find(|rule| rule.matches(request)) else {
            let error = NoMatchingRule::new(
                request.method(),
                request.path(),
                request.query_string().map(str::to_string),
                explain_rules(&rules, request),
            );
            warn!("{}", error);
            return Err(error);
        };

        let (response_idx, response) = rule.next_response_indexed();
        debug!(
            "Dispatched {} {} to rule #{} (response {} of {})",
            request.method(),
            request.path(),
            rule.index(),
            response_idx + 1,
            rule.responses().len()
        );
        Ok(response.clone())
    }

    /// Mismatch report for every rule that rejects `request`, in registration order.
    pub fn explain(&self, request: &Request) -> Vec<NearMiss> {
        explain_rules(&self.snapshot(), request)
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Handles to every registered rule, in registration order.
    pub fn rules(&self) -> Vec<RuleHandle> {
        self.snapshot()
            .iter()
            .map(|rule| RuleHandle(Arc::clone(rule)))
            .collect()
    }
}

fn explain_rules(rules: &[Arc<Rule>], request: &Request) -> Vec<NearMiss> {
    rules
        .iter()
        .filter(|rule| !rule.matches(request))
        .map(|rule| NearMiss {
            rule_index: rule.index(),
            rule_id: rule.id().map(str::to_string),
            mismatch: rule.describe_mismatch(request),
        })
        .collect()
}
