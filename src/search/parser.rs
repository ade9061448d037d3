//! Query parser.
//!
//! Builds a tree of [`SearchNode`]s from a query and one or more index
//! locators. The query is first planned and checked as a whole; only then are
//! the nodes built and every leaf lookup dispatched to its backend.
//!
//! Splitting is top-down in a fixed priority: the first negation splits the
//! query into a difference (everything else minus the negated operand), then
//! implicit AND splits into an intersection, then `or` into a union. Each
//! operand is parsed again with the same rules.

use super::lexer::{Token, render, tokenize};
use super::node::SearchNode;
use super::registry::SearchRegistry;
use super::types::Operation;
use crate::error::{Result, SearchError};
use crate::index::IndexBackend;
use crate::index::catalog::IndexCatalog;

use std::sync::{Arc, Weak};

/// Case-folds and trims a raw query.
pub fn normalize_query(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Splits a locator string on spaces and semicolons, dropping empty pieces.
pub fn split_locators(raw: &str) -> Vec<String> {
    raw.split([' ', ';'])
        .map(str::trim)
        .filter(|locator| !locator.is_empty())
        .map(str::to_string)
        .collect()
}

/// The locator list in the form used inside canonical subjects.
pub fn join_locators(locators: &[String]) -> String {
    locators.join(" ")
}

pub struct QueryParser {
    catalog: Arc<IndexCatalog>,
    registry: Weak<SearchRegistry>,
}

impl QueryParser {
    /// A parser whose nodes are not tied to any registry.
    pub fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self {
            catalog,
            registry: Weak::new(),
        }
    }

    pub(crate) fn with_registry(catalog: Arc<IndexCatalog>, registry: Weak<SearchRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// Normalizes `query` and `index_locators` and parses them.
    pub fn parse(&self, query: &str, index_locators: &str) -> Result<Arc<SearchNode>> {
        self.parse_locators(&normalize_query(query), &split_locators(index_locators))
    }

    /// Parses an already normalized query against a list of locators.
    ///
    /// The whole tree is planned and checked, and every locator resolved,
    /// before any lookup is dispatched: a rejected query never reaches a
    /// backend.
    pub fn parse_locators(&self, query: &str, locators: &[String]) -> Result<Arc<SearchNode>> {
        if query.is_empty() {
            return Err(SearchError::parse("Blank search"));
        }
        if locators.is_empty() {
            return Err(SearchError::parse(
                "Attempt to start search with no index or terms",
            ));
        }

        let backends = locators
            .iter()
            .map(|locator| self.catalog.resolve(locator))
            .collect::<Result<Vec<_>>>()?;
        let tokens = tokenize(query)?;
        tracing::debug!("Parsing '{}' as {:?}", query, tokens);
        let plan = plan(query, &tokens)?;

        match (locators, backends.as_slice()) {
            ([locator], [backend]) => self.dispatch(&plan, locator, backend.as_ref()),
            _ => {
                let children = locators
                    .iter()
                    .zip(&backends)
                    .map(|(locator, backend)| self.dispatch(&plan, locator, backend.as_ref()))
                    .collect::<Result<Vec<_>>>()?;
                SearchNode::composite(
                    query,
                    &join_locators(locators),
                    Operation::MultiIndexMerge,
                    children,
                    self.registry.clone(),
                )
            }
        }
    }

    /// Builds the nodes of a checked plan, sending every leaf lookup to `backend`.
    fn dispatch(
        &self,
        plan: &Plan,
        locator: &str,
        backend: &dyn IndexBackend,
    ) -> Result<Arc<SearchNode>> {
        match plan {
            Plan::Term(word) => {
                let request = backend.term_entries(word);
                Ok(SearchNode::leaf(word, locator, request, self.registry.clone()))
            }
            Plan::Composite {
                query,
                operation,
                children,
            } => {
                let children = children
                    .iter()
                    .map(|child| self.dispatch(child, locator, backend))
                    .collect::<Result<Vec<_>>>()?;
                SearchNode::composite(query, locator, *operation, children, self.registry.clone())
            }
        }
    }
}

/// Shape of a parsed query, checked but not yet bound to any index.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan {
    Term(String),
    Composite {
        query: String,
        operation: Operation,
        children: Vec<Plan>,
    },
}

impl Plan {
    fn composite(query: &str, operation: Operation, children: Vec<Plan>) -> Result<Self> {
        operation
            .check_arity(children.len())
            .map_err(SearchError::Parse)?;
        Ok(Plan::Composite {
            query: query.to_string(),
            operation,
            children,
        })
    }
}

/// Parses a sub-query, named after its own tokens.
fn plan_part(tokens: &[Token]) -> Result<Plan> {
    plan(&render(tokens), tokens)
}

fn plan(query: &str, tokens: &[Token]) -> Result<Plan> {
    match tokens {
        [] => return Err(SearchError::parse("empty sub-query")),
        [Token::Term(word)] => return Ok(Plan::Term(word.clone())),
        [Token::Phrase(words)] => {
            let children = words.iter().cloned().map(Plan::Term).collect();
            return Plan::composite(query, Operation::Phrase, children);
        }
        _ => {}
    }

    if let Some(idx) = tokens.iter().position(|token| *token == Token::Not) {
        let negated = tokens
            .get(idx + 1)
            .filter(|token| token.is_operand())
            .ok_or_else(|| SearchError::parse(format!("nothing to negate in '{}'", query)))?;
        let mut remainder = tokens[..idx].to_vec();
        remainder.extend_from_slice(&tokens[idx + 2..]);

        tracing::debug!("Complement split of '{}'", query);
        let children = vec![
            plan_part(&remainder)?,
            plan_part(std::slice::from_ref(negated))?,
        ];
        return Plan::composite(query, Operation::Difference, children);
    }

    for (connective, operation) in [
        (Token::And, Operation::Intersection),
        (Token::Or, Operation::Union),
    ] {
        if tokens.contains(&connective) {
            tracing::debug!("{} split of '{}'", operation, query);
            let children = tokens
                .split(|token| *token == connective)
                .map(plan_part)
                .collect::<Result<Vec<_>>>()?;
            return Plan::composite(query, operation, children);
        }
    }

    tracing::error!("No split made for '{}'", query);
    Err(SearchError::parse(format!("cannot split query '{}'", query)))
}
