//! Routing module
//!
//! Maps request paths to resources. Routes are tried in the order they were
//! added, and every resource is checked when it is registered.

mod matcher;

pub use matcher::{match_path, PathMatch, RouteMatch};

use crate::negotiation::Resource;

/// Routing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No route matches the request path
    #[error("no route matches {path}")]
    NotFound { path: String },
    /// A resource lists a method it has no endpoint for
    #[error("route {route} allows {method} but provides no handler for it")]
    HandlerMissing { route: String, method: String },
}

/// A route pointing at a resource
#[derive(Debug)]
pub struct Route<R> {
    pub match_rule: RouteMatch,
    pub resource: R,
}

/// Result of a successful lookup
#[derive(Debug)]
pub struct Matched<'r, 'p, R> {
    pub resource: &'r R,
    /// Part of the path after the matched prefix or pattern
    pub remainder: &'p str,
    /// Groups captured by a pattern route
    pub captures: Vec<Option<&'p str>>,
}

/// Ordered routing table
#[derive(Debug)]
pub struct Router<R> {
    routes: Vec<Route<R>>,
}

impl<R> Default for Router<R> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<R: Resource> Router<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resource` under `rule`
    ///
    /// Fails when the resource allows a method without providing its
    /// endpoint.
    pub fn add(&mut self, rule: RouteMatch, resource: R) -> Result<(), RouteError> {
        if let Some(method) = resource
            .allowed_methods()
            .iter()
            .find(|m| resource.endpoint(m).is_none())
        {
            return Err(RouteError::HandlerMissing {
                route: rule.describe(),
                method: method.clone(),
            });
        }

        self.routes.push(Route {
            match_rule: rule,
            resource,
        });
        Ok(())
    }

    /// Find the first route matching `path`
    pub fn match_route<'p>(&self, path: &'p str) -> Result<Matched<'_, 'p, R>, RouteError> {
        self.routes
            .iter()
            .find_map(|route| {
                match_path(&route.match_rule, path).map(|m| Matched {
                    resource: &route.resource,
                    remainder: m.remainder,
                    captures: m.captures,
                })
            })
            .ok_or_else(|| RouteError::NotFound {
                path: path.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
