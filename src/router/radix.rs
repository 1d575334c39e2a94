//! Segment-wise radix tree for route matching.
//!
//! Paths are split on `/` into segments and stored in a tree where:
//! - static segments (`users`) match exactly
//! - named segments (`:id`) match any single segment
//! - catch-all segments (`*path`) match the rest of the path and must be last
//!
//! Lookup prefers static over named over catch-all at every level and
//! backtracks when a branch dead-ends, so `/users/me` and `/users/:id` can
//! coexist.

use super::core::Route;
use super::error::RouterError;
use crate::server::ParamVec;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct RadixNode {
    segment: String,
    /// Terminal routes keyed by method.
    routes: HashMap<Method, Arc<Route>>,
    /// Set on named and catch-all nodes.
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode>,
    /// Several names may share a position (`/u/:id/posts`, `/u/:uid/likes`).
    param_children: Vec<RadixNode>,
    catch_all: Option<Box<RadixNode>>,
}

impl RadixNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn new_param(name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(name)),
            ..Self::default()
        }
    }

    fn insert(
        &mut self,
        segments: &[&str],
        method: Method,
        route: Arc<Route>,
    ) -> Result<(), RouterError> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if self.routes.contains_key(&method) {
                return Err(RouterError::Conflict {
                    method,
                    path: route.pattern.clone(),
                });
            }
            self.routes.insert(method, route);
            return Ok(());
        };

        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid(&route, "named segment without a name"));
            }
            // a sibling with another name that already serves the same shape
            // would always win the lookup
            if self
                .param_children
                .iter()
                .filter(|c| c.param_name.as_deref() != Some(name))
                .any(|c| c.serves(remaining, &method))
            {
                return Err(RouterError::Conflict {
                    method,
                    path: route.pattern.clone(),
                });
            }
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(name))
            {
                return child.insert(remaining, method, route);
            }
            let mut child = RadixNode::new_param(name);
            child.insert(remaining, method, route)?;
            self.param_children.push(child);
            return Ok(());
        }

        if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() {
                return Err(invalid(&route, "catch-all segment without a name"));
            }
            if !remaining.is_empty() {
                return Err(invalid(&route, "catch-all segment must be last"));
            }
            let node = self
                .catch_all
                .get_or_insert_with(|| Box::new(RadixNode::new_param(name)));
            if node.param_name.as_deref() != Some(name) {
                return Err(invalid(&route, "catch-all name differs from an existing route"));
            }
            return node.insert(remaining, method, route);
        }

        if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
            return child.insert(remaining, method, route);
        }
        let mut child = RadixNode::new(segment);
        child.insert(remaining, method, route)?;
        self.children.push(child);
        Ok(())
    }

    /// Whether a route for `method` is stored under a template of the same
    /// shape as `segments`, ignoring parameter names.
    fn serves(&self, segments: &[&str], method: &Method) -> bool {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.contains_key(method);
        };
        if segment.starts_with(':') {
            self.param_children.iter().any(|c| c.serves(remaining, method))
        } else if segment.starts_with('*') {
            self.catch_all
                .as_ref()
                .is_some_and(|c| c.serves(remaining, method))
        } else {
            self.children
                .iter()
                .find(|c| c.segment == segment)
                .is_some_and(|c| c.serves(remaining, method))
        }
    }

    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<Arc<Route>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if let Some(route) = self.routes.get(method) {
                return Some(Arc::clone(route));
            }
            // a catch-all also matches an empty remainder
            return self.search_catch_all(segments, method, params);
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                params.push((name.to_string(), segment.to_string()));
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
                // backtrack
                params.pop();
            }
        }

        self.search_catch_all(segments, method, params)
    }

    fn search_catch_all(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Option<Arc<Route>> {
        let node = self.catch_all.as_deref()?;
        let route = node.routes.get(method)?;
        let name = node.param_name.as_deref().unwrap_or_default();
        params.push((name.to_string(), segments.join("/")));
        Some(Arc::clone(route))
    }
}

fn invalid(route: &Route, reason: &'static str) -> RouterError {
    RouterError::InvalidPath {
        path: route.pattern.clone(),
        reason,
    }
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Radix tree over path segments.
#[derive(Default)]
pub(crate) struct RadixTree {
    root: RadixNode,
}

impl RadixTree {
    pub(crate) fn insert(&mut self, method: Method, route: Arc<Route>) -> Result<(), RouterError> {
        let pattern = route.pattern.clone();
        self.root.insert(&split_path(&pattern), method, route)
    }

    pub(crate) fn search(&self, method: &Method, path: &str) -> Option<(Arc<Route>, ParamVec)> {
        let mut params = ParamVec::new();
        let route = self.root.search(&split_path(path), method, &mut params)?;
        Some((route, params))
    }
}
