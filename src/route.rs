//! Route definitions: the request method wildcard, the immutable route value,
//! and route groups used to register routes under a shared path prefix.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::RouterError;

/// Reserved path-parameter name used by resource routes.
///
/// When a route carries a [`PathVersioner`] and `uri_for` is asked to
/// substitute this parameter, the value is rewritten by the versioner before
/// substitution (cache-busting for versioned static resources).
pub const RESOURCE_PATH_PARAMETER: &str = "path";

/// The method component of a route binding.
///
/// A route is registered either for a concrete HTTP verb or for the `ANY`
/// wildcard, which matches every request method at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    /// A concrete HTTP verb.
    Verb(Method),
    /// The wildcard; applies to every request method.
    Any,
}

impl RequestMethod {
    pub const GET: RequestMethod = RequestMethod::Verb(Method::GET);
    pub const POST: RequestMethod = RequestMethod::Verb(Method::POST);
    pub const PUT: RequestMethod = RequestMethod::Verb(Method::PUT);
    pub const PATCH: RequestMethod = RequestMethod::Verb(Method::PATCH);
    pub const DELETE: RequestMethod = RequestMethod::Verb(Method::DELETE);
    pub const HEAD: RequestMethod = RequestMethod::Verb(Method::HEAD);
    pub const OPTIONS: RequestMethod = RequestMethod::Verb(Method::OPTIONS);
    pub const ANY: RequestMethod = RequestMethod::Any;

    /// Whether a request issued with `verb` is dispatched to this method.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, verb: &Method) -> bool {
        match self {
            RequestMethod::Any => true,
            RequestMethod::Verb(m) => m == verb,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Verb(m) => write!(f, "{}", m),
            RequestMethod::Any => write!(f, "ANY"),
        }
    }
}

impl From<Method> for RequestMethod {
    fn from(method: Method) -> Self {
        RequestMethod::Verb(method)
    }
}

impl FromStr for RequestMethod {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(RouterError::UnspecifiedMethod);
        }

        match token.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::GET),
            "POST" => Ok(RequestMethod::POST),
            "PUT" => Ok(RequestMethod::PUT),
            "PATCH" => Ok(RequestMethod::PATCH),
            "DELETE" => Ok(RequestMethod::DELETE),
            "HEAD" => Ok(RequestMethod::HEAD),
            "OPTIONS" => Ok(RequestMethod::OPTIONS),
            "ANY" | "*" => Ok(RequestMethod::ANY),
            _ => Err(RouterError::UnknownMethod {
                token: token.to_string(),
            }),
        }
    }
}

/// Rewrites a resource path to carry a version fragment.
///
/// Implemented by applications serving fingerprinted static resources; the
/// router only consults it from `uri_for` for the [`RESOURCE_PATH_PARAMETER`]
/// key of a route built with [`Route::versioned`].
pub trait PathVersioner: Send + Sync {
    /// Return `path` with the version fragment injected.
    fn inject_version(&self, path: &str) -> String;
}

/// One (method, uri pattern) binding to an opaque handler.
///
/// The handler is an identifier the router never interprets or invokes; it is
/// carried through matching so the external dispatcher knows what to call.
/// Route identity is the `(method, uri_pattern)` pair: two routes with the
/// same method and pattern are equal regardless of handler, name or
/// attributes.
#[derive(Clone)]
pub struct Route {
    method: RequestMethod,
    uri_pattern: String,
    handler: Arc<str>,
    name: Option<String>,
    run_as_finally: bool,
    attributes: HashMap<String, Value>,
    versioner: Option<Arc<dyn PathVersioner>>,
}

impl Route {
    /// Create a route for the given method, uri pattern and handler.
    pub fn new(
        method: RequestMethod,
        uri_pattern: impl Into<String>,
        handler: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            method,
            uri_pattern: uri_pattern.into(),
            handler: handler.into(),
            name: None,
            run_as_finally: false,
            attributes: HashMap::new(),
            versioner: None,
        }
    }

    pub fn get(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::GET, uri_pattern, handler)
    }

    pub fn post(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::POST, uri_pattern, handler)
    }

    pub fn put(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::PUT, uri_pattern, handler)
    }

    pub fn patch(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::PATCH, uri_pattern, handler)
    }

    pub fn delete(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::DELETE, uri_pattern, handler)
    }

    pub fn head(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::HEAD, uri_pattern, handler)
    }

    /// Create a route matched regardless of the request method.
    pub fn any(uri_pattern: impl Into<String>, handler: impl Into<Arc<str>>) -> Self {
        Self::new(RequestMethod::ANY, uri_pattern, handler)
    }

    /// Name this route for reverse lookup via `uri_for`.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark this route to run even when an earlier route in the chain failed.
    #[must_use]
    pub fn run_as_finally(mut self) -> Self {
        self.run_as_finally = true;
        self
    }

    /// Attach an attribute to this route.
    ///
    /// Attributes are an opaque bag for the application and for route
    /// transformers; the router never reads them.
    #[must_use]
    pub fn bind(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.attributes.insert(key, value);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Cannot serialize route attribute, skipping");
            }
        }
        self
    }

    /// Attach a [`PathVersioner`] for versioned resource serving.
    #[must_use]
    pub fn versioned(mut self, versioner: Arc<dyn PathVersioner>) -> Self {
        self.versioner = Some(versioner);
        self
    }

    #[inline]
    pub fn method(&self) -> &RequestMethod {
        &self.method
    }

    #[inline]
    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    #[inline]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_run_as_finally(&self) -> bool {
        self.run_as_finally
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn versioner(&self) -> Option<&Arc<dyn PathVersioner>> {
        self.versioner.as_ref()
    }

    pub(crate) fn set_uri_pattern(&mut self, uri_pattern: String) {
        self.uri_pattern = uri_pattern;
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(crate) fn set_handler(&mut self, handler: Arc<str>) {
        self.handler = handler;
    }

    pub(crate) fn set_attributes(&mut self, attributes: HashMap<String, Value>) {
        self.attributes = attributes;
    }

    pub(crate) fn insert_attribute(&mut self, key: String, value: Value) {
        self.attributes.insert(key, value);
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("uri_pattern", &self.uri_pattern)
            .field("handler", &self.handler)
            .field("name", &self.name)
            .field("run_as_finally", &self.run_as_finally)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.uri_pattern == other.uri_pattern
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.uri_pattern.hash(state);
    }
}

/// A uri-pattern prefix shared by a set of routes and nested groups.
///
/// Groups exist purely to avoid repeating prefixes; they flatten into plain
/// routes at registration and have no runtime identity afterwards. Group names
/// concatenate outermost-first onto the route name, and group attributes merge
/// into the route's bag with inner entries overriding outer ones.
#[derive(Debug, Clone, Default)]
pub struct RouteGroup {
    uri_pattern: String,
    routes: Vec<Route>,
    children: Vec<RouteGroup>,
    name: Option<String>,
    attributes: HashMap<String, Value>,
}

impl RouteGroup {
    pub fn new(uri_pattern: impl Into<String>) -> Self {
        Self {
            uri_pattern: uri_pattern.into(),
            ..Default::default()
        }
    }

    /// Add a route under this group's prefix.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Nest a child group under this group's prefix.
    #[must_use]
    pub fn group(mut self, child: RouteGroup) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn bind(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.attributes.insert(key, value);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Cannot serialize group attribute, skipping");
            }
        }
        self
    }

    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn children(&self) -> &[RouteGroup] {
        &self.children
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Flatten this group tree into plain routes with absolute uri patterns.
    ///
    /// Routes of a group come before routes of its children, in insertion
    /// order, so registration order is deterministic.
    pub fn flatten(&self) -> Vec<Route> {
        let mut routes = Vec::new();
        self.flatten_into("", "", &HashMap::new(), &mut routes);
        routes
    }

    fn flatten_into(
        &self,
        prefix: &str,
        name_prefix: &str,
        inherited: &HashMap<String, Value>,
        out: &mut Vec<Route>,
    ) {
        let prefix = concat_uri_pattern(prefix, &self.uri_pattern);
        let name_prefix = match &self.name {
            Some(name) => format!("{}{}", name_prefix, name),
            None => name_prefix.to_string(),
        };
        let mut attributes = inherited.clone();
        attributes.extend(self.attributes.clone());

        for route in &self.routes {
            let mut route = route.clone();
            route.set_uri_pattern(concat_uri_pattern(&prefix, route.uri_pattern()));

            let name = format!("{}{}", name_prefix, route.name().unwrap_or(""));
            if !name.is_empty() {
                route.set_name(Some(name));
            }

            let mut merged = attributes.clone();
            merged.extend(route.attributes().clone());
            route.set_attributes(merged);

            out.push(route);
        }

        for child in &self.children {
            child.flatten_into(&prefix, &name_prefix, &attributes, out);
        }
    }
}

/// Join a group prefix and a uri pattern with exactly one `/` between the
/// segments and no trailing slash (the bare `/` is kept as-is).
pub(crate) fn concat_uri_pattern(prefix: &str, uri_pattern: &str) -> String {
    let joined = add_start(&add_start(uri_pattern, "/"), prefix);
    if joined == "/" {
        joined
    } else {
        remove_end(&joined, "/").to_string()
    }
}

/// Normalize a context/application path: `""` and `"/"` become empty,
/// anything else gets a leading `/` and loses any trailing `/`.
pub(crate) fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        String::new()
    } else {
        remove_end(&add_start(trimmed, "/"), "/").to_string()
    }
}

pub(crate) fn add_start(s: &str, start: &str) -> String {
    if s.starts_with(start) {
        s.to_string()
    } else {
        format!("{}{}", start, s)
    }
}

fn remove_end<'a>(s: &'a str, end: &str) -> &'a str {
    s.strip_suffix(end).unwrap_or(s)
}
