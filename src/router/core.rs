//! Router core - route table composition, compilation and the match hot path.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use http::Method;
use regex::NoExpand;
use serde::Serialize;
use tracing::{debug, error, trace, warn};
use url::form_urlencoded;

use crate::error::RouterError;
use crate::pattern::{self, ParamVec, UriPatternBinding};
use crate::route::{
    add_start, normalize_base_path, RequestMethod, Route, RouteGroup, RESOURCE_PATH_PARAMETER,
};

/// Post-compilation hook applied to every compiled route.
///
/// A transformer may replace the route wholesale, mutate its binding fields
/// (name, handler, attributes), or veto it: returning `None` drops the route
/// from the live table and stops the chain for that route. Transformers run
/// in registration order.
pub trait RouteTransformer: Send + Sync {
    fn transform(&self, route: CompiledRoute) -> Option<CompiledRoute>;
}

impl<F> RouteTransformer for F
where
    F: Fn(CompiledRoute) -> Option<CompiledRoute> + Send + Sync,
{
    fn transform(&self, route: CompiledRoute) -> Option<CompiledRoute> {
        self(route)
    }
}

/// A route plus its compiled pattern binding.
///
/// Created during [`Router::compile`]; immutable afterwards. The matching
/// fields (method, uri pattern, regex) are fixed at compilation - only the
/// binding fields (name, handler, attributes) are open to transformers.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    route: Route,
    binding: UriPatternBinding,
}

impl CompiledRoute {
    pub(crate) fn new(route: Route) -> Result<Self, RouterError> {
        let binding = UriPatternBinding::compile(route.uri_pattern())?;
        Ok(Self { route, binding })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    #[inline]
    pub fn method(&self) -> &RequestMethod {
        self.route.method()
    }

    #[inline]
    pub fn uri_pattern(&self) -> &str {
        self.route.uri_pattern()
    }

    pub fn name(&self) -> Option<&str> {
        self.route.name()
    }

    pub fn handler(&self) -> &str {
        self.route.handler()
    }

    /// The emitted regex, without the whole-path anchors.
    pub fn regex(&self) -> &str {
        self.binding.regex()
    }

    /// Path-parameter names in capturing-group order.
    pub fn parameter_names(&self) -> &[Arc<str>] {
        self.binding.parameter_names()
    }

    /// Rename the route (transformer hook).
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.route.set_name(Some(name.into()));
    }

    /// Rebind the route to another handler (transformer hook).
    pub fn set_handler(&mut self, handler: impl Into<Arc<str>>) {
        self.route.set_handler(handler.into());
    }

    /// Attach an attribute (transformer hook).
    pub fn bind(&mut self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => self.route.insert_attribute(key, value),
            Err(err) => {
                warn!(key = %key, error = %err, "Cannot serialize route attribute, skipping");
            }
        }
    }

    pub(crate) fn binding(&self) -> &UriPatternBinding {
        &self.binding
    }
}

/// One successful pairing of a compiled route against a concrete request path.
///
/// Ephemeral: one per dispatch attempt. Parameter values are raw substrings of
/// the request path; percent-decoding is the request layer's responsibility.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched compiled route (shared, not cloned per request).
    pub route: Arc<CompiledRoute>,
    /// Path parameters in template order, stack-allocated for small routes.
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    ///
    /// Last write wins when a name repeats at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path parameters to a `HashMap`.
    /// This allocates - prefer `get_path_param` on hot paths.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub fn handler(&self) -> &str {
        self.route.handler()
    }
}

/// An immutable compiled routing table.
///
/// Produced by [`Router::compile`] and handed out as a read-only snapshot;
/// safe for unsynchronized concurrent reads. Matching walks the master list
/// in registration order - never per-method sublists - so routes registered
/// for different methods keep their relative order.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Arc<CompiledRoute>>,
    method_index: HashMap<RequestMethod, Vec<usize>>,
    ignored_paths: BTreeSet<String>,
    application_path: String,
}

impl RouteTable {
    pub(crate) fn empty() -> Self {
        Self {
            routes: Vec::new(),
            method_index: HashMap::new(),
            ignored_paths: BTreeSet::new(),
            application_path: String::new(),
        }
    }

    /// All compiled routes, in registration order.
    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    /// Compiled routes registered for exactly this method (`ANY` routes are
    /// listed under `ANY`, not under every verb).
    pub fn routes_for(&self, method: &RequestMethod) -> Vec<Arc<CompiledRoute>> {
        self.method_index
            .get(method)
            .map(|indices| indices.iter().map(|&i| Arc::clone(&self.routes[i])).collect())
            .unwrap_or_default()
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    pub fn ignored_paths(&self) -> &BTreeSet<String> {
        &self.ignored_paths
    }

    /// Whether `path` falls under an ignored prefix.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Return every route matching `(method, path)`, in registration order.
    ///
    /// A route is a candidate when it was registered for exactly this verb or
    /// for `ANY`. All candidates are tested - no short-circuit on the first
    /// match; the chain is consumed by the external dispatcher. An empty
    /// result is the normal "not found" signal, not an error.
    #[must_use]
    pub fn find_routes(&self, method: &Method, path: &str) -> Vec<RouteMatch> {
        trace!(method = %method, path = %path, "Finding route matches");

        if self.is_ignored(path) {
            debug!(method = %method, path = %path, "Path is ignored, skipping matching");
            return Vec::new();
        }

        let mut matches = Vec::new();
        for route in &self.routes {
            if !route.method().applies_to(method) {
                continue;
            }
            if let Some(path_params) = route.binding().extract(path) {
                matches.push(RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                });
            }
        }

        debug!(
            method = %method,
            path = %path,
            count = matches.len(),
            "Found route matches"
        );

        matches
    }

    /// Reconstitute a concrete uri from a route name or raw uri pattern.
    ///
    /// The input is resolved against route names first, then against raw
    /// patterns. Parameters matching a placeholder are substituted in place;
    /// the rest are appended as an urlencoded query string, in caller order.
    /// Returns `None` when the input resolves to no compiled route or when a
    /// declared path parameter has no value - a generated uri never contains
    /// literal `{placeholder}` text.
    #[must_use]
    pub fn uri_for(&self, name_or_uri_pattern: &str, parameters: &[(&str, &str)]) -> Option<String> {
        let route = self.compiled_route(name_or_uri_pattern)?;
        let uri = self.render_uri(route, parameters)?;

        Some(self.prefix_application_path(&uri))
    }

    /// Prefix a relative path with the application path.
    #[must_use]
    pub fn uri_for_relative(&self, relative_path: &str) -> String {
        self.prefix_application_path(relative_path)
    }

    fn prefix_application_path(&self, path: &str) -> String {
        format!("{}{}", self.application_path, add_start(path, "/"))
    }

    /// Name lookup takes priority over raw-pattern lookup.
    fn compiled_route(&self, name_or_uri_pattern: &str) -> Option<&Arc<CompiledRoute>> {
        let found = self
            .routes
            .iter()
            .find(|route| route.name() == Some(name_or_uri_pattern))
            .or_else(|| {
                self.routes
                    .iter()
                    .find(|route| route.uri_pattern() == name_or_uri_pattern)
            });

        if found.is_none() {
            warn!(
                name_or_uri_pattern = %name_or_uri_pattern,
                "No compiled route for uri generation"
            );
        }

        found
    }

    fn render_uri(&self, route: &CompiledRoute, parameters: &[(&str, &str)]) -> Option<String> {
        let missing: Vec<&str> = route
            .parameter_names()
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !parameters.iter().any(|(key, _)| key == name))
            .collect();
        if !missing.is_empty() {
            error!(
                uri_pattern = %route.uri_pattern(),
                missing = ?missing,
                "Values must be provided for all path parameters"
            );
            return None;
        }

        let mut uri = route.uri_pattern().to_string();
        let mut query: Vec<(&str, &str)> = Vec::new();

        for &(key, value) in parameters {
            let placeholder = pattern::key_placeholder(key);
            if placeholder.is_match(&uri) {
                let value = path_parameter_value(route, key, value);
                uri = placeholder.replace_all(&uri, NoExpand(&value)).into_owned();
            } else {
                query.push((key, value));
            }
        }

        if !query.is_empty() {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in query {
                serializer.append_pair(key, value);
            }
            uri.push('?');
            uri.push_str(&serializer.finish());
        }

        Some(uri)
    }
}

/// Versioned resource routes rewrite the reserved path parameter before
/// substitution (cache-busting fragment).
fn path_parameter_value(route: &CompiledRoute, key: &str, value: &str) -> String {
    if key == RESOURCE_PATH_PARAMETER {
        if let Some(versioner) = route.route().versioner() {
            return versioner.inject_version(value);
        }
    }

    value.to_string()
}

/// The route table builder and facade.
///
/// Lifecycle is two-phase: a single-threaded composition phase (`add_route`,
/// `add_route_group`, `add_route_transformer`, `ignore_paths`, ...) followed
/// by one explicit [`compile`](Router::compile) that publishes an immutable
/// [`RouteTable`] snapshot. Reads (`find_routes`, `uri_for`) go against the
/// snapshot and are safe for unsynchronized concurrent access; recompiling
/// swaps in a fresh snapshot copy-on-write, so in-flight matches against the
/// previous one complete safely.
///
/// Routes are matched in the order they are defined.
pub struct Router {
    routes: Vec<Route>,
    transformers: Vec<Box<dyn RouteTransformer>>,
    ignored_paths: BTreeSet<String>,
    context_path: String,
    application_path: String,
    table: Arc<RouteTable>,
    dirty: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            transformers: Vec::new(),
            ignored_paths: BTreeSet::new(),
            context_path: String::new(),
            application_path: String::new(),
            table: Arc::new(RouteTable::empty()),
            dirty: false,
        }
    }

    /// Register a route.
    ///
    /// Fails with [`RouterError::EmptyUriPattern`] when the pattern is empty.
    /// (An empty or unknown method token is rejected earlier, when the
    /// [`RequestMethod`] is parsed.) Compilation is deferred to `compile()`.
    pub fn add_route(&mut self, route: Route) -> Result<(), RouterError> {
        if route.uri_pattern().is_empty() {
            return Err(RouterError::EmptyUriPattern);
        }

        debug!(method = %route.method(), uri_pattern = %route.uri_pattern(), "Add route");
        self.routes.push(route);
        self.dirty = true;

        Ok(())
    }

    /// Remove a route by `(method, uri pattern)` identity. No-op if absent.
    pub fn remove_route(&mut self, route: &Route) {
        let before = self.routes.len();
        self.routes.retain(|registered| registered != route);
        if self.routes.len() != before {
            debug!(method = %route.method(), uri_pattern = %route.uri_pattern(), "Removed route");
            self.dirty = true;
        }
    }

    /// Flatten a route group tree and register every resulting route.
    pub fn add_route_group(&mut self, group: &RouteGroup) -> Result<(), RouterError> {
        for route in group.flatten() {
            self.add_route(route)?;
        }

        Ok(())
    }

    /// Flatten a route group tree and remove every resulting route.
    pub fn remove_route_group(&mut self, group: &RouteGroup) {
        for route in group.flatten() {
            self.remove_route(&route);
        }
    }

    /// Register a transformer, run against every compiled route in order.
    pub fn add_route_transformer(&mut self, transformer: impl RouteTransformer + 'static) {
        self.transformers.push(Box::new(transformer));
        self.dirty = true;
    }

    /// Register literal path prefixes that short-circuit matching entirely.
    ///
    /// A request under an ignored prefix yields an empty match list before
    /// the table is consulted (the caller maps this to 404).
    pub fn ignore_paths(&mut self, path_prefixes: &[&str]) {
        for prefix in path_prefixes {
            self.ignored_paths.insert(add_start(prefix, "/"));
        }
        self.dirty = true;
    }

    pub fn ignored_paths(&self) -> &BTreeSet<String> {
        &self.ignored_paths
    }

    /// Set the application path prepended by uri generation.
    /// `""` and `"/"` normalize to empty.
    pub fn set_application_path(&mut self, application_path: &str) {
        self.application_path = normalize_base_path(application_path);
        self.dirty = true;
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    /// Set the servlet-style context path. Same normalization as the
    /// application path; kept for callers that qualify uris themselves.
    pub fn set_context_path(&mut self, context_path: &str) {
        self.context_path = normalize_base_path(context_path);
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// All registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Registered routes for exactly this method.
    pub fn routes_for(&self, method: &RequestMethod) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|route| route.method() == method)
            .collect()
    }

    /// Compile every registered route and publish a fresh immutable table.
    ///
    /// Transformers run per route in registration order; the first returning
    /// `None` drops that route. On a pattern error nothing is published and
    /// the previous snapshot stays live.
    pub fn compile(&mut self) -> Result<(), RouterError> {
        debug!(routes = self.routes.len(), "Compile routes");

        let mut compiled: Vec<Arc<CompiledRoute>> = Vec::with_capacity(self.routes.len());
        let mut method_index: HashMap<RequestMethod, Vec<usize>> = HashMap::new();

        'routes: for route in &self.routes {
            let mut compiled_route = CompiledRoute::new(route.clone())?;

            for transformer in &self.transformers {
                match transformer.transform(compiled_route) {
                    Some(transformed) => compiled_route = transformed,
                    None => {
                        debug!(
                            method = %route.method(),
                            uri_pattern = %route.uri_pattern(),
                            "Route vetoed by transformer"
                        );
                        continue 'routes;
                    }
                }
            }

            method_index
                .entry(compiled_route.method().clone())
                .or_default()
                .push(compiled.len());
            compiled.push(Arc::new(compiled_route));
        }

        self.table = Arc::new(RouteTable {
            routes: compiled,
            method_index,
            ignored_paths: self.ignored_paths.clone(),
            application_path: self.application_path.clone(),
        });
        self.dirty = false;

        Ok(())
    }

    /// The current compiled snapshot, shareable across threads.
    #[must_use]
    pub fn table(&self) -> Arc<RouteTable> {
        Arc::clone(&self.table)
    }

    /// See [`RouteTable::find_routes`]. Serves the last compiled snapshot;
    /// warns when mutations are pending.
    #[must_use]
    pub fn find_routes(&self, method: &Method, path: &str) -> Vec<RouteMatch> {
        self.warn_if_dirty();
        self.table.find_routes(method, path)
    }

    /// See [`RouteTable::uri_for`].
    #[must_use]
    pub fn uri_for(&self, name_or_uri_pattern: &str, parameters: &[(&str, &str)]) -> Option<String> {
        self.warn_if_dirty();
        self.table.uri_for(name_or_uri_pattern, parameters)
    }

    /// See [`RouteTable::uri_for_relative`]. Serves the last compiled
    /// snapshot, so a pending `set_application_path` is invisible until the
    /// next `compile()`.
    #[must_use]
    pub fn uri_for_relative(&self, relative_path: &str) -> String {
        self.warn_if_dirty();
        self.table.uri_for_relative(relative_path)
    }

    /// Print all registered routes to stdout. Debugging aid.
    pub fn dump_routes(&self) {
        println!(
            "[routes] application_path={} count={}",
            self.application_path,
            self.table.routes.len()
        );
        for route in &self.table.routes {
            println!(
                "[route] {} {} -> {}",
                route.method(),
                route.uri_pattern(),
                route.handler()
            );
        }
    }

    fn warn_if_dirty(&self) {
        if self.dirty {
            warn!("Routing table has uncompiled changes; call compile()");
        }
    }
}
