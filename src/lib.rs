//! # Wayfarer
//!
//! **Wayfarer** is a path-template request router: it compiles uri templates
//! like `/user/{id: [0-9]+}` into anchored regular expressions, matches
//! incoming `(method, path)` pairs against a prioritized route table, extracts
//! named path parameters, and generates concrete uris back from route names.
//!
//! ## Overview
//!
//! The crate is deliberately free of HTTP I/O: route handlers are opaque
//! identifiers the router never invokes, and the match result feeds an
//! external dispatch loop. The modules:
//!
//! - **[`route`]** - route values, request-method wildcard, route groups
//! - **[`pattern`]** - uri template to regex compilation, POSIX-class
//!   shorthands, parameter extraction
//! - **[`router`]** - table composition, compilation with transformers,
//!   ordered matching, reverse uri generation, copy-on-write snapshots
//! - **[`error`]** - registration-time configuration errors
//!
//! ## Quick start
//!
//! ```
//! use http::Method;
//! use wayfarer::{Route, RouteGroup, Router};
//!
//! # fn main() -> Result<(), wayfarer::RouterError> {
//! let mut router = Router::new();
//! router.add_route(Route::get("/contact/{id: [0-9]+}", "get_contact").named("contact"))?;
//! router.add_route_group(
//!     &RouteGroup::new("/users")
//!         .route(Route::get("{id}", "get_user"))
//!         .route(Route::post("", "create_user")),
//! )?;
//! router.compile()?;
//!
//! // Matching
//! let matches = router.find_routes(&Method::GET, "/users/1");
//! assert_eq!(matches[0].get_path_param("id"), Some("1"));
//!
//! // Reverse generation
//! let uri = router.uri_for("contact", &[("id", "42"), ("tab", "calls")]);
//! assert_eq!(uri.as_deref(), Some("/contact/42?tab=calls"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Composition is single-threaded; `compile()` publishes an immutable
//! [`RouteTable`] snapshot that is safe for unsynchronized concurrent reads.
//! [`SharedRouteTable`] swaps snapshots copy-on-write for live reloading.

pub mod error;
pub mod pattern;
pub mod route;
pub mod router;

pub use error::RouterError;
pub use pattern::{ParamVec, UriPatternBinding, MAX_INLINE_PARAMS};
pub use route::{PathVersioner, RequestMethod, Route, RouteGroup, RESOURCE_PATH_PARAMETER};
pub use router::{
    CompiledRoute, RouteMatch, RouteTable, RouteTransformer, Router, SharedRouteTable,
};
