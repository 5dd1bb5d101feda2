//! # Router Module
//!
//! Route table composition, compilation and matching.
//!
//! The router uses a two-phase approach:
//!
//! 1. **Composition**: routes, groups, transformers and ignored path prefixes
//!    are registered on a mutable [`Router`]; an explicit
//!    [`compile`](Router::compile) call translates every uri template into an
//!    anchored regex and publishes an immutable [`RouteTable`] snapshot.
//!
//! 2. **Matching**: for each incoming request, [`find_routes`](RouteTable::find_routes)
//!    tests the path against every applicable compiled pattern, in
//!    registration order, returning all matches with their extracted path
//!    parameters. The match list feeds an external chain-of-responsibility
//!    dispatcher; an empty list is the normal "not found" signal.
//!
//! Reverse generation ([`uri_for`](RouteTable::uri_for)) turns a route name or
//! raw pattern plus a parameter set back into a concrete uri, spilling unused
//! parameters into the query string.
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use wayfarer::{Route, Router};
//!
//! # fn main() -> Result<(), wayfarer::RouterError> {
//! let mut router = Router::new();
//! router.add_route(Route::get("/contact/{id: [0-9]+}", "get_contact"))?;
//! router.compile()?;
//!
//! let matches = router.find_routes(&Method::GET, "/contact/42");
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].get_path_param("id"), Some("42"));
//! # Ok(())
//! # }
//! ```

mod core;
mod reload;

pub use self::core::{CompiledRoute, RouteMatch, RouteTable, RouteTransformer, Router};
pub use self::reload::SharedRouteTable;
