//! Request routing.
//!
//! Classifies an inbound HTTP request by path into one of three routes. The
//! front-end document is the default for every unrecognized path, including
//! the root: the host deliberately has no 404 route, so `classify` is total
//! over all path strings.

/// The route an inbound request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Serve the plain front-end document.
    PlainDocument,

    /// Serve the inspector-enabled variant of the front-end document.
    InspectableDocument,

    /// Decode the body as an API request and dispatch it.
    Api,
}

/// Classifies a URI path. Pure and total; exact path matching.
pub fn classify(uri_path: &str) -> Route {
    match uri_path {
        "/api" => Route::Api,
        "/with-inspector" => Route::InspectableDocument,
        _ => Route::PlainDocument,
    }
}
