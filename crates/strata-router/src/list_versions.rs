//! The built-in `list_versions` call.

use serde::Serialize;
use strata_core::{write_json, Reply};

use crate::CallHandler;

/// Route pattern of the built-in `list_versions` call.
pub const LIST_VERSIONS_ROUTE: &str = "list_versions";

#[derive(Serialize)]
struct VersionListing<'a> {
    all_versions: &'a [String],
    curr_version: &'a str,
}

/// Lists every version of the current API and the negotiated one.
pub(crate) fn list_versions_handler() -> CallHandler {
    CallHandler::new("ListVersionsCall")
        .route(LIST_VERSIONS_ROUTE)
        .get(|ctx, call| {
            let curr_version = ctx.api_version().to_string();
            let listing = VersionListing {
                all_versions: call.scope().versions(),
                curr_version: &curr_version,
            };
            Ok(Reply::Ready(write_json(ctx, &listing)))
        })
}
