//! The version tier.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_core::RequestContext;

use crate::{CallRouter, Resolution, Result, RoutePattern, RouteScope, Terminal};

/// One version of an API.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pattern: RoutePattern,
    router: Arc<CallRouter>,
}

impl VersionEntry {
    /// Returns the pattern matched against the negotiated version.
    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Returns the version's call router.
    #[must_use]
    pub fn router(&self) -> &Arc<CallRouter> {
        &self.router
    }
}

/// Resolves which version's call router answers a request.
///
/// Versions are tried in ascending order of their id, so when two patterns
/// could both match, the lowest id wins.
#[derive(Debug, Clone)]
pub struct VersionRouter {
    versions: BTreeMap<String, VersionEntry>,
    ids: Arc<[String]>,
}

impl VersionRouter {
    /// Builds the version table from `(id, pattern, call router)` triples.
    pub fn new<I, S, P>(versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, P, CallRouter)>,
        S: Into<String>,
        P: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (id, pattern, router) in versions {
            table.insert(
                id.into(),
                VersionEntry {
                    pattern: RoutePattern::new(pattern.as_ref())?,
                    router: Arc::new(router),
                },
            );
        }
        let ids = table.keys().cloned().collect::<Vec<_>>().into();
        Ok(Self {
            versions: table,
            ids,
        })
    }

    /// Returns the version table, keyed and ordered by version id.
    #[must_use]
    pub fn version_map(&self) -> &BTreeMap<String, VersionEntry> {
        &self.versions
    }

    /// Returns the version ids, ascending.
    #[must_use]
    pub fn version_ids(&self) -> &[String] {
        &self.ids
    }

    /// Resolves the version and delegates to its call router.
    pub fn resolve(&self, ctx: &mut RequestContext, scope: RouteScope) -> Resolution {
        let token = match ctx.version_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "malformed version token at version tier");
                return Resolution::Terminal(Terminal::UnknownVersion);
            }
        };

        for (id, entry) in &self.versions {
            if entry.pattern.is_match(&token.version) {
                tracing::debug!(version = %id, requested = %token.version, "version resolved");
                ctx.set_api_version(id.clone());
                return entry
                    .router
                    .resolve(ctx, scope.with_versions(Arc::clone(&self.ids)));
            }
        }

        tracing::debug!(requested = %token.version, "no version matched");
        Resolution::Terminal(Terminal::UnknownVersion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallHandler, HandlerRegistry};
    use strata_core::Reply;

    fn router_answering(body: &'static str) -> CallRouter {
        CallRouter::new(HandlerRegistry::new().register(
            CallHandler::new(body)
                .route("ping")
                .get(move |_ctx, _call| Ok(Reply::body(body))),
        ))
        .unwrap()
    }

    fn request(token: &str) -> RequestContext {
        RequestContext::builder()
            .uri("/api/ping")
            .header("X-DigiTar-API-Version", token)
            .build()
    }

    #[test]
    fn test_sorted_resolution_regardless_of_declaration_order() {
        let versions = VersionRouter::new([
            ("1.0", r"1\.0", router_answering("v1_0")),
            ("0.9", r"0\.9", router_answering("v0_9")),
        ])
        .unwrap();
        assert_eq!(versions.version_ids(), ["0.9".to_string(), "1.0".to_string()]);

        let mut ctx = request("api-1.0+prod");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert_eq!(resolution.call().unwrap().handler().name(), "v1_0");
        assert_eq!(ctx.api_version(), "1.0");
    }

    #[test]
    fn test_overlapping_patterns_lowest_id_wins() {
        let versions = VersionRouter::new([
            ("2.0", r"\d\.\d", router_answering("v2_0")),
            ("1.0", r"\d\.\d", router_answering("v1_0")),
        ])
        .unwrap();
        let mut ctx = request("api-2.0+prod");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert_eq!(resolution.call().unwrap().handler().name(), "v1_0");
        assert_eq!(ctx.api_version(), "1.0");
    }

    #[test]
    fn test_scope_carries_version_ids() {
        let versions = VersionRouter::new([
            ("1.0", r"1\.0", router_answering("v1_0")),
            ("0.9", r"0\.9", router_answering("v0_9")),
        ])
        .unwrap();
        let mut ctx = request("api-0.9+test");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert_eq!(
            resolution.call().unwrap().scope().versions(),
            ["0.9".to_string(), "1.0".to_string()]
        );
    }

    #[test]
    fn test_no_version_match() {
        let versions = VersionRouter::new([("1.0", r"1\.0", router_answering("v1_0"))]).unwrap();
        let mut ctx = request("api-3.0+prod");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert!(matches!(resolution.terminal(), Some(Terminal::UnknownVersion)));
        assert_eq!(ctx.api_version(), "");
    }

    #[test]
    fn test_version_pattern_is_anchored() {
        let versions = VersionRouter::new([("1.0", r"1\.0", router_answering("v1_0"))]).unwrap();
        let mut ctx = request("api-1.0.1+prod");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert!(resolution.terminal().is_some());
    }

    #[test]
    fn test_malformed_token() {
        let versions = VersionRouter::new([("1.0", r"1\.0", router_answering("v1_0"))]).unwrap();
        let mut ctx = request("api-1.0");
        let resolution = versions.resolve(&mut ctx, RouteScope::detached());
        assert!(matches!(resolution.terminal(), Some(Terminal::UnknownVersion)));
    }

    #[test]
    fn test_version_map_unmodified() {
        let versions = VersionRouter::new([("1.0", r"1\.0", router_answering("v1_0"))]).unwrap();
        let map = versions.version_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["1.0"].pattern().as_str(), r"1\.0");
    }
}
