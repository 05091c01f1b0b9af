//! Query-string argument validation.

use std::collections::HashSet;

use strata_core::{ApiError, RequestContext};

use crate::content_type::check_content_type;
use crate::{Rejection, Validator, ValidatorBuildError};

/// Requires a set of query arguments to be present.
///
/// When a media type is configured the request `Content-Type` is checked the
/// same way [`JsonArguments`](crate::JsonArguments) checks it.
#[derive(Debug, Clone)]
pub struct UrlArguments {
    names: Vec<String>,
    media_type: Option<String>,
}

impl UrlArguments {
    /// Creates a validator requiring every name in `names`.
    pub fn new<I, S>(names: I) -> Result<Self, ValidatorBuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(ValidatorBuildError::EmptyArgumentName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ValidatorBuildError::DuplicateArgument(name.clone()));
            }
        }

        Ok(Self {
            names,
            media_type: None,
        })
    }

    /// Also requires `Content-Type: <media_type>; charset=utf-8`.
    #[must_use]
    pub fn with_content_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into().to_lowercase());
        self
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), ApiError> {
        if let Some(media_type) = &self.media_type {
            check_content_type(ctx, media_type)?;
        }

        match self.names.iter().find(|name| !ctx.has_query_arg(name)) {
            Some(missing) => Err(ApiError::value(missing, "Argument is missing.")),
            None => Ok(()),
        }
    }
}

impl Validator for UrlArguments {
    fn name(&self) -> &'static str {
        "url_arguments"
    }

    fn validate(&self, ctx: &mut RequestContext) -> Result<(), Rejection> {
        self.check(ctx).map_err(|err| Rejection::raise(ctx, &err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ErrorEnvelope;

    fn text(rejection: Rejection) -> String {
        let env: ErrorEnvelope = serde_json::from_slice(&rejection.into_body()).unwrap();
        env.error.exception_text
    }

    #[test]
    fn test_all_present() {
        let validator = UrlArguments::new(["arg1", "arg2"]).unwrap();
        let mut ctx = RequestContext::builder().uri("/a/1.0/c?arg1=x&arg2=").build();
        assert!(validator.validate(&mut ctx).is_ok());
    }

    #[test]
    fn test_reports_first_missing() {
        let validator = UrlArguments::new(["arg1", "arg2", "arg3"]).unwrap();
        let mut ctx = RequestContext::builder().uri("/a/1.0/c?arg1=x").build();
        assert_eq!(
            text(validator.validate(&mut ctx).unwrap_err()),
            "Invalid value for argument 'arg2'. Argument is missing."
        );
    }

    #[test]
    fn test_content_type_only_when_configured() {
        let plain = UrlArguments::new(["arg1"]).unwrap();
        let strict = UrlArguments::new(["arg1"])
            .unwrap()
            .with_content_type("application/json");

        let mut ctx = RequestContext::builder().uri("/a/1.0/c?arg1=x").build();
        assert!(plain.validate(&mut ctx).is_ok());
        assert!(text(strict.validate(&mut ctx).unwrap_err()).starts_with("The Content-Type"));

        let mut ctx = RequestContext::builder()
            .uri("/a/1.0/c?arg1=x")
            .header("content-type", "application/json; charset=utf-8")
            .build();
        assert!(strict.validate(&mut ctx).is_ok());
    }

    #[test]
    fn test_empty_name_list_checks_content_type_only() {
        let validator = UrlArguments::new(Vec::<String>::new())
            .unwrap()
            .with_content_type("application/json");

        let mut ctx = RequestContext::builder()
            .uri("/a/1.0/c")
            .header("content-type", "application/json; charset=utf-8")
            .build();
        assert!(validator.validate(&mut ctx).is_ok());

        let mut ctx = RequestContext::builder()
            .uri("/a/1.0/c?anything=1")
            .header("content-type", "text/plain; charset=utf-8")
            .build();
        assert!(text(validator.validate(&mut ctx).unwrap_err()).starts_with("The Content-Type"));

        let plain = UrlArguments::new(Vec::<String>::new()).unwrap();
        let mut ctx = RequestContext::builder().uri("/a/1.0/c").build();
        assert!(plain.validate(&mut ctx).is_ok());
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            UrlArguments::new([""]).unwrap_err(),
            ValidatorBuildError::EmptyArgumentName
        );
        assert_eq!(
            UrlArguments::new(["a", "a"]).unwrap_err(),
            ValidatorBuildError::DuplicateArgument("a".into())
        );
    }
}
