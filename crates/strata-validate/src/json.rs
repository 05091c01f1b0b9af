//! JSON body validation.

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;
use strata_core::{ApiError, RequestContext};

use crate::content_type::{check_content_type, JSON_MEDIA_TYPE};
use crate::{Rejection, Validator, ValidatorBuildError};

/// The JSON type an argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// Any JSON value, including `null`.
    Any,
}

impl ArgType {
    /// Returns `true` if `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }

    /// Returns the name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared body argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument name.
    pub name: String,
    /// Expected type.
    pub ty: ArgType,
    /// Whether the argument may be absent.
    pub optional: bool,
}

impl ArgSpec {
    /// A required argument.
    #[must_use]
    pub fn required(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    /// An optional argument, type-checked only when present.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// Validates a JSON object body against a declared argument list.
///
/// On success the parsed object is recorded on the context and is available
/// to the handler through
/// [`RequestContext::json_args`](strata_core::RequestContext::json_args).
#[derive(Debug, Clone)]
pub struct JsonArguments {
    args: Vec<ArgSpec>,
    media_type: String,
}

impl JsonArguments {
    /// Creates a validator for the given arguments and `application/json`.
    pub fn new(args: impl IntoIterator<Item = ArgSpec>) -> Result<Self, ValidatorBuildError> {
        let args: Vec<ArgSpec> = args.into_iter().collect();

        let mut seen = HashSet::new();
        for arg in &args {
            if arg.name.is_empty() {
                return Err(ValidatorBuildError::EmptyArgumentName);
            }
            if !seen.insert(arg.name.as_str()) {
                return Err(ValidatorBuildError::DuplicateArgument(arg.name.clone()));
            }
        }

        Ok(Self {
            args,
            media_type: JSON_MEDIA_TYPE.to_string(),
        })
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> JsonArgumentsBuilder {
        JsonArgumentsBuilder::default()
    }

    /// Expects a media type other than `application/json`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into().to_lowercase();
        self
    }

    /// Returns the declared arguments.
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        check_content_type(ctx, &self.media_type)?;

        let parsed: Value = serde_json::from_slice(ctx.body()).map_err(|e| {
            tracing::debug!(error = %e, "request body is not valid JSON");
            ApiError::json_decode()
        })?;
        let Value::Object(map) = parsed else {
            return Err(ApiError::request_not_hash());
        };

        for arg in &self.args {
            match map.get(&arg.name) {
                Some(value) if !arg.ty.matches(value) => {
                    return Err(ApiError::value(
                        &arg.name,
                        &format!("Must be of type {}", arg.ty),
                    ));
                }
                Some(_) => {}
                None if arg.optional => {}
                None => return Err(ApiError::value(&arg.name, "Argument is missing.")),
            }
        }

        ctx.set_json_args(map);
        Ok(())
    }
}

impl Validator for JsonArguments {
    fn name(&self) -> &'static str {
        "json_arguments"
    }

    fn validate(&self, ctx: &mut RequestContext) -> Result<(), Rejection> {
        self.check(ctx).map_err(|err| Rejection::raise(ctx, &err))
    }
}

/// Builder for [`JsonArguments`].
#[derive(Debug, Default)]
pub struct JsonArgumentsBuilder {
    args: Vec<ArgSpec>,
    media_type: Option<String>,
}

impl JsonArgumentsBuilder {
    /// Declares a required argument.
    pub fn required(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.args.push(ArgSpec::required(name, ty));
        self
    }

    /// Declares an optional argument.
    pub fn optional(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.args.push(ArgSpec::optional(name, ty));
        self
    }

    /// Sets the expected media type.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Builds the validator.
    pub fn build(self) -> Result<JsonArguments, ValidatorBuildError> {
        let validator = JsonArguments::new(self.args)?;
        Ok(match self.media_type {
            Some(media_type) => validator.with_media_type(media_type),
            None => validator,
        })
    }
}
