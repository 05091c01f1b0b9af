//! Result paging arguments.

use strata_core::{ApiError, RequestContext};

use crate::{Rejection, Validator, ValidatorBuildError};

const PAGE: &str = "page";
const PAGE_LEN: &str = "page_len";

/// Validates the optional `page` and `page_len` query arguments.
///
/// Absent arguments are filled in with the configured defaults so the
/// handler can always read both, for example through [`PageArgs::from_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    default_page: i64,
    default_page_len: i64,
    max_page_len: i64,
}

impl Paging {
    /// Creates a paging validator.
    ///
    /// All bounds must be non-negative and `default_page_len` must not exceed
    /// `max_page_len`.
    pub fn new(
        default_page: i64,
        default_page_len: i64,
        max_page_len: i64,
    ) -> Result<Self, ValidatorBuildError> {
        if default_page_len > max_page_len {
            return Err(ValidatorBuildError::DefaultPageLenExceedsMax {
                default: default_page_len,
                max: max_page_len,
            });
        }
        for (field, value) in [
            ("default page", default_page),
            ("default page length", default_page_len),
            ("max page length", max_page_len),
        ] {
            if value < 0 {
                return Err(ValidatorBuildError::NegativePagingBound { field, value });
            }
        }

        Ok(Self {
            default_page,
            default_page_len,
            max_page_len,
        })
    }

    /// Returns the maximum page length.
    #[must_use]
    pub fn max_page_len(&self) -> i64 {
        self.max_page_len
    }

    fn check(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        match ctx.query_arg(PAGE_LEN).map(str::to_owned) {
            Some(raw) => {
                let page_len = parse_non_negative(PAGE_LEN, &raw)?;
                if page_len > self.max_page_len {
                    return Err(ApiError::value(
                        PAGE_LEN,
                        &format!("Argument must be {} or less.", self.max_page_len),
                    ));
                }
            }
            None => ctx.set_query_default(PAGE_LEN, self.default_page_len.to_string()),
        }

        match ctx.query_arg(PAGE).map(str::to_owned) {
            Some(raw) => {
                parse_non_negative(PAGE, &raw)?;
            }
            None => ctx.set_query_default(PAGE, self.default_page.to_string()),
        }
        Ok(())
    }
}

impl Default for Paging {
    /// Page 0, 50 results per page, at most 100.
    fn default() -> Self {
        Self {
            default_page: 0,
            default_page_len: 50,
            max_page_len: 100,
        }
    }
}

impl Validator for Paging {
    fn name(&self) -> &'static str {
        "paged_results"
    }

    fn validate(&self, ctx: &mut RequestContext) -> Result<(), Rejection> {
        self.check(ctx).map_err(|err| Rejection::raise(ctx, &err))
    }
}

fn parse_non_negative(name: &str, raw: &str) -> Result<i64, ApiError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::value(name, "Argument must be an integer."))?;
    if value < 0 {
        return Err(ApiError::value(name, "Argument must be 0 or greater."));
    }
    Ok(value)
}

/// The paging arguments of a request that passed [`Paging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArgs {
    /// Zero-based page number.
    pub page: u64,
    /// Results per page.
    pub page_len: u64,
}

impl PageArgs {
    /// Reads the paging arguments, `None` if they are absent or invalid.
    #[must_use]
    pub fn from_context(ctx: &RequestContext) -> Option<Self> {
        Some(Self {
            page: ctx.query_arg(PAGE)?.trim().parse().ok()?,
            page_len: ctx.query_arg(PAGE_LEN)?.trim().parse().ok()?,
        })
    }

    /// Returns the index of the first result on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_len)
    }
}
