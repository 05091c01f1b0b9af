//! A small API used by the demo binary and the end-to-end tests.
//!
//! | Call | Method | Behavior |
//! |------|--------|----------|
//! | `ping<suffix>` | GET | echoes the suffix and the negotiated mode |
//! | `echo` | POST | echoes a validated JSON body (`arg1` string, optional `arg2` integer) |
//! | `letters` | GET | pages through the alphabet |
//! | `settings` | GET | returns the API configuration |
//! | `later` | GET | answers after a short delay |
//! | `list_versions` | GET | built in |

use std::time::Duration;

use anyhow::anyhow;
use http::Method;
use serde::Serialize;
use strata_core::{write_json, HandlerFailure, HandlerResult, Reply, RequestContext};
use strata_router::{
    ApiModule, Call, CallHandler, CallRouter, Endpoint, HandlerRegistry, RouterBuildError,
    VersionRouter,
};
use strata_validate::{ArgType, JsonArguments, PageArgs, Paging};

/// Name of the demo API, as it appears in negotiation tokens.
pub const API_NAME: &str = "demo";

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

#[derive(Serialize)]
struct Pong<'a> {
    group1: &'a str,
    mode: &'a str,
}

#[derive(Serialize)]
struct LetterPage {
    page: u64,
    page_len: u64,
    letters: Vec<char>,
}

/// Builds the demo API with versions `0.9` and `1.0`.
pub fn api() -> Result<ApiModule, RouterBuildError> {
    let versions = VersionRouter::new([
        ("0.9", r"0\.9", call_router()?),
        ("1.0", r"1\.0", call_router()?),
    ])?;
    Ok(ApiModule::new(API_NAME, versions))
}

fn call_router() -> Result<CallRouter, RouterBuildError> {
    let echo = Endpoint::new(echo).require(
        JsonArguments::builder()
            .required("arg1", ArgType::String)
            .optional("arg2", ArgType::Integer)
            .build()?,
    );
    let letters = Endpoint::new(letters).require(Paging::new(0, 5, 10)?);

    let registry = HandlerRegistry::new()
        .register(CallHandler::new("PingCall").route("ping(?P<group1>.*)").get(ping))
        .register(CallHandler::new("EchoCall").route("echo").on(Method::POST, echo))
        .register(CallHandler::new("LettersCall").route("letters").on(Method::GET, letters))
        .register(CallHandler::new("SettingsCall").route("settings").get(settings))
        .register(CallHandler::new("LaterCall").route("later").get(later));

    CallRouter::builder(registry).auto_list_versions(true).build()
}

fn ping(ctx: &mut RequestContext, _call: &Call) -> HandlerResult {
    let group1 = ctx.url_match("group1").unwrap_or_default().to_string();
    let mode = ctx.api_mode().map(|mode| mode.as_str()).unwrap_or_default();
    Ok(Reply::Ready(write_json(ctx, &Pong { group1: &group1, mode })))
}

fn echo(ctx: &mut RequestContext, _call: &Call) -> HandlerResult {
    let args = ctx.json_args().cloned().unwrap_or_default();
    Ok(Reply::Ready(write_json(ctx, &args)))
}

fn letters(ctx: &mut RequestContext, _call: &Call) -> HandlerResult {
    let args = PageArgs::from_context(ctx)
        .ok_or_else(|| anyhow!("paging arguments missing after validation"))?;
    let letters: Vec<char> = usize::try_from(args.offset())
        .map(|offset| {
            ALPHABET
                .chars()
                .skip(offset)
                .take(usize::try_from(args.page_len).unwrap_or(usize::MAX))
                .collect()
        })
        .unwrap_or_default();
    let page = LetterPage {
        page: args.page,
        page_len: args.page_len,
        letters,
    };
    Ok(Reply::Ready(write_json(ctx, &page)))
}

fn settings(ctx: &mut RequestContext, _call: &Call) -> HandlerResult {
    let settings = ctx.api_config().clone();
    Ok(Reply::Ready(write_json(ctx, &settings)))
}

fn later(_ctx: &mut RequestContext, _call: &Call) -> HandlerResult {
    Ok(Reply::then(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok::<_, HandlerFailure>(|ctx: &mut RequestContext| -> HandlerResult {
            Ok(Reply::Ready(write_json(ctx, &"later")))
        })
    }))
}
