//! Compilation of user rewrite templates into gateway capture group syntax.
//!
//! A template such as `/users/$1/profile` refers to regex captures of the matched route path
//! by index. `\$` produces a literal dollar sign.

use crate::error::TranslationError;
use crate::model::GatewayPlugin;
use crate::source::ServiceParent;
use kongress_api::constants::{REQUEST_TRANSFORMER_PLUGIN, REWRITE_ANNOTATION};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

const CAPTURE_OPEN: &str = "$(uri_captures[";
const CAPTURE_CLOSE: &str = "])";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteUriError {
    #[error("unexpected {character:?} at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("unexpected end of template")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Plain,
    /// `$` seen, a capture index digit must follow.
    Mark,
    /// Inside a capture index.
    Digit,
    /// `\` seen, a `$` must follow.
    Escape,
}

fn scan_plain(c: char, out: &mut String) -> ScanState {
    match c {
        '$' => ScanState::Mark,
        '\\' => ScanState::Escape,
        _ => {
            out.push(c);
            ScanState::Plain
        }
    }
}

pub fn compile_rewrite_uri(template: &str) -> Result<String, RewriteUriError> {
    let mut out = String::with_capacity(template.len());
    let mut state = ScanState::Plain;

    for (position, c) in template.char_indices() {
        state = match state {
            ScanState::Plain => scan_plain(c, &mut out),
            ScanState::Mark if c.is_ascii_digit() => {
                out.push_str(CAPTURE_OPEN);
                out.push(c);
                ScanState::Digit
            }
            ScanState::Digit if c.is_ascii_digit() => {
                out.push(c);
                ScanState::Digit
            }
            ScanState::Digit => {
                out.push_str(CAPTURE_CLOSE);
                scan_plain(c, &mut out)
            }
            ScanState::Escape if c == '$' => {
                out.push(c);
                ScanState::Plain
            }
            ScanState::Mark | ScanState::Escape => {
                return Err(RewriteUriError::UnexpectedCharacter {
                    character: c,
                    position,
                });
            }
        };
    }

    match state {
        ScanState::Plain => Ok(out),
        ScanState::Digit => {
            out.push_str(CAPTURE_CLOSE);
            Ok(out)
        }
        ScanState::Mark | ScanState::Escape => Err(RewriteUriError::UnexpectedEnd),
    }
}

/// Builds the request-transformer plugin for a resource that asks for a URI rewrite.
///
/// Returns `None` when the resource carries no rewrite annotation.
pub fn rewrite_uri_plugin(
    parent: &ServiceParent,
    rewrite_uris_enabled: bool,
) -> Result<Option<GatewayPlugin>, TranslationError> {
    let Some(template) = parent.annotation(REWRITE_ANNOTATION) else {
        return Ok(None);
    };

    if !rewrite_uris_enabled {
        return Err(TranslationError::FeatureDisabled {
            annotation: REWRITE_ANNOTATION,
        });
    }

    let template = if template.is_empty() { "/" } else { template };
    let uri = compile_rewrite_uri(template)?;
    debug!(
        "Rewriting upstream URI: object.ref={} template={} uri={}",
        parent.source(),
        template,
        uri
    );

    Ok(Some(
        GatewayPlugin::builder()
            .name(REQUEST_TRANSFORMER_PLUGIN)
            .config(json!({ "replace": { "uri": uri } }))
            .build(),
    ))
}
