//! Rendering an error chain for humans and log pipelines.
//!
//! ```text
//! brief          Menu not found
//! detail         menu `x` missing - #1 [app/src/menu.rs:40 (app::menu::get)] (100102) Menu not found
//! trace+detail   <outermost detail>; \n<next detail>; \n... #0
//! json           [{"error":"Menu not found"}]
//! json+detail    [{"caller":"#1 app/src/menu.rs:40 (app::menu::get)","code":100102,"error":"...","message":"Menu not found"}]
//! ```
//!
//! Depth numbers count from the innermost node, which is always `#0`.

use std::error::Error as StdError;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::chain;
use crate::stack::StackTrace;
use crate::{codes, Code, Error, Kind, Registry};

/// Delimiter between entries of a non-JSON trace.
pub const TRACE_DELIMITER: &str = "; \n";

/// Which parts of a chain to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    /// Caller location, code and both messages per entry.
    pub detail: bool,
    /// Walk every node instead of only the outermost one.
    pub trace: bool,
    /// Emit a JSON array of records instead of text.
    pub json: bool,
}

impl FormatOptions {
    pub const BRIEF: Self = Self {
        detail: false,
        trace: false,
        json: false,
    };

    pub const DETAIL: Self = Self {
        detail: true,
        trace: false,
        json: false,
    };

    pub const TRACE: Self = Self {
        detail: true,
        trace: true,
        json: false,
    };

    /// Map format flags: `-` detail, `+` trace with detail, `#` JSON.
    pub fn from_formatter(f: &fmt::Formatter<'_>) -> Self {
        let trace = f.sign_plus();
        Self {
            detail: trace || f.sign_minus(),
            trace,
            json: f.alternate(),
        }
    }

    pub const fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// One entry of JSON output. Fields absent from the chosen mode are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Code>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What one node contributes to the output.
struct NodeInfo<'a> {
    code: Code,
    /// Client-facing text.
    message: String,
    /// Internal diagnostic text.
    error: String,
    stack: Option<&'a StackTrace>,
}

fn node_info<'a>(node: &'a (dyn StdError + 'static), registry: Option<&Registry>) -> NodeInfo<'a> {
    let fallback = registry.map_or(codes::INTERNAL_SERVER, |r| r.fallback().code());

    let Some(err) = node.downcast_ref::<Error>() else {
        let text = node.to_string();
        return NodeInfo {
            code: fallback,
            message: text.clone(),
            error: text,
            stack: None,
        };
    };

    let diagnostic = err.diagnostic().into_owned();
    match (err.kind(), err.code()) {
        (Kind::Coded, Some(code)) => {
            let (code, message) = match registry {
                Some(r) => {
                    let coder = r.lookup_or_fallback(code);
                    let message = match coder.message() {
                        "" => diagnostic.clone(),
                        m => m.to_string(),
                    };
                    (coder.code(), message)
                }
                None => (code, diagnostic.clone()),
            };
            NodeInfo {
                code,
                message,
                error: diagnostic,
                stack: err.stack(),
            }
        }
        _ => NodeInfo {
            code: fallback,
            message: diagnostic.clone(),
            error: diagnostic,
            stack: err.stack(),
        },
    }
}

/// Nodes selected by `opts`, outermost first, each paired with its depth.
fn selected<'a>(
    err: &'a (dyn StdError + 'static),
    opts: FormatOptions,
) -> impl Iterator<Item = (usize, &'a (dyn StdError + 'static))> {
    let len = chain::depth(err);
    let take = if opts.trace { len } else { 1 };
    chain::chain(err)
        .enumerate()
        .take(take)
        .map(move |(i, node)| (len - i - 1, node))
}

/// Render `err` as text or JSON.
///
/// With a registry, coded nodes show the registered code and message.
/// Without one they show their own code and diagnostic.
pub fn render(err: &(dyn StdError + 'static), registry: Option<&Registry>, opts: FormatOptions) -> String {
    if opts.json {
        let records = records(err, registry, opts);
        return serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string());
    }

    let mut out = String::new();
    let mut sep = "";
    for (depth, node) in selected(err, opts) {
        let info = node_info(node, registry);
        out.push_str(sep);
        if opts.detail {
            match info.stack.and_then(StackTrace::caller) {
                Some(frame) => {
                    let _ = write!(
                        out,
                        "{} - #{} [{}] ({}) {}",
                        info.error, depth, frame, info.code, info.message
                    );
                }
                None => {
                    let _ = write!(out, "{} - #{} {}", info.error, depth, info.message);
                }
            }
        } else {
            out.push_str(&info.message);
        }
        sep = TRACE_DELIMITER;
    }

    out.trim_matches(|c| matches!(c, '\r' | '\n' | '\t')).to_string()
}

/// Records for JSON output, one per selected node.
pub fn records(err: &(dyn StdError + 'static), registry: Option<&Registry>, opts: FormatOptions) -> Vec<Record> {
    selected(err, opts)
        .map(|(depth, node)| {
            let info = node_info(node, registry);
            if !opts.detail {
                return Record {
                    caller: None,
                    code: None,
                    error: info.message,
                    message: None,
                };
            }
            let caller = match info.stack.and_then(StackTrace::caller) {
                Some(frame) => format!("#{} {}", depth, frame),
                None => format!("#{}", depth),
            };
            Record {
                caller: Some(caller),
                code: Some(info.code),
                error: info.error,
                message: Some(info.message),
            }
        })
        .collect()
}

/// [`Display`](fmt::Display) adapter resolving codes through a registry.
///
/// Built by [`Error::display_with`]; honours the same flags as `Error`.
pub struct WithRegistry<'a> {
    err: &'a (dyn StdError + 'static),
    registry: &'a Registry,
}

impl<'a> WithRegistry<'a> {
    pub fn new(err: &'a (dyn StdError + 'static), registry: &'a Registry) -> Self {
        Self { err, registry }
    }
}

impl fmt::Display for WithRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opts = FormatOptions::from_formatter(f);
        f.write_str(&render(self.err, Some(self.registry), opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let reg = Registry::new();
        codes::bootstrap(&reg).unwrap();
        reg
    }

    #[test]
    fn brief_is_outermost_message() {
        let err = Error::wrap(Error::new("disk full"), "saving menu");
        assert_eq!(format!("{}", err), "saving menu");
        assert_eq!(render(&err, None, FormatOptions::BRIEF), "saving menu");
    }

    #[test]
    fn brief_uses_registry_message() {
        let reg = registry();
        let err = Error::with_code(codes::VALIDATION, "label is empty");
        assert_eq!(render(&err, Some(&reg), FormatOptions::BRIEF), "Validation failed");
        assert_eq!(render(&err, None, FormatOptions::BRIEF), "label is empty");
    }

    #[test]
    fn empty_registry_message_falls_back_to_diagnostic() {
        let reg = Registry::new();
        reg.register_code(Code(900010), 400, "", None).unwrap();
        let err = Error::with_code(Code(900010), "raw detail");
        assert_eq!(render(&err, Some(&reg), FormatOptions::BRIEF), "raw detail");
    }

    #[test]
    fn unregistered_code_resolves_to_internal_server() {
        let reg = registry();
        let err = Error::with_code(Code(4242), "who knows");
        let s = render(&err, Some(&reg), FormatOptions::DETAIL);
        assert!(s.ends_with("Internal server error"), "got: {s}");
        assert!(s.starts_with("who knows - #0"), "got: {s}");
    }

    #[test]
    fn detail_shows_only_outermost() {
        let err = Error::wrap_with_code(Error::with_code(codes::BIND, "a"), codes::VALIDATION, "b");
        let s = format!("{:-}", err);
        assert!(s.starts_with("b - #1"), "got: {s}");
        assert!(s.ends_with(" b"), "got: {s}");
        assert!(!s.contains(TRACE_DELIMITER), "got: {s}");
    }

    #[test]
    fn trace_lists_every_node_innermost_last() {
        let err = Error::wrap(Error::with_message(Error::new("root"), "mid"), "top");
        let s = format!("{:+}", err);
        let entries: Vec<&str> = s.split(TRACE_DELIMITER).collect();
        assert_eq!(entries.len(), 3, "got: {s}");
        assert!(entries[0].starts_with("top - #2"), "got: {s}");
        assert_eq!(entries[1], "mid - #1 mid");
        assert!(entries[2].starts_with("root - #0"), "got: {s}");
    }

    #[test]
    fn trace_without_detail_joins_messages() {
        let err = Error::with_message(Error::with_message(Error::new("c"), "b"), "a");
        let opts = FormatOptions {
            trace: true,
            ..FormatOptions::default()
        };
        assert_eq!(render(&err, None, opts), "a; \nb; \nc");
    }

    #[test]
    fn messaged_node_has_no_caller() {
        let err = Error::with_message(Error::new("root"), "note");
        let s = format!("{:-}", err);
        assert_eq!(s, "note - #1 note");
    }

    #[test]
    fn foreign_leaf_is_rendered() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = Error::with_message(io, "reading request");
        let s = format!("{:+}", err);
        assert!(s.ends_with("socket closed - #0 socket closed"), "got: {s}");
    }

    #[test]
    fn json_brief_has_only_error_key() {
        let reg = registry();
        let err = Error::with_code(codes::MENU_NOT_FOUND, "id 7");
        let s = format!("{:#}", err.display_with(&reg));
        assert_eq!(s, r#"[{"error":"Menu not found"}]"#);
    }

    #[test]
    fn json_detail_fields() {
        let reg = registry();
        let err = Error::with_message(Error::with_code(codes::MENU_NOT_FOUND, "id 7"), "lookup");
        let recs = records(&err, Some(&reg), FormatOptions::TRACE.json());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].caller.as_deref(), Some("#1"));
        assert_eq!(recs[0].code, Some(codes::INTERNAL_SERVER));
        assert_eq!(recs[0].error, "lookup");
        assert_eq!(recs[1].code, Some(codes::MENU_NOT_FOUND));
        assert_eq!(recs[1].message.as_deref(), Some("Menu not found"));
        assert!(recs[1].caller.as_deref().unwrap().starts_with("#0"));

        let s = format!("{:+#}", err.display_with(&reg));
        let parsed: Vec<Record> = serde_json::from_str(&s).unwrap();
        assert_eq!(parsed, recs);
        assert!(s.starts_with(r##"[{"caller":"#1","code":100002,"error":"lookup","message":"lookup"}"##), "got: {s}");
    }

    #[test]
    fn rendering_is_idempotent() {
        let reg = registry();
        let err = Error::wrap(Error::with_code(codes::DATABASE, "conn reset"), "list menus");
        let modes = [
            FormatOptions::BRIEF,
            FormatOptions::DETAIL,
            FormatOptions::TRACE,
            FormatOptions::TRACE.json(),
        ];
        for opts in modes {
            let a = render(&err, Some(&reg), opts);
            let b = render(&err, Some(&reg), opts);
            assert_eq!(a, b);
        }
        assert_eq!(chain::first_code(&err), Some(codes::DATABASE));
        assert_eq!(chain::depth(&err), 2);
    }

    #[test]
    fn output_is_trimmed() {
        let err = Error::new("\n\tpadded\r\n");
        assert_eq!(err.to_string(), "padded");
    }
}
