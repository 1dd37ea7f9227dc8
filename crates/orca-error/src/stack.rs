//! Call-site capture with deferred symbolization.
//!
//! Capturing only records raw program counters. Turning a counter into
//! `(function, file, line)` costs a debug-info lookup, so it happens the
//! first time a frame is formatted and the result is memoized per counter:
//!
//! ```text
//! StackTrace::capture(skip)        walk stack, keep ≤ 32 raw ips
//!       │
//!       ▼  (error discarded → nothing else happens)
//! Frame::symbol()                  SYMBOLS[ip] hit → shared Arc<Symbol>
//!       │                          miss → backtrace::resolve, insert
//!       ▼
//! "orca-error/src/error.rs:120 (orca_error::error::Error::new)"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

/// Maximum frames kept per trace.
pub const MAX_DEPTH: usize = 32;

/// Resolved location of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Symbol {
    fn unknown() -> Self {
        Self {
            function: "unknown".to_string(),
            file: "unknown".to_string(),
            line: 0,
        }
    }
}

/// One captured program counter.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Frame(usize);

impl Frame {
    /// Raw program counter.
    #[inline]
    pub const fn ip(&self) -> usize {
        self.0
    }

    /// Resolve this frame. Memoized across all frames with the same counter.
    pub fn symbol(&self) -> Arc<Symbol> {
        resolve(self.0)
    }

    pub fn function(&self) -> String {
        self.symbol().function.clone()
    }

    pub fn file(&self) -> String {
        self.symbol().file.clone()
    }

    pub fn line(&self) -> u32 {
        self.symbol().line
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sym = self.symbol();
        write!(f, "{}:{} ({})", sym.file, sym.line, sym.function)
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Frame({:#x})", self.0)
    }
}

/// Frames captured when an error node was built, innermost first.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    frames: Vec<Frame>,
}

impl StackTrace {
    /// Capture the current stack.
    ///
    /// Frame 0 of the result is the caller of `capture` when `skip == 0`;
    /// each unit of `skip` drops one more frame above that. Platforms
    /// without a stack walker produce an empty trace.
    #[inline(never)]
    pub fn capture(skip: usize) -> StackTrace {
        let anchor = (StackTrace::capture as fn(usize) -> StackTrace) as usize;
        let raw = walk();

        // Everything up to and including our own frame is capture machinery.
        let start = raw
            .iter()
            .position(|&(_, sym)| sym == anchor)
            .map_or(0, |i| i + 1);

        let frames = raw
            .into_iter()
            .skip(start + skip)
            .take(MAX_DEPTH)
            .map(|(ip, _)| Frame(ip))
            .collect();
        StackTrace { frames }
    }

    /// An empty trace.
    pub const fn empty() -> StackTrace {
        StackTrace { frames: Vec::new() }
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The frame that constructed the owning node.
    #[inline]
    pub fn caller(&self) -> Option<&Frame> {
        self.frames.first()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl core::fmt::Display for StackTrace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for frame in &self.frames {
            let sym = frame.symbol();
            write!(f, "\n{}\n\t{}:{}", sym.function, sym.file, sym.line)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(&self.frames).finish()
    }
}

// ── Walking ───────────────────────────────────────────────────────

/// Slack for the walker's own frames before `MAX_DEPTH` user frames.
const WALK_LIMIT: usize = MAX_DEPTH + 16;

cfg_if::cfg_if! {
    if #[cfg(any(unix, windows))] {
        /// `(ip, enclosing symbol address)` pairs, innermost first.
        #[inline(never)]
        fn walk() -> Vec<(usize, usize)> {
            let mut raw = Vec::with_capacity(WALK_LIMIT);
            backtrace::trace(|frame| {
                raw.push((frame.ip() as usize, frame.symbol_address() as usize));
                raw.len() < WALK_LIMIT
            });
            raw
        }

        fn symbolize(ip: usize) -> Symbol {
            let mut out = None;
            backtrace::resolve(ip as *mut core::ffi::c_void, |sym| {
                if out.is_some() {
                    return;
                }
                out = Some(Symbol {
                    function: sym
                        .name()
                        .map(|n| format!("{:#}", n))
                        .unwrap_or_else(|| "unknown".to_string()),
                    file: sym
                        .filename()
                        .map(short_path)
                        .unwrap_or_else(|| "unknown".to_string()),
                    line: sym.lineno().unwrap_or(0),
                });
            });
            out.unwrap_or_else(Symbol::unknown)
        }
    } else {
        fn walk() -> Vec<(usize, usize)> {
            Vec::new()
        }

        fn symbolize(_ip: usize) -> Symbol {
            Symbol::unknown()
        }
    }
}

// ── Symbol cache ──────────────────────────────────────────────────

fn symbols() -> &'static RwLock<HashMap<usize, Arc<Symbol>>> {
    static SYMBOLS: OnceLock<RwLock<HashMap<usize, Arc<Symbol>>>> = OnceLock::new();
    SYMBOLS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn resolve(ip: usize) -> Arc<Symbol> {
    if let Some(sym) = symbols().read().get(&ip) {
        return Arc::clone(sym);
    }
    // Resolve outside the lock; two racing resolvers compute the same value.
    let sym = Arc::new(symbolize(ip));
    Arc::clone(symbols().write().entry(ip).or_insert(sym))
}

/// `…/orca-error/src/error.rs` → `orca-error/src/error.rs`.
///
/// Keeps the path from the directory owning the last `src` component;
/// paths without one keep their final two components.
fn short_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let from = match parts.iter().rposition(|p| p == "src") {
        Some(i) if i >= 1 => i - 1,
        _ => parts.len().saturating_sub(2),
    };
    parts[from..].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn capture_here() -> StackTrace {
        StackTrace::capture(0)
    }

    #[test]
    fn capture_is_bounded() {
        let trace = capture_here();
        assert!(trace.len() <= MAX_DEPTH);
    }

    #[test]
    fn skip_drops_frames() {
        let full = StackTrace::capture(0);
        let skipped = StackTrace::capture(2);
        if full.len() >= 2 + MAX_DEPTH {
            assert_eq!(skipped.len(), MAX_DEPTH);
        } else {
            assert!(skipped.len() <= full.len());
        }
    }

    #[test]
    fn empty_trace() {
        let trace = StackTrace::empty();
        assert!(trace.is_empty());
        assert!(trace.caller().is_none());
        assert_eq!(format!("{}", trace), "");
    }

    #[test]
    fn resolution_is_memoized() {
        let trace = capture_here();
        if let Some(frame) = trace.caller() {
            let a = frame.symbol();
            let b = frame.symbol();
            assert!(Arc::ptr_eq(&a, &b));
            assert_eq!(format!("{}", frame), format!("{}", frame));
        }
    }

    #[test]
    fn frame_display_shape() {
        let trace = capture_here();
        if let Some(frame) = trace.caller() {
            let s = format!("{}", frame);
            assert!(s.contains(':'), "got: {s}");
            assert!(s.ends_with(')'), "got: {s}");
        }
    }

    #[test]
    fn unknown_ip_degrades() {
        let frame = Frame(0);
        let sym = frame.symbol();
        assert_eq!(sym.line, 0);
        assert_eq!(frame.line(), 0);
    }

    #[test]
    fn short_path_keeps_crate_dir() {
        let p = Path::new("/home/dev/orca/crates/orca-error/src/error.rs");
        assert_eq!(short_path(p), "orca-error/src/error.rs");

        let p = Path::new("/rustc/abc/library/core/src/ops/function.rs");
        assert_eq!(short_path(p), "core/src/ops/function.rs");

        let p = Path::new("/tmp/build/main.rs");
        assert_eq!(short_path(p), "build/main.rs");

        assert_eq!(short_path(Path::new("lib.rs")), "lib.rs");
    }

    #[test]
    fn debug_prints_raw_ips() {
        let trace = StackTrace { frames: vec![Frame(0x10), Frame(0x20)] };
        assert_eq!(format!("{:?}", trace), "[Frame(0x10), Frame(0x20)]");
    }
}
