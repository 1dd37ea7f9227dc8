//! Code registry: `Code` → [`Coder`] descriptors.
//!
//! # Lifecycle
//!
//! ```text
//! Registry::new()
//!       │
//!       ▼  codes::bootstrap(&registry)?   (startup, single-threaded in practice)
//! register / register_code / must_register
//!       │
//!       ▼  shared behind Arc with the response adapter
//! lookup / parse_coder / coder_for        (concurrent reads)
//! ```
//!
//! Writes are serialized by one lock. The table is append-only except for
//! explicit `must_register` overrides.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::chain;
use crate::code::{is_allowed_status, Code, Coder, DefaultCoder, ALLOWED_HTTP_STATUS};
use crate::codes;

/// Registry misconfiguration. Raised at startup, never on a request path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The code already has a descriptor. Use `must_register` to override.
    #[error("code `{0}` is already registered")]
    Duplicate(Code),

    /// The status is outside [`ALLOWED_HTTP_STATUS`].
    #[error("code `{code}` uses HTTP status {status}; only {allowed:?} are allowed")]
    DisallowedStatus {
        code: Code,
        status: u16,
        allowed: [u16; 6],
    },
}

/// Table of registered codes.
#[derive(Default)]
pub struct Registry {
    codes: RwLock<HashMap<Code, Arc<dyn Coder>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `coder` under its code. Fails if the code is already taken.
    pub fn register<C>(&self, coder: C) -> Result<(), RegistryError>
    where
        C: Coder + 'static,
    {
        let code = coder.code();
        let mut codes = self.codes.write();
        if codes.contains_key(&code) {
            return Err(RegistryError::Duplicate(code));
        }
        codes.insert(code, Arc::new(coder));
        Ok(())
    }

    /// Register a [`DefaultCoder`], rejecting statuses outside
    /// [`ALLOWED_HTTP_STATUS`].
    ///
    /// ```
    /// use orca_error::{Code, Registry};
    ///
    /// let registry = Registry::new();
    /// registry.register_code(Code(100001), 200, "OK", None).unwrap();
    /// assert!(registry.register_code(Code(100099), 409, "conflict", None).is_err());
    /// ```
    pub fn register_code(
        &self,
        code: Code,
        http_status: u16,
        message: &str,
        reference: Option<&str>,
    ) -> Result<(), RegistryError> {
        if !is_allowed_status(http_status) {
            return Err(RegistryError::DisallowedStatus {
                code,
                status: http_status,
                allowed: ALLOWED_HTTP_STATUS,
            });
        }
        let mut coder = DefaultCoder::new(code, http_status, message);
        if let Some(reference) = reference {
            coder = coder.with_reference(reference);
        }
        self.register(coder)
    }

    /// Insert `coder`, replacing any existing entry. Returns the replaced one.
    pub fn must_register<C>(&self, coder: C) -> Option<Arc<dyn Coder>>
    where
        C: Coder + 'static,
    {
        let code = coder.code();
        self.codes.write().insert(code, Arc::new(coder))
    }

    pub fn lookup(&self, code: Code) -> Option<Arc<dyn Coder>> {
        self.codes.read().get(&code).cloned()
    }

    pub fn contains(&self, code: Code) -> bool {
        self.codes.read().contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.read().is_empty()
    }

    /// The descriptor every lookup miss resolves to.
    ///
    /// This is the registered [`codes::INTERNAL_SERVER`] entry, or a built-in
    /// 500 descriptor when nothing is registered under that code yet.
    pub fn fallback(&self) -> Arc<dyn Coder> {
        self.lookup(codes::INTERNAL_SERVER)
            .unwrap_or_else(builtin_internal_server)
    }

    /// Resolve `code`, falling back to [`Registry::fallback`] on a miss.
    pub fn lookup_or_fallback(&self, code: Code) -> Arc<dyn Coder> {
        self.lookup(code).unwrap_or_else(|| self.fallback())
    }

    /// Descriptor for the first coded node of `err`'s chain.
    ///
    /// Chains without a coded node, and codes that were never registered,
    /// resolve to the fallback.
    pub fn coder_for(&self, err: &(dyn StdError + 'static)) -> Arc<dyn Coder> {
        match chain::first_code(err) {
            Some(code) => self.lookup_or_fallback(code),
            None => self.fallback(),
        }
    }

    /// Like [`Registry::coder_for`] but passes an absent error through.
    pub fn parse_coder(&self, err: Option<&(dyn StdError + 'static)>) -> Option<Arc<dyn Coder>> {
        err.map(|e| self.coder_for(e))
    }

    /// Snapshot of all descriptors, sorted by code.
    pub fn coders(&self) -> Vec<Arc<dyn Coder>> {
        let mut all: Vec<_> = self.codes.read().values().cloned().collect();
        all.sort_by_key(|c| c.code());
        all
    }

    /// Error code documentation as a Markdown table.
    pub fn markdown(&self) -> String {
        let mut out = String::from(
            "| Code | HTTP | Message | Reference |\n\
             |------|------|---------|-----------|\n",
        );
        for coder in self.coders() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                coder.code(),
                coder.http_status(),
                coder.message(),
                coder.reference(),
            );
        }
        out
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("codes", &self.coders())
            .finish()
    }
}

fn builtin_internal_server() -> Arc<dyn Coder> {
    static BUILTIN: OnceLock<Arc<dyn Coder>> = OnceLock::new();
    BUILTIN
        .get_or_init(|| {
            Arc::new(DefaultCoder::new(
                codes::INTERNAL_SERVER,
                500,
                "Internal server error",
            ))
        })
        .clone()
}
