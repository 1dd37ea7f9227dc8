use serde::{Deserialize, Serialize};

/// HTTP statuses a registered code may map to.
///
/// | Status | Meaning                                   |
/// |--------|-------------------------------------------|
/// | `200`  | request succeeded                         |
/// | `400`  | malformed request, server cannot proceed  |
/// | `401`  | client is not authenticated               |
/// | `403`  | client may not access the resource        |
/// | `404`  | resource not found                        |
/// | `500`  | internal server failure                   |
pub const ALLOWED_HTTP_STATUS: [u16; 6] = [200, 400, 401, 403, 404, 500];

/// Returns `true` if `status` may be attached to a registered code.
#[inline]
pub fn is_allowed_status(status: u16) -> bool {
    ALLOWED_HTTP_STATUS.contains(&status)
}

/// A stable numeric error category.
///
/// Codes are plain integers on the wire. Equality and hashing use the
/// number only, so two `Code`s built from the same value are the same code.
///
/// # Code Ranges
///
/// | Range             | Purpose                   |
/// |-------------------|---------------------------|
/// | `100001 - 100099` | common / base errors      |
/// | `100101 - 100199` | menu module               |
/// | `100201+`         | free for further modules  |
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Code(pub u32);

impl Code {
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Code {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::fmt::Debug for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Code({})", self.0)
    }
}

/// A registered descriptor translating a [`Code`] into something a client
/// can act on.
pub trait Coder: Send + Sync {
    /// The code this descriptor is registered under.
    fn code(&self) -> Code;

    /// Associated HTTP status.
    fn http_status(&self) -> u16;

    /// User-safe message. Never contains internal diagnostics.
    fn message(&self) -> &str;

    /// Link to longer documentation, empty when there is none.
    fn reference(&self) -> &str;
}

/// The stock [`Coder`] built by `Registry::register_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCoder {
    pub code: Code,
    pub http: u16,
    pub message: String,
    pub reference: String,
}

impl DefaultCoder {
    pub fn new(code: Code, http: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            http,
            message: message.into(),
            reference: String::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}

impl Coder for DefaultCoder {
    fn code(&self) -> Code {
        self.code
    }

    /// A zero status reads back as 500.
    fn http_status(&self) -> u16 {
        if self.http == 0 {
            500
        } else {
            self.http
        }
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn reference(&self) -> &str {
        &self.reference
    }
}

impl core::fmt::Debug for dyn Coder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Coder")
            .field("code", &self.code())
            .field("http_status", &self.http_status())
            .field("message", &self.message())
            .field("reference", &self.reference())
            .finish()
    }
}
