//! # orca-response
//!
//! Turns handler outcomes into JSON envelopes.
//!
//! ```text
//! success  200  {"code":100001,"data":{..},"status":200,"message":"menu created"}
//! failure  4xx  {"code":100102,"data":null,"status":404,"message":"Menu not found","reference":""}
//! ```
//!
//! Failures are resolved through the [`Registry`]: the outermost coded node
//! picks the status and the user-safe message. The internal diagnostics of
//! the chain never reach the body; they are logged as a full trace instead.

use std::error::Error as StdError;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use orca_error::format::{self, FormatOptions};
use orca_error::{codes, Code, Registry};
use serde::{Deserialize, Serialize};

/// Body of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessBody<T> {
    pub code: Code,
    pub data: T,
    pub status: u16,
    pub message: String,
}

/// Body of a failed reply. `data` is always `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub code: Code,
    pub data: Option<serde_json::Value>,
    pub status: u16,
    pub message: String,
    pub reference: String,
}

/// A status plus a serializable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<B> {
    status: StatusCode,
    body: B,
}

impl<B: Serialize> Reply<B> {
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.body)
    }

    /// Build an `http::Response` with a JSON body.
    ///
    /// A body that fails to serialize is replaced by a plain 500 envelope.
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let (status, bytes) = match self.to_json() {
            Ok(bytes) => (self.status, bytes),
            Err(e) => {
                tracing::error!(error = %e, "response body failed to serialize");
                (StatusCode::INTERNAL_SERVER_ERROR, unserializable_body())
            }
        };

        let mut resp = http::Response::new(bytes);
        *resp.status_mut() = status;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        resp
    }
}

fn unserializable_body() -> Vec<u8> {
    let body = FailureBody {
        code: codes::INTERNAL_SERVER,
        data: None,
        status: 500,
        message: "Internal server error".to_string(),
        reference: String::new(),
    };
    serde_json::to_vec(&body).unwrap_or_default()
}

/// Maps errors and data to replies using a shared registry.
#[derive(Debug, Clone)]
pub struct Responder {
    registry: Arc<Registry>,
}

impl Responder {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Failure reply for `err`.
    ///
    /// Logs the full chain: `error` level for 5xx, `warn` otherwise.
    pub fn fail(&self, err: &(dyn StdError + 'static)) -> Reply<FailureBody> {
        let coder = self.registry.coder_for(err);
        let status = StatusCode::from_u16(coder.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let trace = format::render(err, Some(&self.registry), FormatOptions::TRACE);
        if status.is_server_error() {
            tracing::error!(code = %coder.code(), status = status.as_u16(), "{}", trace);
        } else {
            tracing::warn!(code = %coder.code(), status = status.as_u16(), "{}", trace);
        }

        Reply {
            status,
            body: FailureBody {
                code: coder.code(),
                data: None,
                status: status.as_u16(),
                message: coder.message().to_string(),
                reference: coder.reference().to_string(),
            },
        }
    }

    /// 200 reply carrying `data`.
    pub fn success<T: Serialize>(&self, data: T, message: impl Into<String>) -> Reply<SuccessBody<T>> {
        Reply {
            status: StatusCode::OK,
            body: SuccessBody {
                code: codes::SUCCESS,
                data,
                status: StatusCode::OK.as_u16(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_error::{with_code, Error};
    use serde_json::{json, Value};

    fn responder() -> Responder {
        let registry = Registry::new();
        codes::bootstrap(&registry).unwrap();
        Responder::new(Arc::new(registry))
    }

    #[test]
    fn not_found_uses_registered_status_and_message() {
        let r = responder();
        let err = with_code!(codes::MENU_NOT_FOUND, "menu `{}` missing from table", "users");
        let reply = r.fail(&err);
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.body().message, "Menu not found");
        assert!(!reply.body().message.contains("users"));
    }

    #[test]
    fn failure_body_shape() {
        let r = responder();
        let err = Error::wrap(with_code!(codes::VALIDATION, "label empty"), "POST /menus");
        let json: Value = serde_json::from_slice(&r.fail(&err).to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "code": 100006,
                "data": null,
                "status": 400,
                "message": "Validation failed",
                "reference": ""
            })
        );
    }

    #[test]
    fn uncoded_error_is_internal() {
        let r = responder();
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let reply = r.fail(&io);
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body().code, codes::INTERNAL_SERVER);
        assert_eq!(reply.body().message, "Internal server error");

        let reply = r.fail(&Error::new("plain"));
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn reference_is_forwarded() {
        let registry = Registry::new();
        registry
            .register_code(Code(300001), 403, "Forbidden", Some("https://docs.example/300001"))
            .unwrap();
        let r = Responder::new(Arc::new(registry));
        let reply = r.fail(&Error::with_code(Code(300001), "role lacks menu:write"));
        assert_eq!(reply.status(), StatusCode::FORBIDDEN);
        assert_eq!(reply.body().reference, "https://docs.example/300001");
    }

    #[test]
    fn success_body_shape() {
        let r = responder();
        let reply = r.success(json!({"label": "Users"}), "menu loaded");
        assert_eq!(reply.status(), StatusCode::OK);
        let json: Value = serde_json::from_slice(&reply.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "code": 100001,
                "data": {"label": "Users"},
                "status": 200,
                "message": "menu loaded"
            })
        );
    }

    #[test]
    fn success_with_unit_data_is_null() {
        let r = responder();
        let bytes = r.success((), "deleted").to_json().unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"], Value::Null);
    }

    #[test]
    fn into_http_sets_status_and_content_type() {
        let r = responder();
        let resp = r.fail(&with_code!(codes::BIND, "bad json")).into_http();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        let body: FailureBody = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.code, codes::BIND);
        assert_eq!(body.data, None);
    }

    #[test]
    fn unserializable_data_becomes_500() {
        use std::collections::HashMap;

        // Non-string map keys cannot be JSON object keys.
        let mut data = HashMap::new();
        data.insert((1u8, 2u8), "pair");
        let resp = responder().success(data, "oops").into_http();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: FailureBody = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.code, codes::INTERNAL_SERVER);
    }
}
