//! Request routing.
//!
//! | Route                   | Handler  |
//! |-------------------------|----------|
//! | `GET    /menus`         | list, filters `code` `label` `type`, paging `page` `limit` |
//! | `GET    /menus/{code}`  | get      |
//! | `POST   /menus`         | create   |
//! | `PUT    /menus/{code}`  | update   |
//! | `DELETE /menus?codes=a,b` | delete |
//!
//! Handlers return `OrcaResult`; the router turns errors into failure
//! envelopes in one place.

use http::{Method, Request, Response};
use orca_error::{codes, with_code, Error, OrcaResult, ResultExt};
use orca_response::Responder;
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::menu::{ListQuery, Menu, MenuStore};
use crate::ServerError;

pub struct App {
    responder: Responder,
    menus: MenuStore,
}

impl App {
    pub fn new(responder: Responder, menus: MenuStore) -> Self {
        Self { responder, menus }
    }

    pub fn menus(&self) -> &MenuStore {
        &self.menus
    }

    pub fn handle(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        let path = req.uri().path();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let query = req.uri().query().unwrap_or("");

        let result = match (req.method(), segments.as_slice()) {
            (&Method::GET, ["menus"]) => self.list(query),
            (&Method::GET, ["menus", code]) => path_code(code).and_then(|code| self.get(&code)),
            (&Method::POST, ["menus"]) => self.create(req.body()),
            (&Method::PUT, ["menus", code]) => {
                path_code(code).and_then(|code| self.update(&code, req.body()))
            }
            (&Method::DELETE, ["menus"]) => self.delete(query),
            _ => Err(with_code!(
                codes::PAGE_NOT_FOUND,
                "no route for {} {}",
                req.method(),
                path
            )),
        };

        match result {
            Ok(resp) => resp,
            Err(err) => self.responder.fail(&err).into_http(),
        }
    }

    /// Reply to bytes that never became a request.
    pub fn reject(&self, err: ServerError) -> Response<Vec<u8>> {
        let err = Error::wrap_with_code(err, codes::BAD_REQUEST, "reading request");
        self.responder.fail(&err).into_http()
    }

    fn list(&self, query: &str) -> OrcaResult<Response<Vec<u8>>> {
        let q: ListQuery = serde_html_form::from_str(query)
            .wrap_with_code(codes::BIND, format!("decoding list query `{}`", query))?;
        let list = self.menus.list(&q);
        Ok(self.responder.success(list, "menus listed").into_http())
    }

    fn get(&self, code: &str) -> OrcaResult<Response<Vec<u8>>> {
        let menu = self.menus.get(code).wrap(format!("GET /menus/{}", code))?;
        Ok(self.responder.success(menu, "menu loaded").into_http())
    }

    fn create(&self, body: &[u8]) -> OrcaResult<Response<Vec<u8>>> {
        let menu: Menu = serde_json::from_slice(body).wrap_with_code(codes::BIND, "decoding menu body")?;
        let menu = self.menus.insert(menu).wrap("POST /menus")?;
        Ok(self.responder.success(menu, "menu created").into_http())
    }

    fn update(&self, code: &str, body: &[u8]) -> OrcaResult<Response<Vec<u8>>> {
        // Unknown code wins over a bad body.
        self.menus.get(code).wrap(format!("PUT /menus/{}", code))?;
        let menu: Menu = serde_json::from_slice(body).wrap_with_code(codes::BIND, "decoding menu body")?;
        let menu = self.menus.update(code, menu).wrap(format!("PUT /menus/{}", code))?;
        Ok(self.responder.success(menu, "menu updated").into_http())
    }

    fn delete(&self, query: &str) -> OrcaResult<Response<Vec<u8>>> {
        let q: DeleteQuery = serde_html_form::from_str(query)
            .wrap_with_code(codes::BIND, format!("decoding delete query `{}`", query))?;
        let removed = self.menus.delete(&q.split()).wrap("DELETE /menus")?;
        Ok(self
            .responder
            .success(serde_json::json!({ "removed": removed }), "menus deleted")
            .into_http())
    }
}

/// `codes=a,b` and `codes=a&codes=b` both name two menus.
#[derive(Debug, Default, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    codes: Vec<String>,
}

impl DeleteQuery {
    fn split(&self) -> Vec<String> {
        self.codes
            .iter()
            .flat_map(|v| v.split(','))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Menu code from a path segment, `%XX` escapes decoded.
fn path_code(segment: &str) -> OrcaResult<String> {
    let code = percent_decode_str(segment)
        .decode_utf8()
        .wrap_with_code(codes::BIND, format!("decoding path segment `{}`", segment))?;
    Ok(code.into_owned())
}
