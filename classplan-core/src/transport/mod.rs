//! The seam between the core and whatever carries requests to the catalog API.
//!
//! The core only builds `ApiRequest`s and decodes JSON; an implementation of
//! `Transport` (HTTP in the CLI, `MemoryTransport` in tests) moves the bytes.

mod memory;

pub use memory::MemoryTransport;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::ClassplanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    /// Form-encoded body.
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

/// Request parameters, kept in key order so their serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ApiParams(BTreeMap<String, ParamValue>);

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.0
            .insert(key.to_string(), ParamValue::Scalar(value.to_string()));
    }

    /// Empty lists are left out.
    pub fn insert_list<I>(&mut self, key: &str, values: I)
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();

        if !values.is_empty() {
            self.0.insert(key.to_string(), ParamValue::List(values));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form pairs; list values repeat under `key[]`.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .flat_map(|(key, value)| match value {
                ParamValue::Scalar(v) => vec![(key.clone(), v.clone())],
                ParamValue::List(values) => values
                    .iter()
                    .map(|v| (format!("{key}[]"), v.clone()))
                    .collect(),
            })
            .collect()
    }

    pub fn form_body(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiRequest {
    pub uri: String,
    pub method: Method,
    pub params: ApiParams,
}

impl ApiRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        ApiRequest {
            uri: uri.into(),
            method: Method::Get,
            params: ApiParams::new(),
        }
    }

    pub fn post(uri: impl Into<String>, params: ApiParams) -> Self {
        ApiRequest {
            uri: uri.into(),
            method: Method::Post,
            params,
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.uri)
        } else {
            write!(f, "{}?{}", self.uri, self.params.form_body())
        }
    }
}

/// Moves a request to the catalog API and returns the raw response body.
///
/// Implementations map non-success responses to `ClassplanError::Status`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ClassplanResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_body_is_independent_of_insertion_order() {
        let mut a = ApiParams::new();
        a.insert_list("subject", [3, 4]);
        a.insert("term", 12);

        let mut b = ApiParams::new();
        b.insert("term", 12);
        b.insert_list("subject", [3, 4]);
        b.insert_list("room", Vec::<u32>::new());

        assert_eq!(a, b);
        assert_eq!(a.form_body(), "subject[]=3&subject[]=4&term=12");
    }

    #[test]
    fn request_display_includes_params() {
        let mut params = ApiParams::new();
        params.insert_list("block", [5]);

        assert_eq!(ApiRequest::get("terms.json").to_string(), "terms.json");
        assert_eq!(
            ApiRequest::post("section/find.json", params).to_string(),
            "section/find.json?block[]=5"
        );
    }
}
