use std::fmt;

use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which bearer credential a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Authorization {
    #[default]
    None,
    /// Client-credential token representing the application.
    AppLevel,
    /// Token of the logged-in user.
    UserLevel,
}

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Path below the configured API root, e.g. `/creations`.
    Path(String),
    /// Fully qualified URL used as-is (storage buckets, ping URLs).
    Absolute(String),
}

/// The single file part of a multipart body.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryPart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl fmt::Debug for BinaryPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryPart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A call as built by the API layer, before authorization and URL
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: HttpMethod,
    pub target: Target,
    pub authorization: Authorization,
    pub headers: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
    pub binary: Option<BinaryPart>,
    /// Skip the API's `Accept`/`Accept-Language` headers. Foreign hosts
    /// such as storage buckets reject or ignore them.
    pub without_default_headers: bool,
}

impl Request {
    pub fn new(method: HttpMethod, target: Target) -> Self {
        Self {
            method,
            target,
            authorization: Authorization::None,
            headers: Vec::new(),
            fields: Vec::new(),
            binary: None,
            without_default_headers: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, Target::Path(path.into()))
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, Target::Path(path.into()))
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, Target::Path(path.into()))
    }

    pub fn absolute(method: HttpMethod, url: impl Into<String>) -> Self {
        Self::new(method, Target::Absolute(url.into()))
    }

    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds the field only when a value is present; absent values are left
    /// out of the body entirely.
    pub fn with_optional_field<V: Into<String>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_field(name, value),
            None => self,
        }
    }

    pub fn with_binary(mut self, part: BinaryPart) -> Self {
        self.binary = Some(part);
        self
    }

    pub fn without_default_headers(mut self) -> Self {
        self.without_default_headers = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A fully resolved call: absolute URL, final headers, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
    pub binary: Option<BinaryPart>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            fields: Vec::new(),
            binary: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.header("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}
