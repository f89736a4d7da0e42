use std::collections::BTreeMap;

/// One inbound request as the authenticator sees it. Header names are stored lowercase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedRequestEnvelope {
    method: String,
    path_and_query: String,
    host: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl SignedRequestEnvelope {
    pub fn new(
        method: impl Into<String>,
        path_and_query: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path_and_query: path_and_query.into(),
            host: host.into(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a header; repeated names are joined with `, ` as HTTP field combination does.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Path without the query string, as used for allow-rule matching.
    pub fn path(&self) -> &str {
        match self.path_and_query.split_once('?') {
            Some((path, _)) => path,
            None => &self.path_and_query,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// `(request-target)` pseudo header value.
    pub fn request_target(&self) -> String {
        format!(
            "{} {}",
            self.method.to_ascii_lowercase(),
            self.path_and_query
        )
    }

    /// POST/PUT/PATCH, or any request that actually carries bytes, must prove its body.
    pub fn requires_digest(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH") || !self.body.is_empty()
    }
}
