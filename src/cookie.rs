// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar with JSON and Netscape (cookies.txt) persistence

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// A single HTTP cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: SameSite,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// Cookie sent with all requests
    #[default]
    None,
    /// Cookie sent with same-site and top-level navigations
    Lax,
    /// Cookie only sent with same-site requests
    Strict,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set http_only flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set same_site attribute
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie matches the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !url.path().starts_with(&self.path) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        if self.is_expired() {
            return false;
        }

        true
    }

    /// Check if domain matches
    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Parse a Set-Cookie header value
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let mut cookie = Cookie::new(name.trim(), value.trim());

        // Default domain to request host
        cookie.domain = url.host_str().unwrap_or("").to_string();

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                    "path" => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                        }
                    }
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            _ => SameSite::None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Cookie record as stored in JSON cookie files
#[derive(Debug, Serialize, Deserialize)]
struct CookieRecord {
    name: String,
    value: String,
    domain: String,
    #[serde(default = "default_path")]
    path: String,
}

fn default_path() -> String {
    "/".to_string()
}

/// Thread-safe cookie storage
///
/// Keys are unique per (domain, path, name) triple; adding a cookie with
/// an existing key overwrites the stored entry.
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Add a cookie to the jar
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        entry.push(cookie);
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// Get all cookies matching a URL
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.remove_expired();

        let mut result = Vec::new();
        for entry in self.cookies.iter() {
            for cookie in entry.value().iter() {
                if cookie.matches(url) {
                    result.push(cookie.clone());
                }
            }
        }
        result
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// All cookies in the jar
    pub fn all(&self) -> Vec<Cookie> {
        self.cookies.iter().flat_map(|e| e.value().clone()).collect()
    }

    /// Flatten to a name -> value map
    ///
    /// Lossy: cookies sharing a name across domains or paths collapse to
    /// one entry and the surviving value is unspecified.
    pub fn name_values(&self) -> HashMap<String, String> {
        self.all().into_iter().map(|c| (c.name, c.value)).collect()
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) {
        if let Some(mut cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name || c.path != path);
        }
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Clear cookies for a specific domain
    pub fn clear_domain(&self, domain: &str) {
        self.cookies.remove(domain);
    }

    /// Remove expired cookies
    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export as a JSON array of `{name, value, domain, path}` records
    pub fn to_json(&self) -> serde_json::Result<String> {
        let records: Vec<CookieRecord> = self
            .all()
            .into_iter()
            .map(|c| CookieRecord {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
            })
            .collect();
        serde_json::to_string_pretty(&records)
    }

    /// Import from a JSON array of `{name, value, domain, path}` records
    ///
    /// A missing `path` defaults to `/`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let records: Vec<CookieRecord> = serde_json::from_str(json)?;
        let jar = CookieJar::new();
        for record in records {
            jar.add(
                Cookie::new(record.name, record.value)
                    .domain(record.domain)
                    .path(record.path),
            );
        }
        Ok(jar)
    }

    /// Render the jar in Netscape cookies.txt format
    ///
    /// Every stored cookie is written unconditionally; session cookies
    /// get expiry 0. HttpOnly cookies use the `#HttpOnly_` domain prefix.
    pub fn to_netscape(&self) -> String {
        let mut out = String::from(
            "# Netscape HTTP Cookie File\n# This is a generated file! Do not edit.\n\n",
        );
        for cookie in self.all() {
            let domain = if cookie.http_only {
                format!("#HttpOnly_{}", cookie.domain)
            } else {
                cookie.domain.clone()
            };
            let include_subdomains = if cookie.domain.starts_with('.') {
                "TRUE"
            } else {
                "FALSE"
            };
            let secure = if cookie.secure { "TRUE" } else { "FALSE" };
            let expires = cookie.expires.map_or(0, |e| e.timestamp());
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                domain, include_subdomains, cookie.path, secure, expires, cookie.name, cookie.value
            ));
        }
        out
    }

    /// Parse a Netscape cookies.txt document
    ///
    /// Blank and comment lines are skipped; the `#HttpOnly_` domain
    /// prefix sets the http_only flag. Malformed rows fail with a
    /// [`Error::Cookie`] error.
    pub fn from_netscape(text: &str) -> Result<Self> {
        let jar = CookieJar::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (line, http_only) = match line.strip_prefix("#HttpOnly_") {
                Some(rest) => (rest, true),
                None => (line, false),
            };
            if line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 {
                return Err(Error::cookie(format!(
                    "malformed cookie line (expected 7 fields, got {}): {}",
                    fields.len(),
                    line
                )));
            }

            // Subdomain flag (field 1) is implied by the leading dot on
            // the domain; expiry 0 or empty means session cookie.
            let mut cookie = Cookie::new(fields[5], fields[6])
                .domain(fields[0])
                .path(fields[2])
                .secure(fields[3].eq_ignore_ascii_case("TRUE"))
                .http_only(http_only);

            match fields[4] {
                "" | "0" => {}
                raw => {
                    let secs = raw.parse::<i64>().map_err(|_| {
                        Error::cookie(format!("invalid cookie expiry '{}'", raw))
                    })?;
                    if let Some(expires) = Utc.timestamp_opt(secs, 0).single() {
                        cookie = cookie.expires(expires);
                    }
                }
            }

            jar.add(cookie);
        }
        Ok(jar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://example.com/path").unwrap();
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_cookie_jar() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/path").unwrap();

        jar.add(Cookie::new("test", "value").domain("example.com"));
        assert_eq!(jar.len(), 1);

        let cookies = jar.get_cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "test");
    }

    #[test]
    fn test_add_overwrites_same_key() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("session", "old").domain("example.com"));
        jar.add(Cookie::new("session", "new").domain("example.com"));

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.name_values()["session"], "new");
    }

    #[test]
    fn test_same_name_distinct_paths() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("pref", "a").domain("example.com").path("/"));
        jar.add(Cookie::new("pref", "b").domain("example.com").path("/admin"));

        assert_eq!(jar.len(), 2);
        // Flattened view collapses to one entry
        assert_eq!(jar.name_values().len(), 1);
    }

    #[test]
    fn test_secure_cookie_not_sent_over_http() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("s", "1").domain("example.com").secure(true));

        let https = Url::parse("https://example.com/").unwrap();
        let http = Url::parse("http://example.com/").unwrap();
        assert_eq!(jar.get_cookies(&https).len(), 1);
        assert!(jar.get_cookies(&http).is_empty());
    }

    #[test]
    fn test_json_records_roundtrip() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("session", "abc").domain("example.com"));
        jar.add(Cookie::new("token", "xyz").domain("api.example.com").path("/v1"));

        let restored = CookieJar::from_json(&jar.to_json().unwrap()).unwrap();
        assert_eq!(restored.name_values(), jar.name_values());
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_json_missing_path_defaults() {
        let json = r#"[{"name": "a", "value": "1", "domain": "example.com"}]"#;
        let jar = CookieJar::from_json(json).unwrap();
        assert_eq!(jar.all()[0].path, "/");
    }

    #[test]
    fn test_netscape_roundtrip() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("session", "abc123").domain(".example.com").secure(true));
        jar.add(Cookie::new("token", "xyz").domain("api.example.com").path("/v1"));
        jar.add(Cookie::new("hidden", "1").domain("example.com").http_only(true));

        let restored = CookieJar::from_netscape(&jar.to_netscape()).unwrap();
        assert_eq!(restored.len(), 3);

        let mut original: Vec<_> = jar
            .all()
            .into_iter()
            .map(|c| (c.domain, c.path, c.name, c.value, c.secure, c.http_only))
            .collect();
        let mut roundtripped: Vec<_> = restored
            .all()
            .into_iter()
            .map(|c| (c.domain, c.path, c.name, c.value, c.secure, c.http_only))
            .collect();
        original.sort();
        roundtripped.sort();
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_netscape_skips_comments_and_blanks() {
        let text = "# Netscape HTTP Cookie File\n\n# comment\nexample.com\tFALSE\t/\tFALSE\t0\tname\tvalue\n";
        let jar = CookieJar::from_netscape(text).unwrap();
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.name_values()["name"], "value");
    }

    #[test]
    fn test_netscape_httponly_prefix() {
        let text = "#HttpOnly_example.com\tFALSE\t/\tFALSE\t0\tsecret\tv\n";
        let jar = CookieJar::from_netscape(text).unwrap();
        let cookie = &jar.all()[0];
        assert_eq!(cookie.domain, "example.com");
        assert!(cookie.http_only);
    }

    #[test]
    fn test_netscape_rejects_malformed_line() {
        let text = "example.com\tFALSE\t/\tFALSE\t0\tname\n";
        assert!(matches!(
            CookieJar::from_netscape(text),
            Err(Error::Cookie(_))
        ));
    }

    #[test]
    fn test_netscape_expiry_preserved() {
        let jar = CookieJar::new();
        let expires = Utc.timestamp_opt(4_102_444_800, 0).single().unwrap();
        jar.add(Cookie::new("keep", "1").domain("example.com").expires(expires));

        let restored = CookieJar::from_netscape(&jar.to_netscape()).unwrap();
        assert_eq!(restored.all()[0].expires, Some(expires));
    }
}
