// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP session manager with proxy rotation and cookie persistence

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};

use crate::cookie::{Cookie, CookieJar};
use crate::error::{Error, Result};
use crate::proxy::{ProxyPool, ProxyUrls};
use crate::request::Request;
use crate::response::Response;
use crate::{headers, DEFAULT_USER_AGENT};

lazy_static! {
    /// Built-in default header set
    static ref DEFAULT_HEADERS: HeaderMap = {
        let mut map = HeaderMap::new();
        map.insert(headers::USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        map.insert(headers::ACCEPT, HeaderValue::from_static("*/*"));
        map.insert(headers::PRAGMA, HeaderValue::from_static("no-cache"));
        map
    };
}

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct RequestManagerConfig {
    /// Default headers sent with every request
    pub default_headers: HeaderMap,
    /// Proxy descriptors, `host:port` or `host:port:user:pass`
    pub proxies: Vec<String>,
    /// Requests routed through one proxy before rotating
    pub max_requests_per_proxy: usize,
    /// Default timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Enable cookie handling
    pub handle_cookies: bool,
}

impl Default for RequestManagerConfig {
    fn default() -> Self {
        Self {
            default_headers: DEFAULT_HEADERS.clone(),
            proxies: Vec::new(),
            max_requests_per_proxy: 10,
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            accept_invalid_certs: false,
            handle_cookies: true,
        }
    }
}

impl RequestManagerConfig {
    /// Create a new config
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default header set
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Add a default header. Invalid names or values are ignored.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Set the proxy pool
    pub fn proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Add a proxy descriptor to the pool
    pub fn proxy(mut self, descriptor: impl Into<String>) -> Self {
        self.proxies.push(descriptor.into());
        self
    }

    /// Set the per-proxy request quota
    pub fn max_requests_per_proxy(mut self, quota: usize) -> Self {
        self.max_requests_per_proxy = quota;
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Enable/disable cookie handling
    pub fn handle_cookies(mut self, handle: bool) -> Self {
        self.handle_cookies = handle;
        self
    }
}

/// HTTP session manager
///
/// Issues requests with the default header set merged under per-call
/// overrides, rotates through the proxy pool on a per-proxy quota, and
/// accumulates response cookies in a session-scoped jar.
pub struct RequestManager {
    config: RequestManagerConfig,
    default_headers: RwLock<HeaderMap>,
    pool: ProxyPool,
    cookie_jar: CookieJar,
    /// Client used when the pool is empty
    base_client: Client,
    /// Clients built per pool index, on first use
    proxy_clients: DashMap<usize, Client>,
}

impl RequestManager {
    /// Create a new manager with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(RequestManagerConfig::default())
    }

    /// Create a new manager with custom configuration
    pub fn with_config(config: RequestManagerConfig) -> Result<Self> {
        if config.max_requests_per_proxy == 0 {
            return Err(Error::config("max_requests_per_proxy must be positive"));
        }

        let base_client = build_client(&config, None)?;

        Ok(Self {
            default_headers: RwLock::new(config.default_headers.clone()),
            pool: ProxyPool::new(config.proxies.clone(), config.max_requests_per_proxy),
            cookie_jar: CookieJar::new(),
            base_client,
            proxy_clients: DashMap::new(),
            config,
        })
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get the proxy pool
    pub fn proxy_pool(&self) -> &ProxyPool {
        &self.pool
    }

    /// Get manager configuration
    pub fn config(&self) -> &RequestManagerConfig {
        &self.config
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl AsRef<str>) -> Result<Response> {
        self.execute(Request::get(url)?).await
    }

    /// Execute a POST request
    pub async fn post(&self, url: impl AsRef<str>, body: impl Into<Bytes>) -> Result<Response> {
        self.execute(Request::post(url)?.body(body)).await
    }

    /// Execute a PUT request
    pub async fn put(&self, url: impl AsRef<str>, body: impl Into<Bytes>) -> Result<Response> {
        self.execute(Request::put(url)?.body(body)).await
    }

    /// Execute a DELETE request
    pub async fn delete(&self, url: impl AsRef<str>) -> Result<Response> {
        self.execute(Request::delete(url)?).await
    }

    /// Create a request builder
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> Result<RequestBuilder<'_>> {
        Ok(RequestBuilder {
            manager: self,
            request: Request::new(method, url)?,
        })
    }

    /// Execute a request
    ///
    /// Merges the default headers with the request's own (request wins),
    /// resolves the current proxy, attaches the cookie jar, folds the
    /// response's Set-Cookie headers back into the jar and counts the
    /// request against the proxy quota.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let start = Instant::now();

        let client = match self.pool.current_entry()? {
            Some((index, urls)) => self.client_for(index, &urls)?,
            None => self.base_client.clone(),
        };

        let mut headers = self.default_headers.read().clone();
        for (name, value) in request.headers.iter() {
            headers.insert(name, value.clone());
        }

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);

        if self.config.handle_cookies {
            if let Some(cookie_header) = self.cookie_jar.get_cookie_header(&request.url) {
                builder = builder.header(headers::COOKIE, cookie_header);
            }
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let response = builder.send().await?;
        let response_time = start.elapsed().as_millis() as u64;

        let redirected = response.url() != &request.url;
        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        // Fold Set-Cookie headers into the jar, keyed on the final URL
        if self.config.handle_cookies {
            for cookie in headers.get_all(crate::headers::SET_COOKIE) {
                if let Ok(cookie_str) = cookie.to_str() {
                    self.cookie_jar.add_from_header(cookie_str, &final_url);
                }
            }
        }

        self.pool.rotate();

        let body = response.bytes().await?;

        Ok(Response::new(
            status,
            headers,
            body,
            final_url,
            redirected,
            response_time,
        ))
    }

    /// Resolve the proxy at the cursor without advancing it
    pub fn current_proxy(&self) -> Result<Option<ProxyUrls>> {
        self.pool.current()
    }

    /// Count one request against the current proxy
    pub fn rotate_proxy(&self) {
        self.pool.rotate();
    }

    // Header management

    /// Add or replace a default header. Invalid names or values are
    /// ignored.
    pub fn add_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.default_headers.write().insert(name, value);
        }
    }

    /// Remove a default header. No-op when absent.
    pub fn remove_header(&self, name: impl AsRef<str>) {
        if let Ok(name) = HeaderName::try_from(name.as_ref()) {
            self.default_headers.write().remove(name);
        }
    }

    /// Clear all default headers
    pub fn clear_headers(&self) {
        self.default_headers.write().clear();
    }

    /// Snapshot of the default headers
    pub fn get_headers(&self) -> HeaderMap {
        self.default_headers.read().clone()
    }

    // Cookie management

    /// Insert or overwrite one cookie
    pub fn add_cookie(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) {
        self.cookie_jar
            .add(Cookie::new(name, value).domain(domain).path(path));
    }

    /// Flattened name -> value view of the cookie store
    ///
    /// Lossy: cookies sharing a name across domains or paths collapse to
    /// one entry and the surviving value is unspecified.
    pub fn get_cookies(&self) -> HashMap<String, String> {
        self.cookie_jar.name_values()
    }

    /// Import cookies from a JSON file, merging into the store
    pub fn import_cookies_from_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let jar = CookieJar::from_json(&json)?;
        for cookie in jar.all() {
            self.cookie_jar.add(cookie);
        }
        Ok(())
    }

    /// Export the cookie store to a JSON file
    pub fn export_cookies_to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.cookie_jar.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Import cookies from a Netscape cookies.txt file, merging into the
    /// store
    pub fn import_cookies_from_netscape(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        let jar = CookieJar::from_netscape(&text)?;
        for cookie in jar.all() {
            self.cookie_jar.add(cookie);
        }
        Ok(())
    }

    /// Export the cookie store to a Netscape cookies.txt file
    pub fn export_cookies_to_netscape(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.cookie_jar.to_netscape())?;
        Ok(())
    }

    /// Get or build the client for a pool index
    fn client_for(&self, index: usize, urls: &ProxyUrls) -> Result<Client> {
        if let Some(client) = self.proxy_clients.get(&index) {
            return Ok(client.clone());
        }
        let client = build_client(&self.config, Some(urls))?;
        self.proxy_clients.insert(index, client.clone());
        Ok(client)
    }
}

/// Build a reqwest client, optionally routed through a proxy
///
/// Default headers are applied per request, not baked into the client,
/// because they are mutable at runtime.
fn build_client(config: &RequestManagerConfig, proxy: Option<&ProxyUrls>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .redirect(Policy::limited(config.max_redirects))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .cookie_store(false); // Jar bookkeeping is done manually

    if let Some(urls) = proxy {
        builder = builder
            .proxy(
                reqwest::Proxy::http(urls.http.as_str())
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            )
            .proxy(
                reqwest::Proxy::https(urls.https.as_str())
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            );
    }

    builder.build().map_err(Error::from)
}

/// Builder for executing requests with the manager
pub struct RequestBuilder<'a> {
    manager: &'a RequestManager,
    request: Request,
}

impl<'a> RequestBuilder<'a> {
    /// Set a header
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Set JSON body
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Result<Self> {
        self.request = self.request.json(data)?;
        Ok(self)
    }

    /// Set form body
    pub fn form(mut self, data: &HashMap<String, String>) -> Self {
        self.request = self.request.form(data);
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request = self.request.timeout(timeout);
        self
    }

    /// Execute the request
    pub async fn send(self) -> Result<Response> {
        self.manager.execute(self.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_creation() {
        let manager = RequestManager::new().unwrap();
        assert_eq!(manager.config().max_requests_per_proxy, 10);
        assert!(manager.proxy_pool().is_empty());
    }

    #[test]
    fn test_built_in_default_headers() {
        let manager = RequestManager::new().unwrap();
        let headers = manager.get_headers();
        assert_eq!(
            headers.get("user-agent").map(|v| v.to_str().unwrap()),
            Some(DEFAULT_USER_AGENT)
        );
        assert_eq!(
            headers.get("accept").map(|v| v.to_str().unwrap()),
            Some("*/*")
        );
        assert_eq!(
            headers.get("pragma").map(|v| v.to_str().unwrap()),
            Some("no-cache")
        );
    }

    #[test]
    fn test_zero_quota_rejected() {
        let config = RequestManagerConfig::new().max_requests_per_proxy(0);
        assert!(matches!(
            RequestManager::with_config(config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_add_remove_header_restores_state() {
        let manager = RequestManager::new().unwrap();
        let before = manager.get_headers();

        manager.add_header("x-test", "1");
        assert_eq!(
            manager.get_headers().get("x-test").map(|v| v.to_str().unwrap()),
            Some("1")
        );

        manager.remove_header("x-test");
        assert_eq!(manager.get_headers(), before);
    }

    #[test]
    fn test_remove_absent_header_is_noop() {
        let manager = RequestManager::new().unwrap();
        let before = manager.get_headers();
        manager.remove_header("x-never-set");
        assert_eq!(manager.get_headers(), before);
    }

    #[test]
    fn test_clear_headers() {
        let manager = RequestManager::new().unwrap();
        manager.clear_headers();
        assert!(manager.get_headers().is_empty());
    }

    #[test]
    fn test_add_cookie_and_flatten() {
        let manager = RequestManager::new().unwrap();
        manager.add_cookie("session_id", "12345", "example.com", "/");

        let cookies = manager.get_cookies();
        assert_eq!(cookies["session_id"], "12345");
    }

    #[test]
    fn test_current_proxy_empty_pool() {
        let manager = RequestManager::new().unwrap();
        assert!(manager.current_proxy().unwrap().is_none());
    }

    #[test]
    fn test_rotation_through_manager() {
        let config = RequestManagerConfig::new()
            .proxy("a:1")
            .proxy("b:2")
            .max_requests_per_proxy(2);
        let manager = RequestManager::with_config(config).unwrap();

        manager.rotate_proxy();
        assert_eq!(manager.proxy_pool().current_index(), 0);
        manager.rotate_proxy();
        assert_eq!(manager.proxy_pool().current_index(), 1);
    }
}
