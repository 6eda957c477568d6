// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Mustekala - Rotating-Proxy HTTP Session Manager
//!
//! A pure Rust HTTP session layer for scanning and scraping workloads.
//! Wraps a reqwest client with round-robin proxy rotation, a mutable
//! default header set, and a session-scoped cookie jar that persists to
//! JSON and Netscape (cookies.txt) files.
//!
//! ## Features
//!
//! - Proxy rotation: round-robin over `host:port[:user:pass]` descriptors
//!   with a per-proxy request quota
//! - Cookie persistence: jar accumulated from Set-Cookie headers, with
//!   JSON and Netscape import/export
//! - Header management: mutable defaults merged with per-call overrides,
//!   call-time values win
//! - No hidden policy: transport errors propagate untouched, no retries
//!
//! ## Example
//!
//! ```rust,no_run
//! use mustekala::{RequestManager, RequestManagerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RequestManagerConfig::new()
//!         .proxy("proxy1.example.com:8080")
//!         .proxy("proxy2.example.com:8080:user:pass")
//!         .max_requests_per_proxy(5);
//!
//!     let manager = RequestManager::with_config(config)?;
//!
//!     let response = manager.get("https://example.com").await?;
//!     println!("{} ({} bytes)", response.status, response.body_len());
//!
//!     manager.export_cookies_to_json("cookies.json")?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod cookie;
pub mod error;
pub mod proxy;
pub mod request;
pub mod response;

// Re-exports for convenience

pub use client::{RequestBuilder, RequestManager, RequestManagerConfig};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use error::{Error, Result};
pub use proxy::{parse_proxy, ProxyPool, ProxyUrls};
pub use request::Request;
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.149 Safari/537.36";

/// Common HTTP headers
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";
    pub const USER_AGENT: &str = "user-agent";
    pub const PRAGMA: &str = "pragma";
    pub const AUTHORIZATION: &str = "authorization";
}

/// Mustekala version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
