// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mustekala CLI - Rotating-Proxy HTTP Session Manager
//!
//! Example usage and demonstration of the mustekala library.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use mustekala::{RequestManager, RequestManagerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mustekala=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: mustekala fetch <url> [options]");
                return ExitCode::from(1);
            }
            match parse_options(&args[3..]) {
                Ok(opts) => fetch_url(&args[2], opts).await,
                Err(e) => {
                    eprintln!("{}", e);
                    print_usage();
                    ExitCode::from(1)
                }
            }
        }
        "cookies" => {
            if args.len() < 3 {
                eprintln!("Usage: mustekala cookies <url> [options]");
                return ExitCode::from(1);
            }
            match parse_options(&args[3..]) {
                Ok(opts) => show_cookies(&args[2], opts).await,
                Err(e) => {
                    eprintln!("{}", e);
                    print_usage();
                    ExitCode::from(1)
                }
            }
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("mustekala {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Mustekala - Rotating-Proxy HTTP Session Manager

USAGE:
    mustekala <COMMAND> <url> [OPTIONS]

COMMANDS:
    fetch <url>     Fetch a URL and display the response summary
    cookies <url>   Fetch a URL and display cookies captured from it
    help            Show this help message
    version         Show version information

OPTIONS:
    --proxy <descriptor>    Add a proxy: 'host:port' or 'host:port:user:pass' (repeatable)
    --quota <n>             Requests per proxy before rotation (default 10)
    --cookie-jar <file>     JSON cookie file loaded before and saved after the request

EXAMPLES:
    mustekala fetch https://example.com
    mustekala fetch https://example.com --proxy proxy1.example.com:8080 --quota 5
    mustekala cookies https://example.com --cookie-jar cookies.json

For more information, see: https://github.com/bountyyfi/mustekala
"#
    );
}

struct Options {
    proxies: Vec<String>,
    quota: usize,
    cookie_jar: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> anyhow::Result<Options> {
    let mut opts = Options {
        proxies: Vec::new(),
        quota: 10,
        cookie_jar: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--proxy" => {
                let value = iter.next().context("--proxy requires a descriptor")?;
                opts.proxies.push(value.clone());
            }
            "--quota" => {
                let value = iter.next().context("--quota requires a number")?;
                opts.quota = value
                    .parse()
                    .context("--quota must be a positive integer")?;
            }
            "--cookie-jar" => {
                let value = iter.next().context("--cookie-jar requires a file path")?;
                opts.cookie_jar = Some(PathBuf::from(value));
            }
            other => anyhow::bail!("Unknown option: {}", other),
        }
    }

    Ok(opts)
}

fn build_manager(opts: &Options) -> Option<RequestManager> {
    let config = RequestManagerConfig::new()
        .proxies(opts.proxies.clone())
        .max_requests_per_proxy(opts.quota);

    let manager = match RequestManager::with_config(config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to create request manager: {}", e);
            return None;
        }
    };

    if let Some(ref path) = opts.cookie_jar {
        if path.exists() {
            if let Err(e) = manager.import_cookies_from_json(path) {
                eprintln!("Failed to load cookie jar: {}", e);
                return None;
            }
        }
    }

    Some(manager)
}

async fn fetch_url(url: &str, opts: Options) -> ExitCode {
    println!("Fetching: {}", url);

    let Some(manager) = build_manager(&opts) else {
        return ExitCode::from(1);
    };

    match manager.get(url).await {
        Ok(response) => {
            println!("\n=== Response ===");
            println!("Status: {}", response.status);
            println!("URL: {}", response.url);
            println!("Content-Type: {:?}", response.content_type());
            println!("Size: {} bytes", response.body_len());
            println!("Time: {}ms", response.response_time_ms);

            let set_cookies = response.set_cookies();
            if !set_cookies.is_empty() {
                println!("\n=== Set-Cookie ({}) ===", set_cookies.len());
                for cookie in &set_cookies {
                    println!("  - {}", cookie);
                }
            }

            if let Some(ref path) = opts.cookie_jar {
                if let Err(e) = manager.export_cookies_to_json(path) {
                    eprintln!("Failed to save cookie jar: {}", e);
                    return ExitCode::from(1);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn show_cookies(url: &str, opts: Options) -> ExitCode {
    println!("Fetching: {}", url);

    let Some(manager) = build_manager(&opts) else {
        return ExitCode::from(1);
    };

    match manager.get(url).await {
        Ok(_) => {
            let cookies = manager.get_cookies();

            if cookies.is_empty() {
                println!("\nNo cookies captured");
            } else {
                println!("\n=== Cookies ({}) ===", cookies.len());
                for (name, value) in &cookies {
                    println!("  {} = {}", name, value);
                }
            }

            if let Some(ref path) = opts.cookie_jar {
                if let Err(e) = manager.export_cookies_to_json(path) {
                    eprintln!("Failed to save cookie jar: {}", e);
                    return ExitCode::from(1);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
    }
}
