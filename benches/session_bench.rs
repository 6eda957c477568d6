// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mustekala::proxy::parse_proxy;
use mustekala::{Cookie, CookieJar};

fn proxy_parsing_benchmark(c: &mut Criterion) {
    let descriptors = [
        "proxy1.example.com:8080",
        "proxy2.example.com:8080:user1:pass1",
        "proxy3.example.com:3128",
    ];

    c.bench_function("parse_proxy", |b| {
        b.iter(|| {
            for descriptor in &descriptors {
                let _ = black_box(parse_proxy(descriptor));
            }
        })
    });
}

fn cookie_header_benchmark(c: &mut Criterion) {
    let jar = CookieJar::new();
    for i in 0..100 {
        jar.add(Cookie::new(format!("cookie{}", i), "value").domain("example.com"));
    }
    let url = url::Url::parse("https://example.com/path").unwrap();

    c.bench_function("cookie_header", |b| {
        b.iter(|| black_box(jar.get_cookie_header(&url)))
    });
}

criterion_group!(benches, proxy_parsing_benchmark, cookie_header_benchmark);
criterion_main!(benches);
