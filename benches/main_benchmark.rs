use criterion::{Criterion, criterion_group, criterion_main};
use nerdbuild::config::{BuildConfig, Profile};
use nerdbuild::directive::{self, Directives, Grammar};
use nerdbuild::modules::ModuleResolver;
use std::hint::black_box;
use std::path::Path;

const MOCK_SOURCE: &str = r#"//------------------------------------------------------------------------------
// Core module
//------------------------------------------------------------------------------
//> def: _POSIX_C_SOURCE=200809L
//> def: _GNU_SOURCE
//> use: util log

#pragma once

#include <stdarg.h>
#include <stdbool.h>
#include <stddef.h>

typedef struct Arena { char *base; size_t used; } Arena;

void arena_init(Arena *arena, size_t size);
void arena_done(Arena *arena);
"#;

const MOCK_BUILD_FILE: &str = r#"
# module overrides
use: util
def: CORE_FAST LEVEL=3
//> define: TRACE
"#;

fn bench_strict_prefix(c: &mut Criterion) {
    let path = Path::new("src/core/core.h");
    c.bench_function("parse_strict_prefix", |b| {
        b.iter(|| {
            let parsed = directive::parse(black_box(MOCK_SOURCE), path, Grammar::StrictPrefix);
            parsed.unwrap().into_iter().collect::<Directives>()
        })
    });
}

fn bench_bare_line(c: &mut Criterion) {
    let path = Path::new("src/core/.build");
    c.bench_function("parse_bare_line", |b| {
        b.iter(|| {
            let parsed = directive::parse(black_box(MOCK_BUILD_FILE), path, Grammar::BareLine);
            parsed.unwrap().into_iter().collect::<Directives>()
        })
    });
}

fn bench_expand_chain(c: &mut Criterion) {
    // A chain m0 -> m1 -> ... -> m31 with a back edge to m0.
    let temp_dir = std::env::temp_dir().join("nerdbuild_bench_expand");
    let src = temp_dir.join("src");
    let count = 32;
    for i in 0..count {
        let dir = src.join(format!("m{i}"));
        std::fs::create_dir_all(&dir).unwrap();
        let next = (i + 1) % count;
        std::fs::write(dir.join(format!("m{i}.h")), format!("//> use: m{next}\n")).unwrap();
    }

    let config = BuildConfig::new(&temp_dir, Profile::Debug, "cc");
    c.bench_function("expand_module_chain", |b| {
        b.iter(|| {
            let mut resolver = ModuleResolver::new(&config);
            resolver.expand(black_box(&["m0".to_string()])).unwrap()
        })
    });
}

criterion_group!(benches, bench_strict_prefix, bench_bare_line, bench_expand_chain);
criterion_main!(benches);
