use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use search_plan::config::{CompilerConfig, SchemaConfig};
use search_plan::lexer::Lexer;
use search_plan::parser::Parser;
use search_plan::query::Query;
use search_plan::{Includes, Joins, SearchCompiler, Visitor};
use std::hint::black_box;

fn create_compiler() -> SearchCompiler {
    SearchCompiler::from_config(&SchemaConfig::default(), CompilerConfig::default())
        .expect("default schema is valid")
}

fn test_cases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("simple", r#"name:"web01""#),
        ("medium", r#"name:web01 services.name:ssh services.port:22"#),
        (
            "complex",
            r#"name:web01 name:web02 os:linux services.name:ssh services.name:http vulns.name:"ms08-067" vulns.exploited:true tags:dmz"#,
        ),
    ]
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, search) in test_cases() {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &search, |b, &search| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(search)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：语法分析性能
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, search) in test_cases() {
        let tokens: Vec<_> = Lexer::new(search).collect();

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| black_box(Parser::new(black_box(tokens)).parse()))
        });
    }

    group.finish();
}

// 基准测试：关联规划性能（只计算访问者，不含解析）
fn benchmark_visitors(c: &mut Criterion) {
    let compiler = create_compiler();
    let mut group = c.benchmark_group("visitor_performance");

    for (name, search) in test_cases() {
        let tree = Query::new(search, "Host", compiler.resolver())
            .expect("benchmark search compiles")
            .into_tree();

        group.bench_with_input(BenchmarkId::new("joins", name), &tree, |b, tree| {
            b.iter(|| black_box(Joins.visit(black_box(tree))))
        });
        group.bench_with_input(BenchmarkId::new("includes", name), &tree, |b, tree| {
            b.iter(|| black_box(Includes.visit(black_box(tree))))
        });
    }

    group.finish();
}

// 基准测试：端到端编译
fn benchmark_compile(c: &mut Criterion) {
    let compiler = create_compiler();
    let mut group = c.benchmark_group("compile_performance");

    for (name, search) in test_cases() {
        group.bench_with_input(BenchmarkId::new("compile", name), &search, |b, &search| {
            b.iter(|| black_box(compiler.compile(black_box(search), "Host")))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_visitors,
    benchmark_compile
);
criterion_main!(benches);
