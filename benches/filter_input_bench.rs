use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use filter_input::catalog::{Candidates, Language, SearchType};
use filter_input::lexer::tokenize;
use filter_input::parser::Parser;
use filter_input::replace::apply_replacement;
use filter_input::resolver::{resolve, resolve_text};
use filter_input::sql_compiler::SqlCompiler;
use std::hint::black_box;

fn test_cases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("simple", "severity : 1"),
        ("medium", "severity : 1 AND status : ABNORMAL OR alert_name : cpu usage high"),
        (
            "complex",
            "  severity : 1 AND   tags.hostname : web01 or strategy_id : 42 AND description : \"disk full\" AND ip : 10.0.0.1 ",
        ),
    ]
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, query) in test_cases() {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &query, |b, &query| {
            b.iter(|| black_box(tokenize(black_box(query))))
        });
    }

    group.finish();
}

// 基准测试：光标解析性能, 光标位于末尾
fn benchmark_resolver(c: &mut Criterion) {
    let candidates = Candidates::for_search_type(SearchType::Alert, Language::Zh);
    let mut group = c.benchmark_group("resolver_performance");

    for (name, query) in test_cases() {
        // 预先词法分析
        let tokens = tokenize(query);
        group.bench_with_input(BenchmarkId::new("resolve", name), &tokens, |b, tokens| {
            b.iter(|| black_box(resolve(query, black_box(query.len()), tokens, &candidates)))
        });
        group.bench_with_input(BenchmarkId::new("resolve_text", name), &query, |b, &query| {
            b.iter(|| black_box(resolve_text(black_box(query), query.len(), &candidates)))
        });
    }

    group.finish();
}

// 基准测试：完整的补全流程 (解析光标 + 拼接候选项)
fn benchmark_end_to_end(c: &mut Criterion) {
    let candidates = Candidates::for_search_type(SearchType::Alert, Language::Zh);
    let compiler = SqlCompiler::new("alert", "description");
    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, query) in test_cases() {
        group.bench_with_input(BenchmarkId::new("replace", name), &query, |b, &query| {
            b.iter(|| {
                let (text, cursor, focus) = resolve_text(black_box(query), 3, &candidates);
                black_box(apply_replacement(&text, &focus, "级别 : ", " "));
                black_box(cursor)
            })
        });
        group.bench_with_input(BenchmarkId::new("compile", name), &query, |b, &query| {
            b.iter(|| {
                let tokens = tokenize(black_box(query));
                let mut parser = Parser::new(&tokens).with_candidates(&candidates);
                match parser.parse() {
                    Ok(ast) => black_box(compiler.compile(&ast).ok()),
                    Err(_) => panic!("解析失败"),
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_lexer, benchmark_resolver, benchmark_end_to_end);
criterion_main!(benches);
