//! Tree Operations Benchmarks
//!
//! Benchmarks for snapshot parsing, enumeration and predicate queries.
//!
//! Run with: `cargo bench --bench tree_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use uiprobe::prelude::*;

const ANDROID_NOTES: &str = include_str!("../fixtures/android_notes.xml");
const IOS_LOGIN: &str = include_str!("../fixtures/ios_login.xml");

/// A list screen with `rows` clickable rows of two labels each
fn synthetic_list(rows: usize) -> String {
    let flags = r#"checkable="false" focusable="false" long-clickable="false" scrollable="false" checked="false" focused="false" password="false""#;
    let mut xml = String::from(r#"<tree sessionId="bench" osType="android">"#);
    xml.push_str(r#"<window.main type="window.main" packageName="bench" x="0" y="0" width="1080" height="2400">"#);
    xml.push_str(&format!(
        r#"<list index="0" type="android.widget.ListView" clickable="false" {flags} x="0" y="0" width="1080" height="2400">"#
    ));
    for row in 0..rows {
        let y = row * 100;
        xml.push_str(&format!(
            r#"<row index="{row}" type="android.widget.LinearLayout" clickable="true" {flags} x="0" y="{y}" width="1080" height="100">"#
        ));
        xml.push_str(&format!(
            r#"<title index="0" type="android.widget.TextView" text="Row {row}" clickable="false" {flags} x="0" y="{y}" width="800" height="60"/>"#
        ));
        xml.push_str(&format!(
            r#"<subtitle index="1" type="android.widget.TextView" text="Detail {row}" clickable="false" {flags} x="0" y="{y}" width="800" height="40"/>"#
        ));
        xml.push_str("</row>");
    }
    xml.push_str("</list></window.main></tree>");
    xml
}

fn bench_parse_fixtures(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_fixture");

    for (name, xml) in [("android_notes", ANDROID_NOTES), ("ios_login", IOS_LOGIN)] {
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &xml, |bench, xml| {
            bench.iter(|| black_box(parse_tree(black_box(xml)).unwrap()));
        });
    }

    group.finish();
}

fn bench_parse_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rows");

    for rows in [10, 100, 1000] {
        let xml = synthetic_list(rows);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &xml, |bench, xml| {
            bench.iter(|| black_box(parse_tree(black_box(xml)).unwrap()));
        });
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let tree = parse_tree(&synthetic_list(1000)).unwrap();
    let by_text = Matcher::Text("Row 500".into());
    let by_regex = Matcher::text_matches(r"^Detail 9\d\d$").unwrap();

    group.bench_function("enumerate", |bench| {
        bench.iter(|| black_box(tree.elements().count()));
    });
    group.bench_function("find_clickable", |bench| {
        bench.iter(|| black_box(tree.find(|e| e.clickable).len()));
    });
    group.bench_function("matcher_text", |bench| {
        bench.iter(|| black_box(tree.find(|e| by_text.matches(e)).len()));
    });
    group.bench_function("matcher_regex", |bench| {
        bench.iter(|| black_box(tree.find(|e| by_regex.matches(e)).len()));
    });

    group.finish();
}

criterion_group!(benches, bench_parse_fixtures, bench_parse_scaling, bench_queries);
criterion_main!(benches);
