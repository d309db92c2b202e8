use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use warp::api::response::xml_to_value;
use warp::api::types::{SearchItem, SearchResponse};
use warp::api::unified::merge_results;
use warp::api::ApiType;

/// Backend page with `count` items, dates descending from 2024 with gaps
fn backend_page(count: usize, offset: usize) -> SearchResponse {
    SearchResponse {
        total_count: count as u32,
        page_no: 1,
        page_size: count as u32,
        items: (0..count)
            .map(|i| SearchItem {
                id: format!("{}", offset + i),
                title: format!("주차장 설치 조례 {}", i),
                // every seventh item has no date
                promulgation_date: (i % 7 != 0)
                    .then(|| format!("2024{:02}{:02}", 12 - (i + offset) % 12, 1 + i % 28)),
                ..Default::default()
            })
            .collect(),
        source: "BENCH".to_string(),
    }
}

fn search_xml(count: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><LawSearch><totalCnt>");
    xml.push_str(&count.to_string());
    xml.push_str("</totalCnt>");
    for i in 0..count {
        xml.push_str(&format!(
            "<law id=\"{i}\"><법령ID>{i:06}</법령ID><법령명한글><![CDATA[법률 {i}]]></법령명한글>\
             <소관부처명>법무부</소관부처명><공포일자>20240101</공포일자></law>"
        ));
    }
    xml.push_str("</LawSearch>");
    xml
}

/// Benchmark merging two backend pages of growing size
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_results");

    for size in [10usize, 100, 1000] {
        let national = backend_page(size, 0);
        let local = backend_page(size, 3);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                merge_results(
                    black_box(vec![
                        (ApiType::Nlic, national.clone()),
                        (ApiType::Elis, local.clone()),
                    ]),
                    1,
                    10,
                )
            });
        });
    }

    group.finish();
}

/// Benchmark XML to JSON value conversion
fn bench_xml_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml_to_value");

    for size in [10usize, 100] {
        let xml = search_xml(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &xml, |b, xml| {
            b.iter(|| xml_to_value(black_box(xml)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_xml_conversion);
criterion_main!(benches);
