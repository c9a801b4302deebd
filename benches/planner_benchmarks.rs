//! Planner benchmarks over synthetic catalogs of increasing size.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::collections::BTreeMap;
use stock_planner::analysis::minimum::{self, MinimumStockMethod};
use stock_planner::analysis::share::share_by_city;
use stock_planner::analysis::stats::compute_stats;
use stock_planner::model::{SalesRow, StockRow};
use stock_planner::planning::transfer::greedy_match;
use stock_planner::planning::{Catalog, PlanInputs, PlanOptions, plan};

const CITIES: [&str; 6] = [
    "Curitiba",
    "Londrina",
    "Maringa",
    "Cascavel",
    "Ponta Grossa",
    "Foz do Iguacu",
];

fn sales_rows(skus: usize) -> Vec<SalesRow> {
    let mut rows = Vec::with_capacity(skus * 17 * CITIES.len());
    for sku in 0..skus {
        for cycle in 1..=17 {
            for (c, city) in CITIES.iter().enumerate() {
                rows.push(SalesRow {
                    brand: "BOTICARIO".into(),
                    sku: format!("{sku:05}"),
                    cycle: format!("2025{cycle:02}"),
                    quantity: ((sku + cycle + c) % 9) as f64,
                    city: city.to_string(),
                });
            }
        }
    }
    rows
}

fn stock_rows(skus: usize) -> Vec<StockRow> {
    let mut rows = Vec::with_capacity(skus * CITIES.len());
    for sku in 0..skus {
        for (c, city) in CITIES.iter().enumerate() {
            rows.push(StockRow {
                brand: "BOTICARIO".into(),
                sku: format!("{sku:05}"),
                description: format!("Produto {sku}"),
                pdv: String::new(),
                city: city.to_string(),
                class: "B".into(),
                category: "PERFUMARIA".into(),
                unit_price: 19.9,
                on_hand: ((sku * 7 + c * 3) % 20) as f64,
                in_transit: 0.0,
                pending: 0.0,
                net_pending: 0.0,
                deactivation_cycle: None,
                promo_cycle: None,
                promo_discount_pct: None,
                smart_buy_next_cycle: 0.0,
                prior_cycle_sales: 0.0,
                current_cycle_sales: 0.0,
            });
        }
    }
    rows
}

fn bench_compute_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_stats");
    for skus in [100usize, 1_000] {
        let rows = sales_rows(skus);
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(skus), &rows, |b, rows| {
            b.iter(|| black_box(compute_stats(rows)));
        });
    }
    group.finish();
}

fn bench_greedy_match(c: &mut Criterion) {
    let surpluses: Vec<u64> = (0..64).map(|i| (i * 13 % 17) as u64).collect();
    let deficits: Vec<u64> = (0..64).map(|i| (i * 7 % 11) as u64).collect();
    c.bench_function("greedy_match_64x64", |b| {
        b.iter(|| black_box(greedy_match(black_box(&surpluses), black_box(&deficits))));
    });
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    for skus in [100usize, 1_000] {
        let sales = sales_rows(skus);
        let catalog = Catalog::build(&stock_rows(skus));
        let stats = compute_stats(&sales);
        let minimum = minimum::suggest(&stats, MinimumStockMethod::Mean, 1.0);
        let shares = share_by_city(&sales);
        let window_sales = BTreeMap::new();
        let best_moments = BTreeMap::new();
        let inputs = PlanInputs {
            catalog: &catalog,
            shares: &shares,
            window_sales: &window_sales,
            best_moments: &best_moments,
        };
        let options = PlanOptions::new(202517);

        group.throughput(Throughput::Elements(skus as u64));
        group.bench_with_input(BenchmarkId::from_parameter(skus), &minimum, |b, minimum| {
            b.iter(|| black_box(plan(minimum, inputs, &options)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_stats, bench_greedy_match, bench_plan);
criterion_main!(benches);
