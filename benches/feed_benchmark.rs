/// 行情进料性能基准测试
/// 对比时序器吞吐、封帧/解码成本与两种策略的进料路径

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use feed_generator::application::strategies::{
    NaiveStrategy, PoolConfig, PooledStrategy, ProcessingStrategy,
};
use feed_generator::domain::generator::{GeneratorConfig, GeneratorState};
use feed_generator::domain::order::OpenOrder;
use feed_generator::shared::protocol::{FixCodec, Side};
use std::sync::Arc;

/// 基准测试：不同订单上限下的事件生成吞吐
fn bench_generator_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("Feed Generator - Max Open Orders");

    for max_open in [1usize, 100, 1_000] {
        group.throughput(Throughput::Elements(1_000));

        group.bench_with_input(
            BenchmarkId::from_parameter(max_open),
            &max_open,
            |b, &max_open| {
                let config = GeneratorConfig {
                    max_open_orders: max_open,
                    seed: Some(42),
                    ..Default::default()
                };
                let mut state = GeneratorState::new(config);

                b.iter(|| {
                    // 生成1000个事件
                    for _ in 0..1_000 {
                        black_box(state.next_event());
                    }
                });
            },
        );
    }

    group.finish();
}

/// 基准测试：一次状态转移的封帧成本（请求+确认两条消息）
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("FIX Codec - Encode");
    group.throughput(Throughput::Elements(2));

    let codec = FixCodec::default();
    let order = OpenOrder::new(
        7,
        Arc::from("TRADER-01"),
        Arc::from("BTC/USD"),
        Side::Buy,
        50_000,
        100,
    );

    group.bench_function("new_order_pair", |b| {
        b.iter(|| black_box(order.new_order(&codec)));
    });

    group.finish();
}

/// 基准测试：解码+校验和验证成本
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("FIX Codec - Decode");
    group.throughput(Throughput::Elements(1));

    let codec = FixCodec::default();
    let order = OpenOrder::new(
        7,
        Arc::from("TRADER-01"),
        Arc::from("BTC/USD"),
        Side::Buy,
        50_000,
        100,
    );
    let message = order.new_order(&codec)[0].clone();

    group.bench_function("validate_request", |b| {
        b.iter(|| codec.decode(black_box(&message)).unwrap());
    });

    group.finish();
}

/// 基准测试：两种策略的进料路径对比
fn bench_strategy_intake(c: &mut Criterion) {
    let mut group = c.benchmark_group("Strategy Intake");
    group.throughput(Throughput::Elements(1_000));

    // 预生成一批真实消息
    let config = GeneratorConfig {
        max_open_orders: 100,
        seed: Some(7),
        ..Default::default()
    };
    let mut state = GeneratorState::new(config);
    let mut messages = Vec::with_capacity(1_000);
    while messages.len() < 1_000 {
        messages.extend(state.next_event().messages);
    }
    messages.truncate(1_000);

    group.bench_function("naive", |b| {
        let strategy = NaiveStrategy::with_capacity(1_000_000);

        b.iter_batched(
            || messages.clone(),
            |batch| strategy.on_data_available(batch),
            BatchSize::SmallInput,
        );

        strategy.shutdown_and_join();
    });

    group.bench_function("pooled_4_workers", |b| {
        let strategy = PooledStrategy::new(PoolConfig {
            workers: 4,
            queue_capacity: 1_000_000,
            enable_cpu_affinity: false, // 基准测试中禁用
            ..Default::default()
        });

        b.iter_batched(
            || messages.clone(),
            |batch| strategy.on_data_available(batch),
            BatchSize::SmallInput,
        );

        strategy.shutdown_and_join();
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_generator_throughput,
    bench_encode,
    bench_decode,
    bench_strategy_intake,
);
criterion_main!(benches);
