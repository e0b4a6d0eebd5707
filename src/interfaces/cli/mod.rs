/// CLI Interface Module
///
/// This module provides the command-line entry point for the feed
/// benchmark. It parses arguments, wires the chosen processing strategy
/// to a feed producer, runs for the requested duration while reporting
/// progress, then performs the two-phase shutdown (producer drains
/// first, strategy joins second) and prints the final report.

use crate::application::strategies::{NaiveStrategy, PoolConfig, PooledStrategy, ProcessingStrategy};
use crate::application::producer::FeedProducer;
use crate::domain::generator::GeneratorConfig;
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 状态行打印间隔
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// 行情进料基准命令行配置
#[derive(Parser, Debug, Clone)]
#[command(name = "feed-generator")]
#[command(author = "Feed Generator Team")]
#[command(version = "0.1.0")]
#[command(about = "合成行情进料生成器与并发策略基准", long_about = None)]
pub struct CliConfig {
    /// 处理策略
    #[arg(short = 's', long, default_value = "naive", value_parser = ["naive", "pooled"])]
    pub strategy: String,

    /// 运行时长（秒）
    #[arg(short = 'd', long, default_value_t = 10)]
    pub duration: u64,

    /// 每轮生成的事件数
    #[arg(short = 'b', long, default_value_t = 1_000)]
    pub batch_size: usize,

    /// 未完结订单上限M
    #[arg(short = 'm', long, default_value_t = 100)]
    pub max_open_orders: usize,

    /// 低于上限时新建订单的概率
    #[arg(short = 'p', long, default_value_t = 0.4)]
    pub new_order_probability: f64,

    /// 策略进料队列/通道容量
    #[arg(short = 'q', long, default_value_t = 10_000)]
    pub queue_capacity: usize,

    /// 工作池worker数量（0表示自动检测CPU核心数，仅pooled策略）
    #[arg(short = 'w', long, default_value_t = 0)]
    pub workers: usize,

    /// 随机种子（缺省取系统时钟，指定后序列可复现）
    #[arg(long)]
    pub seed: Option<u64>,

    /// 启用CPU亲和性绑定（仅pooled策略）
    #[arg(long, default_value_t = false)]
    pub cpu_affinity: bool,

    /// 日志级别
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// 以JSON输出最终报告
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// 最终基准报告
#[derive(Debug, Serialize)]
struct BenchReport {
    strategy: String,
    elapsed_secs: f64,
    batches: u64,
    produced_messages: u64,
    closing_messages: u64,
    throughput_per_sec: f64,
    strategy_info: String,
}

/// Runs the CLI application
///
/// This is the main entry point for the benchmark binary: parse the
/// arguments, run the feed for the requested duration, report.
pub fn run() {
    // 解析命令行参数
    let config = CliConfig::parse();

    // 初始化日志系统
    init_logging(&config.log_level);

    tracing::info!("行情进料基准启动");
    tracing::info!("配置: {:?}", config);

    // 自动检测worker数量
    let worker_count = if config.workers == 0 {
        let cpus = num_cpus::get();
        tracing::info!("自动检测到 {} 个CPU核心", cpus);
        cpus
    } else {
        config.workers
    };

    // 显示配置信息
    println!("========================================");
    println!("  合成行情进料基准 v0.1.0");
    println!("========================================");
    println!("策略:         {}", config.strategy);
    println!("运行时长:     {}s", config.duration);
    println!("批次大小:     {}", config.batch_size);
    println!("订单上限:     {}", config.max_open_orders);
    println!("新建概率:     {}", config.new_order_probability);
    println!("队列容量:     {}", config.queue_capacity);
    if config.strategy == "pooled" {
        println!("worker数量:   {}", worker_count);
        println!("CPU亲和性:    {}", if config.cpu_affinity { "启用" } else { "禁用" });
    }
    match config.seed {
        Some(seed) => println!("随机种子:     {}", seed),
        None => println!("随机种子:     系统时钟"),
    }
    println!("日志级别:     {}", config.log_level);
    println!("========================================");

    // 组装策略
    let strategy: Arc<dyn ProcessingStrategy> = if config.strategy == "pooled" {
        Arc::new(PooledStrategy::new(PoolConfig {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            enable_cpu_affinity: config.cpu_affinity,
            ..Default::default()
        }))
    } else {
        Arc::new(NaiveStrategy::with_capacity(config.queue_capacity))
    };

    let generator_config = GeneratorConfig {
        max_open_orders: config.max_open_orders,
        new_order_probability: config.new_order_probability,
        seed: config.seed,
        ..Default::default()
    };

    // 启动生产线程
    let producer = FeedProducer::start(generator_config, config.batch_size, Arc::clone(&strategy));
    let stats = producer.stats();
    let started = Instant::now();
    let run_duration = Duration::from_secs(config.duration);

    // 每秒报告一次进度
    while started.elapsed() < run_duration {
        let remaining = run_duration.saturating_sub(started.elapsed());
        thread::sleep(remaining.min(STATUS_INTERVAL));
        tracing::info!("{}", producer.running_information());
        tracing::info!("{}", strategy.running_information());
    }

    // 两段式关闭：生产者先清场投递收尾批次，策略后join
    tracing::info!("运行时间到，开始关闭");
    producer.shutdown_and_join();
    strategy.shutdown_and_join();

    let elapsed = started.elapsed();
    let produced = stats.messages.load(std::sync::atomic::Ordering::Relaxed)
        + stats.closing_messages.load(std::sync::atomic::Ordering::Relaxed);
    let report = BenchReport {
        strategy: config.strategy.clone(),
        elapsed_secs: elapsed.as_secs_f64(),
        batches: stats.batches.load(std::sync::atomic::Ordering::Relaxed),
        produced_messages: produced,
        closing_messages: stats
            .closing_messages
            .load(std::sync::atomic::Ordering::Relaxed),
        throughput_per_sec: produced as f64 / elapsed.as_secs_f64(),
        strategy_info: strategy.running_information(),
    };

    if config.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(error) => tracing::error!("报告序列化失败: {}", error),
        }
    } else {
        println!("========================================");
        println!("  基准结果");
        println!("========================================");
        println!("运行时长:     {:.2}s", report.elapsed_secs);
        println!("投递批次:     {}", report.batches);
        println!("生产消息:     {}", report.produced_messages);
        println!("  其中收尾:   {}", report.closing_messages);
        println!("生产吞吐:     {:.0} msg/s", report.throughput_per_sec);
        println!("策略状态:     {}", report.strategy_info);
        println!("========================================");
    }
}

/// 初始化日志系统
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
