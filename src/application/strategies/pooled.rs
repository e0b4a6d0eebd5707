/// 工作池策略：按订单号分区的多线程并行处理
///
/// 每个worker独占一条crossbeam有界通道和一份计数器，`on_data_available`
/// 按订单号取模路由——同一订单的全部事件恒定落在同一worker上，
/// 订单内的处理顺序不需要锁就能保持。
///
/// worker循环批量try_iter收取消息（减少上下文切换），空转时按
/// 积压情况自适应等待：有积压就spin_loop忙等，真空闲才yield。
/// 可选CPU亲和性绑定（cpu-affinity特性）减少缓存失效。
///
/// 关闭语义与基线策略一致：观察到信号立即退出，通道内残留
/// 不再处理。

use crate::application::strategies::ProcessingStrategy;
use crate::shared::active_object::{ActiveObject, ShutdownSignal};
use crate::shared::protocol::{self, FixCodec};
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// 工作池配置
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// worker数量（0 = 按CPU核数）
    pub workers: usize,

    /// 每个worker的进料通道容量
    pub queue_capacity: usize,

    /// 单轮批量收取上限
    pub batch_size: usize,

    /// 是否绑定CPU核心
    pub enable_cpu_affinity: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            queue_capacity: 10_000,
            batch_size: 100,
            enable_cpu_affinity: true,
        }
    }
}

/// 单个worker的计数器
#[derive(Debug, Default)]
struct WorkerStats {
    processed: AtomicU64,
    queue_depth: AtomicUsize,
}

/// 多worker并行策略
pub struct PooledStrategy {
    senders: Vec<Sender<String>>,
    stats: Arc<Vec<WorkerStats>>,
    received: AtomicU64,
    workers: Mutex<Option<Vec<ActiveObject>>>,
}

impl PooledStrategy {
    /// 按配置启动工作池（构造即启动全部worker线程）
    pub fn new(config: PoolConfig) -> Self {
        let worker_count = if config.workers == 0 {
            num_cpus::get()
        } else {
            config.workers
        };

        let stats: Arc<Vec<WorkerStats>> = Arc::new(
            (0..worker_count).map(|_| WorkerStats::default()).collect(),
        );

        let mut senders = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let (tx, rx) = bounded(config.queue_capacity);
            senders.push(tx);

            let worker_stats = Arc::clone(&stats);
            let batch_size = config.batch_size;
            let enable_cpu_affinity = config.enable_cpu_affinity;

            let worker = ActiveObject::spawn(&format!("pool-worker-{}", worker_id), move |signal| {
                run_worker(rx, worker_stats, worker_id, batch_size, enable_cpu_affinity, signal);
            });
            workers.push(worker);
        }

        Self {
            senders,
            stats,
            received: AtomicU64::new(0),
            workers: Mutex::new(Some(workers)),
        }
    }

    /// worker数量
    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// 所有worker已处理消息数合计
    pub fn processed(&self) -> u64 {
        self.stats
            .iter()
            .map(|stats| stats.processed.load(Ordering::Relaxed))
            .sum()
    }
}

impl ProcessingStrategy for PooledStrategy {
    fn on_data_available(&self, batch: Vec<String>) {
        let worker_count = self.senders.len() as u64;
        for message in batch {
            // 同一订单号恒定路由到同一worker，保持订单内事件顺序
            let order_number =
                protocol::scan_order_number(&message, protocol::SOH).unwrap_or(0);
            let worker_id = (order_number % worker_count) as usize;

            self.received.fetch_add(1, Ordering::Relaxed);
            if self.senders[worker_id].send(message).is_err() {
                panic!("pool worker {} channel closed", worker_id);
            }
        }
    }

    fn running_information(&self) -> String {
        let processed: u64 = self
            .stats
            .iter()
            .map(|stats| stats.processed.load(Ordering::Relaxed))
            .sum();
        let queued: usize = self.senders.iter().map(|tx| tx.len()).sum();
        format!(
            "PooledStrategy: workers={} received={} processed={} queued={}",
            self.senders.len(),
            self.received.load(Ordering::Relaxed),
            processed,
            queued,
        )
    }

    fn shutdown_and_join(&self) {
        let workers = self
            .workers
            .lock()
            .take()
            .expect("strategy already shut down");
        for worker in workers {
            worker.shutdown_and_join();
        }
    }
}

/// worker主循环
fn run_worker(
    rx: Receiver<String>,
    stats: Arc<Vec<WorkerStats>>,
    worker_id: usize,
    batch_size: usize,
    enable_cpu_affinity: bool,
    signal: Arc<ShutdownSignal>,
) {
    // 绑定CPU核心（如果启用）
    if enable_cpu_affinity {
        #[cfg(feature = "cpu-affinity")]
        {
            if let Some(core_ids) = core_affinity::get_core_ids() {
                if worker_id < core_ids.len() {
                    core_affinity::set_for_current(core_ids[worker_id]);
                }
            }
        }
    }

    let codec = FixCodec::default();
    let worker_stats = &stats[worker_id];
    let mut backlog = 0usize;

    loop {
        if signal.is_set() {
            return;
        }

        // 批量收取，减少上下文切换
        let batch: Vec<String> = rx.try_iter().take(batch_size).collect();

        if batch.is_empty() {
            // 自适应等待策略
            if backlog > 0 {
                // 有积压，继续忙等
                std::hint::spin_loop();
            } else {
                // 通道真空，让出时间片
                std::thread::yield_now();
            }
            backlog = rx.len();
            continue;
        }

        for message in batch {
            process_message(&codec, &message, worker_stats);
        }

        backlog = rx.len();
        worker_stats.queue_depth.store(backlog, Ordering::Relaxed);
    }
}

/// 解码一条消息并计数
///
/// 解码失败意味着生产侧封帧损坏，按契约违约处理：panic让
/// worker响亮终止。
fn process_message(codec: &FixCodec, message: &str, stats: &WorkerStats) {
    if let Err(error) = codec.decode(message) {
        panic!("malformed feed message: {}", error);
    }
    stats.processed.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generator::{GeneratorConfig, GeneratorState};
    use std::thread;
    use std::time::{Duration, Instant};

    /// 用时序器造一段真实的消息流
    fn sample_messages(count: usize) -> Vec<String> {
        let config = GeneratorConfig {
            max_open_orders: 10,
            seed: Some(33),
            ..Default::default()
        };
        let mut state = GeneratorState::new(config);

        let mut messages = Vec::with_capacity(count);
        while messages.len() < count {
            messages.extend(state.next_event().messages);
        }
        messages.truncate(count);
        messages
    }

    fn wait_until_processed(strategy: &PooledStrategy, expected: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while strategy.processed() < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_same_order_routes_to_single_worker() {
        let strategy = PooledStrategy::new(PoolConfig {
            workers: 2,
            ..Default::default()
        });

        // 同一订单的新建请求重复投递100次
        let config = GeneratorConfig {
            max_open_orders: 1,
            seed: Some(7),
            ..Default::default()
        };
        let mut state = GeneratorState::new(config);
        let message = state.next_event().messages[0].clone();
        let batch: Vec<String> = (0..100).map(|_| message.clone()).collect();

        strategy.on_data_available(batch);
        wait_until_processed(&strategy, 100);

        let busy_workers = strategy
            .stats
            .iter()
            .filter(|stats| stats.processed.load(Ordering::Relaxed) > 0)
            .count();
        assert_eq!(busy_workers, 1, "one order must stay on one worker");
        assert_eq!(strategy.processed(), 100);

        strategy.shutdown_and_join();
    }

    #[test]
    fn test_all_messages_processed_across_workers() {
        let strategy = PooledStrategy::new(PoolConfig {
            workers: 4,
            ..Default::default()
        });
        let messages = sample_messages(2_000);
        let total = messages.len() as u64;

        strategy.on_data_available(messages);
        wait_until_processed(&strategy, total);

        assert_eq!(strategy.processed(), total);
        assert_eq!(strategy.received.load(Ordering::Relaxed), total);

        strategy.shutdown_and_join();
    }

    #[test]
    fn test_zero_workers_defaults_to_cpu_count() {
        let strategy = PooledStrategy::new(PoolConfig {
            workers: 0,
            ..Default::default()
        });
        assert_eq!(strategy.worker_count(), num_cpus::get());
        strategy.shutdown_and_join();
    }

    #[test]
    #[should_panic(expected = "strategy already shut down")]
    fn test_double_shutdown_is_fatal() {
        let strategy = PooledStrategy::new(PoolConfig {
            workers: 1,
            ..Default::default()
        });
        strategy.shutdown_and_join();
        strategy.shutdown_and_join();
    }
}
