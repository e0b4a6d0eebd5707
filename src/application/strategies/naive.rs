/// 基线策略：单工作线程 + 有界进料队列
///
/// 刻意的最差情况底线：一次取一条、不批处理、不并行，给其他
/// 策略一个必须超越的性能下限。
///
/// `on_data_available`把批次逐条push进有界队列（默认容量
/// 10_000），队列满时阻塞——这就是提供给生产者的回压。工作
/// 线程逐条pop并解码计数；空队列限时等待，醒来先轮询关闭
/// 信号再继续。
///
/// 观察到关闭信号立即退出，队列中未处理的残留直接作废：底线
/// 策略不做收尾清空，处理量与产出量的差距正是基准要量的东西。

use crate::application::strategies::ProcessingStrategy;
use crate::shared::active_object::ActiveObject;
use crate::shared::collections::BoundedQueue;
use crate::shared::protocol::{self, FixCodec};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 进料队列默认容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// 空队列单次等待时长，醒来后轮询关闭信号
const POP_TIMEOUT: Duration = Duration::from_millis(1);

/// 处理计数（worker写入，观察者只读）
#[derive(Debug, Default)]
struct NaiveStats {
    received: AtomicU64,
    processed: AtomicU64,
    requests: AtomicU64,
    reports: AtomicU64,
    stalls: AtomicU64,
}

/// 单线程基线策略
pub struct NaiveStrategy {
    queue: Arc<BoundedQueue<String>>,
    stats: Arc<NaiveStats>,
    worker: Mutex<Option<ActiveObject>>,
}

impl NaiveStrategy {
    /// 默认容量启动
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// 指定进料容量启动（构造即启动工作线程）
    pub fn with_capacity(queue_capacity: usize) -> Self {
        let queue = Arc::new(BoundedQueue::<String>::with_capacity(queue_capacity));
        let stats = Arc::new(NaiveStats::default());

        let worker_queue = Arc::clone(&queue);
        let worker_stats = Arc::clone(&stats);
        let worker = ActiveObject::spawn("naive-strategy", move |signal| {
            let codec = FixCodec::default();
            loop {
                if signal.is_set() {
                    return;
                }
                match worker_queue.pop_timeout(POP_TIMEOUT) {
                    Some(message) => process_message(&codec, &message, &worker_stats),
                    None => {
                        worker_stats.stalls.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        Self {
            queue,
            stats,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 进料队列当前占用
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// 已处理消息数
    pub fn processed(&self) -> u64 {
        self.stats.processed.load(Ordering::Relaxed)
    }
}

impl Default for NaiveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStrategy for NaiveStrategy {
    fn on_data_available(&self, batch: Vec<String>) {
        for message in batch {
            // 队列满时在这里阻塞，回压传导给调用方
            self.queue.push(message);
            self.stats.received.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn running_information(&self) -> String {
        format!(
            "NaiveStrategy: received={} processed={} queued={} requests={} reports={} stalls={}",
            self.stats.received.load(Ordering::Relaxed),
            self.stats.processed.load(Ordering::Relaxed),
            self.queue.len(),
            self.stats.requests.load(Ordering::Relaxed),
            self.stats.reports.load(Ordering::Relaxed),
            self.stats.stalls.load(Ordering::Relaxed),
        )
    }

    fn shutdown_and_join(&self) {
        let worker = self
            .worker
            .lock()
            .take()
            .expect("strategy already shut down");
        worker.shutdown_and_join();
    }
}

/// 解码一条消息并计数
///
/// 解码失败意味着生产侧封帧有bug，按契约违约处理：panic让
/// 工作线程响亮终止，join处把故障抛还给所有者。
fn process_message(codec: &FixCodec, message: &str, stats: &NaiveStats) {
    let fields = codec
        .decode(message)
        .unwrap_or_else(|error| panic!("malformed feed message: {}", error));
    let msg_type = fields
        .msg_type()
        .unwrap_or_else(|error| panic!("malformed feed message: {}", error));

    match msg_type {
        protocol::MSG_TYPE_NEW_ORDER | protocol::MSG_TYPE_MODIFY | protocol::MSG_TYPE_CANCEL => {
            stats.requests.fetch_add(1, Ordering::Relaxed);
        }
        protocol::MSG_TYPE_EXEC_REPORT => {
            stats.reports.fetch_add(1, Ordering::Relaxed);
        }
        other => panic!("unknown message type: {}", other),
    }

    stats.processed.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generator::{GeneratorConfig, GeneratorState};
    use std::thread;
    use std::time::Instant;

    /// 用时序器造一段真实的消息流
    fn sample_messages(count: usize) -> Vec<String> {
        let config = GeneratorConfig {
            max_open_orders: 10,
            seed: Some(21),
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

    fn wait_until_processed(strategy: &NaiveStrategy, expected: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while strategy.processed() < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_burst_fully_processed_without_loss() {
        // 容量远小于burst，push路径必然经历回压
        let strategy = NaiveStrategy::with_capacity(64);
        let messages = sample_messages(2_000);
        let total = messages.len() as u64;

        strategy.on_data_available(messages);
        wait_until_processed(&strategy, total);

        assert_eq!(strategy.processed(), total);
        assert_eq!(strategy.stats.received.load(Ordering::Relaxed), total);
        // 请求与回报分类计数合计等于总量
        let requests = strategy.stats.requests.load(Ordering::Relaxed);
        let reports = strategy.stats.reports.load(Ordering::Relaxed);
        assert_eq!(requests + reports, total);

        strategy.shutdown_and_join();
    }

    #[test]
    fn test_running_information_reflects_counts() {
        let strategy = NaiveStrategy::with_capacity(128);
        strategy.on_data_available(sample_messages(50));
        wait_until_processed(&strategy, 50);

        let info = strategy.running_information();
        assert!(info.contains("NaiveStrategy"));
        assert!(info.contains("processed=50"));

        strategy.shutdown_and_join();
    }

    #[test]
    fn test_shutdown_joins_worker() {
        let strategy = NaiveStrategy::with_capacity(128);
        strategy.on_data_available(sample_messages(10));
        strategy.shutdown_and_join();
        // join返回即工作线程已退出，重复关闭在下面的用例中覆盖
    }

    #[test]
    #[should_panic(expected = "strategy already shut down")]
    fn test_double_shutdown_is_fatal() {
        let strategy = NaiveStrategy::with_capacity(8);
        strategy.shutdown_and_join();
        strategy.shutdown_and_join();
    }
}
