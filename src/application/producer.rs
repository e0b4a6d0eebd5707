/// 批量进料生产者
///
/// 独占一条生产线程驱动时序器：每轮取`batch_size`个事件，把
/// 它们的线路消息拍平成一个批次交给策略的`on_data_available`。
/// 投递是同步调用，策略的回压（队列满阻塞）直接传导到生产
/// 循环——这正是基准想要的耦合点。
///
/// 观察到关闭信号后先清场再退出：`final_events`为每张在场
/// 订单生成撤单对并作为最后一个批次投递，下游不会收到悬空
/// 订单。

use crate::application::strategies::ProcessingStrategy;
use crate::domain::generator::{GeneratorConfig, GeneratorState};
use crate::shared::active_object::ActiveObject;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// 每轮生成的事件数默认值
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// 生产侧计数（生产线程写入，观察者只读）
#[derive(Debug, Default)]
pub struct ProducerStats {
    /// 已投递批次数
    pub batches: AtomicU64,

    /// 已投递消息数（不含收尾）
    pub messages: AtomicU64,

    /// 收尾批次的消息数
    pub closing_messages: AtomicU64,

    /// 最近一轮后的未完结订单数
    pub open_orders: AtomicUsize,
}

/// 行情进料生产者
pub struct FeedProducer {
    stats: Arc<ProducerStats>,
    worker: ActiveObject,
    batch_size: usize,
}

impl FeedProducer {
    /// 启动生产线程（构造即开始投递）
    pub fn start(
        config: GeneratorConfig,
        batch_size: usize,
        strategy: Arc<dyn ProcessingStrategy>,
    ) -> Self {
        assert!(batch_size > 0, "Batch size must be greater than 0");

        let stats = Arc::new(ProducerStats::default());
        let worker_stats = Arc::clone(&stats);

        let worker = ActiveObject::spawn("feed-producer", move |signal| {
            let mut state = GeneratorState::new(config);

            loop {
                if signal.is_set() {
                    // 清场：每张在场订单一条撤单请求+一条确认
                    let closing = state.final_events();
                    worker_stats
                        .closing_messages
                        .store(closing.len() as u64, Ordering::Relaxed);
                    worker_stats.open_orders.store(0, Ordering::Relaxed);
                    if !closing.is_empty() {
                        strategy.on_data_available(closing);
                    }
                    tracing::info!("feed producer drained and exiting");
                    return;
                }

                // 多数事件产出2条消息，按2倍预留
                let mut batch = Vec::with_capacity(batch_size * 2);
                for _ in 0..batch_size {
                    batch.extend(state.next_event().messages);
                }

                worker_stats
                    .messages
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                worker_stats.batches.fetch_add(1, Ordering::Relaxed);
                worker_stats
                    .open_orders
                    .store(state.open_order_count(), Ordering::Relaxed);

                // 策略队列满时在此阻塞，回压由此传导到生产节奏
                strategy.on_data_available(batch);
            }
        });

        Self {
            stats,
            worker,
            batch_size,
        }
    }

    /// 生产侧计数的共享句柄
    pub fn stats(&self) -> Arc<ProducerStats> {
        Arc::clone(&self.stats)
    }

    pub fn running_information(&self) -> String {
        format!(
            "FeedProducer: batches={} messages={} open_orders={} batch_size={}",
            self.stats.batches.load(Ordering::Relaxed),
            self.stats.messages.load(Ordering::Relaxed),
            self.stats.open_orders.load(Ordering::Relaxed),
            self.batch_size,
        )
    }

    /// 发信号、清场并等待生产线程退出
    pub fn shutdown_and_join(self) {
        self.worker.shutdown_and_join();
    }
}
