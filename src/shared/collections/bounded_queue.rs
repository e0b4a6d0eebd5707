/// 有界阻塞队列（条件变量实现）
///
/// 参考策略的进料结构，同时充当生产者回压点：
/// - `push` 在占用达到容量时阻塞，空位出现后继续，绝不丢元素
/// - `pop_timeout` 在空队列上限时等待，便于工作线程按轮询间隔
///   回头检查关闭信号
/// - FIFO：单个调用方push的顺序原样保持
///
/// 等待挂在条件变量上而不是逐毫秒睡眠重试：唤醒即重测，附带
/// 超时兜底防止错失通知。对外契约与睡眠重试版本一致——有界
/// 等待、不丢元素——只是不再空耗CPU。
///
/// # 并发模型
///
/// 多生产者/多消费者均安全；顺序敏感场景按单写单读使用。

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;

/// 满队列等待的兜底重测间隔
const FULL_WAIT_TIMEOUT: Duration = Duration::from_millis(1);

/// 有界阻塞队列
pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// 创建指定容量的队列
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// 入队，占用达到容量时阻塞等待
    ///
    /// 这是回压的实现点：上游感知到的"消费者跟不上"就是
    /// 这里的等待时间。
    pub fn push(&self, item: T) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            self.not_full.wait_for(&mut queue, FULL_WAIT_TIMEOUT);
        }
        queue.push_back(item);
        drop(queue);
        self.not_empty.notify_one();
    }

    /// 出队，空队列时最多等待`timeout`
    ///
    /// 超时返回None，调用方借机轮询关闭信号后再回来。
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut queue = self.inner.lock();
        if queue.is_empty() {
            self.not_empty.wait_for(&mut queue, timeout);
        }
        let item = queue.pop_front();
        if item.is_some() {
            drop(queue);
            self.not_full.notify_one();
        }
        item
    }

    /// 当前占用
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// 容量上限
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::with_capacity(8);

        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(1));
        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(2));
        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_timeout_on_empty() {
        let queue: BoundedQueue<u32> = BoundedQueue::with_capacity(4);

        let start = Instant::now();
        let item = queue.pop_timeout(Duration::from_millis(30));
        let elapsed = start.elapsed();

        assert_eq!(item, None);
        // 等待必须有界：大致等于超时，绝不无限期
        assert!(elapsed >= Duration::from_millis(25));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_push_blocks_at_capacity_and_resumes() {
        let queue = Arc::new(BoundedQueue::with_capacity(2));
        queue.push(1);
        queue.push(2);

        // 消费者暂停（无人pop）时，第三次push必须阻塞
        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            let start = Instant::now();
            producer_queue.push(3);
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 2, "occupancy must never exceed capacity");

        // 腾出一个位置，push随即恢复
        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(1));
        let blocked_for = producer.join().unwrap();

        assert!(
            blocked_for >= Duration::from_millis(40),
            "push should have blocked, blocked_for={:?}",
            blocked_for
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(2));
        assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(3));
    }

    #[test]
    fn test_concurrent_producers_nothing_lost() {
        let queue = Arc::new(BoundedQueue::with_capacity(64));
        let producer_count: u64 = 4;
        let per_producer: u64 = 250;

        let mut producers = Vec::new();
        for p in 0..producer_count {
            let q = Arc::clone(&queue);
            producers.push(thread::spawn(move || {
                for i in 0..per_producer {
                    q.push(p * per_producer + i);
                }
            }));
        }

        // 单消费者收齐所有元素
        let total = producer_count * per_producer;
        let mut received = Vec::with_capacity(total as usize);
        while received.len() < total as usize {
            if let Some(item) = queue.pop_timeout(Duration::from_millis(100)) {
                received.push(item);
            }
        }

        for producer in producers {
            producer.join().unwrap();
        }

        received.sort_unstable();
        received.dedup();
        assert_eq!(received.len(), total as usize, "no item may be lost or duplicated");
    }
}
