/// Active Object线程生命周期管理
///
/// 每个活动对象独占一个命名工作线程，通过协作式关闭信号停止：
/// - 构造即启动（spawn就是构造），二次启动无从谈起
/// - `shutdown_and_join`消耗self，二次join无从谈起
/// - 工作体panic在join处继续抛出，故障必须响亮
/// - Drop兜底：未显式join时发信号并等待线程退出，不留悬挂线程
///
/// 工作体约定：以有界间隔轮询`ShutdownSignal::is_set()`（参考实现
/// 每轮循环轮询一次），观察到信号后完成必要的收尾再返回。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// 协作式关闭信号
///
/// 原子布尔封装：一方set，工作线程轮询。没有硬中断，
/// 进行中的工作不会被打断。
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    flag: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// 发出关闭请求（幂等）
    #[inline]
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// 是否已请求关闭
    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 活动对象：命名工作线程 + 关闭信号
///
/// 循环体以闭包形式在构造时注入，组合替代继承。
pub struct ActiveObject {
    name: String,
    shutdown: Arc<ShutdownSignal>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveObject {
    /// 启动命名工作线程并返回其生命周期句柄
    pub fn spawn<F>(name: &str, body: F) -> Self
    where
        F: FnOnce(Arc<ShutdownSignal>) + Send + 'static,
    {
        let shutdown = Arc::new(ShutdownSignal::new());
        let signal = Arc::clone(&shutdown);

        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(signal))
            .expect("Failed to spawn worker thread");

        tracing::debug!("worker started: {}", name);

        Self {
            name: name.to_string(),
            shutdown,
            worker: Some(worker),
        }
    }

    /// 是否已发出关闭信号
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_set()
    }

    /// 发信号并阻塞等待工作线程退出
    ///
    /// 消耗self，join只会发生一次。工作体的panic在此处
    /// resume_unwind，调用方必须能看到故障。
    pub fn shutdown_and_join(mut self) {
        self.shutdown.set();
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(()) => tracing::debug!("worker exited: {}", self.name),
                Err(payload) => {
                    tracing::error!("worker panicked: {}", self.name);
                    std::panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl Drop for ActiveObject {
    fn drop(&mut self) {
        // 显式shutdown_and_join后worker已被取走，这里无事可做
        if let Some(handle) = self.worker.take() {
            self.shutdown.set();
            if handle.join().is_err() {
                // drop过程中不能再次panic，只记录
                tracing::error!("worker panicked during drop: {}", self.name);
            }
        }
    }
}
