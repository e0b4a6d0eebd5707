/// 行情事件时序器
///
/// 维护未完结订单集合并决定下一个生命周期事件，产出封帧后的
/// 线路消息。选择规则：
/// 1. 集合为空 → 新建订单
/// 2. 集合规模达到上限M → 只操作存量订单，绝不新建
/// 3. 否则均匀抽样[0,1)：抽样值小于`new_order_probability`
///    则新建，其余操作存量订单
///
/// 存量操作先均匀随机挑一单，再按权重选转移（改单40%、部分
/// 成交35%、完全成交15%、撤单10%）。数量参数全部经过守卫，
/// 不会触发实体的违约panic：改单delta的下界保住remaining，
/// 剩余量不足2的部分成交改走完全成交。remaining归零的订单
/// 在产生转移的同一次调用内swap_remove出集合。
///
/// 给定种子与配置，事件与消息序列完全可复现。
///
/// 该类型*非线程安全*：订单集合与随机源归生产者工作线程
/// 独占，不得跨线程共享。

use crate::domain::order::{OpenOrder, TransitionMessages};
use crate::shared::protocol::{FixCodec, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// 默认未完结订单上限
const DEFAULT_MAX_OPEN_ORDERS: usize = 100;

/// 低于上限时新建订单的默认概率
const DEFAULT_NEW_ORDER_PROBABILITY: f64 = 0.4;

/// 默认交易员数量
const DEFAULT_TRADER_COUNT: usize = 5;

/// 新订单价格区间（tick）
const PRICE_TICKS_RANGE: (u64, u64) = (49_900, 50_100);

/// 新订单数量区间
const QUANTITY_RANGE: (u64, u64) = (1, 500);

/// 单次改单的数量变化上限（绝对值）
const MAX_QUANTITY_DELTA: i64 = 50;

/// 时序器配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// 未完结订单上限M
    pub max_open_orders: usize,

    /// 低于上限时新建订单的概率
    pub new_order_probability: f64,

    /// 随机种子（None则取系统时钟）
    pub seed: Option<u64>,

    /// 交易员标签池
    pub trader_tags: Vec<Arc<str>>,

    /// 产品池
    pub products: Vec<Arc<str>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_open_orders: DEFAULT_MAX_OPEN_ORDERS,
            new_order_probability: DEFAULT_NEW_ORDER_PROBABILITY,
            seed: None,
            trader_tags: (1..=DEFAULT_TRADER_COUNT)
                .map(|i| Arc::from(format!("TRADER-{:02}", i)))
                .collect(),
            products: vec![Arc::from("BTC/USD"), Arc::from("ETH/USD")],
        }
    }
}

/// 事件类型（带标签的转移变体）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewOrder,
    Modify,
    PartialFill,
    CompleteFill,
    Cancel,
}

/// 一次时序器调用的产出
#[derive(Debug, Clone)]
pub struct FeedEvent {
    /// 转移类型
    pub kind: EventKind,

    /// 所涉订单编号
    pub order_number: u64,

    /// 产出的线路消息（保持生成顺序）
    pub messages: TransitionMessages,
}

/// 行情事件时序器状态
pub struct GeneratorState {
    config: GeneratorConfig,
    codec: FixCodec,
    rng: StdRng,
    open_orders: Vec<OpenOrder>,
    next_order_number: u64,
}

impl GeneratorState {
    pub fn new(config: GeneratorConfig) -> Self {
        assert!(config.max_open_orders > 0, "max_open_orders must be positive");
        assert!(
            (0.0..=1.0).contains(&config.new_order_probability),
            "new_order_probability must be within [0, 1]"
        );
        assert!(!config.trader_tags.is_empty(), "trader catalog must not be empty");
        assert!(!config.products.is_empty(), "product catalog must not be empty");

        let seed = config.seed.unwrap_or_else(seed_from_clock);
        let open_orders = Vec::with_capacity(config.max_open_orders);

        Self {
            config,
            codec: FixCodec::default(),
            rng: StdRng::seed_from_u64(seed),
            open_orders,
            next_order_number: 1,
        }
    }

    /// 当前未完结订单数
    #[inline]
    pub fn open_order_count(&self) -> usize {
        self.open_orders.len()
    }

    /// 未完结订单视图（测试与诊断用）
    pub fn open_orders(&self) -> &[OpenOrder] {
        &self.open_orders
    }

    /// 产出下一个事件
    pub fn next_event(&mut self) -> FeedEvent {
        if self.open_orders.is_empty() {
            return self.create_order();
        }
        if self.open_orders.len() >= self.config.max_open_orders {
            return self.mutate_existing();
        }

        // 低于上限：抽样落在[0, p)新建，其余操作存量
        if self.rng.gen::<f64>() < self.config.new_order_probability {
            self.create_order()
        } else {
            self.mutate_existing()
        }
    }

    /// 关闭前清场：撤掉所有未完结订单
    ///
    /// 返回按顺序拍平的收尾消息（每单一条撤单请求+一条确认），
    /// 调用后集合为空，下游不会残留悬空订单。
    pub fn final_events(&mut self) -> Vec<String> {
        let mut messages = Vec::with_capacity(self.open_orders.len() * 2);
        while let Some(order) = self.open_orders.pop() {
            messages.extend(order.cancel(&self.codec));
        }
        messages
    }

    fn create_order(&mut self) -> FeedEvent {
        let order_number = self.next_order_number;
        self.next_order_number += 1;

        let trader_tag =
            self.config.trader_tags[self.rng.gen_range(0..self.config.trader_tags.len())].clone();
        let product =
            self.config.products[self.rng.gen_range(0..self.config.products.len())].clone();
        let side = if self.rng.gen::<bool>() { Side::Buy } else { Side::Sell };
        let price_ticks = self.rng.gen_range(PRICE_TICKS_RANGE.0..=PRICE_TICKS_RANGE.1);
        let quantity = self.rng.gen_range(QUANTITY_RANGE.0..=QUANTITY_RANGE.1);

        let order = OpenOrder::new(order_number, trader_tag, product, side, price_ticks, quantity);
        let messages = order.new_order(&self.codec);
        self.open_orders.push(order);

        FeedEvent {
            kind: EventKind::NewOrder,
            order_number,
            messages,
        }
    }

    fn mutate_existing(&mut self) -> FeedEvent {
        let index = self.rng.gen_range(0..self.open_orders.len());
        let roll = self.rng.gen_range(0..100u32);

        if roll < 40 {
            self.modify_order(index)
        } else if roll < 75 {
            self.partial_fill_order(index)
        } else if roll < 90 {
            self.complete_fill_order(index)
        } else {
            self.cancel_order(index)
        }
    }

    fn modify_order(&mut self, index: usize) -> FeedEvent {
        let remaining = self.open_orders[index].remaining() as i64;

        // delta下界保住remaining > 0
        let min_delta = (-(remaining - 1)).max(-MAX_QUANTITY_DELTA);
        let quantity_delta = self.rng.gen_range(min_delta..=MAX_QUANTITY_DELTA);
        let new_price = self.rng.gen_range(PRICE_TICKS_RANGE.0..=PRICE_TICKS_RANGE.1);

        let order = &mut self.open_orders[index];
        let messages = order.modify(new_price, quantity_delta, &self.codec);

        FeedEvent {
            kind: EventKind::Modify,
            order_number: order.order_number(),
            messages,
        }
    }

    fn partial_fill_order(&mut self, index: usize) -> FeedEvent {
        let remaining = self.open_orders[index].remaining();
        if remaining < 2 {
            // 吃掉仅剩的数量等于完全成交
            return self.complete_fill_order(index);
        }

        let quantity = self.rng.gen_range(1..remaining);
        let order = &mut self.open_orders[index];
        let messages = order.partial_fill(quantity, &self.codec);

        FeedEvent {
            kind: EventKind::PartialFill,
            order_number: order.order_number(),
            messages,
        }
    }

    fn complete_fill_order(&mut self, index: usize) -> FeedEvent {
        let mut order = self.open_orders.swap_remove(index);
        let messages = order.complete_fill(&self.codec);

        FeedEvent {
            kind: EventKind::CompleteFill,
            order_number: order.order_number(),
            messages,
        }
    }

    fn cancel_order(&mut self, index: usize) -> FeedEvent {
        let order = self.open_orders.swap_remove(index);
        let messages = order.cancel(&self.codec);

        FeedEvent {
            kind: EventKind::Cancel,
            order_number: order.order_number(),
            messages,
        }
    }
}

fn seed_from_clock() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
