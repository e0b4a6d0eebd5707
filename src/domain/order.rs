/// 未完结订单实体
///
/// 一条订单从新建到终结的完整生命周期。五种转移各自产出封帧
/// 后的线路消息：改状态的转移两条（请求+确认），成交回报一条。
///
/// 不变式：每次操作完成后 `filled + remaining == total`；
/// `remaining > 0` 期间订单留在未完结集合中，归零即终结、
/// 由调用方移出集合。
///
/// 数量守卫是显式检查：把remaining打到0以下的改单/部分成交
/// 属于时序器bug，直接panic，绝不静默截断。

use crate::shared::protocol::{self, field, format_price, FixCodec, Side};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

/// 单次转移产出的消息（至多两条）
pub type TransitionMessages = SmallVec<[String; 2]>;

/// 未完结订单
#[derive(Debug, Clone)]
pub struct OpenOrder {
    /// 订单编号（生成器内单调递增，进程内唯一）
    order_number: u64,

    /// 交易员标签
    trader_tag: Arc<str>,

    /// 产品代码
    product: Arc<str>,

    /// 买卖方向
    side: Side,

    /// 价格（整数tick，2位隐含小数）
    price_ticks: u64,

    /// 总数量
    total_quantity: u64,

    /// 剩余数量
    remaining_quantity: u64,

    /// 已成交数量
    filled_quantity: u64,
}

impl OpenOrder {
    /// 新建订单：remaining = total，filled = 0
    pub fn new(
        order_number: u64,
        trader_tag: Arc<str>,
        product: Arc<str>,
        side: Side,
        price_ticks: u64,
        total_quantity: u64,
    ) -> Self {
        assert!(total_quantity > 0, "Order quantity must be positive");

        Self {
            order_number,
            trader_tag,
            product,
            side,
            price_ticks,
            total_quantity,
            remaining_quantity: total_quantity,
            filled_quantity: 0,
        }
    }

    #[inline]
    pub fn order_number(&self) -> u64 {
        self.order_number
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining_quantity
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total_quantity
    }

    #[inline]
    pub fn filled(&self) -> u64 {
        self.filled_quantity
    }

    #[inline]
    pub fn price_ticks(&self) -> u64 {
        self.price_ticks
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// 订单是否已终结（remaining归零）
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// 新订单转移：请求 + 确认
    pub fn new_order(&self, codec: &FixCodec) -> TransitionMessages {
        let mut request = vec![
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_NEW_ORDER),
            field(protocol::TAG_ORDER_QTY, self.total_quantity),
            field(protocol::TAG_PRICE, format_price(self.price_ticks)),
        ];
        request.extend(self.common_sent_fields(codec));

        let mut ack = vec![
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_EXEC_REPORT),
            field(protocol::TAG_EXEC_TYPE, protocol::EXEC_TYPE_NEW),
        ];
        ack.extend(self.common_received_fields(codec));

        smallvec![codec.frame(&request), codec.frame(&ack)]
    }

    /// 改单转移：按`quantity_delta`调整总量与剩余量并换价
    ///
    /// 守卫：调整后的remaining必须仍大于0，否则属于时序器
    /// 选错转移（应当走完全成交/撤单），panic。
    pub fn modify(
        &mut self,
        new_price_ticks: u64,
        quantity_delta: i64,
        codec: &FixCodec,
    ) -> TransitionMessages {
        let new_remaining = self.remaining_quantity as i64 + quantity_delta;
        assert!(
            new_remaining > 0,
            "modify must leave remaining > 0: order {} remaining {} delta {}",
            self.order_number,
            self.remaining_quantity,
            quantity_delta
        );

        // total >= remaining恒成立，remaining守住了total就不会为负
        self.total_quantity = (self.total_quantity as i64 + quantity_delta) as u64;
        self.remaining_quantity = new_remaining as u64;
        self.price_ticks = new_price_ticks;

        let mut request = vec![
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_MODIFY),
            field(protocol::TAG_ORDER_QTY, self.remaining_quantity),
            field(protocol::TAG_PRICE, format_price(self.price_ticks)),
        ];
        request.extend(self.common_sent_fields(codec));

        let mut ack = vec![
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_EXEC_REPORT),
            field(protocol::TAG_EXEC_TYPE, protocol::EXEC_TYPE_REPLACED),
        ];
        ack.extend(self.common_received_fields(codec));

        smallvec![codec.frame(&request), codec.frame(&ack)]
    }

    /// 部分成交转移：单条执行回报
    ///
    /// 守卫：成交量必须小于剩余量（吃完剩余量应当走完全成交）。
    pub fn partial_fill(&mut self, quantity: u64, codec: &FixCodec) -> TransitionMessages {
        assert!(quantity > 0, "fill quantity must be positive");
        assert!(
            quantity < self.remaining_quantity,
            "partial fill must leave remaining > 0: order {} remaining {} fill {}",
            self.order_number,
            self.remaining_quantity,
            quantity
        );

        self.remaining_quantity -= quantity;
        self.filled_quantity += quantity;

        let mut report = vec![
            field(protocol::TAG_CUM_QTY, self.filled_quantity),
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_EXEC_REPORT),
            field(protocol::TAG_ORD_STATUS, protocol::ORD_STATUS_PARTIAL),
            field(protocol::TAG_EXEC_TYPE, protocol::EXEC_TYPE_TRADE),
            field(protocol::TAG_LEAVES_QTY, self.remaining_quantity),
        ];
        report.extend(self.common_received_fields(codec));

        smallvec![codec.frame(&report)]
    }

    /// 完全成交转移：剩余量全部转入已成交，单条执行回报
    pub fn complete_fill(&mut self, codec: &FixCodec) -> TransitionMessages {
        self.filled_quantity += self.remaining_quantity;
        self.remaining_quantity = 0;

        let mut report = vec![
            field(protocol::TAG_CUM_QTY, self.filled_quantity),
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_EXEC_REPORT),
            field(protocol::TAG_ORD_STATUS, protocol::ORD_STATUS_FILLED),
            field(protocol::TAG_EXEC_TYPE, protocol::EXEC_TYPE_TRADE),
            field(protocol::TAG_LEAVES_QTY, 0),
        ];
        report.extend(self.common_received_fields(codec));

        smallvec![codec.frame(&report)]
    }

    /// 撤单转移：请求 + 确认
    ///
    /// 实体本身不改数量，剩余量随调用方把订单移出集合而作废。
    pub fn cancel(&self, codec: &FixCodec) -> TransitionMessages {
        let mut request = vec![field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_CANCEL)];
        request.extend(self.common_sent_fields(codec));

        let mut ack = vec![
            field(protocol::TAG_MSG_TYPE, protocol::MSG_TYPE_EXEC_REPORT),
            field(protocol::TAG_ORD_STATUS, protocol::ORD_STATUS_CANCELLED),
            field(protocol::TAG_EXEC_TYPE, protocol::EXEC_TYPE_CANCELLED),
        ];
        ack.extend(self.common_received_fields(codec));

        smallvec![codec.frame(&request), codec.frame(&ack)]
    }

    /// 我方发出的请求共有字段
    fn common_sent_fields(&self, codec: &FixCodec) -> Vec<String> {
        vec![
            field(protocol::TAG_ORDER_NUMBER, self.order_number),
            field(protocol::TAG_SENDER_FIRM, &codec.firm),
            field(protocol::TAG_SENDER_TRADER, &self.trader_tag),
            field(protocol::TAG_QUANTITY, self.remaining_quantity),
            field(protocol::TAG_SIDE, self.side.wire_code()),
            field(protocol::TAG_PRODUCT, &self.product),
            field(protocol::TAG_TARGET_FIRM, &codec.exchange),
        ]
    }

    /// 对手方（虚拟交易所）回报共有字段
    fn common_received_fields(&self, codec: &FixCodec) -> Vec<String> {
        vec![
            field(protocol::TAG_ORDER_NUMBER, self.order_number),
            field(protocol::TAG_SENDER_FIRM, &codec.exchange),
            field(protocol::TAG_PRODUCT, &self.product),
            field(protocol::TAG_TARGET_FIRM, &codec.firm),
            field(protocol::TAG_TARGET_TRADER, &self.trader_tag),
        ]
    }
}
