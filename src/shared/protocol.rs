/// FIX风格行情协议编解码
///
/// 生成器与策略之间的私有线路约定：
/// - `tag=value` 字段，单字节分隔符连接（默认SOH 0x01）
/// - 头部 `8=<版本>` + `9=<包裹体字节长度>`，尾部 `10=<校验和>`
/// - 校验和 = 前面所有字节求和 mod 256，3位十进制补零
/// - 包裹体 = 分隔符 + 字段体 + 分隔符，每条消息统一封帧
///
/// tag编号只需在编码器与解码器之间保持一致，不追求与真实
/// 交易所FIX字典完全对齐。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// 默认字段分隔符（SOH）
pub const SOH: u8 = 0x01;

/// 协议版本标识
pub const BEGIN_STRING: &str = "FIX.4.4";

/// 价格缩放因子：整数tick表示，2位隐含小数（123.45 → 12345）
pub const PRICE_SCALE: u64 = 100;

// ---- 字段tag（线路约定） ----
pub const TAG_BEGIN_STRING: u32 = 8; // 协议版本
pub const TAG_BODY_LENGTH: u32 = 9; // 包裹体字节长度
pub const TAG_CHECKSUM: u32 = 10; // 校验和
pub const TAG_ORDER_NUMBER: u32 = 11; // 订单编号
pub const TAG_CUM_QTY: u32 = 14; // 累计成交数量
pub const TAG_MSG_TYPE: u32 = 35; // 消息类型
pub const TAG_ORDER_QTY: u32 = 38; // 订单数量
pub const TAG_ORD_STATUS: u32 = 39; // 订单状态
pub const TAG_PRICE: u32 = 44; // 价格
pub const TAG_SENDER_FIRM: u32 = 49; // 发送方机构
pub const TAG_SENDER_TRADER: u32 = 50; // 发送方交易员
pub const TAG_QUANTITY: u32 = 53; // 剩余数量
pub const TAG_SIDE: u32 = 54; // 买卖方向
pub const TAG_PRODUCT: u32 = 55; // 产品代码
pub const TAG_TARGET_FIRM: u32 = 56; // 接收方机构
pub const TAG_TARGET_TRADER: u32 = 57; // 接收方交易员
pub const TAG_EXEC_TYPE: u32 = 150; // 执行类型
pub const TAG_LEAVES_QTY: u32 = 151; // 未成交数量

// ---- 消息类型值（tag 35） ----
pub const MSG_TYPE_NEW_ORDER: &str = "D"; // 新订单请求
pub const MSG_TYPE_MODIFY: &str = "G"; // 改单请求
pub const MSG_TYPE_CANCEL: &str = "F"; // 撤单请求
pub const MSG_TYPE_EXEC_REPORT: &str = "8"; // 执行回报

// ---- 执行类型值（tag 150） ----
pub const EXEC_TYPE_NEW: &str = "0"; // 新订单确认
pub const EXEC_TYPE_REPLACED: &str = "5"; // 改单确认
pub const EXEC_TYPE_CANCELLED: &str = "4"; // 撤单确认
pub const EXEC_TYPE_TRADE: &str = "F"; // 成交

// ---- 订单状态值（tag 39） ----
pub const ORD_STATUS_PARTIAL: &str = "3"; // 部分成交
pub const ORD_STATUS_FILLED: &str = "7"; // 全部成交
pub const ORD_STATUS_CANCELLED: &str = "4"; // 已撤销

/// 买卖方向
///
/// 线路编码为数字（Buy=1，Sell=2）。枚举本身保证编码侧
/// 不可能出现未知方向；解码侧遇到其他值返回错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// 线路编码值
    #[inline]
    pub fn wire_code(self) -> u8 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }

    /// 从线路值解析
    pub fn from_wire(value: &str) -> Result<Self, FixError> {
        match value {
            "1" => Ok(Side::Buy),
            "2" => Ok(Side::Sell),
            other => Err(FixError::InvalidSide(other.to_string())),
        }
    }
}

/// 编解码错误
#[derive(Debug, Error)]
pub enum FixError {
    #[error("checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch { declared: u8, computed: u8 },

    #[error("body length mismatch: declared {declared}, actual {actual}")]
    BodyLengthMismatch { declared: usize, actual: usize },

    #[error("missing required field: tag {0}")]
    MissingField(u32),

    #[error("invalid side code: {0}")]
    InvalidSide(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// FIX编解码器
///
/// 持有封帧所需的机构标识与分隔符。编码（封帧）由订单实体
/// 调用，解码由策略侧调用，两侧共用同一套常量即可互通。
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// 字段分隔符（单字节，不得出现在字段值内）
    pub delimiter: u8,

    /// 本方机构标识
    pub firm: Arc<str>,

    /// 对手方（虚拟交易所）标识
    pub exchange: Arc<str>,
}

impl Default for FixCodec {
    fn default() -> Self {
        Self {
            delimiter: SOH,
            firm: Arc::from("FAKE_PROP_TRADING_FIRM"),
            exchange: Arc::from("FAKE_EXCHANGE"),
        }
    }
}

impl FixCodec {
    /// 校验和：所有字节求和 mod 256
    #[inline]
    pub fn checksum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    /// 封帧：字段体 → 完整线路消息
    ///
    /// 布局：`8=FIX.4.4|9=<len>|<字段体>|10=<sum>|`（|为分隔符，
    /// `<len>` 统计包含前后分隔符的包裹体字节数）
    pub fn frame(&self, fields: &[String]) -> String {
        let delim = self.delimiter as char;

        // 包裹体：前后各一个分隔符
        let mut body = String::with_capacity(fields.iter().map(|f| f.len() + 1).sum::<usize>() + 1);
        body.push(delim);
        for (i, field) in fields.iter().enumerate() {
            body.push_str(field);
            if i + 1 < fields.len() {
                body.push(delim);
            }
        }
        body.push(delim);

        let mut message = String::with_capacity(body.len() + 32);
        message.push_str("8=");
        message.push_str(BEGIN_STRING);
        message.push(delim);
        message.push_str("9=");
        message.push_str(&body.len().to_string());
        message.push_str(&body);

        let sum = Self::checksum(message.as_bytes());
        message.push_str(&format!("10={:03}", sum));
        message.push(delim);
        message
    }

    /// 解码：校验封帧完整性并返回有序的tag/value对
    ///
    /// 依次校验：尾部校验和字段、头部版本与长度声明、字段格式。
    pub fn decode(&self, message: &str) -> Result<FixFields, FixError> {
        let bytes = message.as_bytes();
        let delim = self.delimiter;

        // 尾部固定7字节："10=" + 3位数字 + 分隔符
        if bytes.len() < 7 || bytes[bytes.len() - 1] != delim {
            return Err(FixError::Malformed("missing checksum trailer".to_string()));
        }
        let trailer_start = bytes.len() - 7;
        if &bytes[trailer_start..trailer_start + 3] != b"10=" {
            return Err(FixError::Malformed("missing checksum trailer".to_string()));
        }
        let declared_sum: u8 = message[trailer_start + 3..trailer_start + 6]
            .parse()
            .map_err(|_| FixError::Malformed("non-numeric checksum".to_string()))?;

        let pre_checksum = &bytes[..trailer_start];
        let computed = Self::checksum(pre_checksum);
        if computed != declared_sum {
            return Err(FixError::ChecksumMismatch {
                declared: declared_sum,
                computed,
            });
        }

        // 头部：8=<版本> 分隔符 9=<长度>，随后是包裹体
        let header = &message[..trailer_start];
        let version_field = format!("8={}", BEGIN_STRING);
        let after_version = header
            .strip_prefix(&version_field)
            .and_then(|rest| rest.strip_prefix(delim as char))
            .ok_or_else(|| FixError::Malformed("missing version header".to_string()))?;
        let rest = after_version
            .strip_prefix("9=")
            .ok_or_else(|| FixError::Malformed("missing body length".to_string()))?;

        // 长度声明的数字部分一直延伸到包裹体的首个分隔符
        let digits_end = rest
            .find(self.delimiter as char)
            .ok_or_else(|| FixError::Malformed("truncated after body length".to_string()))?;
        let declared_len: usize = rest[..digits_end]
            .parse()
            .map_err(|_| FixError::Malformed("non-numeric body length".to_string()))?;

        let wrapped = &rest[digits_end..];
        if wrapped.len() != declared_len {
            return Err(FixError::BodyLengthMismatch {
                declared: declared_len,
                actual: wrapped.len(),
            });
        }

        // 拆字段：包裹体前后有分隔符，split后过滤空段
        let mut fields = Vec::new();
        for raw in wrapped.split(self.delimiter as char) {
            if raw.is_empty() {
                continue;
            }
            let (tag, value) = raw
                .split_once('=')
                .ok_or_else(|| FixError::Malformed(format!("field without '=': {}", raw)))?;
            let tag: u32 = tag
                .parse()
                .map_err(|_| FixError::Malformed(format!("non-numeric tag: {}", tag)))?;
            fields.push((tag, value.to_string()));
        }

        Ok(FixFields { fields })
    }
}

/// 解码后的消息视图（tag/value有序列表）
#[derive(Debug, Clone, PartialEq)]
pub struct FixFields {
    fields: Vec<(u32, String)>,
}

impl FixFields {
    /// 取第一个匹配tag的值
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// 消息类型（tag 35），所有消息必有
    pub fn msg_type(&self) -> Result<&str, FixError> {
        self.get(TAG_MSG_TYPE).ok_or(FixError::MissingField(TAG_MSG_TYPE))
    }

    /// 订单编号（tag 11），所有消息必有
    pub fn order_number(&self) -> Result<u64, FixError> {
        let raw = self
            .get(TAG_ORDER_NUMBER)
            .ok_or(FixError::MissingField(TAG_ORDER_NUMBER))?;
        raw.parse()
            .map_err(|_| FixError::Malformed(format!("non-numeric order number: {}", raw)))
    }

    /// 全部tag/value对（保持线路顺序）
    pub fn pairs(&self) -> &[(u32, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 拼一个 `tag=value` 字段
#[inline]
pub fn field(tag: u32, value: impl std::fmt::Display) -> String {
    format!("{}={}", tag, value)
}

/// 价格渲染：整数tick → 线路小数表示
#[inline]
pub fn format_price(price_ticks: u64) -> String {
    format!("{}.{:02}", price_ticks / PRICE_SCALE, price_ticks % PRICE_SCALE)
}

/// 快速提取订单编号，不做完整解码
///
/// 路由场景使用：按分隔符定位 `11=` 字段并解析数字。
/// 消息不含该字段时返回None。
#[inline]
pub fn scan_order_number(message: &str, delimiter: u8) -> Option<u64> {
    let bytes = message.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == delimiter && bytes.len() - i > 3 && &bytes[i + 1..i + 4] == b"11=" {
            let start = i + 4;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            return message[start..end].parse().ok();
        }
        i += 1;
    }
    None
}
