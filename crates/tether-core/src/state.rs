//! 连接引擎的状态标签。

use core::fmt;

/// 连接生命周期的四态标签。
///
/// # 教案式说明
/// - **意图 (Why)**：引擎的全部调度决策只取决于这个标签——重连定时器仅在
///   `Closed` 时发起新尝试，`close` 仅在 `Connected` 时生效；
/// - **契约 (What)**：
///   - `Closed` 为初始态与失败汇合点；
///   - `Resolving` 表示名称解析在途；
///   - `Connecting` 覆盖 TCP 建连与 TLS 握手（握手重试期间状态不变）；
///   - `Connected` 表示通道可用，UDP 在解析完成后直接进入该态；
/// - **权衡 (Trade-offs)**：状态标签与资源所有权分离存放（资源由尝试
///   过程与已建链槽位持有），标签本身保持 `Copy`，便于放入 watch 通道
///   广播给观察者。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LinkState {
    /// 无连接亦无在途尝试；重连调度器唯一允许发起新尝试的状态。
    #[default]
    Closed,
    /// 正在解析候选服务器的主机名。
    Resolving,
    /// 流式传输的建连/握手在途（UDP 不经过此态）。
    Connecting,
    /// 通道已建立，载荷层可以读写。
    Connected,
}

impl LinkState {
    /// 是否处于空闲（可发起新尝试）状态。
    pub fn is_closed(self) -> bool {
        matches!(self, LinkState::Closed)
    }

    /// 是否已建链。
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LinkState::Closed => "closed",
            LinkState::Resolving => "resolving",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(text)
    }
}
