//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义候选服务器 URI 的解析错误，使“格式不合法”“缺少服务列表”
//!   等情形拥有彼此独立的变体，避免退化成单一的失败码；
//! - 解析错误属于同步报告的一类：调用方在 `add` 时立刻获得结果，登记表
//!   不会残留半成品。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `thiserror::Error`，可直接接入 `std::error::Error` 生态；
//! - 每个变体携带原始 URI，便于日志与告警直接定位问题条目。

use thiserror::Error;

/// 服务器 URI 解析失败的细分错误。
///
/// # 教案式说明
/// - **意图 (Why)**：上层通常把解析失败视为配置错误而非网络故障，细分
///   变体帮助调用方给出精确的修复提示；
/// - **契约 (What)**：任何变体返回时，登记表保持调用前的状态；
/// - **权衡 (Trade-offs)**：以 `String` 保存原始 URI，牺牲一次堆分配换取
///   错误信息的自包含性。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// URI 中主机部分为空（例如 `tcp://:80`）。
    #[error("server uri `{uri}` has an empty host")]
    EmptyHost { uri: String },

    /// URI 未携带服务列表（例如 `example.com`）。
    ///
    /// 服务列表是强制项：没有端口/服务名就无法发起任何一次尝试。
    #[error("server uri `{uri}` does not specify any service")]
    MissingServices { uri: String },

    /// 服务列表中存在空项（例如 `host:80,,443` 或 `host:`）。
    #[error("server uri `{uri}` contains an empty service entry")]
    EmptyService { uri: String },
}
