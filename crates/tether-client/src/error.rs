//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 按照“每类失败一个变体”的原则集中定义客户端错误：解析失败、误用
//!   （未连接时 close/read/write）、解析期/建连期/握手期故障各自独立，
//!   不复用单一的失败码；
//! - 解析、建连与握手错误在引擎内部同样会被日志记录并驱动回 `Closed`，
//!   随后由固定间隔的调度器对下一个候选重试。
//!
//! ## 设计要求（What）
//! - 全部变体实现 `thiserror::Error`；来源错误通过 `#[source]` 保留链条；
//! - 名称解析的底层错误类型来自可选依赖，这里以
//!   `Box<dyn Error + Send + Sync>` 承接，保证本模块不受 feature 开关影响。

use std::io;

use thiserror::Error;

use tether_core::ParseError;

/// 连接引擎对外暴露的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方需要区分“配置写错了”（[`Parse`](ClientError::Parse)）、
///   “时机不对”（[`NotConnected`](ClientError::NotConnected) /
///   [`ShutDown`](ClientError::ShutDown)）与“网络在抖动”（其余变体），
///   三类的处置策略完全不同；
/// - **契约 (What)**：所有变体 `Send + Sync + 'static`，可跨任务传播；
///   误用类错误保证无副作用——返回时引擎状态与资源与调用前一致。
#[derive(Debug, Error)]
pub enum ClientError {
    /// 候选服务器 URI 解析失败；登记表保持原状。
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 当前没有已建立的链路（`close`/`read`/`write` 的前置条件不满足）。
    #[error("link is not connected")]
    NotConnected,

    /// 引擎已被 `shutdown`，不再接受 `start`。
    #[error("client has been shut down")]
    ShutDown,

    /// 主机名解析失败。
    #[error("failed to resolve host `{host}`")]
    Resolve {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// 服务字段不是合法端口号。
    ///
    /// 服务按数字端口解释；命名服务（如 `https`）不在支持范围内，该错误
    /// 与解析失败同样会驱动引擎转入 `Closed` 并轮转到下一个候选。
    #[error("invalid service `{service}`: expected a numeric port")]
    InvalidService { service: String },

    /// 建连失败（已解析出的所有地址均不可达）。
    #[error("failed to connect to `{target}`")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// TLS 握手失败。
    #[error("tls handshake with `{host}` failed")]
    Handshake {
        host: String,
        #[source]
        source: io::Error,
    },

    /// 已建链后的读写 I/O 错误；触发 `Connected → Closed` 迁移。
    #[error("link io error")]
    Io(#[from] io::Error),
}
