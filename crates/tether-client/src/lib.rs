#![doc = r#"
# tether-client

## 设计动机（Why）
- **定位**：提供 Tokio 运行时上的持久多传输客户端引擎：候选服务器可经
  UDP、TCP 或 TLS-over-TCP 访问，引擎保持“至多一条活动链路”，断开后按
  确定性轮转次序自动解析、建连、握手并重试，直到再次成功；
- **架构角色**：坐在具体协议客户端之下，作为“自己会保持连接”的传输
  底座；纯数据语义（登记表、游标、状态标签）下沉在 `tether-core`，本
  crate 只负责把它们接到真实网络栈上。

## 核心契约（What）
- [`TetherClient`]：公开句柄，提供候选登记、回调注册、启动/停止/关闭/
  终止以及已建链后的读写；
- **单尝试不变式**：重连调度器仅在 `Closed` 态发起新尝试，且尝试在驱动
  任务内就地执行完毕，任一时刻至多一次解析/建连/握手序列在途；
- **恰好一次释放**：每个状态入口获得的资源（地址列表、套接字、TLS
  会话）在离开该状态的所有路径上恰好释放一次，由所有权与 drop 保证；
- **回调时机**：`on_connect` 在每次成功进入 `Connected` 时同步触发，
  `on_close` 仅在 `Connected → Closed` 迁移时触发。

## 实现策略（How）
- 调度器为 `tokio::time::interval` 驱动的常驻任务，缺省 1000ms 固定间隔、
  永远重试、无退避；
- 解析经 `hickory-resolver`（IP 字面量走快路径），TLS 经
  `rustls`/`tokio-rustls` 客户端握手，回调槽位经 `arc-swap` 原子替换；
- 错误按“解析/误用/名称解析/建连/握手/链路 I/O”细分于
  [`ClientError`]，引擎内部的失败一律记日志后回到 `Closed` 交给下一个
  tick 轮转重试。

## 风险与考量（Trade-offs）
- `stop` 只阻止新尝试，不中断在途尝试；需要立刻终止时使用 `shutdown`；
- 读写与关闭共用链路槽位的互斥锁，阻塞中的读取会推迟 `close` 生效；
- 服务字段按数字端口解释，命名服务（`https` 等）视为尝试期错误并轮转
  到下一个候选。
"#]
#![cfg_attr(
    not(feature = "runtime-tokio"),
    doc = r#"## 功能开关：`runtime-tokio`
- 禁用该特性时仅保留错误类型与 `tether-core` 的再导出，便于在纯配置
  场景编译；调用网络 API 将得到编译错误而非运行期 panic。
"#
)]

pub mod error;

#[cfg(feature = "runtime-tokio")]
mod client;
#[cfg(feature = "runtime-tokio")]
mod events;
#[cfg(feature = "runtime-tokio")]
mod options;
#[cfg(feature = "runtime-tokio")]
mod resolver;
#[cfg(feature = "runtime-tokio")]
mod tls;
#[cfg(feature = "runtime-tokio")]
mod transport;

pub use error::ClientError;

#[cfg(feature = "runtime-tokio")]
pub use client::TetherClient;
#[cfg(feature = "runtime-tokio")]
pub use events::PeerInfo;
#[cfg(feature = "runtime-tokio")]
pub use options::ClientOptions;
#[cfg(feature = "runtime-tokio")]
pub use tls::default_client_config;

pub use tether_core::{FailoverCursor, LinkState, ParseError, Proto, ServerEndpoint, ServerRegistry};
