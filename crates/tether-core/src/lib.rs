#![doc = r#"
# tether-core

## 设计动机（Why）
- **模型与运行时分离**：把“候选服务器登记、故障转移游标、链路状态”这类
  纯数据语义从 Tokio 引擎中剥离出来，使协议层与测试可以在不触碰网络栈的
  情况下验证轮转与解析行为；
- **确定性优先**：重连引擎的正确性核心在于“下一个候选是谁”，该问题必须
  是可单元测试、可性质验证的纯函数逻辑。

## 核心契约（What）
- [`ServerEndpoint`]：单个候选服务器（协议 + 主机 + 有序服务列表），由
  `[proto://]host[:svc1,svc2,...]` 形式的 URI 原子化解析而来；
- [`ServerRegistry`]：保序、允许重复的候选列表，解析失败时保持原状；
- [`FailoverCursor`]：`(服务器下标, 服务下标)` 二元组，按“先扫完同一
  服务器的服务、再换下一台服务器”的次序确定性推进并回绕；
- [`LinkState`]：连接引擎的四态标签（closed / resolving / connecting /
  connected）；
- [`ParseError`]：URI 解析的细分错误，彼此互斥、不复用单一错误码。

## 实现策略（How）
- 全部类型只依赖标准库与 `thiserror`，不引入任何异步运行时；
- 游标推进在入口处先对下标做夹取，使“登记表在两次尝试之间被改小”不会
  产生越界选择；
- 解析过程在返回错误前不会向登记表写入任何内容，保证原子性。
"#]

pub mod endpoint;
pub mod error;
pub mod registry;
pub mod state;

pub use endpoint::{Proto, ServerEndpoint};
pub use error::ParseError;
pub use registry::{FailoverCursor, ServerRegistry};
pub use state::LinkState;
