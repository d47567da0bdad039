//! 候选服务器登记表与故障转移游标。
//!
//! # 教案式说明
//! - **Why**：重连引擎“永远重试、绝不空转”的前提是每次 tick 都能拿到一个
//!   确定的下一候选；把这一选择逻辑做成纯数据结构，引擎只需在 `Closed`
//!   态调用一次 [`FailoverCursor::advance`]；
//! - **How**：登记表保序、允许重复；游标以 `(server, service)` 二元组在
//!   “展平后的候选序列”上回绕推进；
//! - **What**：推进恰好 Σ(各服务器服务数) 次后回到出发位置，这是对外承诺
//!   的轮转性质，由性质测试覆盖。

use crate::endpoint::ServerEndpoint;
use crate::error::ParseError;

/// 候选服务器的保序登记表。
///
/// # 契约说明
/// - 插入顺序即故障转移扫描顺序，允许重复条目；
/// - [`ServerRegistry::add`] 解析失败时登记表保持原状；
/// - 清空操作只负责登记表本身，游标复位由持有双方的上层完成（参见
///   `tether-client` 的目标表封装）。
#[derive(Clone, Debug, Default)]
pub struct ServerRegistry {
    servers: Vec<ServerEndpoint>,
}

impl ServerRegistry {
    /// 构造空登记表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 URI 并追加候选服务器；失败时不改变登记表。
    pub fn add(&mut self, uri: &str) -> Result<(), ParseError> {
        let endpoint = ServerEndpoint::parse(uri)?;
        self.servers.push(endpoint);
        Ok(())
    }

    /// 一次性清空全部候选。
    pub fn clear(&mut self) {
        self.servers.clear();
    }

    /// 候选服务器数量。
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// 登记表是否为空。
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// 按下标访问候选。
    pub fn get(&self, index: usize) -> Option<&ServerEndpoint> {
        self.servers.get(index)
    }

    /// 遍历全部候选。
    pub fn iter(&self) -> impl Iterator<Item = &ServerEndpoint> {
        self.servers.iter()
    }

    /// 展平后的候选总数，即 Σ(各服务器服务数)。
    pub fn total_services(&self) -> usize {
        self.servers.iter().map(|s| s.services().len()).sum()
    }
}

/// 故障转移游标：`(服务器下标, 服务下标)`。
///
/// # 教案式说明
///
/// ## 意图（Why）
/// - 游标跨越多次尝试持续存在，使重试在全部候选之间轮转，而不是反复
///   锤击同一个目标。
///
/// ## 契约（What）
/// - [`advance`](FailoverCursor::advance) 先推进、后取值：当前服务器还有
///   未扫到的服务时只递增服务下标；否则服务下标归零，并在登记表多于一台
///   服务器时按模回绕推进服务器下标；
/// - 由上述规则推论：从 `(0, 0)` 出发推进 Σ(服务数) 次后回到 `(0, 0)`；
/// - 登记表为空时推进返回 `None` 并把游标复位；
/// - 下标在推进入口处先被夹取进合法区间，因此登记表在两次尝试之间被改小
///   不会产生越界选择。
///
/// ## 注意事项（Trade-offs）
/// - “先推进、后取值”意味着启动后的第一次尝试并不落在 `(0, 0)`：单服务
///   多服务器的配置会从第二台服务器开始扫描。该行为保证了推进函数无需
///   额外的“首次”分支，轮转整体仍覆盖全部候选。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FailoverCursor {
    server: usize,
    service: usize,
}

impl FailoverCursor {
    /// 构造指向 `(0, 0)` 的游标。
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前服务器下标。
    pub fn server(&self) -> usize {
        self.server
    }

    /// 当前服务下标。
    pub fn service(&self) -> usize {
        self.service
    }

    /// 复位到 `(0, 0)`。登记表被清空或重建时应当调用。
    pub fn reset(&mut self) {
        self.server = 0;
        self.service = 0;
    }

    /// 推进游标并返回新的当前候选服务器。
    ///
    /// 返回 `None` 当且仅当登记表为空；此时游标被复位。
    pub fn advance<'a>(&mut self, registry: &'a ServerRegistry) -> Option<&'a ServerEndpoint> {
        if registry.is_empty() {
            self.reset();
            return None;
        }

        // 夹取：登记表可能在上一次尝试之后被改小。
        self.server = self.server.min(registry.len() - 1);
        let service_count = registry
            .get(self.server)
            .map(|srv| srv.services().len())
            .unwrap_or(1);
        self.service = self.service.min(service_count - 1);

        if self.service + 1 < service_count {
            self.service += 1;
        } else {
            self.service = 0;
            if registry.len() > 1 {
                self.server = (self.server + 1) % registry.len();
            }
        }

        registry.get(self.server)
    }

    /// 取当前候选的 `(端点, 服务)`，不推进游标。
    pub fn current<'a>(&self, registry: &'a ServerRegistry) -> Option<(&'a ServerEndpoint, &'a str)> {
        let endpoint = registry.get(self.server)?;
        let service = endpoint.service(self.service)?;
        Some((endpoint, service))
    }
}
