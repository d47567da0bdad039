//! 连接引擎的可选参数集合。

use std::sync::Arc;
use std::time::Duration;

use rustls::ClientConfig;

/// 连接引擎的可选参数集合。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 将“重试间隔”“TLS 客户端配置”这类宿主可调项显式建模为数据结构，
///   避免在引擎内部散布魔法常量；
/// - 为测试与嵌入方提供注入点：自签证书信任链通过 `with_tls_config`
///   传入，无需打补丁或改动全局状态。
///
/// ## 契约（What）
/// - `retry_interval`：重连调度器的固定触发间隔，缺省 1000ms；没有退避、
///   没有次数上限——“固定间隔、永远重试”是引擎的既定策略而非缺陷；
/// - `tls`：TLS 候选使用的 `rustls` 客户端配置；缺省 `None` 时引擎退回
///   进程级共享的 webpki 信任链配置。
#[derive(Clone, Debug)]
pub struct ClientOptions {
    retry_interval: Duration,
    tls: Option<Arc<ClientConfig>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(1000),
            tls: None,
        }
    }
}

impl ClientOptions {
    /// 构造缺省参数。
    pub fn new() -> Self {
        Self::default()
    }

    /// 调整重连调度器的触发间隔。
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// 注入自定义的 TLS 客户端配置。
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    /// 当前的重连间隔。
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// 当前的 TLS 配置覆盖（若有）。
    pub fn tls_config(&self) -> Option<&Arc<ClientConfig>> {
        self.tls.as_ref()
    }
}
