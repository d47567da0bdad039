//! 异步主机名解析。
//!
//! # 教案式说明
//! - **Why**：每次尝试都以“解析选中候选的主机名”开场，解析失败与建连
//!   失败同等对待——记日志、回到 `Closed`、等待下一个 tick 轮转重试；
//! - **How**：IP 字面量走快路径，完全不触碰解析器；真正的主机名交给
//!   `hickory-resolver` 的 Tokio 解析器，解析器在首次使用时惰性构建——
//!   系统配置（`/etc/resolv.conf`）缺失或损坏时退回库内缺省配置，而不是
//!   让整个客户端无法构造；
//! - **What**：每次调用恰好交付一个完成结果：非空地址列表或错误。

use std::net::IpAddr;
use std::sync::OnceLock;

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::debug;

use crate::error::ClientError;

/// 惰性构建的进程内解析器句柄。
#[derive(Default)]
pub(crate) struct HostResolver {
    inner: OnceLock<TokioResolver>,
}

impl HostResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 把主机文本解析为地址列表。
    ///
    /// # 契约说明
    /// - IP 字面量直接返回单元素列表；
    /// - 成功时列表非空；失败以 [`ClientError::Resolve`] 返回。
    pub(crate) async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ClientError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let resolver = self.inner.get_or_init(build_resolver);
        let lookup = resolver
            .lookup_ip(host)
            .await
            .map_err(|err| ClientError::Resolve {
                host: host.to_string(),
                source: Box::new(err),
            })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(ClientError::Resolve {
                host: host.to_string(),
                source: "lookup returned no addresses".to_string().into(),
            });
        }
        Ok(addrs)
    }
}

fn build_resolver() -> TokioResolver {
    match TokioResolver::builder_tokio() {
        Ok(builder) => builder.build(),
        Err(err) => {
            debug!(error = %err, "system resolver configuration unavailable, using library defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
            .build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ip_literals_bypass_the_resolver() {
        let resolver = HostResolver::new();
        let addrs = resolver.resolve("127.0.0.1").await.expect("字面量必须可解析");
        assert_eq!(addrs, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);

        let addrs = resolver.resolve("::1").await.expect("IPv6 字面量必须可解析");
        assert_eq!(addrs, vec!["::1".parse::<IpAddr>().unwrap()]);
    }
}
