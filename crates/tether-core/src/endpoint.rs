//! 候选服务器的协议标签与 URI 解析。

use core::fmt;

use crate::error::ParseError;

/// 传输协议标签。
///
/// # 教案式说明
/// - **意图 (Why)**：一个候选服务器只会以一种方式被连接（UDP 直连、TCP
///   建连、TCP 之上再做 TLS 握手），用枚举在类型层面钉死这一事实；
/// - **契约 (What)**：`from_scheme` 大小写不敏感地匹配 `udp`/`tcp`/`tls`，
///   未知 scheme 一律回退为 [`Proto::Tcp`]——这是刻意的宽容默认值，而非
///   解析错误；
/// - **权衡 (Trade-offs)**：宽容回退意味着拼写错误的 scheme 不会在配置期
///   暴露，只能靠连接日志发现；换来的是旧配置在协议名演进时依旧可用。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Proto {
    Udp,
    Tcp,
    Tls,
}

impl Proto {
    /// 按 scheme 字符串匹配协议，未知值回退为 TCP。
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("udp") {
            Proto::Udp
        } else if scheme.eq_ignore_ascii_case("tls") {
            Proto::Tls
        } else {
            Proto::Tcp
        }
    }

    /// 返回规范化的 scheme 文本，用于日志拼接。
    pub fn as_str(self) -> &'static str {
        match self {
            Proto::Udp => "udp",
            Proto::Tcp => "tcp",
            Proto::Tls => "tls",
        }
    }

    /// 该协议是否为面向流的传输（TCP 与 TLS）。
    pub fn is_stream(self) -> bool {
        !matches!(self, Proto::Udp)
    }
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个候选服务器：协议 + 主机 + 有序服务列表。
///
/// # 教案式说明
///
/// ## 意图（Why）
/// - 承载故障转移的最小单元。一台服务器可以暴露多个服务（端口），游标
///   会在换机之前先把同一台机器上的服务扫完。
///
/// ## 契约（What）
/// - 由 [`ServerEndpoint::parse`] 从 `[proto://]host[:svc1,svc2,...]` 构造；
/// - 构造成功后不可变，`services` 恒非空；
/// - 解析失败时不产生任何部分构造的对象（原子性）；
/// - `uri` 保留调用方传入的原始文本，仅用于日志与排障。
///
/// ## 实现（How）
/// - scheme 通过首个 `://` 切分，缺省为 `tcp`；
/// - 主机为其后到第一个 `:` 之前的子串；服务列表按 `,` 切分且不允许空项。
///
/// ## 注意事项（Trade-offs）
/// - 主机按“第一个冒号之前”的朴素规则切分，因此字面量 IPv6 地址
///   （自身含冒号）不在支持范围内；如需 IPv6 请使用可解析的主机名。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerEndpoint {
    uri: String,
    proto: Proto,
    host: String,
    services: Vec<String>,
}

impl ServerEndpoint {
    /// 解析 `[proto://]host[:svc1,svc2,...]` 形式的候选服务器 URI。
    ///
    /// # 契约说明
    /// - **输入**：服务列表为强制项，至少包含一个非空服务；
    /// - **输出**：成功时返回完整端点；失败时返回 [`ParseError`]，调用方
    ///   侧不会观察到任何中间状态。
    pub fn parse(uri: &str) -> Result<Self, ParseError> {
        let (proto, rest) = match uri.split_once("://") {
            Some((scheme, rest)) => (Proto::from_scheme(scheme), rest),
            None => (Proto::Tcp, uri),
        };

        let (host, services_raw) = rest.split_once(':').ok_or_else(|| {
            ParseError::MissingServices {
                uri: uri.to_string(),
            }
        })?;

        if host.is_empty() {
            return Err(ParseError::EmptyHost {
                uri: uri.to_string(),
            });
        }

        let mut services = Vec::new();
        for service in services_raw.split(',') {
            if service.is_empty() {
                return Err(ParseError::EmptyService {
                    uri: uri.to_string(),
                });
            }
            services.push(service.to_string());
        }
        debug_assert!(!services.is_empty());

        Ok(Self {
            uri: uri.to_string(),
            proto,
            host: host.to_string(),
            services,
        })
    }

    /// 原始 URI 文本。
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 连接协议。
    pub fn proto(&self) -> Proto {
        self.proto
    }

    /// 目标主机（主机名或 IP 字面量）。
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 有序服务列表，恒非空。
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// 按下标取服务；越界返回 `None`。
    pub fn service(&self, index: usize) -> Option<&str> {
        self.services.get(index).map(String::as_str)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.proto, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tls_uri_with_ordered_services() {
        let ep = ServerEndpoint::parse("tls://example.com:443,8443").expect("uri 应当合法");
        assert_eq!(ep.proto(), Proto::Tls);
        assert_eq!(ep.host(), "example.com");
        assert_eq!(ep.services(), ["443".to_string(), "8443".to_string()]);
        assert_eq!(ep.uri(), "tls://example.com:443,8443");
    }

    #[test]
    fn scheme_defaults_to_tcp_when_omitted() {
        let ep = ServerEndpoint::parse("example.com:80").expect("缺省 scheme 应回退为 tcp");
        assert_eq!(ep.proto(), Proto::Tcp);
    }

    #[test]
    fn scheme_matching_is_case_insensitive() {
        let ep = ServerEndpoint::parse("TLS://example.com:443").expect("大写 scheme 应可解析");
        assert_eq!(ep.proto(), Proto::Tls);
        let ep = ServerEndpoint::parse("Udp://example.com:53").expect("混合大小写应可解析");
        assert_eq!(ep.proto(), Proto::Udp);
    }

    #[test]
    fn unknown_scheme_falls_back_to_tcp() {
        let ep = ServerEndpoint::parse("quic://host:53").expect("未知 scheme 不是解析错误");
        assert_eq!(ep.proto(), Proto::Tcp);
        assert_eq!(ep.host(), "host");
    }

    #[test]
    fn missing_service_list_is_rejected() {
        let err = ServerEndpoint::parse("example.com").expect_err("无服务列表必须失败");
        assert_eq!(
            err,
            ParseError::MissingServices {
                uri: "example.com".to_string()
            }
        );
    }

    #[test]
    fn empty_service_entries_are_rejected() {
        assert!(matches!(
            ServerEndpoint::parse("host:"),
            Err(ParseError::EmptyService { .. })
        ));
        assert!(matches!(
            ServerEndpoint::parse("host:80,,443"),
            Err(ParseError::EmptyService { .. })
        ));
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            ServerEndpoint::parse("tcp://:80"),
            Err(ParseError::EmptyHost { .. })
        ));
    }
}
