//! 三种传输策略与带标签的传输句柄。
//!
//! # 教案式说明
//!
//! ## 意图（Why）
//! - 一条连接同一时刻只存在一个传输句柄，其形态由当前候选的协议决定；
//!   以和类型 [`Transport`] 建模，使“活动变体与协议一致”成为类型事实，
//!   而不是依赖旁路判别字段；
//! - 三种策略共享同一个完成契约：每次尝试恰好向状态机交付一次成功或
//!   失败，绝不交付零次或多次。
//!
//! ## 实现策略（How）
//! - **UDP**：按地址族绑定通配地址后 `connect` 到解析出的对端，本地即时
//!   完成，没有任何握手步骤；
//! - **TCP**：按解析顺序逐个地址发起异步建连，首个成功者胜出，全部失败
//!   则以最后一个错误定论；
//! - **TLS**：在已建立的 TCP 流之上执行 `tokio-rustls` 握手；对
//!   “还需读入/还需写出”的非阻塞重试由握手 Future 内部的就绪驱动完成，
//!   `await` 返回成功之前绝不上报 `Connected`，致命错误即尝试失败。
//!
//! ## 注意事项（Trade-offs）
//! - 地址列表按解析顺序串行尝试，未做 Happy-Eyeballs 式并发竞速；重连
//!   引擎本身就是以固定节拍重试的，串行足够且更易推理。

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

/// 带协议标签的传输句柄；活动变体恒与本次候选的协议一致。
#[derive(Debug)]
pub(crate) enum Transport {
    Udp(UdpSocket),
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Transport {
    /// 执行一次读取；流式传输返回 `Ok(0)` 表示对端关闭。
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self {
            Transport::Udp(socket) => socket.recv(buf).await,
            Transport::Tcp(stream) => stream.read(buf).await,
            Transport::Tls(stream) => stream.read(buf).await,
        }
    }

    /// 执行一次写入，返回实际写出的字节数。
    pub(crate) async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self {
            Transport::Udp(socket) => socket.send(buf).await,
            Transport::Tcp(stream) => stream.write(buf).await,
            Transport::Tls(stream) => stream.write(buf).await,
        }
    }

    /// 关闭写方向；TLS 会先发送 `close_notify`，UDP 为无操作。
    pub(crate) async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Transport::Udp(_) => Ok(()),
            Transport::Tcp(stream) => stream.shutdown().await,
            Transport::Tls(stream) => stream.shutdown().await,
        }
    }

    /// 对端套接字地址。
    pub(crate) fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Transport::Udp(socket) => socket.peer_addr(),
            Transport::Tcp(stream) => stream.peer_addr(),
            Transport::Tls(stream) => stream.get_ref().0.peer_addr(),
        }
    }

    /// 是否为面向流的传输（`Ok(0)` 才具有“对端关闭”语义）。
    pub(crate) fn is_stream(&self) -> bool {
        !matches!(self, Transport::Udp(_))
    }
}

fn no_usable_address() -> io::Error {
    io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address")
}

/// UDP 策略：绑定通配地址并 `connect` 到首个可用对端，即时完成。
pub(crate) async fn connect_udp(addrs: &[IpAddr], port: u16) -> io::Result<UdpSocket> {
    let mut last_err = None;
    for ip in addrs {
        let bind_addr: SocketAddr = match ip {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = match UdpSocket::bind(bind_addr).await {
            Ok(socket) => socket,
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        };
        match socket.connect(SocketAddr::new(*ip, port)).await {
            Ok(()) => return Ok(socket),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(no_usable_address))
}

/// TCP 策略：按解析顺序逐个地址建连，首个成功者胜出。
pub(crate) async fn connect_tcp(addrs: &[IpAddr], port: u16) -> io::Result<TcpStream> {
    let mut last_err = None;
    for ip in addrs {
        match TcpStream::connect(SocketAddr::new(*ip, port)).await {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(no_usable_address))
}

/// TLS 策略：在已建立的 TCP 流上完成客户端握手。
///
/// `host` 同时用作 SNI 与证书校验名；IP 字面量会落入 `ServerName` 的
/// IP 变体，要求证书携带对应的 IP SAN。
pub(crate) async fn connect_tls(
    stream: TcpStream,
    host: &str,
    config: Arc<ClientConfig>,
) -> io::Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let connector = TlsConnector::from(config);
    connector.connect(server_name, stream).await
}
