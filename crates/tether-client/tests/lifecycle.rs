//! 连接生命周期端到端验证：误用错误、UDP/TCP 建链、单尝试不变式与
//! 停机语义。
//!
//! # 教案式说明
//! - **Why**：状态机契约（`Closed` 守卫、回调时机、误用无副作用）是上层
//!   协议客户端的依赖基线，必须在真实回环套接字上验证；
//! - **How**：服务端一律绑定 `127.0.0.1:0` 由内核分配端口；候选主机使用
//!   IP 字面量，解析走快路径，测试不触碰真实 DNS；
//! - **What**：断言失败时 `expect` 直接给出场景上下文。

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use tether_client::{ClientError, ClientOptions, LinkState, Proto, TetherClient};

const WAIT: Duration = Duration::from_secs(10);

fn fast_client() -> TetherClient {
    TetherClient::new(ClientOptions::new().with_retry_interval(Duration::from_millis(50)))
}

async fn wait_for(client: &TetherClient, target: LinkState) {
    let mut rx = client.subscribe_state();
    timeout(WAIT, rx.wait_for(|state| *state == target))
        .await
        .expect("等待目标状态超时")
        .expect("状态通道不应关闭");
}

/// `close` 在非 `Connected` 态必须失败且无副作用。
#[tokio::test(flavor = "multi_thread")]
async fn close_while_not_connected_fails_without_side_effect() {
    let client = fast_client();
    client
        .add_server("tcp://127.0.0.1:1")
        .expect("合法 URI 必须可登记");

    let err = client.close().await.expect_err("未连接时 close 必须失败");
    assert!(matches!(err, ClientError::NotConnected));
    assert_eq!(client.server_count(), 1, "误用错误不得触碰登记表");
    assert!(client.state().is_closed());
}

/// 已建链后的读写误用：链路不存在时读写返回 `NotConnected`。
#[tokio::test(flavor = "multi_thread")]
async fn read_write_require_a_link() {
    let client = fast_client();
    let mut buf = [0u8; 4];
    assert!(matches!(
        client.read(&mut buf).await,
        Err(ClientError::NotConnected)
    ));
    assert!(matches!(
        client.write(b"x").await,
        Err(ClientError::NotConnected)
    ));
}

/// UDP 候选：`Closed → Resolving → Connected`，无握手、无 TLS 会话，
/// 建链后可立即发送数据报。
#[tokio::test(flavor = "multi_thread")]
async fn udp_link_goes_straight_to_connected() {
    let server = UdpSocket::bind("127.0.0.1:0").await.expect("绑定回环失败");
    let port = server.local_addr().expect("取本地地址失败").port();

    let client = fast_client();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.set_connect_callback(move |info| {
        let _ = tx.send(info.clone());
    });
    client
        .add_server(&format!("udp://127.0.0.1:{port}"))
        .expect("UDP URI 必须可登记");
    client.start().expect("启动调度器失败");

    let info = timeout(WAIT, rx.recv())
        .await
        .expect("等待 on_connect 超时")
        .expect("回调通道不应关闭");
    assert_eq!(info.proto, Proto::Udp);
    assert_eq!(info.service, port.to_string());
    assert!(client.state().is_connected());

    client.write(b"ping").await.expect("UDP 写入失败");
    let mut buf = [0u8; 16];
    let (len, _) = timeout(WAIT, server.recv_from(&mut buf))
        .await
        .expect("等待数据报超时")
        .expect("接收数据报失败");
    assert_eq!(&buf[..len], b"ping");

    client.shutdown().await;
}

/// TCP 候选：建链、载荷写入、显式 `close` 触发 `on_close`，且关闭后
/// 再次 `close` 返回误用错误。
#[tokio::test(flavor = "multi_thread")]
async fn tcp_link_connects_and_closes_cleanly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定回环失败");
    let port = listener.local_addr().expect("取本地地址失败").port();

    let client = fast_client();
    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    client.set_close_callback(move || {
        let _ = close_tx.send(());
    });
    client
        .add_server(&format!("tcp://127.0.0.1:{port}"))
        .expect("TCP URI 必须可登记");
    client.start().expect("启动调度器失败");

    let (mut server_side, _) = timeout(WAIT, listener.accept())
        .await
        .expect("等待建连超时")
        .expect("accept 失败");
    wait_for(&client, LinkState::Connected).await;

    client.write(b"hello").await.expect("TCP 写入失败");
    let mut buf = [0u8; 5];
    timeout(WAIT, server_side.read_exact(&mut buf))
        .await
        .expect("等待载荷超时")
        .expect("服务端读取失败");
    assert_eq!(&buf, b"hello");

    // 先解除武装再关闭，避免调度器立刻重连干扰终态断言。
    client.stop();
    client.close().await.expect("已连接时 close 必须成功");
    timeout(WAIT, close_rx.recv())
        .await
        .expect("等待 on_close 超时")
        .expect("回调通道不应关闭");
    assert!(client.state().is_closed());
    assert!(matches!(
        client.close().await,
        Err(ClientError::NotConnected)
    ));

    client.shutdown().await;
}

/// 单尝试不变式：已建链期间调度器 tick 必须是无操作，不得出现第二次
/// 建连。
#[tokio::test(flavor = "multi_thread")]
async fn scheduler_is_a_noop_while_connected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定回环失败");
    let port = listener.local_addr().expect("取本地地址失败").port();

    let client = fast_client();
    client
        .add_server(&format!("tcp://127.0.0.1:{port}"))
        .expect("TCP URI 必须可登记");
    client.start().expect("启动调度器失败");

    let (_server_side, _) = timeout(WAIT, listener.accept())
        .await
        .expect("等待建连超时")
        .expect("accept 失败");
    wait_for(&client, LinkState::Connected).await;

    // 多个重试间隔内不应出现第二条连接。
    let second = timeout(Duration::from_millis(300), listener.accept()).await;
    assert!(second.is_err(), "Connected 态不得发起新尝试");

    client.shutdown().await;
}

/// `stop` 解除武装后不再发起新尝试；重新 `start` 恢复重连。
#[tokio::test(flavor = "multi_thread")]
async fn stop_disarms_and_start_rearms() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定回环失败");
    let port = listener.local_addr().expect("取本地地址失败").port();

    let client = fast_client();
    client.start().expect("启动调度器失败");
    client.stop();
    client
        .add_server(&format!("tcp://127.0.0.1:{port}"))
        .expect("TCP URI 必须可登记");

    sleep(Duration::from_millis(300)).await;
    assert!(client.state().is_closed(), "解除武装后不得发起尝试");

    client.start().expect("重新武装失败");
    timeout(WAIT, listener.accept())
        .await
        .expect("重新武装后应当建连")
        .expect("accept 失败");
    wait_for(&client, LinkState::Connected).await;

    client.shutdown().await;
}

/// `shutdown` 幂等、任意状态下安全，且之后 `start` 失败。
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_is_terminal_and_idempotent() {
    let client = fast_client();
    client
        .add_server("tcp://127.0.0.1:1")
        .expect("合法 URI 必须可登记");

    client.shutdown().await;
    client.shutdown().await;

    assert!(client.state().is_closed());
    assert_eq!(client.server_count(), 0, "shutdown 必须清空登记表");
    assert!(matches!(client.start(), Err(ClientError::ShutDown)));
}
