//! 连接状态机、重连调度器与公开客户端句柄。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tether_core::{FailoverCursor, LinkState, Proto, ServerRegistry};

use crate::error::ClientError;
use crate::events::{CallbackSlots, PeerInfo};
use crate::options::ClientOptions;
use crate::resolver::HostResolver;
use crate::transport::{self, Transport};

/// 持久多传输客户端：注册若干候选服务器后保持“至多一条活动链路”，
/// 断开即按确定性轮转次序自动重连。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 为上层协议客户端提供一个“自己会保持连接”的传输底座：解析、建连、
///   握手、失败回退与定时重试全部由引擎内部闭环完成；
/// - 句柄可廉价克隆，任意克隆体都操作同一个共享引擎。
///
/// ## 契约（What）
/// - [`add_server`](TetherClient::add_server) 登记候选（解析失败登记表不变）；
/// - [`start`](TetherClient::start) 启动固定间隔的重连调度器（必须在
///   Tokio 运行时内调用），[`stop`](TetherClient::stop) 仅阻止发起新尝试，
///   不中断在途尝试；
/// - [`close`](TetherClient::close) 仅在 `Connected` 态成功，其余状态返回
///   [`ClientError::NotConnected`] 且无任何副作用；
/// - [`shutdown`](TetherClient::shutdown) 终止调度任务（在途尝试在下一个
///   `await` 点被取消并释放其资源）、关闭既有链路并清空登记表，之后
///   `start` 返回 [`ClientError::ShutDown`]；任何状态下调用都安全且幂等；
/// - 每次成功进入 `Connected` 之前同步触发 `on_connect`；`on_close` 只在
///   `Connected → Closed` 迁移时触发，解析/建连/握手失败不触发回调。
///
/// ## 实现逻辑（How）
/// - 重连调度器是一个持有 `tokio::time::interval` 的驱动任务：tick 时仅当
///   状态为 `Closed`、登记表非空且调度器处于武装状态才推进游标并就地执行
///   一次尝试。尝试内联执行加上 `Closed` 守卫共同保证“同一时刻至多一次
///   尝试在途”；
/// - 传输句柄与 TLS 会话由尝试过程独占持有，任何失败路径通过所有权
///   （drop）完成释放；成功后句柄移入链路槽位，`close`/读写错误路径取出
///   并显式关闭。
///
/// ## 注意事项（Trade-offs）
/// - 读写与关闭共用链路槽位的异步互斥锁：一个阻塞在 `read` 上的任务会
///   推迟并发 `close` 的生效，直到该次读取返回。如需即刻中断，请在上层
///   为读取包裹超时；
/// - 登记表允许在任意状态下增删；在途尝试使用的是推进游标当刻的候选
///   快照，不受后续增删影响。
#[derive(Clone)]
pub struct TetherClient {
    shared: Arc<Shared>,
}

struct Shared {
    options: ClientOptions,
    targets: Mutex<TargetTable>,
    link: AsyncMutex<Option<ActiveLink>>,
    state_tx: watch::Sender<LinkState>,
    armed: AtomicBool,
    callbacks: CallbackSlots,
    driver: Mutex<DriverSlot>,
    resolver: HostResolver,
}

/// 登记表与游标必须在同一把锁下推进，否则轮转次序会被并发修改打乱。
#[derive(Default)]
struct TargetTable {
    registry: ServerRegistry,
    cursor: FailoverCursor,
}

/// 已建立的链路：传输句柄 + 对端描述。
struct ActiveLink {
    transport: Transport,
    peer: PeerInfo,
}

enum DriverSlot {
    Idle,
    Running(JoinHandle<()>),
    Terminated,
}

/// 推进游标当刻做出的候选快照；尝试全程只依赖该快照。
#[derive(Clone)]
struct Candidate {
    uri: String,
    proto: Proto,
    host: String,
    service: String,
}

impl Default for TetherClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl TetherClient {
    /// 以给定参数构造客户端；进程级 TLS 支持在此幂等初始化。
    pub fn new(options: ClientOptions) -> Self {
        crate::tls::install_crypto_provider();
        let (state_tx, _) = watch::channel(LinkState::Closed);
        Self {
            shared: Arc::new(Shared {
                options,
                targets: Mutex::new(TargetTable::default()),
                link: AsyncMutex::new(None),
                state_tx,
                armed: AtomicBool::new(false),
                callbacks: CallbackSlots::new(),
                driver: Mutex::new(DriverSlot::Idle),
                resolver: HostResolver::new(),
            }),
        }
    }

    /// 解析并登记一个候选服务器 URI；失败时登记表保持原状。
    pub fn add_server(&self, uri: &str) -> Result<(), ClientError> {
        let mut targets = self.shared.lock_targets();
        targets.registry.add(uri)?;
        Ok(())
    }

    /// 清空全部候选并把故障转移游标复位到 `(0, 0)`。
    pub fn remove_all_servers(&self) {
        let mut targets = self.shared.lock_targets();
        targets.registry.clear();
        targets.cursor.reset();
    }

    /// 当前登记的候选服务器数量。
    pub fn server_count(&self) -> usize {
        self.shared.lock_targets().registry.len()
    }

    /// 设置（整体替换）读取钩子。
    pub fn set_read_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.shared.callbacks.set_read(callback);
    }

    /// 清除读取钩子。
    pub fn clear_read_callback(&self) {
        self.shared.callbacks.clear_read();
    }

    /// 设置（整体替换）建链钩子。
    pub fn set_connect_callback(&self, callback: impl Fn(&PeerInfo) + Send + Sync + 'static) {
        self.shared.callbacks.set_connect(callback);
    }

    /// 清除建链钩子。
    pub fn clear_connect_callback(&self) {
        self.shared.callbacks.clear_connect();
    }

    /// 设置（整体替换）关闭钩子。
    pub fn set_close_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.shared.callbacks.set_close(callback);
    }

    /// 清除关闭钩子。
    pub fn clear_close_callback(&self) {
        self.shared.callbacks.clear_close();
    }

    /// 武装重连调度器；首次调用时派生驱动任务。
    ///
    /// 必须在 Tokio 运行时上下文内调用。`shutdown` 之后调用返回
    /// [`ClientError::ShutDown`]。
    pub fn start(&self) -> Result<(), ClientError> {
        {
            let mut slot = self.shared.lock_driver();
            match &*slot {
                DriverSlot::Terminated => return Err(ClientError::ShutDown),
                DriverSlot::Running(_) => {}
                DriverSlot::Idle => {
                    let handle = tokio::spawn(run_driver(self.shared.clone()));
                    *slot = DriverSlot::Running(handle);
                }
            }
        }
        self.shared.armed.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// 解除调度器武装：不再发起新尝试，但不中断在途尝试，也不关闭
    /// 既有链路。
    pub fn stop(&self) {
        self.shared.armed.store(false, Ordering::SeqCst);
    }

    /// 关闭当前链路。
    ///
    /// 仅在 `Connected` 态成功；关闭后触发 `on_close`，调度器（若武装）
    /// 会在下一个 tick 发起新的尝试。
    pub async fn close(&self) -> Result<(), ClientError> {
        let mut guard = self.shared.link.lock().await;
        let Some(link) = guard.take() else {
            return Err(ClientError::NotConnected);
        };
        drop(guard);
        self.shared.tear_down(link).await;
        Ok(())
    }

    /// 终止引擎：停止调度任务、关闭既有链路、清空登记表。
    ///
    /// 任何状态下调用都安全且幂等；之后 `start` 将失败。
    pub async fn shutdown(&self) {
        {
            let mut slot = self.shared.lock_driver();
            if let DriverSlot::Running(handle) =
                std::mem::replace(&mut *slot, DriverSlot::Terminated)
            {
                handle.abort();
            }
        }
        self.shared.armed.store(false, Ordering::SeqCst);

        let taken = self.shared.link.lock().await.take();
        if let Some(link) = taken {
            self.shared.tear_down(link).await;
        } else {
            self.shared.set_state(LinkState::Closed);
        }

        let mut targets = self.shared.lock_targets();
        targets.registry.clear();
        targets.cursor.reset();
    }

    /// 从当前链路读取数据。
    ///
    /// 流式传输读到 `Ok(0)`（对端关闭）或任何 I/O 错误都会执行
    /// `Connected → Closed` 迁移并触发 `on_close`；成功读入载荷后同步
    /// 触发 `on_read` 钩子。
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, ClientError> {
        let mut guard = self.shared.link.lock().await;
        let Some(link) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        let is_stream = link.transport.is_stream();

        match link.transport.read(buf).await {
            Ok(0) if is_stream && !buf.is_empty() => {
                if let Some(link) = guard.take() {
                    drop(guard);
                    self.shared.tear_down(link).await;
                }
                Ok(0)
            }
            Ok(read) => {
                if read > 0 {
                    self.shared.callbacks.fire_read();
                }
                Ok(read)
            }
            Err(err) => {
                if let Some(link) = guard.take() {
                    drop(guard);
                    self.shared.tear_down(link).await;
                }
                Err(ClientError::Io(err))
            }
        }
    }

    /// 向当前链路写入数据，返回实际写出的字节数。
    ///
    /// I/O 错误同样执行 `Connected → Closed` 迁移并触发 `on_close`。
    pub async fn write(&self, buf: &[u8]) -> Result<usize, ClientError> {
        let mut guard = self.shared.link.lock().await;
        let Some(link) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };

        match link.transport.write(buf).await {
            Ok(written) => Ok(written),
            Err(err) => {
                if let Some(link) = guard.take() {
                    drop(guard);
                    self.shared.tear_down(link).await;
                }
                Err(ClientError::Io(err))
            }
        }
    }

    /// 当前链路状态标签。
    pub fn state(&self) -> LinkState {
        *self.shared.state_tx.borrow()
    }

    /// 订阅状态变化；适合上层协议客户端等待 `Connected`。
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.shared.state_tx.subscribe()
    }

    /// 已建链时返回对端描述。
    pub async fn peer_info(&self) -> Option<PeerInfo> {
        self.shared.link.lock().await.as_ref().map(|l| l.peer.clone())
    }
}

impl fmt::Debug for TetherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TetherClient")
            .field("state", &self.state())
            .field("servers", &self.server_count())
            .field("armed", &self.shared.armed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Shared {
    fn set_state(&self, state: LinkState) {
        self.state_tx.send_replace(state);
    }

    fn state(&self) -> LinkState {
        *self.state_tx.borrow()
    }

    fn lock_targets(&self) -> MutexGuard<'_, TargetTable> {
        match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_driver(&self) -> MutexGuard<'_, DriverSlot> {
        match self.driver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 推进游标并取出候选快照；登记表为空时返回 `None`。
    fn next_candidate(&self) -> Option<Candidate> {
        let mut targets = self.lock_targets();
        let TargetTable { registry, cursor } = &mut *targets;
        cursor.advance(registry)?;
        let (endpoint, service) = cursor.current(registry)?;
        Some(Candidate {
            uri: endpoint.uri().to_string(),
            proto: endpoint.proto(),
            host: endpoint.host().to_string(),
            service: service.to_string(),
        })
    }

    /// `Connected → Closed`：关闭传输、广播状态并触发 `on_close`。
    async fn tear_down(&self, mut link: ActiveLink) {
        if let Err(err) = link.transport.shutdown().await {
            debug!(error = %err, "error while shutting down transport");
        }
        self.set_state(LinkState::Closed);
        self.callbacks.fire_close();
    }
}

/// 重连调度器：固定间隔 tick，仅在空闲时发起尝试。
async fn run_driver(shared: Arc<Shared>) {
    let mut ticker = tokio::time::interval(shared.options.retry_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !shared.armed.load(Ordering::SeqCst) {
            continue;
        }
        if !shared.state().is_closed() {
            continue;
        }
        let Some(candidate) = shared.next_candidate() else {
            continue;
        };
        attempt(&shared, candidate).await;
    }
}

/// 执行一次完整尝试：解析 → 建连 →（握手）→ 安装链路。
///
/// 每次尝试恰好以一种方式落定：成功进入 `Connected` 并触发 `on_connect`，
/// 或记录告警后回到 `Closed` 等待下一个 tick 轮转重试。
async fn attempt(shared: &Shared, candidate: Candidate) {
    info!(
        proto = %candidate.proto,
        host = %candidate.host,
        service = %candidate.service,
        "connecting",
    );
    shared.set_state(LinkState::Resolving);

    match run_attempt(shared, &candidate).await {
        Ok(link) => {
            let peer = link.peer.clone();
            *shared.link.lock().await = Some(link);
            shared.set_state(LinkState::Connected);
            shared.callbacks.fire_connect(&peer);
            info!(peer = %peer.peer_addr, uri = %candidate.uri, "link established");
        }
        Err(err) => {
            warn!(uri = %candidate.uri, error = %err, "connection attempt failed");
            shared.set_state(LinkState::Closed);
        }
    }
}

async fn run_attempt(shared: &Shared, candidate: &Candidate) -> Result<ActiveLink, ClientError> {
    let port: u16 = candidate
        .service
        .parse()
        .map_err(|_| ClientError::InvalidService {
            service: candidate.service.clone(),
        })?;
    let addrs = shared.resolver.resolve(&candidate.host).await?;

    let transport = match candidate.proto {
        Proto::Udp => {
            let socket = transport::connect_udp(&addrs, port)
                .await
                .map_err(|source| ClientError::Connect {
                    target: candidate.uri.clone(),
                    source,
                })?;
            Transport::Udp(socket)
        }
        Proto::Tcp => {
            shared.set_state(LinkState::Connecting);
            let stream = transport::connect_tcp(&addrs, port)
                .await
                .map_err(|source| ClientError::Connect {
                    target: candidate.uri.clone(),
                    source,
                })?;
            Transport::Tcp(stream)
        }
        Proto::Tls => {
            shared.set_state(LinkState::Connecting);
            let stream = transport::connect_tcp(&addrs, port)
                .await
                .map_err(|source| ClientError::Connect {
                    target: candidate.uri.clone(),
                    source,
                })?;
            let config = shared
                .options
                .tls_config()
                .cloned()
                .unwrap_or_else(crate::tls::default_client_config);
            let tls = transport::connect_tls(stream, &candidate.host, config)
                .await
                .map_err(|source| ClientError::Handshake {
                    host: candidate.host.clone(),
                    source,
                })?;
            Transport::Tls(Box::new(tls))
        }
    };

    let peer_addr = transport.peer_addr()?;
    Ok(ActiveLink {
        transport,
        peer: PeerInfo {
            proto: candidate.proto,
            host: candidate.host.clone(),
            service: candidate.service.clone(),
            peer_addr,
        },
    })
}
