//! 回调槽位：建链、关闭与读取三类用户钩子的持有与触发。
//!
//! # 教案式说明
//! - **Why**：上层协议客户端需要在“链路建立/断开”这两个确切时刻同步获得
//!   通知；钩子以闭包形式携带自身捕获的状态，替代 C 风格的
//!   “函数指针 + 不透明上下文”二元组；
//! - **How**：每个槽位是一个 `ArcSwapOption`，设置/替换/清除都是一次原子
//!   指针交换——替换既换函数又换其捕获的上下文，二者不可分割；正在执行
//!   的旧钩子因持有自己的 `Arc` 引用而安全跑完；
//! - **What**：触发是同步的，发生在状态迁移的当下；同一槽位不做多播，
//!   新值整体覆盖旧值，旧闭包捕获的资源在引用计数归零时释放。

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use tether_core::Proto;

/// 已建立链路的对端描述，随 `on_connect` 回调一并交付。
#[derive(Clone, Debug)]
pub struct PeerInfo {
    /// 生效的传输协议。
    pub proto: Proto,
    /// 候选条目中的主机文本（主机名或 IP 字面量）。
    pub host: String,
    /// 本次选中的服务（端口文本）。
    pub service: String,
    /// 实际建连的对端套接字地址。
    pub peer_addr: SocketAddr,
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.proto, self.host, self.service)
    }
}

struct ReadSlot(Box<dyn Fn() + Send + Sync + 'static>);
struct ConnectSlot(Box<dyn Fn(&PeerInfo) + Send + Sync + 'static>);
struct CloseSlot(Box<dyn Fn() + Send + Sync + 'static>);

/// 三个互相独立的回调槽位。
///
/// 槽位为空时触发是无操作；触发始终在调用方（引擎任务）的执行流内同步
/// 完成，不排队、不延迟。
#[derive(Default)]
pub(crate) struct CallbackSlots {
    on_read: ArcSwapOption<ReadSlot>,
    on_connect: ArcSwapOption<ConnectSlot>,
    on_close: ArcSwapOption<CloseSlot>,
}

impl CallbackSlots {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_read(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_read
            .store(Some(Arc::new(ReadSlot(Box::new(callback)))));
    }

    pub(crate) fn clear_read(&self) {
        self.on_read.store(None);
    }

    pub(crate) fn set_connect(&self, callback: impl Fn(&PeerInfo) + Send + Sync + 'static) {
        self.on_connect
            .store(Some(Arc::new(ConnectSlot(Box::new(callback)))));
    }

    pub(crate) fn clear_connect(&self) {
        self.on_connect.store(None);
    }

    pub(crate) fn set_close(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_close
            .store(Some(Arc::new(CloseSlot(Box::new(callback)))));
    }

    pub(crate) fn clear_close(&self) {
        self.on_close.store(None);
    }

    /// 载荷送达后同步触发读取钩子。
    pub(crate) fn fire_read(&self) {
        if let Some(slot) = self.on_read.load_full() {
            (slot.0)();
        }
    }

    /// 每次成功进入 `Connected` 时同步触发。
    pub(crate) fn fire_connect(&self, info: &PeerInfo) {
        if let Some(slot) = self.on_connect.load_full() {
            (slot.0)(info);
        }
    }

    /// `Connected → Closed` 迁移时同步触发。
    pub(crate) fn fire_close(&self) {
        if let Some(slot) = self.on_close.load_full() {
            (slot.0)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_slots_are_noops() {
        let slots = CallbackSlots::new();
        slots.fire_read();
        slots.fire_close();
    }

    #[test]
    fn replacing_a_slot_swaps_function_and_context_together() {
        let slots = CallbackSlots::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        slots.set_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        slots.fire_close();

        let counter = second.clone();
        slots.set_close(move || {
            counter.fetch_add(10, Ordering::SeqCst);
        });
        slots.fire_close();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn cleared_slot_stops_firing() {
        let slots = CallbackSlots::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        slots.set_read(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        slots.fire_read();
        slots.clear_read();
        slots.fire_read();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
