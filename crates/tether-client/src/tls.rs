//! 进程级 TLS 客户端配置。
//!
//! # 教案式说明
//! - **Why**：TLS 库的初始化是进程级关切：加密后端只需安装一次，webpki
//!   信任链也只需构建一次，多个客户端实例应当共享同一份缺省配置；
//! - **How**：两个 `OnceLock` 分别守护“安装 ring 加密后端”与“构建缺省
//!   `ClientConfig`”，任意数量的客户端并发触发都只会执行一次，重复调用
//!   是无操作；
//! - **What**：[`default_client_config`] 返回的配置可直接交给
//!   `tokio_rustls::TlsConnector`；需要自签信任链的场景请改用
//!   `ClientOptions::with_tls_config` 注入，不要改动进程级缺省值。

use std::sync::{Arc, OnceLock};

use rustls::{ClientConfig, RootCertStore};

static CRYPTO_PROVIDER: OnceLock<()> = OnceLock::new();
static DEFAULT_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// 幂等地安装进程级加密后端。
///
/// 多个客户端（或宿主自身）可能竞争安装，后到者的失败被有意忽略。
pub(crate) fn install_crypto_provider() {
    CRYPTO_PROVIDER.get_or_init(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// 返回进程级共享的缺省 TLS 客户端配置（webpki 信任链，无客户端证书）。
pub fn default_client_config() -> Arc<ClientConfig> {
    DEFAULT_CONFIG
        .get_or_init(|| {
            install_crypto_provider();
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            Arc::new(
                ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth(),
            )
        })
        .clone()
}
