//! # ماژول سرویس‌ها (Business Logic)
//!
//! این لایه workflow های پنل رو پیاده میکنه: CRUD منابع، تنظیمات،
//! و سیم‌کشی state مشترک. منطق HTTP در لایه transport میمونه و
//! منطق permission/کش اینجا اعمال میشه.
//!
//! ## مفاهیم Rust:
//! - **Dependency Injection**: سرویس‌ها trait object میگیرن
//! - **Arc**: اشتراک state بین سرویس‌ها و taskها

mod resource_service;
mod settings_service;

pub use resource_service::{DeleteFlow, ResourceBrowser, ResourceClient};
pub use settings_service::SettingsClient;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{ApiTransport, MemoryTokenStore, ReqwestTransport, TokenStore};
use crate::notify::{LogNotifier, Notifier};
use crate::query::QueryCache;
use crate::session::SessionStore;

// =====================================
// Client State
// =====================================
/// state مشترک کل کلاینت
///
/// معادل context سراسری اپلیکیشن: هر چیزی که بین صفحه‌ها share میشه
/// اینجا زندگی میکنه. همه فیلدها `Arc` هستن که clone کردن ارزون باشه.
#[derive(Clone)]
pub struct ClientState {
    pub config: Arc<ClientConfig>,
    pub transport: Arc<dyn ApiTransport>,
    pub cache: Arc<QueryCache>,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl ClientState {
    /// سیم‌کشی کامل با transport واقعی
    ///
    /// # Errors
    /// خطا اگه config نامعتبر باشه یا ساخت کلاینت HTTP fail بشه
    pub fn connect(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let config = Arc::new(config);
        let transport: Arc<dyn ApiTransport> =
            Arc::new(ReqwestTransport::new((*config).clone(), tokens.clone())?);

        Ok(Self::with_transport(config, transport, tokens))
    }

    /// سیم‌کشی با transport دلخواه (تست‌ها fake تزریق میکنن)
    #[must_use]
    pub fn with_transport(
        config: Arc<ClientConfig>,
        transport: Arc<dyn ApiTransport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(
            config.clone(),
            transport.clone(),
            tokens,
        ));

        Self {
            config,
            transport,
            cache: Arc::new(QueryCache::new()),
            session,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// سیم‌کشی حافظه‌ای برای تست
    #[must_use]
    pub fn for_testing(transport: Arc<dyn ApiTransport>, notifier: Arc<dyn Notifier>) -> Self {
        let config = Arc::new(ClientConfig::default());
        let mut state =
            Self::with_transport(config, transport, Arc::new(MemoryTokenStore::new()));
        state.notifier = notifier;
        state
    }

    /// ساخت کلاینت CRUD برای یک resource
    ///
    /// # مثال
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use admin_panel_client::config::ClientConfig;
    /// # use admin_panel_client::http::MemoryTokenStore;
    /// # use admin_panel_client::services::ClientState;
    /// let state = ClientState::connect(ClientConfig::default(), Arc::new(MemoryTokenStore::new())).unwrap();
    /// let articles = state.resource("articles");
    /// ```
    #[must_use]
    pub fn resource(&self, name: impl Into<String>) -> ResourceClient {
        ResourceClient::new(
            name,
            self.transport.clone(),
            self.cache.clone(),
            self.session.clone(),
            self.notifier.clone(),
        )
    }

    /// ساخت کلاینت تنظیمات سایت
    #[must_use]
    pub fn settings(&self) -> SettingsClient {
        SettingsClient::new(
            self.transport.clone(),
            self.session.clone(),
            self.notifier.clone(),
        )
    }

    /// پاکسازی کامل بعد از خروج (کش + session)
    pub async fn logout(&self) {
        self.session.logout().await;
        self.cache.clear();
    }
}
