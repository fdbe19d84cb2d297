//! # ماژول تنظیمات (Configuration)
//!
//! این ماژول مسئول خوندن و مدیریت تنظیمات کلاینت هست.
//!
//! ## مفاهیم Rust:
//! - **Structs**: ساختار داده‌ای برای نگهداری تنظیمات
//! - **Derive Macros**: تولید خودکار کد با `#[derive(...)]`
//! - **Default Trait**: مقادیر پیش‌فرض
//! - **Builder Pattern**: ساخت تدریجی آبجکت
//!
//! ## نکته معماری
//!
//! سورس اصلی برای هر resource یک prefix متفاوت داشت (بعضی‌ها `/api/v1`
//! و بعضی‌ها بدون prefix). اینجا به یک convention واحد نرمالایز شده:
//! همه مسیرها نسبت به `base_url + api_prefix` ساخته میشن.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// تنظیمات اصلی کلاینت
///
/// # مفاهیم:
/// - `#[derive(...)]`: macro برای تولید خودکار implementation
/// - `Clone`: اجازه کپی کردن (deep copy)
/// - `Serialize/Deserialize`: تبدیل به/از JSON
///
/// # مثال
/// ```rust
/// use admin_panel_client::config::ClientConfig;
///
/// let config = ClientConfig::default();
/// println!("Base URL: {}", config.base_url);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// آدرس پایه بک‌اند (مثلا `https://panel.example.com`)
    pub base_url: String,

    /// پیشوند مسیر API - همه endpointها با این prefix ساخته میشن
    pub api_prefix: String,

    /// timeout هر درخواست (ثانیه)
    pub request_timeout_secs: u64,

    /// حداکثر تعداد تلاش برای GETها (شامل تلاش اول)
    /// mutationها هیچوقت retry نمیشن
    pub max_get_attempts: u32,

    /// تاخیر پایه backoff بین تلاش‌ها (میلی‌ثانیه)
    pub retry_base_delay_ms: u64,

    /// تاخیر debounce جستجو (میلی‌ثانیه)
    pub search_debounce_ms: u64,

    /// حداقل طول عبارت جستجو - کوتاه‌تر از این اصلا ارسال نمیشه
    pub min_search_len: usize,

    /// مدت اعتبار توکن ذخیره‌شده (روز) - معادل expiry کوکی
    pub token_ttl_days: i64,

    /// محیط اجرا (development, production)
    pub environment: Environment,
}

/// محیط اجرای برنامه
///
/// # مفاهیم:
/// - `enum`: نوع داده شمارشی
/// - `#[serde(rename_all = "lowercase")]`: تغییر نام‌گذاری در سریالایز
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// محیط توسعه - با قابلیت‌های دیباگ
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید - بهینه‌سازی شده
    Production,
}

impl Environment {
    /// آیا در محیط توسعه هستیم؟
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// آیا در محیط تولید هستیم؟
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// تبدیل String به Environment
impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

/// مقادیر پیش‌فرض برای ClientConfig
impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_prefix: "/api/v1".to_string(),
            request_timeout_secs: 30,
            max_get_attempts: 3,
            retry_base_delay_ms: 300,
            search_debounce_ms: 600,
            min_search_len: 2,
            token_ttl_days: 7,
            environment: Environment::Development,
        }
    }
}

impl ClientConfig {
    /// ساخت تنظیمات از متغیرهای محیطی
    ///
    /// # مفاهیم:
    /// - `env::var()`: خوندن متغیر محیطی
    /// - `unwrap_or_else`: مقدار پیش‌فرض با closure
    /// - `parse()`: تبدیل String به نوع‌های دیگه
    ///
    /// # Errors
    /// این متد خودش خطا نمیده؛ اعتبارسنجی جداست (`validate`)
    ///
    /// # مثال
    /// ```rust,no_run
    /// use admin_panel_client::config::ClientConfig;
    ///
    /// let config = ClientConfig::from_env().expect("Failed to load config");
    /// ```
    pub fn from_env() -> Result<Self> {
        // helper function برای خوندن متغیر محیطی با default
        let get_env = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        // helper برای parse کردن عدد
        let parse_env = |key: &str, default: u64| -> u64 {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            base_url: get_env("PANEL_BASE_URL", "http://localhost:5000"),
            api_prefix: get_env("PANEL_API_PREFIX", "/api/v1"),
            request_timeout_secs: parse_env("PANEL_REQUEST_TIMEOUT_SECS", 30),
            max_get_attempts: parse_env("PANEL_MAX_GET_ATTEMPTS", 3) as u32,
            retry_base_delay_ms: parse_env("PANEL_RETRY_BASE_DELAY_MS", 300),
            search_debounce_ms: parse_env("PANEL_SEARCH_DEBOUNCE_MS", 600),
            min_search_len: parse_env("PANEL_MIN_SEARCH_LEN", 2) as usize,
            token_ttl_days: parse_env("PANEL_TOKEN_TTL_DAYS", 7) as i64,
            environment: get_env("ENVIRONMENT", "development").into(),
        })
    }

    /// اعتبارسنجی تنظیمات
    ///
    /// # مفاهیم:
    /// - Early return: برگشت زودهنگام در صورت خطا
    /// - استفاده از کتابخانه url برای چک کردن base_url
    pub fn validate(&self) -> Result<()> {
        // base_url باید یک URL مطلق معتبر باشه
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("PANEL_BASE_URL is invalid: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::Config(
                "PANEL_BASE_URL must use http or https".to_string(),
            ));
        }

        // prefix باید با / شروع بشه و با / تموم نشه
        if !self.api_prefix.is_empty()
            && (!self.api_prefix.starts_with('/') || self.api_prefix.ends_with('/'))
        {
            return Err(AppError::Config(
                "PANEL_API_PREFIX must start with '/' and not end with '/'".to_string(),
            ));
        }

        if self.max_get_attempts == 0 {
            return Err(AppError::Config(
                "PANEL_MAX_GET_ATTEMPTS cannot be 0".to_string(),
            ));
        }

        if self.token_ttl_days <= 0 {
            return Err(AppError::Config(
                "PANEL_TOKEN_TTL_DAYS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// timeout به صورت Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// تاخیر debounce به صورت Duration
    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// آدرس کامل API (base + prefix)
    ///
    /// # مفاهیم:
    /// - `format!`: ماکرو برای ساخت String
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_prefix)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت ClientConfig با Builder Pattern
///
/// # مفاهیم:
/// - Builder Pattern: ساخت تدریجی یک object
/// - Method Chaining: زنجیره‌ای کردن متدها
/// - Consuming self: گرفتن ownership در هر متد
///
/// # مثال
/// ```rust
/// use admin_panel_client::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .base_url("https://panel.example.com")
///     .min_search_len(3)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: ClientConfig,
}

impl ConfigBuilder {
    /// ساخت builder جدید
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// تنظیم آدرس پایه
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// تنظیم پیشوند API
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// تنظیم timeout درخواست (ثانیه)
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// تنظیم حداکثر تلاش GET
    #[must_use]
    pub fn max_get_attempts(mut self, attempts: u32) -> Self {
        self.config.max_get_attempts = attempts;
        self
    }

    /// تنظیم تاخیر debounce (میلی‌ثانیه)
    #[must_use]
    pub fn search_debounce_ms(mut self, ms: u64) -> Self {
        self.config.search_debounce_ms = ms;
        self
    }

    /// تنظیم حداقل طول جستجو
    #[must_use]
    pub fn min_search_len(mut self, len: usize) -> Self {
        self.config.min_search_len = len;
        self
    }

    /// تنظیم مدت اعتبار توکن (روز)
    #[must_use]
    pub fn token_ttl_days(mut self, days: i64) -> Self {
        self.config.token_ttl_days = days;
        self
    }

    /// تنظیم محیط
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// ساخت ClientConfig نهایی
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }

    /// ساخت ClientConfig با اعتبارسنجی
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اعتبارسنجی fail بشه
    pub fn build_validated(self) -> Result<ClientConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
