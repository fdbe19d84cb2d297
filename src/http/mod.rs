//! # لایه انتقال (HTTP Transport)
//!
//! این ماژول معادل لایه data access هست: تنها جاییه که واقعا HTTP
//! رد و بدل میشه. بقیه crate فقط با trait `ApiTransport` کار میکنه
//! که تست‌ها بتونن fake/mock جایگزین کنن.
//!
//! ## مفاهیم Rust:
//! - **async-trait**: trait با متدهای async
//! - **Trait Objects**: `Arc<dyn TokenStore>` برای تزریق storage
//! - **Retry با backoff**: فقط برای GETها؛ mutationها هیچوقت
//!   خودکار تکرار نمیشن
//!
//! ## هدرها
//! - `Authorization: Bearer <token>` وقتی session داریم
//! - `X-CSRF-Token` روی POST/PUT/PATCH/DELETE - تنبل fetch میشه و
//!   تا وقتی یک 403 از جنس CSRF باطلش نکنه کش میمونه

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{AppError, ErrorBody, Result};
use crate::models::{ApiEnvelope, CsrfTokenData};
use crate::utils;

// =====================================
// API Request
// =====================================
/// توصیف یک درخواست به بک‌اند
///
/// مسیر نسبت به `api_root` هست و باید با `/` شروع بشه.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// درخواست GET ساده
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// درخواست GET با query string
    #[must_use]
    pub fn get_with_query(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query,
            body: None,
        }
    }

    /// درخواست POST با بدنه JSON
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// درخواست PUT با بدنه JSON
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// درخواست DELETE
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// آیا این درخواست state سرور رو تغییر میده؟ (نیازمند CSRF)
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

// =====================================
// Transport Trait
// =====================================
/// seam اصلی شبکه - همه سرویس‌ها از این عبور میکنن
///
/// خروجی بدنه JSON پاسخ موفقه؛ خطاها به `AppError` ترجمه شدن.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// اجرای یک درخواست
    async fn send(&self, request: ApiRequest) -> Result<Value>;

    /// دور ریختن state وابسته به session (کش CSRF)
    ///
    /// پیاده‌سازی پیش‌فرض no-op هست؛ transport واقعی override میکنه.
    fn clear_session_state(&self) {}
}

// =====================================
// Token Store
// =====================================
/// توکن ذخیره‌شده با انقضا (معادل کوکی با expiry هفت روزه)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    /// ساخت توکن با TTL روزانه
    #[must_use]
    pub fn with_ttl_days(token: impl Into<String>, days: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: Utc::now() + ChronoDuration::days(days),
        }
    }

    /// آیا منقضی شده؟
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// storage توکن session
///
/// پیاده‌سازی‌ها: حافظه‌ای (تست/embed) و فایل (persist بین اجراها).
pub trait TokenStore: Send + Sync {
    /// خوندن توکن معتبر (منقضی‌ها None برمیگردن)
    fn load(&self) -> Option<StoredToken>;

    /// ذخیره توکن
    fn save(&self, token: StoredToken) -> Result<()>;

    /// پاک کردن (logout یا 401)
    fn clear(&self);
}

/// storage حافظه‌ای
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    /// ساخت storage خالی
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<StoredToken> {
        let slot = self.slot.lock().expect("token lock poisoned");
        slot.clone().filter(|t| !t.is_expired())
    }

    fn save(&self, token: StoredToken) -> Result<()> {
        *self.slot.lock().expect("token lock poisoned") = Some(token);
        Ok(())
    }

    fn clear(&self) {
        *self.slot.lock().expect("token lock poisoned") = None;
    }
}

/// storage فایل - توکن رو به صورت JSON کنار config کاربر نگه میداره
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// ساخت storage روی مسیر مشخص
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<StoredToken> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token: StoredToken = serde_json::from_str(&raw).ok()?;

        if token.is_expired() {
            // توکن منقضی مثل نبودنش رفتار میکنه؛ فایل هم تمیز میشه
            self.clear();
            return None;
        }

        Some(token)
    }

    fn save(&self, token: StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(&token)?)?;
        Ok(())
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

// =====================================
// CSRF Cache
// =====================================
/// کش توکن CSRF
///
/// تنبل پر میشه و با اولین خطای CSRF باطل میشه؛ mutation بعدی
/// شفاف یک توکن تازه میگیره.
#[derive(Debug, Default)]
pub struct CsrfCache {
    token: Mutex<Option<String>>,
}

impl CsrfCache {
    /// توکن کش‌شده (در صورت وجود)
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.token.lock().expect("csrf lock poisoned").clone()
    }

    /// ذخیره توکن تازه
    pub fn set(&self, token: String) {
        *self.token.lock().expect("csrf lock poisoned") = Some(token);
    }

    /// باطل کردن (بعد از 403 از جنس CSRF یا logout)
    pub fn invalidate(&self) {
        *self.token.lock().expect("csrf lock poisoned") = None;
    }
}

// =====================================
// Reqwest Transport
// =====================================
/// پیاده‌سازی واقعی transport روی reqwest
pub struct ReqwestTransport {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenStore>,
    csrf: CsrfCache,
}

impl ReqwestTransport {
    /// ساخت transport از config
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            config,
            tokens,
            csrf: CsrfCache::default(),
        })
    }

    /// دسترسی به storage توکن (برای session store)
    #[must_use]
    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        self.tokens.clone()
    }

    /// باطل کردن دستی کش CSRF (موقع logout)
    pub fn invalidate_csrf(&self) {
        self.csrf.invalidate();
    }

    /// آدرس کامل یک مسیر
    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }

    /// گرفتن توکن CSRF - تنبل، فقط وقتی session داریم
    ///
    /// 429 اینجا عمدا ساکته: موقع ترافیک پرشی نباید false-alarm
    /// تولید بشه و نباید mutation اصلی رو هم block کنه.
    async fn ensure_csrf(&self) -> Option<String> {
        if let Some(cached) = self.csrf.get() {
            return Some(cached);
        }

        let bearer = self.tokens.load()?;

        let url = self.url_for("/auth/csrf-token");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&bearer.token)
            .send()
            .await
            .ok()?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            debug!("CSRF token fetch rate limited, proceeding without it");
            return None;
        }

        if !response.status().is_success() {
            debug!(status = %response.status(), "CSRF token fetch failed");
            return None;
        }

        let envelope: ApiEnvelope<CsrfTokenData> = response.json().await.ok()?;
        let token = envelope.data?.csrf_token;
        debug!(token = %utils::mask_string(&token, 4), "CSRF token cached");
        self.csrf.set(token.clone());
        Some(token)
    }

    /// یک بار اجرای درخواست، بدون retry
    async fn execute_once(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.url_for(&request.path);

        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            debug!(query = %utils::encode_query(&request.query), "Query string");
            builder = builder.query(&request.query);
        }

        if let Some(token) = self.tokens.load() {
            builder = builder.bearer_auth(&token.token);
        }

        if request.is_mutation() {
            if let Some(csrf) = self.ensure_csrf().await {
                builder = builder.header("X-CSRF-Token", csrf);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                AppError::Network(e.to_string())
            } else {
                AppError::Http(e)
            }
        })?;

        let status = response.status();

        if status.is_success() {
            // بعضی endpointها (مثلا DELETE) بدنه خالی برمیگردونن
            let text = response.text().await.unwrap_or_default();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        // بدنه خطا رو best-effort پارس میکنیم
        let body: Option<ErrorBody> = response.json().await.ok();
        let error = AppError::from_response(status, body.as_ref());

        if error.is_csrf() {
            // توکن کش‌شده دیگه قابل اعتماد نیست
            self.csrf.invalidate();
        }

        Err(error)
    }

    /// آیا این خطا ارزش retry داره؟ (فقط برای GET)
    fn is_retryable(error: &AppError) -> bool {
        error.is_network() || matches!(error, AppError::Server(_))
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let max_attempts = if request.is_mutation() {
            1
        } else {
            self.config.max_get_attempts
        };

        let mut attempt = 1u32;
        loop {
            match self.execute_once(&request).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && Self::is_retryable(&error) => {
                    let delay = utils::backoff_delay(self.config.retry_base_delay_ms, attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Retrying GET");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn clear_session_state(&self) {
        self.csrf.invalidate();
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_request_helpers() {
        let get = ApiRequest::get("/articles");
        assert!(!get.is_mutation());

        let post = ApiRequest::post("/articles", serde_json::json!({}));
        assert!(post.is_mutation());

        let del = ApiRequest::delete("/articles/a1");
        assert!(del.is_mutation());
        assert_eq!(del.path, "/articles/a1");
    }

    #[test]
    fn test_stored_token_expiry() {
        let fresh = StoredToken::with_ttl_days("t", 7);
        assert!(!fresh.is_expired());

        let expired = StoredToken {
            token: "t".to_string(),
            expires_at: Utc::now() - ChronoDuration::hours(1),
        };
        assert!(expired.is_expired());
    }

    #[test]
    fn test_memory_store_filters_expired() {
        let store = MemoryTokenStore::new();
        store
            .save(StoredToken {
                token: "old".to_string(),
                expires_at: Utc::now() - ChronoDuration::days(1),
            })
            .unwrap();

        assert!(store.load().is_none());

        store
            .save(StoredToken::with_ttl_days("fresh", 7))
            .unwrap();
        assert_eq!(store.load().unwrap().token, "fresh");

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("panel-token-{}.json", uuid::Uuid::new_v4()));
        let store = FileTokenStore::new(&path);

        assert!(store.load().is_none());

        store.save(StoredToken::with_ttl_days("abc", 7)).unwrap();
        assert_eq!(store.load().unwrap().token, "abc");

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_csrf_cache() {
        let cache = CsrfCache::default();
        assert!(cache.get().is_none());

        cache.set("tok".to_string());
        assert_eq!(cache.get().as_deref(), Some("tok"));

        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
