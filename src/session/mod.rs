//! # ماژول session (احراز هویت کلاینت)
//!
//! چرخه کامل session: ورود، بررسی session موجود، خروج، پروفایل.
//!
//! ## مفاهیم Rust:
//! - **Interior Mutability**: state پشت `Mutex` چون store بین
//!   taskها share میشه
//! - **Single-flight**: `tokio::sync::Mutex` برای اینکه چند کامپوننت
//!   همزمان فقط یک `GET /auth/me` تولید کنن
//!
//! ## قواعد رفتاری
//!
//! - بررسی session ساکته: 401/403 یعنی «session نداریم»، نه خطا -
//!   state پاک میشه و هیچ notification یا لاگ error تولید نمیشه
//! - 429 در بررسی session و خروج هم ساکته (ترافیک پرشی موقع لود
//!   نباید false-alarm بده)
//! - خروج همیشه state محلی رو پاک میکنه، حتی اگه درخواست fail بشه

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::http::{ApiRequest, ApiTransport, StoredToken, TokenStore};
use crate::models::{
    ApiEnvelope, ChangePasswordRequest, LoginData, LoginRequest, ProfileUpdateRequest, User,
};
use crate::permissions::{Action, Capabilities};

// =====================================
// Session State
// =====================================
/// state داخلی session
#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    has_checked: bool,
}

// =====================================
// Session Store
// =====================================
/// store مرکزی session - همه سرویس‌ها برای gate کردن ازش میپرسن
pub struct SessionStore {
    config: Arc<ClientConfig>,
    transport: Arc<dyn ApiTransport>,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<SessionState>,
    // قفل single-flight برای check_session
    check_guard: tokio::sync::Mutex<()>,
    is_checking: AtomicBool,
}

impl SessionStore {
    /// ساخت store جدید
    #[must_use]
    pub fn new(
        config: Arc<ClientConfig>,
        transport: Arc<dyn ApiTransport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
            state: Mutex::new(SessionState::default()),
            check_guard: tokio::sync::Mutex::new(()),
            is_checking: AtomicBool::new(false),
        }
    }

    // =====================================
    // Accessors
    // =====================================
    /// کاربر جاری (کپی)
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.lock().expect("session lock poisoned").user.clone()
    }

    /// آیا کاربری وارد شده؟
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state
            .lock()
            .expect("session lock poisoned")
            .user
            .is_some()
    }

    /// آیا بررسی اولیه session انجام شده؟
    #[must_use]
    pub fn has_checked(&self) -> bool {
        self.state
            .lock()
            .expect("session lock poisoned")
            .has_checked
    }

    /// آیا الان وسط بررسی session هستیم؟
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.is_checking.load(Ordering::Relaxed)
    }

    /// capabilityهای کاربر جاری روی یک resource
    ///
    /// کاربر مهمان هیچ capability نداره.
    #[must_use]
    pub fn capabilities(&self, resource: &str) -> Capabilities {
        let state = self.state.lock().expect("session lock poisoned");
        match &state.user {
            Some(user) => Capabilities::for_resource(&user.role, resource),
            None => Capabilities::none(),
        }
    }

    /// gate کردن یک اکشن: خطای Forbidden اگه اجازه نباشه
    ///
    /// سرویس‌ها قبل از هر درخواست resource این رو صدا میزنن؛ وقتی
    /// fail بشه هیچ درخواستی به سرور نمیره.
    pub fn require(&self, resource: &str, action: Action) -> Result<()> {
        let state = self.state.lock().expect("session lock poisoned");

        let user = state
            .user
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

        if crate::permissions::allows(&user.role, resource, action) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission for {resource}"
            )))
        }
    }

    /// تزریق مستقیم کاربر بدون رفتن سمت شبکه (فقط تست‌های داخلی)
    #[cfg(test)]
    pub(crate) fn seed_user_for_tests(&self, user: User) {
        self.set_user(Some(user));
    }

    fn set_user(&self, user: Option<User>) {
        let mut state = self.state.lock().expect("session lock poisoned");
        state.user = user;
        state.has_checked = true;
    }

    /// پاک کردن کامل state محلی (توکن، CSRF، کاربر)
    fn clear_local(&self) {
        self.tokens.clear();
        self.transport.clear_session_state();
        self.set_user(None);
    }

    // =====================================
    // Login / Logout
    // =====================================
    /// ورود: `POST /auth/login`
    ///
    /// اعتبارسنجی محلی قبل از ارسال انجام میشه؛ توکن برگشتی با TTL
    /// پیکربندی‌شده ذخیره میشه.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<User> {
        request.validate()?;

        let body = serde_json::to_value(&request)?;
        let response = self
            .transport
            .send(ApiRequest::post("/auth/login", body))
            .await?;

        let envelope: ApiEnvelope<LoginData> = serde_json::from_value(response)?;
        let data = envelope.into_data()?;

        if let Some(bearer) = data.tokens.bearer() {
            self.tokens
                .save(StoredToken::with_ttl_days(bearer, self.config.token_ttl_days))?;
        }

        info!(user_id = %data.user.id, "Logged in");
        self.set_user(Some(data.user.clone()));
        Ok(data.user)
    }

    /// خروج: `POST /auth/logout`
    ///
    /// state محلی در هر صورت پاک میشه. 429 و خطای شبکه ساکت
    /// نادیده گرفته میشن؛ بقیه خطاها فقط debug لاگ میشن.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let result = self
            .transport
            .send(ApiRequest::post("/auth/logout", Value::Null))
            .await;

        match result {
            Ok(_) => info!("Logged out"),
            Err(error) if error.is_rate_limited() || error.is_network() => {
                debug!(error = %error, "Logout request suppressed");
            }
            Err(error) => {
                debug!(error = %error, "Logout request failed");
            }
        }

        self.clear_local();
    }

    // =====================================
    // Session Check
    // =====================================
    /// بررسی session موجود: `GET /auth/me`
    ///
    /// single-flight: چند caller همزمان فقط یک درخواست تولید میکنن؛
    /// بقیه منتظر میمونن و نتیجه کش‌شده رو میگیرن.
    ///
    /// خروجی `Ok(None)` یعنی «وارد نشده» - این حالت خطا نیست.
    #[instrument(skip(self))]
    pub async fn check_session(&self) -> Result<Option<User>> {
        let _guard = self.check_guard.lock().await;

        // caller دوم بعد از گرفتن قفل نتیجه آماده رو برمیداره
        if self.has_checked() {
            return Ok(self.current_user());
        }

        // بدون توکن ذخیره‌شده درخواست بی‌معنیه
        if self.tokens.load().is_none() {
            self.set_user(None);
            return Ok(None);
        }

        self.is_checking.store(true, Ordering::Relaxed);
        let result = self.transport.send(ApiRequest::get("/auth/me")).await;
        self.is_checking.store(false, Ordering::Relaxed);

        match result {
            Ok(response) => {
                let user = parse_user_payload(response)?;
                debug!(user_id = %user.id, "Session restored");
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(error) if error.is_unauthorized() || error.is_forbidden() => {
                // session نامعتبر - پاکسازی ساکت، بدون notification
                debug!("Stored session is no longer valid");
                self.clear_local();
                Ok(None)
            }
            Err(error) if error.is_rate_limited() => {
                // نتیجه نامشخص: توکن رو نگه میداریم و has_checked
                // رو set نمیکنیم که تلاش بعدی دوباره بپرسه
                debug!("Session check rate limited");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    // =====================================
    // Profile
    // =====================================
    /// بروزرسانی پروفایل: `PUT /auth/profile`
    #[instrument(skip(self, request))]
    pub async fn update_profile(&self, request: ProfileUpdateRequest) -> Result<User> {
        request.validate()?;

        let body = serde_json::to_value(&request)?;
        let response = self
            .transport
            .send(ApiRequest::put("/auth/profile", body))
            .await?;

        let user = parse_user_payload(response)?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    /// تغییر رمز: `PUT /auth/change-password`
    #[instrument(skip(self, request))]
    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let body = serde_json::to_value(&request)?;
        self.transport
            .send(ApiRequest::put("/auth/change-password", body))
            .await?;

        Ok(())
    }
}

/// خوندن `User` از پاسخ‌های auth
///
/// بک‌اند گاهی `data: { user: {...} }` میفرسته و گاهی خود کاربر رو
/// مستقیم در `data` میذاره؛ هر دو پذیرفته میشن.
fn parse_user_payload(response: Value) -> Result<User> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(response)?;
    let data = envelope.into_data()?;

    let user_value = match data.get("user") {
        Some(inner) => inner.clone(),
        None => data,
    };

    let user: User = serde_json::from_value(user_value)?;

    // slug خراب دسترسی نمیده؛ فقط برای عیب‌یابی دیتای نقش لاگ میشه
    for slug in &user.role.permissions {
        if !crate::utils::is_valid_permission_slug(slug) {
            debug!(slug = %slug, "Role contains a malformed permission slug");
        }
    }

    Ok(user)
}
