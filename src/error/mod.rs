//! # ماژول مدیریت خطاها (Error Handling)
//!
//! این ماژول سیستم مدیریت خطای کلاینت رو تعریف میکنه.
//!
//! ## مفاهیم Rust:
//! - **Custom Error Types**: تعریف نوع خطای سفارشی
//! - **thiserror**: derive macro برای Error trait
//! - **From Trait**: تبدیل خودکار نوع‌ها
//! - **Result Type Alias**: alias برای ساده‌تر شدن کد
//! - **Error Propagation**: انتشار خطا با `?`
//!
//! ## طبقه‌بندی خطاها در این کلاینت
//!
//! هر خطای HTTP باید به یک رفتار مشخص ترجمه بشه:
//! - 401: پاک کردن session و هدایت به صفحه ورود (خطای نمایشی نیست)
//! - 403: نوتیفیکیشن "دسترسی ندارید" (مگر در auth bootstrap که ساکته)
//! - 4xx با پیام: پیام بک‌اند عینا نمایش داده میشه
//! - خطای CSRF: توکن کش‌شده باطل میشه و درخواست بعدی توکن تازه میگیره
//! - 429: در چند جریان خاص (logout، گرفتن CSRF، چک session) ساکت میمونه

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =====================================
// Result Type Alias
// =====================================
/// نوع Result سفارشی برنامه
///
/// به جای نوشتن `Result<User, AppError>` میتونیم بنویسیم `Result<User>`
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// خطای اصلی کلاینت
///
/// # مفاهیم:
/// - `enum`: نوع شمارشی با انواع مختلف خطا
/// - `#[derive(Error)]`: از thiserror برای پیاده‌سازی Error trait
/// - `#[error("...")]`: پیام خطا برای هر نوع
/// - `#[from]`: تبدیل خودکار از نوع‌های دیگه
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // خطاهای پاسخ بک‌اند (4xx)
    // ----------------------------------------
    /// درخواست نامعتبر - 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// احراز هویت نشده - 401
    /// سمت کلاینت یعنی: session پاک بشه و کاربر به login هدایت بشه
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// دسترسی ممنوع - 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// توکن CSRF نامعتبر یا منقضی - زیرمجموعه خاص 403
    #[error("CSRF token rejected: {0}")]
    Csrf(String),

    /// پیدا نشد - 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// تکراری - 409
    #[error("Conflict: {0}")]
    Conflict(String),

    /// محدودیت نرخ - 429
    #[error("Too many requests")]
    RateLimited,

    /// خطای اعتبارسنجی - 422 یا 4xx با پیام
    #[error("Validation error: {0}")]
    Validation(String),

    // ----------------------------------------
    // خطاهای سرور و زیرساخت (5xx / transport)
    // ----------------------------------------
    /// خطای سمت سرور (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// خطای شبکه - هیچ پاسخی از سرور نرسیده
    #[error("Network error: {0}")]
    Network(String),

    /// خطای تنظیمات
    #[error("Configuration error: {0}")]
    Config(String),

    /// خطای داخلی کلاینت
    #[error("Internal client error: {0}")]
    Internal(String),

    // ----------------------------------------
    // خطاهای تبدیل شده از کتابخانه‌ها
    // ----------------------------------------
    /// خطای HTTP client
    /// `#[from]` یعنی reqwest::Error خودکار به این تبدیل میشه
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// خطای IO (ذخیره توکن روی دیسک)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// خطای JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// خطای URL
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AppError {
    /// ساخت خطا از status code و بدنه (در صورت وجود) پاسخ بک‌اند
    ///
    /// # مفاهیم:
    /// - `match`: pattern matching روی status
    /// - بدنه خطا ممکنه `message` یا `error` داشته باشه؛ هر دو رو چک میکنیم
    ///
    /// تشخیص CSRF: بک‌اند 403 با کد یا پیام CSRF برمیگردونه؛
    /// این مورد باید از Forbidden معمولی جدا بشه چون رفتارش فرق داره.
    #[must_use]
    pub fn from_response(status: reqwest::StatusCode, body: Option<&ErrorBody>) -> Self {
        let message = body
            .and_then(ErrorBody::best_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        match status.as_u16() {
            401 => Self::Unauthorized(message),
            403 if body.map(ErrorBody::looks_like_csrf).unwrap_or(false) => Self::Csrf(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            429 => Self::RateLimited,
            422 => Self::Validation(message),
            400 => Self::BadRequest(message),
            // بقیه 4xx‌ها اگه پیام داشته باشن، خطای اعتبارسنجی حساب میشن
            s if (400..500).contains(&s) => Self::Validation(message),
            s if (500..600).contains(&s) => Self::Server(message),
            _ => Self::Internal(message),
        }
    }

    /// آیا این خطا 401 هست؟ (session باید پاک بشه)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// آیا این خطا 403 هست؟ (CSRF حساب نمیشه)
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// آیا این خطای CSRF هست؟
    #[must_use]
    pub fn is_csrf(&self) -> bool {
        matches!(self, Self::Csrf(_))
    }

    /// آیا این خطا 429 هست؟
    ///
    /// در جریان‌های logout و CSRF و چک session، این خطا ساکت میمونه
    /// تا در ترافیک پرشی false-alarm تولید نشه.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// آیا خطای شبکه/زیرساخت هست؟ (هیچ پاسخ معناداری از سرور نداریم)
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// پیام مناسب برای نمایش به کاربر (نوتیفیکیشن)
    ///
    /// قاعده: پیام اعتبارسنجی بک‌اند عینا نمایش داده میشه،
    /// خطاهای شبکه و سرور به یک پیام عمومی تبدیل میشن.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(m) | Self::BadRequest(m) | Self::Conflict(m) | Self::NotFound(m) => {
                m.clone()
            }
            Self::Forbidden(_) => "You do not have access to perform this action".to_string(),
            Self::Csrf(_) => "Security error, please retry".to_string(),
            Self::RateLimited => "Too many requests, please slow down".to_string(),
            _ => "Request failed, please try again".to_string(),
        }
    }
}

// =====================================
// Error Response DTO
// =====================================
/// ساختار بدنه خطا که بک‌اند برمیگردونه
///
/// # مفاهیم:
/// - DTO (Data Transfer Object): شکل داده روی سیم
/// - همه فیلدها Option هستن چون بک‌اند همیشه همه رو نمیفرسته
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// کد خطا (مثلا "CSRF_TOKEN_INVALID")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// شناسه خطا
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// پیام خطا
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// بهترین پیام موجود در بدنه
    #[must_use]
    pub fn best_message(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }

    /// آیا این بدنه شبیه خطای CSRF هست؟
    #[must_use]
    pub fn looks_like_csrf(&self) -> bool {
        let marker = |s: &str| s.to_ascii_lowercase().contains("csrf");
        self.code.as_deref().map(marker).unwrap_or(false)
            || self.message.as_deref().map(marker).unwrap_or(false)
            || self.error.as_deref().map(marker).unwrap_or(false)
    }
}

// =====================================
// From Implementations
// =====================================
// این‌ها برای تبدیل خودکار خطاهای دیگه به AppError هستن
// با `?` میتونیم خطا رو propagate کنیم

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Internal(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Internal(s.to_string())
    }
}

// تبدیل validator error
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

// =====================================
// Result Extensions
// =====================================
/// Extension trait برای Result
///
/// # مفاهیم:
/// - Extension Trait: اضافه کردن متد به نوع‌های موجود
/// - Generic: کار با هر نوع T و E
pub trait ResultExt<T, E> {
    /// تبدیل خطا به AppError::Internal
    fn map_internal(self) -> Result<T>;

    /// تبدیل خطا به نوع دلخواه
    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for std::result::Result<T, E> {
    fn map_internal(self) -> Result<T> {
        self.map_err(|e| AppError::Internal(e.to_string()))
    }

    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError,
    {
        self.map_err(f)
    }
}

// =====================================
// Option Extensions
// =====================================
/// Extension trait برای Option
pub trait OptionExt<T> {
    /// تبدیل None به AppError::NotFound
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_status_mapping() {
        use reqwest::StatusCode;

        assert!(matches!(
            AppError::from_response(StatusCode::UNAUTHORIZED, None),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from_response(StatusCode::FORBIDDEN, None),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            AppError::from_response(StatusCode::TOO_MANY_REQUESTS, None),
            AppError::RateLimited
        ));
        assert!(matches!(
            AppError::from_response(StatusCode::BAD_GATEWAY, None),
            AppError::Server(_)
        ));
    }

    #[test]
    fn test_csrf_detection() {
        let body = ErrorBody {
            code: Some("CSRF_TOKEN_INVALID".to_string()),
            error: None,
            message: Some("csrf token mismatch".to_string()),
        };
        let err = AppError::from_response(reqwest::StatusCode::FORBIDDEN, Some(&body));
        assert!(err.is_csrf());
        assert!(!err.is_forbidden());
    }

    #[test]
    fn test_plain_forbidden_is_not_csrf() {
        let body = ErrorBody {
            code: None,
            error: None,
            message: Some("you shall not pass".to_string()),
        };
        let err = AppError::from_response(reqwest::StatusCode::FORBIDDEN, Some(&body));
        assert!(err.is_forbidden());
        assert!(!err.is_csrf());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let body = ErrorBody {
            code: None,
            error: None,
            message: Some("title.fa is required".to_string()),
        };
        let err = AppError::from_response(reqwest::StatusCode::UNPROCESSABLE_ENTITY, Some(&body));
        assert_eq!(err.user_message(), "title.fa is required");
    }

    #[test]
    fn test_server_error_message_is_generic() {
        let body = ErrorBody {
            code: None,
            error: None,
            message: Some("stack trace leaked".to_string()),
        };
        let err = AppError::from_response(reqwest::StatusCode::INTERNAL_SERVER_ERROR, Some(&body));
        assert_eq!(err.user_message(), "Request failed, please try again");
    }

    #[test]
    fn test_option_extension() {
        let some_value: Option<i32> = Some(42);
        let none_value: Option<i32> = None;

        assert!(some_value.ok_or_not_found("not found").is_ok());
        assert!(none_value.ok_or_not_found("not found").is_err());
    }

    #[test]
    fn test_result_extension() {
        let ok: std::result::Result<i32, &str> = Ok(42);
        let err: std::result::Result<i32, &str> = Err("original error");

        assert!(ok.map_internal().is_ok());
        let mapped = err.map_internal();
        assert!(matches!(mapped, Err(AppError::Internal(_))));
    }
}
