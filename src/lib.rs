//! # Admin Panel Client Library
//!
//! این کتابخانه یک کلاینت تایپ‌شده برای بک‌اند پنل مدیریت ارائه میده:
//! session و CSRF، نرمالایزر سند تنظیمات، کش query با invalidate، و
//! workflow کامل CRUD منابع با gate کردن permission.
//!
//! ## ساختار پروژه
//!
//! ```text
//! src/
//! ├── lib.rs          # نقطه ورود کتابخانه - اینجا!
//! ├── main.rs         # باینری demo
//! ├── config/         # مدیریت تنظیمات کلاینت
//! ├── error/          # تعریف خطاها
//! ├── http/           # لایه transport (reqwest، توکن، CSRF)
//! ├── models/         # مدل‌های داده و wire shapes
//! ├── permissions/    # ارزیابی capability
//! ├── settings/       # نرمالایزر سند تنظیمات
//! ├── query/          # state فیلتر، کش و debounce
//! ├── session/        # چرخه احراز هویت
//! ├── services/       # منطق کسب‌وکار (CRUD، تنظیمات)
//! ├── notify/         # بازخورد کاربری (toast)
//! └── utils/          # توابع کمکی
//! ```
//!
//! ## مفاهیم Rust در این فایل
//!
//! - **Module System**: سیستم ماژول‌ها برای سازماندهی کد
//! - **Public API**: با `pub` مشخص میکنیم چی از بیرون قابل دسترسی باشه
//! - **Re-exports**: با `pub use` آیتم‌ها رو re-export میکنیم
//!
//! ## مثال استفاده
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use admin_panel_client::config::ClientConfig;
//! use admin_panel_client::http::MemoryTokenStore;
//! use admin_panel_client::services::ClientState;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::from_env().unwrap();
//!     let state = ClientState::connect(config, Arc::new(MemoryTokenStore::new())).unwrap();
//!     let articles = state.resource("articles");
//! }
//! ```

// =====================================
// Module Declarations
// =====================================
// در Rust، هر ماژول باید در lib.rs یا main.rs declare بشه
// `pub mod` یعنی این ماژول از بیرون کتابخانه قابل دسترسی هست

/// ماژول مدیریت تنظیمات کلاینت
pub mod config;

/// ماژول تعریف و مدیریت خطاها
pub mod error;

/// ماژول لایه transport
pub mod http;

/// ماژول مدل‌های داده (Domain Models)
pub mod models;

/// ماژول بازخورد کاربری
pub mod notify;

/// ماژول ارزیابی دسترسی
pub mod permissions;

/// ماژول state فیلتر و کش query
pub mod query;

/// ماژول session و احراز هویت
pub mod session;

/// ماژول سرویس‌ها (Business Logic)
pub mod services;

/// ماژول نرمالایزر تنظیمات سایت
pub mod settings;

/// ماژول توابع کمکی
pub mod utils;

// =====================================
// Re-exports
// =====================================
// Re-export کردن آیتم‌های پرکاربرد برای دسترسی راحت‌تر
// کاربر به جای `admin_panel_client::error::Result` میتونه بنویسه
// `admin_panel_client::Result`

/// نتیجه عملیات با خطای سفارشی ما
pub use error::Result;

/// خطای اصلی برنامه
pub use error::AppError;

// =====================================
// Prelude Module
// =====================================
/// ماژول prelude برای import راحت‌تر آیتم‌های پرکاربرد
///
/// کاربرد:
/// ```rust
/// use admin_panel_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ClientConfig, ConfigBuilder};
    pub use crate::error::{AppError, Result};
    pub use crate::http::{ApiTransport, FileTokenStore, MemoryTokenStore, TokenStore};
    pub use crate::models::*;
    pub use crate::notify::{Notification, NotificationKind, Notifier};
    pub use crate::permissions::{Action, Capabilities};
    pub use crate::query::{FilterState, ListQuery, QueryCache, QueryKey};
    pub use crate::services::*;
    pub use crate::session::SessionStore;
    pub use crate::settings::{Section, SettingsForm};
}
