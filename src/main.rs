//! # Admin Panel Client - باینری demo
//!
//! یک smoke-test سر راست برای کتابخانه: ورود (یا بازیابی session
//! ذخیره‌شده)، نمایش capabilityها و fetch یک صفحه از articles.
//!
//! ## مفاهیم Rust در این فایل:
//! - `use`: وارد کردن آیتم‌ها از ماژول‌های دیگه
//! - `async fn main()`: تابع اصلی غیرهمزمان با tokio
//! - `Result<T, E>`: مدیریت خطا
//! - `?` operator: انتشار خطا به بالا

use std::env;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// وارد کردن ماژول‌ها از کتابخانه‌مون
use admin_panel_client::{
    config::ClientConfig,
    error::Result,
    http::FileTokenStore,
    models::LoginRequest,
    query::ListQuery,
    services::ClientState,
};

/// نقطه ورود اصلی برنامه
///
/// # مفاهیم مهم:
/// - `#[tokio::main]`: این macro تابع async رو به یک runtime تبدیل میکنه
/// - `Result<()>`: برگردوندن Result بدون مقدار موفقیت (unit type)
///
/// # Errors
/// خطا برمیگردونه اگه:
/// - تنظیمات لود نشن یا نامعتبر باشن
/// - ورود fail بشه
#[tokio::main]
async fn main() -> Result<()> {
    // لود کردن متغیرهای محیطی از فایل .env
    // اگه فایل نباشه اوکیه
    dotenvy::dotenv().ok();

    // راه‌اندازی سیستم لاگینگ
    init_tracing();

    info!("🚀 Starting admin panel client demo...");

    // لود کردن تنظیمات
    let config = ClientConfig::from_env()?;
    config.validate()?;
    info!(base_url = %config.base_url, "✅ Configuration loaded successfully");

    // توکن بین اجراها روی دیسک میمونه (مثل کوکی مرورگر)
    let token_path = env::var("PANEL_TOKEN_FILE")
        .unwrap_or_else(|_| "/tmp/admin-panel-token.json".to_string());
    let tokens = Arc::new(FileTokenStore::new(token_path));

    let state = ClientState::connect(config, tokens)?;

    // اول تلاش برای بازیابی session ذخیره‌شده
    let user = match state.session.check_session().await? {
        Some(user) => {
            info!(email = %user.email, "✅ Session restored");
            user
        }
        None => {
            // session نداریم - ورود با credentials محیطی
            let email = env::var("PANEL_EMAIL")
                .map_err(|_| admin_panel_client::AppError::Config(
                    "PANEL_EMAIL is not set and no stored session exists".to_string(),
                ))?;
            let password = env::var("PANEL_PASSWORD")
                .map_err(|_| admin_panel_client::AppError::Config(
                    "PANEL_PASSWORD is not set".to_string(),
                ))?;

            let user = state
                .session
                .login(LoginRequest { email, password })
                .await?;
            info!(email = %user.email, "✅ Logged in");
            user
        }
    };

    info!(role = %user.role.name, "Current role");

    // نمایش capabilityها روی چند resource
    for resource in ["articles", "products", "orders", "settings"] {
        let caps = state.session.capabilities(resource);
        info!(
            resource,
            view = caps.can_view,
            create = caps.can_create,
            edit = caps.can_edit,
            delete = caps.can_delete,
            "Capabilities"
        );
    }

    // یک صفحه از articles (اگه دسترسی باشه)
    let articles = state.resource("articles");
    match articles.list(&ListQuery::new()).await {
        Ok(page) => {
            info!(
                rows = page.data.len(),
                total = page.pagination.total,
                "✅ Fetched first page of articles"
            );
        }
        Err(error) => {
            warn!(error = %error, "Could not fetch articles");
        }
    }

    Ok(())
}

/// راه‌اندازی سیستم tracing برای لاگینگ
///
/// # مفاهیم:
/// - Structured Logging: لاگ‌ها به صورت ساختاریافته ذخیره میشن
/// - EnvFilter: فیلتر کردن لاگ‌ها بر اساس متغیر محیطی
fn init_tracing() {
    // EnvFilter از متغیر RUST_LOG میخونه
    // اگه نبود، default استفاده میکنه
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("admin_panel_client=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .pretty(),
        )
        .init();
}
