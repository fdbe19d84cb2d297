//! # ماژول توابع کمکی (Utilities)
//!
//! این ماژول توابع و ثابت‌های کمکی رو ارائه میده.
//!
//! ## مفاهیم Rust:
//! - **static**: متغیرهای با عمر 'static
//! - **lazy_static / once_cell**: مقداردهی اولیه تنبل
//! - **Regex**: عبارات منظم
//! - **Iterator**: ساخت رشته‌ها با iterator

use std::time::Duration;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Constants
// =====================================
/// حداکثر طول عبارت جستجو که به بک‌اند فرستاده میشه
pub const MAX_SEARCH_LEN: usize = 128;

/// سقف تاخیر backoff (میلی‌ثانیه) - که انتظار کاربر بی‌نهایت نشه
pub const MAX_BACKOFF_MS: u64 = 5_000;

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
/// الگوی معتبر برای permission slug
///
/// # مفاهیم:
/// - `Lazy`: مقداردهی اولیه در اولین استفاده
/// - این بهینه‌تر از ساخت Regex هر بار هست
///
/// فرمت: `resource.action` یا wildcard به شکل `resource.*`
/// مثال: `articles.create` ، `orders.*` ، `admin.all`
pub static VALID_PERMISSION_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_-]*\.(\*|[a-z][a-z0-9_-]*)$").expect("Invalid regex pattern")
});

/// الگوی شماره تلفن (برای agentهای واتساپ)
pub static VALID_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Invalid regex pattern"));

// =====================================
// Query String Helpers
// =====================================
/// ساخت query string از زوج‌های کلید/مقدار
///
/// # مفاهیم:
/// - `url::form_urlencoded`: انکود امن query string
/// - ترتیب پارامترها همونیه که caller داده
///
/// # مثال
/// ```rust
/// use admin_panel_client::utils::encode_query;
///
/// let qs = encode_query(&[("page".to_string(), "1".to_string())]);
/// assert_eq!(qs, "page=1");
/// ```
#[must_use]
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

/// اثر انگشت (fingerprint) پایدار از پارامترهای query
///
/// پارامترهای یکسان باید کلید کش یکسان بسازن، مستقل از ترتیب.
/// برای همین زوج‌ها قبل از join مرتب میشن.
///
/// # مثال
/// ```rust
/// use admin_panel_client::utils::query_fingerprint;
///
/// let a = query_fingerprint(&[("b".into(), "2".into()), ("a".into(), "1".into())]);
/// let b = query_fingerprint(&[("a".into(), "1".into()), ("b".into(), "2".into())]);
/// assert_eq!(a, b);
/// ```
#[must_use]
pub fn query_fingerprint(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort();

    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

// =====================================
// Retry / Backoff
// =====================================
/// محاسبه تاخیر backoff نمایی با jitter
///
/// # مفاهیم:
/// - `rand::thread_rng()`: تولیدکننده اعداد تصادفی برای این thread
/// - `gen_range`: تولید عدد تصادفی در بازه
/// - `saturating_mul`: ضرب بدون overflow
///
/// attempt از 1 شروع میشه (تلاش اول که شکست خورده).
/// jitter تصادفی که درخواست‌های همزمان با هم retry نکنن.
#[must_use]
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exp = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(MAX_BACKOFF_MS);

    let jitter = rand::thread_rng().gen_range(0..=capped / 4 + 1);
    Duration::from_millis(capped + jitter)
}

// =====================================
// String Utilities
// =====================================
/// تمیز کردن whitespace‌های اضافی
#[must_use]
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mask کردن بخشی از متن (برای لاگ کردن توکن‌ها)
///
/// # مثال
/// ```rust
/// use admin_panel_client::utils::mask_string;
///
/// assert_eq!(mask_string("secret123", 3), "sec***");
/// ```
#[must_use]
pub fn mask_string(text: &str, visible_chars: usize) -> String {
    if text.len() <= visible_chars {
        return "*".repeat(text.len());
    }

    let visible: String = text.chars().take(visible_chars).collect();
    format!("{}***", visible)
}

/// اعتبارسنجی permission slug
///
/// # مثال
/// ```rust
/// use admin_panel_client::utils::is_valid_permission_slug;
///
/// assert!(is_valid_permission_slug("articles.create"));
/// assert!(is_valid_permission_slug("orders.*"));
/// assert!(!is_valid_permission_slug("articles"));
/// ```
#[must_use]
pub fn is_valid_permission_slug(slug: &str) -> bool {
    VALID_PERMISSION_SLUG.is_match(slug)
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        let qs = encode_query(&[
            ("page".to_string(), "1".to_string()),
            ("search".to_string(), "کفش ورزشی".to_string()),
        ]);
        // مقدار فارسی باید percent-encode بشه
        assert!(qs.starts_with("page=1&search="));
        assert!(!qs.contains(' '));
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let a = query_fingerprint(&[
            ("status".to_string(), "draft".to_string()),
            ("page".to_string(), "2".to_string()),
        ]);
        let b = query_fingerprint(&[
            ("page".to_string(), "2".to_string()),
            ("status".to_string(), "draft".to_string()),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_on_value_change() {
        let a = query_fingerprint(&[("page".to_string(), "1".to_string())]);
        let b = query_fingerprint(&[("page".to_string(), "2".to_string())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let d1 = backoff_delay(300, 1);
        let d3 = backoff_delay(300, 3);

        assert!(d1.as_millis() >= 300);
        assert!(d3.as_millis() >= 1200);
        // سقف + حداکثر jitter
        assert!(backoff_delay(300, 20).as_millis() <= (MAX_BACKOFF_MS + MAX_BACKOFF_MS / 4 + 1) as u128);
    }

    #[test]
    fn test_permission_slug_validation() {
        assert!(is_valid_permission_slug("articles.create"));
        assert!(is_valid_permission_slug("orders.*"));
        assert!(is_valid_permission_slug("admin.all"));
        assert!(!is_valid_permission_slug("articles"));
        assert!(!is_valid_permission_slug(".create"));
        assert!(!is_valid_permission_slug("Articles.Create"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(VALID_PHONE.is_match("+989121234567"));
        assert!(VALID_PHONE.is_match("02188776655"));
        assert!(!VALID_PHONE.is_match("not-a-phone"));
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  a   b  "), "a b");
    }

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string("secret123", 3), "sec***");
        assert_eq!(mask_string("ab", 5), "**");
    }
}
