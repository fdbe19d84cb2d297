//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده کلاینت رو تعریف میکنه.
//!
//! ## مفاهیم Rust:
//! - **Structs**: ساختار داده
//! - **Derive Macros**: تولید خودکار کد
//! - **Serialize/Deserialize**: تبدیل JSON
//! - **Generic Types**: کار با هر نوع داده
//!
//! ## تفاوت انواع مدل:
//! - **Wire Shape**: شکل دقیق داده روی سیم (camelCase مثل بک‌اند)
//! - **DTO (Data Transfer Object)**: برای ارسال/دریافت از API
//! - **View Model**: شکل مناسب فرم‌ها (مدل بخش‌بندی‌شده تنظیمات)

mod auth;
mod resource;
mod settings;

// Re-export همه مدل‌ها
pub use auth::*;
pub use resource::*;
pub use settings::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// alias برای map خام JSON - در نرمالایزر تنظیمات زیاد استفاده میشه
pub type JsonMap = serde_json::Map<String, Value>;

// =====================================
// Localized Text
// =====================================
/// متن دو زبانه - هر فیلد متنی قابل نمایش این شکل رو داره
///
/// # Invariant
/// موقع سریالایز شدن، هر دو کلید همیشه حاضرن (پیش‌فرض رشته خالی).
/// `undefined` برای هیچکدوم معنا نداره؛ فقط وقتی کل فیلد خالیه ممکنه
/// از payload حذف بشه (قاعده prune در نرمالایزر تنظیمات).
///
/// # مثال
/// ```rust
/// use admin_panel_client::models::LocalizedText;
///
/// let t = LocalizedText::new("سلام", "Hello");
/// assert!(!t.is_empty());
/// assert!(LocalizedText::default().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub fa: String,

    #[serde(default)]
    pub en: String,
}

impl LocalizedText {
    /// ساخت متن دو زبانه
    #[must_use]
    pub fn new(fa: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            fa: fa.into(),
            en: en.into(),
        }
    }

    /// آیا هر دو زبان خالی هستن؟
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fa.is_empty() && self.en.is_empty()
    }
}

/// لیست دو زبانه (کلمات کلیدی سئو)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedList {
    #[serde(default)]
    pub fa: Vec<String>,

    #[serde(default)]
    pub en: Vec<String>,
}

// =====================================
// Pagination (Wire Shape)
// =====================================
/// اطلاعات صفحه‌بندی که بک‌اند برمیگردونه
///
/// این شکل عینا به جدول پاس داده میشه - کلاینت چیزی بهش اضافه نمیکنه.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// شماره صفحه (از 1 شروع میشه)
    pub page: u32,

    /// تعداد آیتم در صفحه
    pub limit: u32,

    /// تعداد کل آیتم‌ها
    pub total: u64,

    /// تعداد کل صفحات
    pub total_pages: u32,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

// =====================================
// API Envelopes (Wire Shapes)
// =====================================
/// پاسخ لیست: `GET /<resource>?page&limit&...`
///
/// # مفاهیم:
/// - Generic: `T` نوع ردیف (معمولا `serde_json::Value` برای جدول عمومی)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPayload<T = Value> {
    #[serde(default)]
    pub success: bool,

    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub pagination: PageInfo,
}

impl<T> Default for ListPayload<T> {
    fn default() -> Self {
        Self {
            success: false,
            data: Vec::new(),
            pagination: PageInfo::default(),
        }
    }
}

/// پاسخ عمومی یک آیتم: `{ success, data, message? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    #[serde(default)]
    pub success: bool,

    #[serde(default = "none_value")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn none_value<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    /// گرفتن data یا خطای قابل فهم
    pub fn into_data(self) -> crate::error::Result<T> {
        use crate::error::AppError;
        self.data
            .ok_or_else(|| AppError::Server("Response envelope has no data".to_string()))
    }
}

// =====================================
// Record Helpers
// =====================================
/// خوندن `_id` از یک ردیف خام
///
/// هر resource حداقل `_id` و `createdAt` داره؛ ردیف‌ها به صورت
/// `Value` جابه‌جا میشن چون جدول عمومی به شکل دقیق اهمیتی نمیده.
#[must_use]
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("_id").and_then(Value::as_str)
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_localized_text_serializes_both_keys() {
        let t = LocalizedText::new("سلام", "");
        let v = serde_json::to_value(&t).unwrap();

        // هر دو کلید باید حاضر باشن حتی وقتی خالی‌ان
        assert_eq!(v["fa"], "سلام");
        assert_eq!(v["en"], "");
    }

    #[test]
    fn test_localized_text_deserializes_missing_keys() {
        let t: LocalizedText = serde_json::from_value(json!({ "fa": "متن" })).unwrap();
        assert_eq!(t.fa, "متن");
        assert_eq!(t.en, "");
    }

    #[test]
    fn test_page_info_wire_names() {
        let p: PageInfo =
            serde_json::from_value(json!({ "page": 2, "limit": 10, "total": 45, "totalPages": 5 }))
                .unwrap();
        assert_eq!(p.total_pages, 5);
    }

    #[test]
    fn test_list_payload_tolerates_missing_fields() {
        let p: ListPayload = serde_json::from_value(json!({ "success": true, "data": [] })).unwrap();
        assert_eq!(p.pagination.page, 1);
        assert!(p.data.is_empty());
    }

    #[test]
    fn test_record_id() {
        let row = json!({ "_id": "abc", "createdAt": "2024-01-01" });
        assert_eq!(record_id(&row), Some("abc"));
        assert_eq!(record_id(&json!({})), None);
    }
}
