//! # مدل‌های resource و ساخت payload امن
//!
//! ## مفاهیم Rust:
//! - **Untagged Enum**: دسریالایز از چند شکل مختلف
//! - **Builder Pattern**: ساخت payload تایپ‌شده
//! - **Type Safety به جای sniffing**: سورس اصلی قبل از هر update
//!   محتوای فیلدها رو در runtime بو میکشید که آبجکت داخلی کتابخانه
//!   validation توش نشت نکرده باشه. اینجا payload از اول تایپ‌شده
//!   ساخته میشه و فیلد رابطه‌ای فقط میتونه `Vec<String>` باشه؛
//!   اون کلاس باگ ساختاری غیرممکنه.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::LocalizedText;

// =====================================
// Entity References
// =====================================
/// ارجاع به یک موجودیت دیگه (دسته‌بندی، محصول مرتبط، برند)
///
/// بک‌اند گاهی شناسه خام میفرسته و گاهی آبجکت populate شده `{_id: ...}`.
/// هر دو شکل به شناسه ساده unwrap میشن.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    /// شناسه خام: `"65a1..."`
    Id(String),

    /// آبجکت populate شده: `{ "_id": "65a1...", ... }`
    Object {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl EntityRef {
    /// گرفتن شناسه، مستقل از شکل ورودی
    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

impl From<&str> for EntityRef {
    fn from(s: &str) -> Self {
        Self::Id(s.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(s: String) -> Self {
        Self::Id(s)
    }
}

/// نرمالایز کردن یک مقدار خام JSON به لیست شناسه
///
/// این تابع مرز ورودی داده‌های بی‌شکل هست (مثلا state فرم قدیمی).
/// قرارداد: فیلد categories-مانند هرگز چیزی جز آرایه شناسه رشته‌ای
/// به بک‌اند فرستاده نمیشه. عنصرهایی که نه رشته‌ان نه `{_id}`،
/// کنار گذاشته میشن و لاگ هشدار میگیرن.
#[must_use]
pub fn ids_from_value(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        warn!("Expected an array of identifiers, got a non-array value");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => match obj.get("_id").and_then(Value::as_str) {
                Some(id) => Some(id.to_string()),
                None => {
                    warn!("Dropping non-identifier object from id list");
                    None
                }
            },
            _ => {
                warn!("Dropping non-identifier element from id list");
                None
            }
        })
        .collect()
}

// =====================================
// Product Update (Typed Payload)
// =====================================
/// payload بروزرسانی محصول: `PUT /products/:id`
///
/// فقط فیلدهای Some سریالایز میشن (minimal diff).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,

    /// همیشه آرایه شناسه - builder نوع دیگه‌ای قبول نمیکنه
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_products: Option<Vec<String>>,
}

impl ProductUpdate {
    /// شروع ساخت payload
    #[must_use]
    pub fn builder() -> ProductUpdateBuilder {
        ProductUpdateBuilder::default()
    }

    /// تبدیل به Value برای ارسال از طریق workflow عمومی
    pub fn into_value(self) -> crate::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builder برای ProductUpdate
///
/// # مفاهیم:
/// - Method Chaining: زنجیره‌ای کردن متدها
/// - `impl Into<EntityRef>`: پذیرش شناسه خام یا آبجکت `{_id}`
///
/// # مثال
/// ```rust
/// use admin_panel_client::models::ProductUpdate;
///
/// let update = ProductUpdate::builder()
///     .price(129.0)
///     .categories(["c1", "c2"])
///     .build();
///
/// assert_eq!(update.categories, Some(vec!["c1".to_string(), "c2".to_string()]));
/// ```
#[derive(Debug, Default)]
pub struct ProductUpdateBuilder {
    update: ProductUpdate,
}

impl ProductUpdateBuilder {
    /// تنظیم نام دو زبانه
    #[must_use]
    pub fn name(mut self, name: LocalizedText) -> Self {
        self.update.name = Some(name);
        self
    }

    /// تنظیم توضیحات دو زبانه
    #[must_use]
    pub fn description(mut self, description: LocalizedText) -> Self {
        self.update.description = Some(description);
        self
    }

    /// تنظیم قیمت
    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.update.price = Some(price);
        self
    }

    /// تنظیم موجودی
    #[must_use]
    pub fn stock(mut self, stock: i64) -> Self {
        self.update.stock = Some(stock);
        self
    }

    /// تنظیم وضعیت
    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.update.status = Some(status.into());
        self
    }

    /// toggle انتشار (اکشن تکی روی ردیف جدول)
    #[must_use]
    pub fn published(mut self, published: bool) -> Self {
        self.update.published = Some(published);
        self
    }

    /// toggle ویژه بودن
    #[must_use]
    pub fn featured(mut self, featured: bool) -> Self {
        self.update.featured = Some(featured);
        self
    }

    /// تنظیم دسته‌بندی‌ها - هر ورودی به شناسه unwrap میشه
    #[must_use]
    pub fn categories<I, R>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<EntityRef>,
    {
        self.update.categories = Some(refs.into_iter().map(|r| r.into().into_id()).collect());
        self
    }

    /// تنظیم دسته‌بندی‌ها از JSON بی‌شکل (state فرم قدیمی)
    ///
    /// عنصرهای غیر شناسه حذف میشن (`ids_from_value`).
    #[must_use]
    pub fn categories_from_json(mut self, value: &Value) -> Self {
        self.update.categories = Some(ids_from_value(value));
        self
    }

    /// تنظیم محصولات مرتبط
    #[must_use]
    pub fn related_products<I, R>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<EntityRef>,
    {
        self.update.related_products =
            Some(refs.into_iter().map(|r| r.into().into_id()).collect());
        self
    }

    /// ساخت payload نهایی
    #[must_use]
    pub fn build(self) -> ProductUpdate {
        self.update
    }
}

// =====================================
// Order Mutations
// =====================================
/// وضعیت سفارش
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// بدنه `PUT /orders/:id/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entity_ref_unwraps_both_shapes() {
        let raw: EntityRef = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(raw.into_id(), "abc");

        let populated: EntityRef =
            serde_json::from_value(json!({ "_id": "xyz", "name": { "fa": "", "en": "" } }))
                .unwrap();
        assert_eq!(populated.into_id(), "xyz");
    }

    #[test]
    fn test_ids_from_value_strips_schema_artifacts() {
        // آبجکتی که شبیه schema داخلی کتابخانه validation هست
        // (کلیدهای متادیتا بدون `_id`) باید حذف بشه
        let mixed = json!([
            "id1",
            { "_id": "id2" },
            { "_root": {}, "_rules": [], "_flags": {} },
            42,
            null
        ]);

        assert_eq!(ids_from_value(&mixed), vec!["id1", "id2"]);
    }

    #[test]
    fn test_ids_from_value_non_array() {
        assert!(ids_from_value(&json!({ "_root": {} })).is_empty());
    }

    #[test]
    fn test_product_update_minimal_diff() {
        let update = ProductUpdate::builder().published(true).build();
        let v = serde_json::to_value(update).unwrap();

        // فقط فیلد تغییر کرده باید حاضر باشه
        assert_eq!(v, json!({ "published": true }));
    }

    #[test]
    fn test_product_update_categories_are_plain_ids() {
        let populated: Vec<EntityRef> = serde_json::from_value(json!([
            { "_id": "c1" },
            "c2"
        ]))
        .unwrap();

        let update = ProductUpdate::builder().categories(populated).build();
        let v = serde_json::to_value(update).unwrap();

        assert_eq!(v, json!({ "categories": ["c1", "c2"] }));
    }

    #[test]
    fn test_order_status_wire_format() {
        let v = serde_json::to_value(OrderStatusUpdate {
            status: OrderStatus::Shipped,
        })
        .unwrap();
        assert_eq!(v, json!({ "status": "shipped" }));
    }
}
