//! # نرمالایزر تنظیمات (Settings Normalizer)
//!
//! تبدیل دوطرفه بین سند تخت تنظیمات که بک‌اند نگه میداره و
//! view-model بخش‌بندی‌شده که فرم تب‌دار ویرایش میکنه.
//!
//! ## مفاهیم Rust:
//! - **Pure Functions**: هر سه تبدیل (unflatten / merge / flatten)
//!   تابع خالص بدون side effect هستن
//! - **serde_json::Map**: کار با JSON بی‌شکل در بخش‌های pass-through
//! - **Recursion**: merge و prune بازگشتی روی آبجکت‌های تو در تو
//!
//! ## قراردادها
//!
//! - `Null` در یک patch معادل `undefined` جاوااسکریپتیه: هیچوقت
//!   مقدار تعریف‌شده رو بازنویسی نمیکنه (skip میشه)
//! - آبجکت‌های ساده بازگشتی merge میشن؛ آرایه‌ها یکجا جایگزین میشن
//! - موقع flatten، کلیدهای Null حذف میشن و آبجکتی که بعد از prune
//!   خالی بمونه خودش هم حذف میشه (آبجکت خالی ارسال نمیشه)
//! - استثنای صریح: `siteDescription` با هر دو زبان رشته خالی کامل
//!   حذف میشه - این قاعده از prune عمومی درنمیاد و جداگانه اعمال میشه
//! - `general.maintenanceMode` (boolean فرم) به
//!   `system.maintenanceMode.{enabled,message,allowedIPs}` هدایت میشه
//!
//! ## قرارداد round-trip (تست property دار)
//!
//! `flatten(unflatten(D)) == prune(D)` برای هر سند کامل `D`
//! (سند کامل یعنی `siteName` و بخش‌های با شکل اجباری رو داره).

use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{
    AnnouncementBar, JsonMap, LocalizedList, LocalizedText, MaintenanceMode, WhatsappSettings,
};

// =====================================
// Sections
// =====================================
/// بخش‌های فرم تنظیمات (تب‌ها)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    General,
    Contact,
    Email,
    Security,
    Media,
    Notifications,
    Theme,
    System,
    Seo,
    Whatsapp,
    AnnouncementBar,
}

impl Section {
    /// نام بخش روی سیم / در state فرم
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Contact => "contact",
            Self::Email => "email",
            Self::Security => "security",
            Self::Media => "media",
            Self::Notifications => "notifications",
            Self::Theme => "theme",
            Self::System => "system",
            Self::Seo => "seo",
            Self::Whatsapp => "whatsapp",
            Self::AnnouncementBar => "announcementBar",
        }
    }
}

// =====================================
// Sectioned View-Model
// =====================================
/// مدل بخش‌بندی‌شده تنظیمات - state فرم تب‌دار
///
/// بخش‌های pass-through به صورت map خام نگه داشته میشن؛ دو بخشی که
/// شکل اجباری دارن (`whatsapp` و `announcementBar`) تایپ‌شده هستن.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsForm {
    pub general: JsonMap,
    pub contact: JsonMap,
    pub email: JsonMap,
    pub security: JsonMap,
    pub media: JsonMap,
    pub notifications: JsonMap,
    pub theme: JsonMap,
    pub system: JsonMap,
    pub seo: JsonMap,
    pub whatsapp: WhatsappSettings,
    pub announcement_bar: AnnouncementBar,
}

/// خوندن یک بخش از سند تخت به صورت map (پیش‌فرض: خالی)
fn section_map(doc: &JsonMap, key: &str) -> JsonMap {
    match doc.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => JsonMap::new(),
    }
}

/// مقدار تو در تو: `doc[a][b]`
fn nested<'a>(doc: &'a JsonMap, a: &str, b: &str) -> Option<&'a Value> {
    doc.get(a)?.get(b)
}

// =====================================
// Unflatten (Load)
// =====================================
/// تبدیل سند تخت بک‌اند به مدل بخش‌بندی‌شده
///
/// بخش `general` از چند جای سند سرهم میشه (نام سایت، توضیحات،
/// کلمات کلیدی سئو، timezone و...) - بقیه بخش‌ها pass-through هستن.
#[must_use]
pub fn unflatten(doc: &JsonMap) -> SettingsForm {
    let mut general = JsonMap::new();

    let localized_or_default = |v: Option<&Value>| -> Value {
        v.cloned()
            .unwrap_or_else(|| serde_json::to_value(LocalizedText::default()).unwrap_or_default())
    };

    general.insert("siteName".to_string(), localized_or_default(doc.get("siteName")));
    general.insert(
        "description".to_string(),
        localized_or_default(doc.get("siteDescription")),
    );
    general.insert(
        "keywords".to_string(),
        nested(doc, "seo", "defaultKeywords")
            .cloned()
            .unwrap_or_else(|| serde_json::to_value(LocalizedList::default()).unwrap_or_default()),
    );
    general.insert(
        "timezone".to_string(),
        nested(doc, "system", "timezone")
            .cloned()
            .unwrap_or_else(|| Value::String("Asia/Tehran".to_string())),
    );
    general.insert(
        "dateFormat".to_string(),
        nested(doc, "system", "dateFormat")
            .cloned()
            .unwrap_or_else(|| Value::String("jYYYY/jMM/jDD".to_string())),
    );
    general.insert(
        "defaultLanguage".to_string(),
        nested(doc, "system", "defaultLanguage")
            .cloned()
            .unwrap_or_else(|| Value::String("fa".to_string())),
    );
    general.insert(
        "maxFileSize".to_string(),
        nested(doc, "media", "maxFileSize")
            .cloned()
            .unwrap_or_else(|| Value::Number(10.into())),
    );

    // دو بخش با شکل اجباری - حتی وقتی در سند غایبن، پیش‌فرض تایپ‌شده دارن
    let whatsapp: WhatsappSettings = doc
        .get("whatsapp")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let announcement_bar: AnnouncementBar = doc
        .get("announcementBar")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    SettingsForm {
        general,
        contact: section_map(doc, "contact"),
        email: section_map(doc, "email"),
        security: section_map(doc, "security"),
        media: section_map(doc, "media"),
        notifications: section_map(doc, "notifications"),
        theme: section_map(doc, "theme"),
        system: section_map(doc, "system"),
        seo: section_map(doc, "seo"),
        whatsapp,
        announcement_bar,
    }
}

// =====================================
// Merge (Edit)
// =====================================
/// merge عمیق یک patch در یک map
///
/// قرارداد (برای هر کلید `k` در patch):
/// - اگه `patch[k]` برابر `Null` باشه: skip - هیچوقت مقدار تعریف‌شده
///   رو بازنویسی نمیکنیم
/// - اگه هر دو طرف آبجکت ساده باشن: بازگشتی merge
/// - در غیر این صورت: بازنویسی (آرایه‌ها یکجا جایگزین میشن)
pub fn merge_maps(target: &mut JsonMap, patch: JsonMap) {
    for (key, value) in patch {
        if value.is_null() {
            continue;
        }

        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                merge_maps(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

impl SettingsForm {
    /// اعمال update جزئی یک بخش (خروجی sub-form همون بخش)
    ///
    /// حالت خاص: اگه بخش `general` کلید `maintenanceMode` (boolean)
    /// داشته باشه، به `system.maintenanceMode` هدایت میشه -
    /// `message` و `allowedIPs` موجود حفظ میشن - و از `general` حذف
    /// میشه که هیچوقت زیر `general` به بک‌اند برنگرده.
    pub fn apply_update(&mut self, section: Section, mut patch: JsonMap) -> Result<()> {
        if section == Section::General {
            if let Some(value) = patch.remove("maintenanceMode") {
                if let Some(enabled) = value.as_bool() {
                    self.redirect_maintenance_mode(enabled)?;
                } else if !value.is_null() {
                    debug!("Ignoring non-boolean maintenanceMode in general update");
                }
            }
        }

        match section {
            Section::General => merge_maps(&mut self.general, patch),
            Section::Contact => merge_maps(&mut self.contact, patch),
            Section::Email => merge_maps(&mut self.email, patch),
            Section::Security => merge_maps(&mut self.security, patch),
            Section::Media => merge_maps(&mut self.media, patch),
            Section::Notifications => merge_maps(&mut self.notifications, patch),
            Section::Theme => merge_maps(&mut self.theme, patch),
            Section::System => merge_maps(&mut self.system, patch),
            Section::Seo => merge_maps(&mut self.seo, patch),
            Section::Whatsapp => {
                self.whatsapp = merge_typed(&self.whatsapp, patch)?;
            }
            Section::AnnouncementBar => {
                self.announcement_bar = merge_typed(&self.announcement_bar, patch)?;
            }
        }

        Ok(())
    }

    /// ساخت/بروزرسانی `system.maintenanceMode` از boolean فرم
    fn redirect_maintenance_mode(&mut self, enabled: bool) -> Result<()> {
        let mut mode: MaintenanceMode = self
            .system
            .get("maintenanceMode")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        mode.enabled = enabled;

        self.system
            .insert("maintenanceMode".to_string(), serde_json::to_value(mode)?);

        Ok(())
    }
}

/// merge یک patch خام در یک بخش تایپ‌شده
///
/// بخش تایپ‌شده موقتا به map تبدیل میشه، merge عمومی اعمال میشه و
/// نتیجه دوباره به نوع اصلی برمیگرده. اگه نتیجه شکل اجباری رو نقض
/// کنه، خطای اعتبارسنجی برمیگردونیم و state دست نمیخوره.
fn merge_typed<T>(current: &T, patch: JsonMap) -> Result<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut as_map = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    };

    merge_maps(&mut as_map, patch);

    serde_json::from_value(Value::Object(as_map))
        .map_err(|e| AppError::Validation(format!("Section update has invalid shape: {e}")))
}

// =====================================
// Flatten (Save) + Prune
// =====================================
/// prune بازگشتی یک مقدار
///
/// - `Null` حذف میشه (None)
/// - آبجکت: اول فرزندها prune میشن؛ اگه نتیجه هیچ کلیدی نداشت،
///   خود آبجکت هم حذف میشه
/// - بقیه مقدارها (از جمله آرایه‌ها و رشته خالی) دست نمیخورن
#[must_use]
pub fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: JsonMap = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();

            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}

/// اعمال prune روی همه کلیدهای یک map
#[must_use]
pub fn prune_map(map: JsonMap) -> JsonMap {
    map.into_iter()
        .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
        .collect()
}

/// آیا این مقدار یک `LocalizedText` با هر دو زبان خالیه؟
fn is_empty_localized(value: Option<&Value>) -> bool {
    value
        .and_then(|v| serde_json::from_value::<LocalizedText>(v.clone()).ok())
        .map(|t| t.is_empty())
        .unwrap_or(false)
}

impl SettingsForm {
    /// تبدیل مدل بخش‌بندی‌شده به payload تخت برای `PUT /settings`
    pub fn flatten(&self) -> Result<JsonMap> {
        let mut flat = JsonMap::new();

        flat.insert(
            "siteName".to_string(),
            self.general.get("siteName").cloned().unwrap_or(Value::Null),
        );
        flat.insert(
            "siteDescription".to_string(),
            self.general.get("description").cloned().unwrap_or(Value::Null),
        );

        let passthrough: [(&str, &JsonMap); 7] = [
            ("contact", &self.contact),
            ("email", &self.email),
            ("security", &self.security),
            ("media", &self.media),
            ("notifications", &self.notifications),
            ("theme", &self.theme),
            ("system", &self.system),
        ];

        for (key, map) in passthrough {
            flat.insert(key.to_string(), Value::Object(map.clone()));
        }

        // `seo ?? {}` - آبجکت خالی بعدا توسط prune حذف میشه
        flat.insert("seo".to_string(), Value::Object(self.seo.clone()));

        flat.insert("whatsapp".to_string(), serde_json::to_value(&self.whatsapp)?);
        flat.insert(
            "announcementBar".to_string(),
            serde_json::to_value(&self.announcement_bar)?,
        );

        // استثنای صریح: توضیحات با هر دو زبان خالی کامل حذف میشه -
        // این از قاعده عمومی prune درنمیاد چون رشته خالی مقدار تعریف‌شده‌ست
        if is_empty_localized(flat.get("siteDescription")) {
            flat.remove("siteDescription");
        }

        Ok(prune_map(flat))
    }
}
