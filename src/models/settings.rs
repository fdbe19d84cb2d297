//! # شکل‌های تایپ‌شده سند تنظیمات
//!
//! بیشتر بخش‌های تنظیمات pass-through هستن و به صورت `JsonMap` خام
//! جابه‌جا میشن، اما چند زیرساختار شکل اجباری دارن حتی وقتی در سند
//! غایب باشن: `whatsapp`، `announcementBar` و `system.maintenanceMode`.
//! این فایل اون شکل‌ها رو تایپ‌شده تعریف میکنه.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::LocalizedText;

// =====================================
// Maintenance Mode
// =====================================
/// حالت تعمیر و نگهداری - زیرساختار `system.maintenanceMode`
///
/// فرم تنظیمات فقط یک boolean ساده (`general.maintenanceMode`) نشون
/// میده؛ نرمالایزر اون رو به این ساختار کامل تبدیل میکنه و `message`
/// و `allowedIPs` موجود رو حفظ میکنه.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceMode {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub message: LocalizedText,

    #[serde(default, rename = "allowedIPs")]
    pub allowed_ips: Vec<String>,
}

// =====================================
// WhatsApp
// =====================================
/// یک روز از برنامه کاری
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingDay {
    pub day: String,

    pub is_open: bool,

    #[serde(default = "default_open_time")]
    pub open_time: String,

    #[serde(default = "default_close_time")]
    pub close_time: String,
}

fn default_open_time() -> String {
    "09:00".to_string()
}

fn default_close_time() -> String {
    "18:00".to_string()
}

/// ساعات کاری یک agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_schedule")]
    pub schedule: Vec<WorkingDay>,
}

fn default_timezone() -> String {
    "Asia/Tehran".to_string()
}

/// برنامه پیش‌فرض: شنبه تا پنجشنبه باز، جمعه بسته
fn default_schedule() -> Vec<WorkingDay> {
    let days = [
        ("saturday", true),
        ("sunday", true),
        ("monday", true),
        ("tuesday", true),
        ("wednesday", true),
        ("thursday", true),
        ("friday", false),
    ];

    days.iter()
        .map(|(day, is_open)| WorkingDay {
            day: (*day).to_string(),
            is_open: *is_open,
            open_time: default_open_time(),
            close_time: default_close_time(),
        })
        .collect()
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            enabled: false,
            timezone: default_timezone(),
            schedule: default_schedule(),
        }
    }
}

/// یک agent پشتیبانی واتساپ
///
/// چرخه عمر: سمت کلاینت به عنوان عنصر آرایه ساخته/حذف میشه و فقط
/// موقع ذخیره سند والد تنظیمات persist میشه.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappAgent {
    #[validate(regex(path = *crate::utils::VALID_PHONE, message = "Invalid phone number"))]
    pub phone_number: String,

    #[validate(length(min = 1, max = 120, message = "Agent name is required"))]
    pub name: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub offline_message: String,

    #[serde(default)]
    pub working_hours: WorkingHours,
}

/// بخش `whatsapp` سند تنظیمات - حتی وقتی در سند نیست، شکل کامل داره
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub agents: Vec<WhatsappAgent>,
}

impl WhatsappSettings {
    /// اضافه کردن agent جدید (بعد از اعتبارسنجی)
    pub fn add_agent(&mut self, agent: WhatsappAgent) -> crate::error::Result<()> {
        agent.validate()?;
        self.agents.push(agent);
        Ok(())
    }

    /// حذف agent بر اساس شماره تلفن
    pub fn remove_agent(&mut self, phone_number: &str) {
        self.agents.retain(|a| a.phone_number != phone_number);
    }
}

// =====================================
// Announcement Bar
// =====================================
/// نوار اطلاع‌رسانی بالای سایت - شکل اجباری دیگه
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementBar {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub text: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default = "default_bar_background")]
    pub background_color: String,

    #[serde(default = "default_bar_text_color")]
    pub text_color: String,
}

fn default_bar_background() -> String {
    "#1976d2".to_string()
}

fn default_bar_text_color() -> String {
    "#ffffff".to_string()
}

impl Default for AnnouncementBar {
    fn default() -> Self {
        Self {
            enabled: false,
            text: LocalizedText::default(),
            link: None,
            background_color: default_bar_background(),
            text_color: default_bar_text_color(),
        }
    }
}
