//! # ماژول نوتیفیکیشن (Toast Feedback)
//!
//! هر mutation موفق یا ناموفق باید یک بازخورد کاربری تولید کنه.
//! این ماژول sink اون بازخوردهاست؛ UI واقعی (toast و...) بیرون از
//! این crate زندگی میکنه و فقط این trait رو پیاده میکنه.
//!
//! ## مفاهیم Rust:
//! - **Trait Objects**: `Arc<dyn Notifier>` برای تزریق وابستگی
//! - **Interior Mutability**: `Mutex` در پیاده‌سازی حافظه‌ای

use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

// =====================================
// Notification
// =====================================
/// نوع بازخورد
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// یک بازخورد کاربری
///
/// `id` سمت کلاینت تولید میشه تا UI بتونه toastها رو dismiss کنه.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    /// ساخت بازخورد موفقیت
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// ساخت بازخورد خطا
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

// =====================================
// Notifier Trait
// =====================================
/// sink بازخوردها
///
/// # مفاهیم:
/// - `Send + Sync`: باید از چند task قابل استفاده باشه
pub trait Notifier: Send + Sync {
    /// تحویل یک بازخورد به UI
    fn notify(&self, notification: Notification);
}

/// پیاده‌سازی پیش‌فرض: لاگ با tracing
///
/// برای باینری demo و محیط‌هایی که UI ندارن.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                info!(message = %notification.message, "notification");
            }
            NotificationKind::Error => {
                warn!(message = %notification.message, "notification");
            }
        }
    }
}

/// پیاده‌سازی حافظه‌ای - بازخوردها رو جمع میکنه
///
/// در تست‌ها برای assert کردن بازخوردها استفاده میشه.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// ساخت sink خالی
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// کپی از همه بازخوردهای جمع‌شده
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().expect("notifier lock poisoned").clone()
    }

    /// آخرین بازخورد
    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.entries
            .lock()
            .expect("notifier lock poisoned")
            .last()
            .cloned()
    }

    /// پاک کردن بازخوردها
    pub fn clear(&self) {
        self.entries.lock().expect("notifier lock poisoned").clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
    }
}
