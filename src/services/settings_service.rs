//! # سرویس تنظیمات سایت
//!
//! تنظیمات یک سند singleton هست: `GET /settings` و `PUT /settings`
//! بدون شناسه. این سرویس چرخه load → edit → save فرم تب‌دار رو
//! مدیریت میکنه و نرمالایزر (ماژول settings) رو به شبکه وصل میکنه.
//!
//! ## قواعد
//!
//! - ذخیره ناموفق state فرم رو دست نمیزنه؛ کاربر میتونه دوباره
//!   تلاش کنه بدون اینکه چیزی از دست بره
//! - پیام خطای سرور لاگ میشه و به toast میرسه
//! - `reset` فرم رو به آخرین سند fetch شده برمیگردونه

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::http::{ApiRequest, ApiTransport};
use crate::models::{ApiEnvelope, JsonMap};
use crate::notify::{Notification, Notifier};
use crate::permissions::Action;
use crate::session::SessionStore;
use crate::settings::{unflatten, Section, SettingsForm};

/// resource ای که دسترسی تنظیمات روش gate میشه
const SETTINGS_RESOURCE: &str = "settings";

// =====================================
// Settings Client
// =====================================
/// state داخلی: فرم جاری + آخرین سند سرور
#[derive(Debug, Default)]
struct SettingsState {
    form: SettingsForm,
    last_fetched: JsonMap,
}

/// کلاینت تنظیمات سایت
pub struct SettingsClient {
    transport: Arc<dyn ApiTransport>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SettingsState>,
}

impl SettingsClient {
    /// ساخت کلاینت
    #[must_use]
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            session,
            notifier,
            state: Mutex::new(SettingsState::default()),
        }
    }

    /// فرم جاری (کپی)
    #[must_use]
    pub fn form(&self) -> SettingsForm {
        self.state.lock().expect("settings lock poisoned").form.clone()
    }

    /// load سند از سرور و پر کردن فرم: `GET /settings`
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<SettingsForm> {
        self.session.require(SETTINGS_RESOURCE, Action::View)?;

        let response = self.transport.send(ApiRequest::get("/settings")).await?;
        let envelope: ApiEnvelope<Value> = serde_json::from_value(response)?;
        let doc = extract_document(envelope.into_data()?);

        let form = unflatten(&doc);

        let mut state = self.state.lock().expect("settings lock poisoned");
        state.form = form.clone();
        state.last_fetched = doc;

        debug!("Settings loaded");
        Ok(form)
    }

    /// اعمال تغییرات یک تب روی فرم (هنوز چیزی ارسال نمیشه)
    ///
    /// patch ناقصه: فقط فیلدهایی که کاربر دست زده. قرارداد merge و
    /// هدایت `maintenanceMode` در ماژول settings پیاده شده.
    pub fn update_section(&self, section: Section, patch: JsonMap) -> Result<()> {
        let mut state = self.state.lock().expect("settings lock poisoned");
        state.form.apply_update(section, patch)
    }

    /// ذخیره فرم: `PUT /settings`
    ///
    /// فرم flatten و prune میشه و به شکل سند تخت به سرور میره.
    /// شکست، فرم رو دست نمیزنه.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<()> {
        self.session.require(SETTINGS_RESOURCE, Action::Edit)?;

        let flat = {
            let state = self.state.lock().expect("settings lock poisoned");
            state.form.flatten()?
        };

        let request = ApiRequest::put("/settings", Value::Object(flat.clone()));

        match self.transport.send(request).await {
            Ok(response) => {
                let envelope: ApiEnvelope<Value> =
                    serde_json::from_value(response).unwrap_or(ApiEnvelope {
                        success: true,
                        data: None,
                        message: None,
                    });

                // سرور ممکنه سند نهایی (با فیلدهای سیستمی) رو برگردونه
                let doc = match envelope.data {
                    Some(data) => extract_document(data),
                    None => flat,
                };

                {
                    let mut state = self.state.lock().expect("settings lock poisoned");
                    state.form = unflatten(&doc);
                    state.last_fetched = doc;
                }

                let message = envelope
                    .message
                    .unwrap_or_else(|| "Settings saved successfully".to_string());
                self.notifier.notify(Notification::success(message));
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Saving settings failed");
                self.notifier
                    .notify(Notification::error(error.user_message()));
                Err(error)
            }
        }
    }

    /// دور ریختن تغییرات ذخیره‌نشده و برگشت به آخرین سند سرور
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("settings lock poisoned");
        let doc = state.last_fetched.clone();
        state.form = unflatten(&doc);
    }
}

/// بیرون کشیدن سند تخت از `data`
///
/// بک‌اند گاهی `data: { settings: {...} }` میفرسته و گاهی خود سند رو.
fn extract_document(data: Value) -> JsonMap {
    match data {
        Value::Object(map) => match map.get("settings") {
            Some(Value::Object(inner)) => inner.clone(),
            _ => map,
        },
        _ => JsonMap::new(),
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::http::MockApiTransport;
    use crate::models::{Role, User};
    use crate::notify::{MemoryNotifier, NotificationKind};
    use crate::services::ClientState;
    use serde_json::json;

    fn state_with(transport: MockApiTransport, notifier: Arc<MemoryNotifier>) -> ClientState {
        let state = ClientState::for_testing(Arc::new(transport), notifier);
        state.session.seed_user_for_tests(User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: None,
            role: Role::new("admin", vec!["settings.*".to_string()]),
        });
        state
    }

    fn settings_doc() -> Value {
        json!({
            "siteName": { "fa": "فروشگاه", "en": "Shop" },
            "contact": { "phone": "021000" },
            "system": { "timezone": "Asia/Tehran" }
        })
    }

    #[tokio::test]
    async fn test_load_unflattens_document() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/settings")
            .times(1)
            .returning(|_| {
                Ok(json!({ "success": true, "data": { "settings": settings_doc() } }))
            });

        let notifier = Arc::new(MemoryNotifier::new());
        let state = state_with(transport, notifier);
        let client = state.settings();

        let form = client.load().await.unwrap();
        assert_eq!(form.general["siteName"]["fa"], "فروشگاه");
        assert_eq!(form.contact["phone"], "021000");
    }

    #[tokio::test]
    async fn test_save_failure_leaves_form_untouched() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == reqwest::Method::GET)
            .times(1)
            .returning(|_| Ok(json!({ "success": true, "data": settings_doc() })));
        transport
            .expect_send()
            .withf(|req| req.method == reqwest::Method::PUT)
            .times(1)
            .returning(|_| Err(AppError::Validation("Invalid settings".to_string())));

        let notifier = Arc::new(MemoryNotifier::new());
        let state = state_with(transport, notifier.clone());
        let client = state.settings();

        client.load().await.unwrap();
        client
            .update_section(
                Section::Contact,
                json!({ "phone": "021999" }).as_object().unwrap().clone(),
            )
            .unwrap();

        assert!(client.save().await.is_err());

        // فرم (با تغییر ذخیره‌نشده) دست نخورده و toast خطا اومده
        assert_eq!(client.form().contact["phone"], "021999");
        let last = notifier.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
        assert_eq!(last.message, "Invalid settings");
    }

    #[tokio::test]
    async fn test_save_sends_pruned_flat_document() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == reqwest::Method::GET)
            .times(1)
            .returning(|_| Ok(json!({ "success": true, "data": settings_doc() })));
        transport
            .expect_send()
            .withf(|req| {
                if req.method != reqwest::Method::PUT {
                    return false;
                }
                let body = req.body.as_ref().unwrap();
                // maintenanceMode زیر general برنگشته و به system هدایت شده
                body["system"]["maintenanceMode"]["enabled"] == json!(true)
                    && body.get("general").map_or(true, |g| g.get("maintenanceMode").is_none())
            })
            .times(1)
            .returning(|_| Ok(json!({ "success": true, "message": "ذخیره شد" })));

        let notifier = Arc::new(MemoryNotifier::new());
        let state = state_with(transport, notifier.clone());
        let client = state.settings();

        client.load().await.unwrap();
        client
            .update_section(
                Section::General,
                json!({ "maintenanceMode": true }).as_object().unwrap().clone(),
            )
            .unwrap();

        client.save().await.unwrap();
        assert_eq!(notifier.last().unwrap().message, "ذخیره شد");
    }

    #[tokio::test]
    async fn test_reset_restores_last_fetched() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(json!({ "success": true, "data": settings_doc() })));

        let notifier = Arc::new(MemoryNotifier::new());
        let state = state_with(transport, notifier);
        let client = state.settings();

        client.load().await.unwrap();
        client
            .update_section(
                Section::Contact,
                json!({ "phone": "changed" }).as_object().unwrap().clone(),
            )
            .unwrap();
        assert_eq!(client.form().contact["phone"], "changed");

        client.reset();
        assert_eq!(client.form().contact["phone"], "021000");
    }

    #[tokio::test]
    async fn test_view_only_cannot_save() {
        let mut transport = MockApiTransport::new();
        transport.expect_send().times(0);

        let notifier = Arc::new(MemoryNotifier::new());
        let state = ClientState::for_testing(Arc::new(transport), notifier.clone());
        state.session.seed_user_for_tests(User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: None,
            role: Role::new("viewer", vec!["settings.read".to_string()]),
        });

        let client = state.settings();
        let result = client.save().await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(notifier.entries().is_empty());
    }
}
