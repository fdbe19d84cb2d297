//! # سرویس CRUD منابع
//!
//! workflow کامل یک resource لیستی (articles، products، orders، ...):
//! fetch کش‌شده، mutation با invalidate، حذف دو مرحله‌ای و browser
//! با debounce جستجو.
//!
//! ## قواعد (رفتار پنل)
//!
//! - هر اکشن اول gate میشه؛ بدون permission هیچ درخواستی نمیره و
//!   notification هم تولید نمیشه (کنترلش اصلا نباید دیده میشد)
//! - mutation موفق: invalidate همه queryهای resource + یک toast موفقیت
//! - mutation ناموفق: toast خطا با پیام بک‌اند، کش دست نمیخوره
//! - پاسخ دیررس از query قدیمی دور ریخته میشه (latest-key-wins)

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::http::{ApiRequest, ApiTransport};
use crate::models::{ApiEnvelope, ListPayload};
use crate::notify::{Notification, Notifier};
use crate::permissions::{Action, Capabilities};
use crate::query::{Debouncer, FilterState, ListQuery, QueryCache, QueryKey};
use crate::session::SessionStore;

// =====================================
// Resource Client
// =====================================
/// کلاینت CRUD یک resource
///
/// نمونه‌ها سبک هستن (همه فیلدها Arc) و برای هر صفحه جدا ساخته میشن.
#[derive(Clone)]
pub struct ResourceClient {
    resource: String,
    transport: Arc<dyn ApiTransport>,
    cache: Arc<QueryCache>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl ResourceClient {
    /// ساخت کلاینت برای یک resource
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        transport: Arc<dyn ApiTransport>,
        cache: Arc<QueryCache>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resource: resource.into(),
            transport,
            cache,
            session,
            notifier,
        }
    }

    /// نام resource
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// capabilityهای کاربر جاری روی این resource
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.session.capabilities(&self.resource)
    }

    fn base_path(&self) -> String {
        format!("/{}", self.resource)
    }

    fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.resource, id)
    }

    // =====================================
    // Reads
    // =====================================
    /// fetch لیست با کش
    ///
    /// پارامترهای یکسان به همون ورودی کش میرسن؛ بعد از mutation
    /// ورودی stale شده و دوباره از سرور خونده میشه.
    ///
    /// خطای fetch یک toast خطا تولید میکنه (جدول خالی نشون داده میشه).
    #[instrument(skip(self, query), fields(resource = %self.resource, page = query.page))]
    pub async fn list(&self, query: &ListQuery) -> Result<ListPayload<Value>> {
        self.session.require(&self.resource, Action::View)?;

        let key = QueryKey::new(&self.resource, query);

        if let Some(hit) = self.cache.get_fresh(&key) {
            debug!("Cache hit");
            return Ok(hit);
        }

        let request = ApiRequest::get_with_query(self.base_path(), query.to_pairs());

        match self.transport.send(request).await {
            Ok(response) => {
                let payload: ListPayload<Value> = serde_json::from_value(response)?;
                self.cache.insert(key, payload.clone());
                Ok(payload)
            }
            Err(error) => {
                self.notifier
                    .notify(Notification::error(error.user_message()));
                Err(error)
            }
        }
    }

    /// گرفتن یک آیتم: `GET /<resource>/:id`
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.session.require(&self.resource, Action::View)?;

        let response = self
            .transport
            .send(ApiRequest::get(self.item_path(id)))
            .await?;

        let envelope: ApiEnvelope<Value> = serde_json::from_value(response)?;
        envelope.into_data()
    }

    // =====================================
    // Mutations
    // =====================================
    /// اجرای یک mutation با قرارداد مشترک toast/invalidate
    async fn run_mutation(
        &self,
        action: Action,
        request: ApiRequest,
        success_fallback: &str,
    ) -> Result<Value> {
        self.session.require(&self.resource, action)?;

        match self.transport.send(request).await {
            Ok(response) => {
                let envelope: ApiEnvelope<Value> =
                    serde_json::from_value(response).unwrap_or(ApiEnvelope {
                        success: true,
                        data: None,
                        message: None,
                    });

                let invalidated = self.cache.invalidate_resource(&self.resource);
                debug!(invalidated, "Cache invalidated after mutation");

                let message = envelope
                    .message
                    .clone()
                    .unwrap_or_else(|| success_fallback.to_string());
                self.notifier.notify(Notification::success(message));

                Ok(envelope.data.unwrap_or(Value::Null))
            }
            Err(error) => {
                // کش دست نمیخوره؛ داده نمایش‌داده‌شده هنوز معتبره
                self.notifier
                    .notify(Notification::error(error.user_message()));
                Err(error)
            }
        }
    }

    /// ساخت آیتم جدید: `POST /<resource>`
    #[instrument(skip(self, body), fields(resource = %self.resource))]
    pub async fn create(&self, body: Value) -> Result<Value> {
        self.run_mutation(
            Action::Create,
            ApiRequest::post(self.base_path(), body),
            "Created successfully",
        )
        .await
    }

    /// بروزرسانی آیتم: `PUT /<resource>/:id`
    #[instrument(skip(self, body), fields(resource = %self.resource))]
    pub async fn update(&self, id: &str, body: Value) -> Result<Value> {
        self.run_mutation(
            Action::Edit,
            ApiRequest::put(self.item_path(id), body),
            "Saved successfully",
        )
        .await
    }

    /// حذف آیتم: `DELETE /<resource>/:id`
    ///
    /// مستقیم صدا نزنید؛ مسیر معمول از `DeleteFlow` عبور میکنه که
    /// تایید کاربر رو اجباری کنه.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.run_mutation(
            Action::Delete,
            ApiRequest::delete(self.item_path(id)),
            "Deleted successfully",
        )
        .await?;
        Ok(())
    }

    /// mutation روی زیرمسیر یک آیتم: `PUT /<resource>/:id/<segment>`
    ///
    /// برای اکشن‌های خاص مثل تغییر وضعیت سفارش
    /// (`PUT /orders/:id/status`).
    #[instrument(skip(self, body), fields(resource = %self.resource, segment))]
    pub async fn update_item_segment(
        &self,
        id: &str,
        segment: &str,
        body: Value,
    ) -> Result<Value> {
        let path = format!("{}/{segment}", self.item_path(id));
        self.run_mutation(
            Action::Edit,
            ApiRequest::put(path, body),
            "Saved successfully",
        )
        .await
    }

    /// اکشن POST روی یک آیتم: `POST /<resource>/:id/<segment>`
    ///
    /// مثل لغو سفارش (`POST /orders/:id/cancel`).
    #[instrument(skip(self, body), fields(resource = %self.resource, segment))]
    pub async fn post_item_action(&self, id: &str, segment: &str, body: Value) -> Result<Value> {
        let path = format!("{}/{segment}", self.item_path(id));
        self.run_mutation(
            Action::Edit,
            ApiRequest::post(path, body),
            "Done successfully",
        )
        .await
    }
}

// =====================================
// Delete Flow
// =====================================
/// state machine حذف دو مرحله‌ای
///
/// حذف هیچوقت مستقیم اجرا نمیشه: اول `request` شناسه رو pending
/// میکنه (UI دیالوگ تایید نشون میده)، بعد `confirm` واقعا DELETE
/// میفرسته یا `cancel` منصرف میشه.
#[derive(Debug, Default)]
pub struct DeleteFlow {
    pending: Option<String>,
}

impl DeleteFlow {
    /// ساخت flow خالی
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// شناسه در انتظار تایید
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// مرحله اول: درخواست حذف - فقط state عوض میشه
    pub fn request(&mut self, id: impl Into<String>) {
        self.pending = Some(id.into());
    }

    /// انصراف - هیچ درخواستی نرفته که undo بخواد
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// مرحله دوم: تایید و اجرای DELETE
    ///
    /// بدون `request` قبلی خطای BadRequest برمیگرده.
    pub async fn confirm(&mut self, client: &ResourceClient) -> Result<()> {
        let id = self
            .pending
            .take()
            .ok_or_else(|| AppError::BadRequest("No delete pending confirmation".to_string()))?;

        client.delete(&id).await
    }
}

// =====================================
// Resource Browser
// =====================================
/// state کامل یک صفحه لیستی: فیلترها + debounce + نتیجه جاری
///
/// پاسخ‌های دیررس از queryهای قدیمی دور ریخته میشن: هر fetch کلید
/// خودش رو ثبت میکنه و نتیجه فقط وقتی اعمال میشه که اون کلید هنوز
/// فعال باشه.
pub struct ResourceBrowser {
    client: ResourceClient,
    state: Mutex<FilterState>,
    debouncer: Debouncer,
    active_key: Mutex<Option<QueryKey>>,
    rows: Mutex<ListPayload<Value>>,
}

impl ResourceBrowser {
    /// ساخت browser با تنظیمات debounce از config
    #[must_use]
    pub fn new(client: ResourceClient, config: &ClientConfig) -> Self {
        Self {
            client,
            state: Mutex::new(FilterState::new(10, config.min_search_len)),
            debouncer: Debouncer::new(config.search_debounce()),
            active_key: Mutex::new(None),
            rows: Mutex::new(ListPayload::default()),
        }
    }

    /// ردیف‌های جاری (کپی)
    #[must_use]
    pub fn rows(&self) -> ListPayload<Value> {
        self.rows.lock().expect("browser lock poisoned").clone()
    }

    /// صفحه جاری
    #[must_use]
    pub fn page(&self) -> u32 {
        self.state.lock().expect("browser lock poisoned").page()
    }

    fn current_key(&self) -> (ListQuery, QueryKey) {
        let query = self.state.lock().expect("browser lock poisoned").query();
        let key = QueryKey::new(self.client.resource(), &query);
        (query, key)
    }

    /// fetch نتیجه برای state جاری
    ///
    /// خروجی `Ok(false)` یعنی پاسخ به عنوان دیررس دور ریخته شد.
    pub async fn refresh(&self) -> Result<bool> {
        let (query, key) = self.current_key();

        {
            let mut active = self.active_key.lock().expect("browser lock poisoned");
            *active = Some(key.clone());
        }

        let payload = self.client.list(&query).await?;

        // latest-key-wins: فقط اگه این fetch هنوز آخرین باشه اعمال میشه
        let still_active = {
            let active = self.active_key.lock().expect("browser lock poisoned");
            active.as_ref() == Some(&key)
        };

        if still_active {
            *self.rows.lock().expect("browser lock poisoned") = payload;
            Ok(true)
        } else {
            warn!(resource = %self.client.resource(), "Dropped late response for superseded query");
            Ok(false)
        }
    }

    /// تنظیم فیلتر و fetch فوری
    pub async fn apply_filter(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool> {
        self.state
            .lock()
            .expect("browser lock poisoned")
            .set_filter(key, value);
        self.refresh().await
    }

    /// حذف فیلتر و fetch فوری
    pub async fn clear_filter(&self, key: &str) -> Result<bool> {
        self.state
            .lock()
            .expect("browser lock poisoned")
            .remove_filter(key);
        self.refresh().await
    }

    /// رفتن به صفحه دیگه
    pub async fn go_to_page(&self, page: u32) -> Result<bool> {
        self.state
            .lock()
            .expect("browser lock poisoned")
            .set_page(page);
        self.refresh().await
    }

    /// ثبت تایپ کاربر در فیلد جستجو
    ///
    /// فقط وقتی تایپ آروم بشه (debounce) عبارت promote و fetch میشه؛
    /// `Ok(false)` یعنی این تایپ با تایپ جدیدتری جایگزین شد.
    pub async fn type_search(&self, raw: &str) -> Result<bool> {
        let cleaned = {
            let mut state = self.state.lock().expect("browser lock poisoned");
            state.set_search_input(raw);
            state.search_input().to_string()
        };

        match self.debouncer.debounce(cleaned).await {
            Some(value) => {
                self.state
                    .lock()
                    .expect("browser lock poisoned")
                    .promote_search(value);
                self.refresh().await
            }
            None => Ok(false),
        }
    }

    /// لغو کارهای معلق (موقع ترک صفحه)
    pub fn dispose(&self) {
        self.debouncer.cancel();
        *self.active_key.lock().expect("browser lock poisoned") = None;
    }
}
