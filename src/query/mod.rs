//! # ماژول query و کش (Fetch Cache)
//!
//! state فیلتر/صفحه‌بندی، کلید query، کش invalidate-on-mutation و
//! ابزار debounce جستجو.
//!
//! ## مفاهیم Rust:
//! - **BTreeMap**: فیلترها مرتب نگه داشته میشن که کلید کش پایدار باشه
//! - **Atomic Counters**: نسل (sequence) برای debounce
//! - **Interior Mutability**: کش پشت Mutex
//!
//! ## قواعد (از رفتار مرجع)
//!
//! - تغییر هر فیلتر، `page` رو به 1 برمیگردونه
//! - عبارت جستجو فقط بعد از debounce و فقط وقتی به حداقل طول برسه
//!   وارد query میشه؛ کوتاه‌تر از اون کلا ارسال نمیشه
//! - پارامترهای یکسان ⇒ ورودی کش یکسان
//! - invalidate کردن با پیشوند resource انجام میشه نه کلید دقیق،
//!   که همه ترکیب‌های فیلتر/صفحه یک resource بعد از mutation تازه بشن

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::models::ListPayload;
use crate::utils;

// =====================================
// List Query
// =====================================
/// پارامترهای یک fetch لیستی
///
/// # Invariants
/// - `page >= 1` و `limit > 0`
/// - `search` فقط وقتی Some هست که باید واقعا ارسال بشه
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    /// ساخت query پیش‌فرض (صفحه اول)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// زوج‌های کلید/مقدار برای query string
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];

        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }

        for (key, value) in &self.filters {
            pairs.push((key.clone(), value.clone()));
        }

        pairs
    }

    /// اثر انگشت پایدار برای کلید کش
    #[must_use]
    pub fn fingerprint(&self) -> String {
        utils::query_fingerprint(&self.to_pairs())
    }
}

// =====================================
// Filter State
// =====================================
/// state فیلترهای یک صفحه لیستی
///
/// `search_input` مقدار خام ورودیه؛ `debounced_search` مقداریه که
/// بعد از آروم شدن تایپ promote شده و تنها چیزیه که به query میرسه.
#[derive(Debug, Clone)]
pub struct FilterState {
    search_input: String,
    debounced_search: String,
    filters: BTreeMap<String, String>,
    page: u32,
    limit: u32,
    min_search_len: usize,
}

impl FilterState {
    /// ساخت state تازه
    #[must_use]
    pub fn new(limit: u32, min_search_len: usize) -> Self {
        Self {
            search_input: String::new(),
            debounced_search: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            limit: limit.max(1),
            min_search_len,
        }
    }

    /// مقدار خام ورودی جستجو
    #[must_use]
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// صفحه جاری
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// ثبت تایپ کاربر - هنوز چیزی fetch نمیشه
    pub fn set_search_input(&mut self, raw: &str) {
        self.search_input = utils::clean_whitespace(raw);
    }

    /// promote شدن مقدار debounce شده - این یک "تغییر فیلتر" حساب میشه
    pub fn promote_search(&mut self, value: String) {
        if self.debounced_search != value {
            self.debounced_search = value;
            self.page = 1;
        }
    }

    /// تنظیم یک فیلتر (status، type، category، dateFrom، ...)
    ///
    /// Invariant: هر تغییر فیلتر `page` رو به 1 برمیگردونه.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(key.into(), value.into());
        self.page = 1;
    }

    /// حذف یک فیلتر
    pub fn remove_filter(&mut self, key: &str) {
        if self.filters.remove(key).is_some() {
            self.page = 1;
        }
    }

    /// رفتن به صفحه دیگه (فیلترها دست نمیخورن)
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// تغییر اندازه صفحه - مثل تغییر فیلتر رفتار میکنه
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
        self.page = 1;
    }

    /// ساخت query جاری
    ///
    /// جستجوی کوتاه‌تر از حداقل، کلا از query حذف میشه
    /// (رشته خالی هم فرستاده نمیشه).
    #[must_use]
    pub fn query(&self) -> ListQuery {
        let search = if self.debounced_search.chars().count() >= self.min_search_len {
            // truncate امن برای یونیکد (متن فارسی چندبایتیه)
            let term: String = self
                .debounced_search
                .chars()
                .take(utils::MAX_SEARCH_LEN)
                .collect();
            Some(term)
        } else {
            None
        };

        ListQuery {
            page: self.page,
            limit: self.limit,
            search,
            filters: self.filters.clone(),
        }
    }
}

// =====================================
// Query Key
// =====================================
/// کلید یک fetch کش‌شده: `(resource, fingerprint(params))`
///
/// سگمنت اول (resource) همونیه که invalidate کردن روش predicate
/// میزنه؛ بقیه کلید فقط برای تفکیک ترکیب‌های فیلتر/صفحه‌ست.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: String,
    params: String,
}

impl QueryKey {
    /// ساخت کلید از resource و query
    #[must_use]
    pub fn new(resource: impl Into<String>, query: &ListQuery) -> Self {
        Self {
            resource: resource.into(),
            params: query.fingerprint(),
        }
    }

    /// نام resource (سگمنت اول)
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// آیا این کلید متعلق به این resource هست؟
    #[must_use]
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.resource == resource
    }
}

// =====================================
// Query Cache
// =====================================
/// یک ورودی کش‌شده
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: ListPayload<Value>,
    stale: bool,
}

/// کش fetch با invalidate کردن بر اساس resource
///
/// مالک واقعی داده بک‌انده؛ این فقط یک کپی گذرا نگه میداره که بعد از
/// هر mutation موفق باطل میشه.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    /// ساخت کش خالی
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// گرفتن ورودی تازه (غیر stale)
    #[must_use]
    pub fn get_fresh(&self, key: &QueryKey) -> Option<ListPayload<Value>> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| e.payload.clone())
    }

    /// ذخیره نتیجه یک fetch موفق
    pub fn insert(&self, key: QueryKey, payload: ListPayload<Value>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key,
            CacheEntry {
                payload,
                stale: false,
            },
        );
    }

    /// stale کردن همه ورودی‌های یک resource
    ///
    /// predicate روی سگمنت اول کلیده نه کل کلید - همه ترکیب‌های
    /// فیلتر/صفحه stale میشن و در دسترسی بعدی refetch میخورن.
    pub fn invalidate_resource(&self, resource: &str) -> usize {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let mut count = 0;

        for (key, entry) in entries.iter_mut() {
            if key.matches_resource(resource) && !entry.stale {
                entry.stale = true;
                count += 1;
            }
        }

        count
    }

    /// آیا این کلید stale شده؟ (None یعنی اصلا کش نشده)
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(key).map(|e| e.stale)
    }

    /// پاک کردن کامل کش (موقع logout)
    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }
}

// =====================================
// Debouncer
// =====================================
/// ابزار debounce با semantics لغو صریح
///
/// هر فراخوانی `debounce` نسل جدیدی ثبت میکنه؛ بعد از گذشت تاخیر،
/// فقط آخرین نسل مقدارش رو برمیگردونه و بقیه `None` میگیرن. این
/// یعنی برای تایپ سریع، دقیقا یک مقدار (آخری) promote میشه.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    seq: Arc<AtomicU64>,
}

impl Debouncer {
    /// ساخت debouncer با تاخیر مشخص
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// ثبت یک مقدار جدید؛ بعد از آروم شدن ورودی برمیگرده
    ///
    /// `None` یعنی مقدار جدیدتری جایگزین شده (یا لغو شده).
    pub async fn debounce(&self, value: String) -> Option<String> {
        let my_seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.delay).await;

        if self.seq.load(Ordering::SeqCst) == my_seq {
            Some(value)
        } else {
            None
        }
    }

    /// لغو مقدارهای در انتظار (معادل unmount شدن صفحه)
    pub fn cancel(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
    }
}
