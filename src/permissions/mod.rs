//! # ماژول ارزیابی دسترسی (Permissions)
//!
//! ارزیابی capability بر اساس نقش کاربر.
//!
//! ## مفاهیم Rust:
//! - **Pattern Matching**: به جای مقایسه رشته‌ای پراکنده در UI
//! - **Copy Types**: `Action` یک enum کوچیک و Copy هست
//!
//! ## قواعد ارزیابی
//!
//! - نقش `super_admin` یا داشتن `admin.all` همه چک‌ها رو پاس میکنه
//! - تطبیق دقیق: `articles.create`
//! - تطبیق wildcard: `articles.*`
//! - هر اکشن چند نام مترادف داره (`read`/`view` و `update`/`edit`)
//!   چون بک‌اند در resourceهای مختلف ناسازگار نام‌گذاری کرده
//!
//! این فقط defense in depth هست: نقطه اجرای واقعی بک‌انده، اما
//! کلاینت نباید کنترلی که کاربر اجازه‌شو نداره حتی نشون بده.

use serde::{Deserialize, Serialize};

use crate::models::Role;

// =====================================
// Constants
// =====================================
/// نقشی که همه چک‌ها رو دور میزنه
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

/// permission سراسری که معادل super_admin عمل میکنه
pub const BYPASS_PERMISSION: &str = "admin.all";

// =====================================
// Action
// =====================================
/// اکشن‌های قابل gate شدن روی هر resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    /// نام‌های مترادف این اکشن در permission slugها
    ///
    /// بک‌اند برای خواندن گاهی `read` و گاهی `view` استفاده میکنه؛
    /// هر دو پذیرفته میشن.
    #[must_use]
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::View => &["read", "view"],
            Self::Create => &["create"],
            Self::Edit => &["update", "edit"],
            Self::Delete => &["delete"],
        }
    }

    /// همه اکشن‌ها (برای ساخت Capabilities)
    #[must_use]
    pub fn all() -> [Action; 4] {
        [Self::View, Self::Create, Self::Edit, Self::Delete]
    }
}

// =====================================
// Evaluation
// =====================================
/// آیا نقش اجازه wildcard یا سراسری داره؟
fn is_bypass(role: &Role) -> bool {
    role.name == SUPER_ADMIN_ROLE || role.permissions.iter().any(|p| p == BYPASS_PERMISSION)
}

/// ارزیابی یک capability: `allows(role, "articles", Action::Edit)`
///
/// # مثال
/// ```rust
/// use admin_panel_client::models::Role;
/// use admin_panel_client::permissions::{allows, Action};
///
/// let editor = Role::new("editor", vec!["articles.*".to_string()]);
/// assert!(allows(&editor, "articles", Action::Delete));
/// assert!(!allows(&editor, "orders", Action::View));
/// ```
#[must_use]
pub fn allows(role: &Role, resource: &str, action: Action) -> bool {
    if is_bypass(role) {
        return true;
    }

    let wildcard = format!("{resource}.*");

    role.permissions.iter().any(|perm| {
        if perm == &wildcard {
            return true;
        }

        action
            .aliases()
            .iter()
            .any(|alias| perm == &format!("{resource}.{alias}"))
    })
}

// =====================================
// Capabilities
// =====================================
/// چهار capability یک resource به صورت یکجا
///
/// جدول‌ها و فرم‌ها از این ساختار استفاده میکنن تا هر کنترل رو
/// جداگانه نشون بدن یا مخفی کنن.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Capabilities {
    /// محاسبه capabilityها برای یک resource
    #[must_use]
    pub fn for_resource(role: &Role, resource: &str) -> Self {
        Self {
            can_view: allows(role, resource, Action::View),
            can_create: allows(role, resource, Action::Create),
            can_edit: allows(role, resource, Action::Edit),
            can_delete: allows(role, resource, Action::Delete),
        }
    }

    /// capability متناظر یک اکشن
    #[must_use]
    pub fn can(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }

    /// هیچ دسترسی‌ای (نقش غایب / کاربر مهمان)
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, perms: &[&str]) -> Role {
        Role::new(name, perms.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_exact_match_read_only() {
        let r = role("viewer", &["articles.read"]);
        let caps = Capabilities::for_resource(&r, "articles");

        assert!(caps.can_view);
        assert!(!caps.can_edit);
        assert!(!caps.can_delete);
        assert!(!caps.can_create);
    }

    #[test]
    fn test_view_alias_accepts_both_spellings() {
        assert!(allows(&role("a", &["tickets.view"]), "tickets", Action::View));
        assert!(allows(&role("a", &["tickets.read"]), "tickets", Action::View));
        assert!(allows(&role("a", &["tickets.edit"]), "tickets", Action::Edit));
        assert!(allows(&role("a", &["tickets.update"]), "tickets", Action::Edit));
    }

    #[test]
    fn test_wildcard_grants_every_action() {
        let r = role("editor", &["articles.*"]);
        for action in Action::all() {
            assert!(allows(&r, "articles", action));
        }
        assert!(!allows(&r, "orders", Action::View));
    }

    #[test]
    fn test_super_admin_bypasses_with_empty_permissions() {
        let r = role(SUPER_ADMIN_ROLE, &[]);
        for action in Action::all() {
            assert!(allows(&r, "anything", action));
        }
    }

    #[test]
    fn test_admin_all_permission_bypasses() {
        let r = role("ops", &[BYPASS_PERMISSION]);
        assert!(allows(&r, "orders", Action::Delete));
    }

    #[test]
    fn test_no_permissions_means_no_access() {
        let r = role("guest", &[]);
        let caps = Capabilities::for_resource(&r, "articles");
        assert_eq!(caps, Capabilities::none());
    }

    #[test]
    fn test_resource_must_match_exactly() {
        // پیشوند مشترک نباید match بشه
        let r = role("a", &["articles.read"]);
        assert!(!allows(&r, "article", Action::View));
        assert!(!allows(&r, "articles-archive", Action::View));
    }
}
