//! # مدل‌های احراز هویت
//!
//! کاربر، نقش، و DTOهای ورود/پروفایل
//!
//! ## مفاهیم Rust:
//! - Validation با derive macro
//! - `#[serde(rename)]` برای نام‌های سیم (`_id`, camelCase)

use serde::{Deserialize, Serialize};
use validator::Validate;

// =====================================
// Role
// =====================================
/// نقش کاربر
///
/// `permissions` لیستی از slugهاست: دقیق (`articles.create`) یا
/// wildcard (`articles.*`). نقش `super_admin` یا permission خاص
/// `admin.all` همه چک‌ها رو دور میزنه (ارزیابی در ماژول permissions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    /// ساخت نقش جدید
    #[must_use]
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }
}

// =====================================
// User
// =====================================
/// کاربر جاری (خروجی `GET /auth/me`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub role: Role,
}

// =====================================
// Tokens
// =====================================
/// توکن‌های برگشتی از ورود
///
/// بک‌اند ناسازگاره: بعضی نسخه‌ها `accessToken` میفرستن و بعضی `token`.
/// هر دو رو میخونیم و `bearer()` اولی که موجوده رو برمیگردونه.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Tokens {
    /// توکن قابل استفاده برای هدر Authorization
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().or(self.token.as_deref())
    }
}

// =====================================
// Auth DTOs
// =====================================
/// درخواست ورود: `POST /auth/login`
///
/// # مفاهیم:
/// - `#[derive(Validate)]`: اعتبارسنجی سمت کلاینت قبل از ارسال
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// بدنه `data` پاسخ ورود
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub user: User,

    #[serde(default)]
    pub tokens: Tokens,
}

/// درخواست بروزرسانی پروفایل: `PUT /auth/profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "Name length is invalid"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

/// درخواست تغییر رمز: `PUT /auth/change-password`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, message = "Current password is too short"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// بدنه `data` پاسخ `GET /auth/csrf-token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenData {
    pub csrf_token: String,
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokens_prefer_access_token() {
        let t = Tokens {
            access_token: Some("aaa".to_string()),
            token: Some("bbb".to_string()),
        };
        assert_eq!(t.bearer(), Some("aaa"));

        let t = Tokens {
            access_token: None,
            token: Some("bbb".to_string()),
        };
        assert_eq!(t.bearer(), Some("bbb"));
    }

    #[test]
    fn test_user_wire_shape() {
        let u: User = serde_json::from_value(json!({
            "_id": "u1",
            "email": "admin@example.com",
            "role": { "name": "editor", "permissions": ["articles.*"] }
        }))
        .unwrap();

        assert_eq!(u.id, "u1");
        assert_eq!(u.role.permissions, vec!["articles.*"]);
    }

    #[test]
    fn test_login_request_validation() {
        let bad = LoginRequest {
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };
        assert!(bad.validate().is_err());

        let ok = LoginRequest {
            email: "admin@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_change_password_must_match() {
        let req = ChangePasswordRequest {
            current_password: "oldpass1".to_string(),
            new_password: "newpass123".to_string(),
            confirm_password: "different".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
