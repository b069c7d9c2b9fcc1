use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{push_field_error, FieldErrors};
use crate::schema::{
    as_object, check_unknown, opt_bool, opt_string, opt_string_not_null, req_string,
};
use crate::users::repo::{NewUser, User};

/// Output allow-list for a user. No id, no password, no timestamps.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const CREATE_FIELDS: &[&str] = &[
    "username",
    "password",
    "email",
    "first_name",
    "last_name",
    "is_admin",
];

/// Load a registration payload. Username and email are required; the
/// password is optional (a user without one simply cannot log in).
pub fn load_new(payload: &Value) -> Result<NewUser, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, CREATE_FIELDS, &mut errors);

    let username = req_string(obj, "username", &mut errors);
    let email = req_string(obj, "email", &mut errors);
    if let Some(ref email) = email {
        if !is_valid_email(email) {
            push_field_error(&mut errors, "email", "Not a valid email.");
        }
    }
    let password = opt_string(obj, "password", &mut errors).flatten();
    let first_name = opt_string(obj, "first_name", &mut errors).flatten();
    let last_name = opt_string(obj, "last_name", &mut errors).flatten();
    let is_admin = opt_bool(obj, "is_admin", &mut errors).unwrap_or(false);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewUser {
        username: username.unwrap_or_default(),
        email: email.unwrap_or_default(),
        password,
        first_name,
        last_name,
        is_admin,
    })
}

// password and email never pass through the generic update path.
const PATCH_FIELDS: &[&str] = &["username", "first_name", "last_name", "is_admin"];

/// Password and email changes need a dedicated flow. Drop them from an
/// update payload before loading so they are ignored rather than rejected
/// as unknown fields.
pub fn strip_immutable_fields(payload: &mut Value) {
    if let Some(obj) = payload.as_object_mut() {
        obj.remove("password");
        obj.remove("email");
    }
}

#[derive(Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub is_admin: Option<bool>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
    }
}

pub fn load_patch(payload: &Value) -> Result<UserPatch, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, PATCH_FIELDS, &mut errors);

    let patch = UserPatch {
        username: opt_string_not_null(obj, "username", &mut errors),
        first_name: opt_string(obj, "first_name", &mut errors),
        last_name: opt_string(obj, "last_name", &mut errors),
        is_admin: opt_bool(obj, "is_admin", &mut errors),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_new_accepts_a_complete_payload() {
        let payload = json!({
            "username": "a",
            "email": "a@x.com",
            "password": "secret",
        });
        let new = load_new(&payload).expect("should load");
        assert_eq!(new.username, "a");
        assert_eq!(new.email, "a@x.com");
        assert_eq!(new.password.as_deref(), Some("secret"));
        assert!(!new.is_admin);
    }

    #[test]
    fn load_new_collects_field_errors() {
        let payload = json!({"email": "not-an-email", "is_admin": "yes"});
        let errors = load_new(&payload).unwrap_err();
        assert_eq!(errors["username"], vec!["Missing data for required field."]);
        assert_eq!(errors["email"], vec!["Not a valid email."]);
        assert_eq!(errors["is_admin"], vec!["Not a valid boolean."]);
    }

    #[test]
    fn load_new_rejects_unknown_fields() {
        let payload = json!({"username": "a", "email": "a@x.com", "shoe_size": 44});
        let errors = load_new(&payload).unwrap_err();
        assert_eq!(errors["shoe_size"], vec!["Unknown field."]);
    }

    #[test]
    fn patch_rejects_null_username() {
        let errors = load_patch(&json!({"username": null})).unwrap_err();
        assert_eq!(errors["username"], vec!["Field may not be null."]);
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let payload = json!({"first_name": "Ada", "last_name": null});
        let patch = load_patch(&payload).expect("should load");
        let mut user = User {
            id: 1,
            username: "a".into(),
            email: "a@x.com".into(),
            password: None,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            first_name: None,
            last_name: Some("Smith".into()),
            active: false,
            is_admin: true,
        };
        patch.apply(&mut user);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name, None);
        assert_eq!(user.username, "a");
        assert!(user.is_admin);
    }

    #[test]
    fn update_ignores_password_and_email_but_applies_other_fields() {
        let mut payload = json!({
            "password": "new-secret",
            "email": "b@x.com",
            "first_name": "Ada",
        });
        strip_immutable_fields(&mut payload);
        let patch = load_patch(&payload).expect("stripped payload should load");
        let mut user = User {
            id: 1,
            username: "a".into(),
            email: "a@x.com".into(),
            password: Some("old-hash".into()),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            first_name: None,
            last_name: None,
            active: false,
            is_admin: false,
        };
        patch.apply(&mut user);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.password.as_deref(), Some("old-hash"));
    }

    #[test]
    fn user_out_hides_password_and_id() {
        let user = User {
            id: 9,
            username: "a".into(),
            email: "a@x.com".into(),
            password: Some("hash".into()),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            first_name: None,
            last_name: None,
            active: true,
            is_admin: false,
        };
        let json = serde_json::to_value(UserOut::from(&user)).expect("serialize");
        let obj = json.as_object().expect("object");
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("id"));
        assert_eq!(obj["username"], "a");
    }

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
    }
}
