use serde::Serialize;
use serde_json::Value;

use crate::error::{push_field_error, FieldErrors};
use crate::periods::repo::Period;
use crate::schema::{as_object, check_unknown, opt_int_not_null, req_int};

const MONTH_RANGE: &str = "Month must be between 1 and 12.";

/// Output allow-list for a period, including the derived read-only month
/// names.
#[derive(Debug, Serialize)]
pub struct PeriodOut {
    pub id: i32,
    pub month: i32,
    pub year: i32,
    pub user_id: Option<i32>,
    pub name: &'static str,
    pub short_name: &'static str,
}

impl From<&Period> for PeriodOut {
    fn from(period: &Period) -> Self {
        Self {
            id: period.id,
            month: period.month,
            year: period.year,
            user_id: period.user_id,
            name: period.month_name().unwrap_or(""),
            short_name: period.month_abbr().unwrap_or(""),
        }
    }
}

// The owner comes from the bearer token, never from the payload.
const FIELDS: &[&str] = &["month", "year"];

#[derive(Debug)]
pub struct NewPeriod {
    pub month: i32,
    pub year: i32,
}

pub fn load_new(payload: &Value) -> Result<NewPeriod, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, FIELDS, &mut errors);

    let month = req_int(obj, "month", &mut errors);
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            push_field_error(&mut errors, "month", MONTH_RANGE);
        }
    }
    let year = req_int(obj, "year", &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewPeriod {
        month: month.unwrap_or_default(),
        year: year.unwrap_or_default(),
    })
}

#[derive(Debug, Default)]
pub struct PeriodPatch {
    pub month: Option<i32>,
    pub year: Option<i32>,
}

impl PeriodPatch {
    pub fn apply(self, period: &mut Period) {
        if let Some(month) = self.month {
            period.month = month;
        }
        if let Some(year) = self.year {
            period.year = year;
        }
    }
}

pub fn load_patch(payload: &Value) -> Result<PeriodPatch, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, FIELDS, &mut errors);

    let month = opt_int_not_null(obj, "month", &mut errors);
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            push_field_error(&mut errors, "month", MONTH_RANGE);
        }
    }
    let year = opt_int_not_null(obj, "year", &mut errors);

    if errors.is_empty() {
        Ok(PeriodPatch { month, year })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_new_accepts_a_valid_month() {
        let new = load_new(&json!({"month": 4, "year": 2026})).expect("should load");
        assert_eq!(new.month, 4);
        assert_eq!(new.year, 2026);
    }

    #[test]
    fn month_thirteen_is_rejected() {
        let errors = load_new(&json!({"month": 13, "year": 2026})).unwrap_err();
        assert_eq!(errors["month"], vec![MONTH_RANGE]);
    }

    #[test]
    fn month_zero_is_rejected() {
        let errors = load_new(&json!({"month": 0, "year": 2026})).unwrap_err();
        assert_eq!(errors["month"], vec![MONTH_RANGE]);
    }

    #[test]
    fn owner_cannot_be_smuggled_into_the_payload() {
        let errors = load_new(&json!({"month": 4, "year": 2026, "user_id": 9})).unwrap_err();
        assert_eq!(errors["user_id"], vec!["Unknown field."]);
    }

    #[test]
    fn patch_validates_month_when_present() {
        assert!(load_patch(&json!({"year": 2027})).is_ok());
        let errors = load_patch(&json!({"month": 99})).unwrap_err();
        assert_eq!(errors["month"], vec![MONTH_RANGE]);
    }

    #[test]
    fn patch_rejects_null_month_and_year() {
        let errors = load_patch(&json!({"month": null, "year": null})).unwrap_err();
        assert_eq!(errors["month"], vec!["Field may not be null."]);
        assert_eq!(errors["year"], vec!["Field may not be null."]);
    }

    #[test]
    fn period_out_carries_derived_month_names() {
        let period = Period {
            id: 3,
            month: 2,
            year: 2026,
            user_id: Some(1),
        };
        let json = serde_json::to_value(PeriodOut::from(&period)).expect("serialize");
        assert_eq!(json["name"], "February");
        assert_eq!(json["short_name"], "Feb");
        assert_eq!(json["id"], 3);
    }
}
