use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::FieldErrors;
use crate::expenses::repo::{Expense, NewExpense};
use crate::schema::{
    as_object, check_unknown, opt_int, opt_int_not_null, opt_string_not_null, req_string,
};

/// Output allow-list for an expense line item.
#[derive(Debug, Serialize)]
pub struct ExpenseOut {
    pub id: i32,
    pub period_id: Option<i32>,
    pub name: String,
    pub budgeted_price: i32,
    pub actual_price: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_last_updated: Option<OffsetDateTime>,
    pub status: String,
    pub priority: String,
    pub note: String,
    pub user_id: Option<i32>,
}

impl From<&Expense> for ExpenseOut {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            period_id: expense.period_id,
            name: expense.name.clone(),
            budgeted_price: expense.budgeted_price,
            actual_price: expense.actual_price,
            date_created: expense.date_created,
            date_last_updated: expense.date_last_updated,
            status: expense.status.clone(),
            priority: expense.priority.clone(),
            note: expense.note.clone(),
            user_id: expense.user_id,
        }
    }
}

// user_id comes from the bearer token; timestamps are server-assigned.
const FIELDS: &[&str] = &[
    "name",
    "note",
    "budgeted_price",
    "actual_price",
    "status",
    "priority",
    "period_id",
];

pub fn load_new(payload: &Value) -> Result<NewExpense, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, FIELDS, &mut errors);

    let name = req_string(obj, "name", &mut errors);
    let note = req_string(obj, "note", &mut errors);
    let budgeted_price = opt_int_not_null(obj, "budgeted_price", &mut errors);
    let actual_price = opt_int(obj, "actual_price", &mut errors).flatten();
    let status = opt_string_not_null(obj, "status", &mut errors);
    let priority = opt_string_not_null(obj, "priority", &mut errors);
    let period_id = opt_int(obj, "period_id", &mut errors).flatten();

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewExpense {
        name: name.unwrap_or_default(),
        note: note.unwrap_or_default(),
        budgeted_price: budgeted_price.unwrap_or(0),
        actual_price,
        status: status.unwrap_or_else(|| "open".into()),
        priority: priority.unwrap_or_else(|| "normal".into()),
        period_id,
    })
}

#[derive(Debug, Default)]
pub struct ExpensePatch {
    pub name: Option<String>,
    pub note: Option<String>,
    pub budgeted_price: Option<i32>,
    pub actual_price: Option<Option<i32>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub period_id: Option<Option<i32>>,
}

impl ExpensePatch {
    pub fn apply(self, expense: &mut Expense) {
        if let Some(name) = self.name {
            expense.name = name;
        }
        if let Some(note) = self.note {
            expense.note = note;
        }
        if let Some(budgeted_price) = self.budgeted_price {
            expense.budgeted_price = budgeted_price;
        }
        if let Some(actual_price) = self.actual_price {
            expense.actual_price = actual_price;
        }
        if let Some(status) = self.status {
            expense.status = status;
        }
        if let Some(priority) = self.priority {
            expense.priority = priority;
        }
        if let Some(period_id) = self.period_id {
            expense.period_id = period_id;
        }
    }
}

pub fn load_patch(payload: &Value) -> Result<ExpensePatch, FieldErrors> {
    let obj = as_object(payload)?;
    let mut errors = FieldErrors::new();
    check_unknown(obj, FIELDS, &mut errors);

    let patch = ExpensePatch {
        name: opt_string_not_null(obj, "name", &mut errors),
        note: opt_string_not_null(obj, "note", &mut errors),
        budgeted_price: opt_int_not_null(obj, "budgeted_price", &mut errors),
        actual_price: opt_int(obj, "actual_price", &mut errors),
        status: opt_string_not_null(obj, "status", &mut errors),
        priority: opt_string_not_null(obj, "priority", &mut errors),
        period_id: opt_int(obj, "period_id", &mut errors),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}
