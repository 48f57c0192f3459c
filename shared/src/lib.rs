use serde::{Deserialize, Deserializer, Serialize};
use chrono::NaiveDate;

/// Name of the category the server uses to file goal contributions under.
///
/// The category must exist while the user has at least one goal and is
/// removed once the last goal is gone.
pub const GOALS_CATEGORY_NAME: &str = "goals";

/// A savings goal as returned by `GET /goals/`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Goal {
    /// Server-assigned identifier, absent until persisted
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub goal_name: String,
    #[serde(default)]
    pub goal_description: String,
    /// Target amount
    #[serde(default, deserialize_with = "de::optional_amount")]
    pub goal_amount: Option<f64>,
    /// Amount saved so far (not bounded by `goal_amount`)
    #[serde(default, deserialize_with = "de::optional_amount")]
    pub amount_raised: Option<f64>,
    /// Image reference: a relative upload path on the wire, an absolute URL
    /// once resolved by the client
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub goal_image: Option<String>,
    /// Target date (ISO-8601)
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub goal_date: Option<String>,
}

impl Goal {
    /// Fraction of the target raised so far, clamped to `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        match (self.goal_amount, self.amount_raised) {
            (Some(target), Some(raised)) if target > 0.0 => (raised / target).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Amount still missing to reach the target
    pub fn remaining(&self) -> f64 {
        let target = self.goal_amount.unwrap_or(0.0);
        let raised = self.amount_raised.unwrap_or(0.0);
        (target - raised).max(0.0)
    }

    /// Target date without the time component, if it parses
    pub fn target_date(&self) -> Option<NaiveDate> {
        let raw = self.goal_date.as_deref()?;
        let date_part = raw.split('T').next()?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// A spending category as returned by `GET /categories/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub category_name: String,
    /// Optional monthly budget cap
    #[serde(default, deserialize_with = "de::optional_amount")]
    pub max_amount: Option<f64>,
}

impl Category {
    /// Whether this is the category backing the goals feature
    pub fn is_goals_sentinel(&self) -> bool {
        self.category_name == GOALS_CATEGORY_NAME
    }
}

/// Body of `POST /categories/add`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategoryRequest {
    pub user_id: String,
    pub category_name: String,
    /// Serialized as `null` when there is no cap
    pub max_amount: Option<f64>,
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A transaction as returned by `GET /transactions/`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub transaction_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub transaction_amount: f64,
    /// Due date (`YYYY-MM-DD`)
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

/// Body of `POST /transactions/add` and `PUT /transactions/edit/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub transaction_name: String,
    pub category_name: String,
    pub transaction_amount: f64,
    pub expiration_date: Option<String>,
    pub paid: bool,
}

/// Input captured by the add/edit transaction form
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub transaction_type: TransactionType,
    pub transaction_name: String,
    pub category_name: String,
    /// Raw amount text as typed
    pub transaction_amount: String,
    /// Raw date text as typed (`YYYY-MM-DD`), empty for none
    pub expiration_date: String,
    pub paid: bool,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            transaction_name: String::new(),
            category_name: String::new(),
            transaction_amount: "0".to_string(),
            expiration_date: String::new(),
            paid: false,
        }
    }
}

impl From<&Transaction> for TransactionForm {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_type: tx.transaction_type,
            transaction_name: tx.transaction_name.clone(),
            category_name: tx.category_name.clone(),
            transaction_amount: tx.transaction_amount.to_string(),
            expiration_date: tx.expiration_date.clone().unwrap_or_default(),
            paid: tx.paid,
        }
    }
}

/// Validation result for transaction form input
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionValidation {
    pub errors: Vec<ValidationError>,
    pub cleaned_amount: Option<f64>,
    pub cleaned_date: Option<NaiveDate>,
}

impl TransactionValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Specific validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyName,
    MissingAmount,
    InvalidAmount(String),
    NegativeAmount,
    InvalidDate(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "title is required"),
            ValidationError::MissingAmount => write!(f, "amount is required"),
            ValidationError::InvalidAmount(raw) => write!(f, "'{}' is not a valid amount", raw),
            ValidationError::NegativeAmount => write!(f, "amount cannot be negative"),
            ValidationError::InvalidDate(raw) => write!(f, "'{}' is not a valid date", raw),
        }
    }
}

impl TransactionForm {
    /// Check the form the same way the add/edit modal does before submitting
    pub fn validate(&self) -> TransactionValidation {
        let mut errors = Vec::new();

        if self.transaction_name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        }

        let raw_amount = self.transaction_amount.trim();
        let cleaned_amount = if raw_amount.is_empty() {
            errors.push(ValidationError::MissingAmount);
            None
        } else {
            match raw_amount.parse::<f64>() {
                Ok(value) if !value.is_finite() => {
                    errors.push(ValidationError::InvalidAmount(raw_amount.to_string()));
                    None
                }
                Ok(value) if value < 0.0 => {
                    errors.push(ValidationError::NegativeAmount);
                    None
                }
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(ValidationError::InvalidAmount(raw_amount.to_string()));
                    None
                }
            }
        };

        let raw_date = self.expiration_date.trim();
        let cleaned_date = if raw_date.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(ValidationError::InvalidDate(raw_date.to_string()));
                    None
                }
            }
        };

        TransactionValidation {
            errors,
            cleaned_amount,
            cleaned_date,
        }
    }

    /// Build the request body for a validated form
    pub fn to_request(&self, user_id: &str) -> Result<TransactionRequest, Vec<ValidationError>> {
        let validation = self.validate();
        if !validation.is_valid() {
            return Err(validation.errors);
        }

        Ok(TransactionRequest {
            user_id: user_id.to_string(),
            transaction_type: self.transaction_type,
            transaction_name: self.transaction_name.trim().to_string(),
            category_name: self.category_name.trim().to_string(),
            transaction_amount: validation.cleaned_amount.unwrap_or(0.0),
            expiration_date: validation
                .cleaned_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            paid: self.paid,
        })
    }
}

/// Lenient deserializers for fields the server is inconsistent about
mod de {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<NumberOrString>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(NumberOrString::Number(n)) => Ok(Some(n)),
            Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(NumberOrString::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }

    pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional_amount(deserializer).map(|amount| amount.unwrap_or(0.0))
    }

    pub fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.trim().is_empty()))
    }
}
