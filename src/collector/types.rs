use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Wardrobe listing page (REST)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WardrobePage {
    #[serde(default)]
    pub items: Vec<ApiItem>,
    #[serde(default)]
    pub pagination: Option<ApiPagination>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiPagination {
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One item as the marketplace returns it. Ids arrive as numbers or strings
/// and prices as plain strings or `{amount, currency_code}` objects.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_closed: Option<bool>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
}

impl ApiItem {
    pub fn id_text(&self) -> Option<String> {
        match &self.id {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Price as displayed, before any parsing.
    pub fn price_text(&self) -> Option<String> {
        match self.price.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(obj) => match obj.get("amount")? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Sold, reserved or hidden items are no longer listed.
    pub fn is_listed(&self) -> bool {
        !self.is_closed.unwrap_or(false) && !self.is_hidden.unwrap_or(false)
    }
}
