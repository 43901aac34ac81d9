//! The product entity and the request shapes that carry it.
//!
//! Only the fields named here cross from a parameter mapping into the
//! service; anything else in the request is dropped.

use crate::schema::{as_number, Params};
use crate::store::FindQuery;
use crate::{Fields, Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Collection holding products.
pub const COLLECTION: &str = "products";

/// A product as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub created_at: String,
}

impl Product {
    /// Build from a stored record, defaulting anything missing.
    pub fn from_record(record: &Record) -> Self {
        let text = |field: &str| {
            record
                .fields
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: record.id,
            name: text("name"),
            description: text("description"),
            price: record.fields.get("price").and_then(as_number).unwrap_or(0.0),
            category: text("category"),
            stock: record.fields.get("stock").and_then(as_int).unwrap_or(0),
            created_at: record.created_at.clone(),
        }
    }

    /// Storable fields, without `id` and `created_at`.
    pub fn to_fields(&self) -> Fields {
        product_fields(
            &self.name,
            &self.description,
            self.price,
            &self.category,
            self.stock,
        )
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price": self.price,
            "category": self.category,
            "stock": self.stock,
            "created_at": self.created_at,
        })
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
}

impl NewProduct {
    pub fn from_params(params: &Params) -> Self {
        Self {
            name: text_param(params, "name").unwrap_or_default(),
            description: text_param(params, "description").unwrap_or_default(),
            price: number_param(params, "price").unwrap_or(0.0),
            category: text_param(params, "category").unwrap_or_default(),
            stock: int_param(params, "stock").unwrap_or(0),
        }
    }

    pub fn to_fields(&self) -> Fields {
        product_fields(
            &self.name,
            &self.description,
            self.price,
            &self.category,
            self.stock,
        )
    }
}

/// Body of an update request. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn from_params(params: &Params) -> Self {
        Self {
            id: int_param(params, "id").unwrap_or(0),
            name: text_param(params, "name"),
            description: text_param(params, "description"),
            price: number_param(params, "price"),
            category: text_param(params, "category"),
            stock: int_param(params, "stock"),
        }
    }

    /// Overlay the supplied fields onto `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Query of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub category: Option<String>,
    pub sort_by: Option<String>,
    /// `field=value`, matched as a case-insensitive substring
    pub find_like: Option<String>,
}

impl ListQuery {
    pub fn from_params(params: &Params) -> Self {
        Self {
            category: text_param(params, "category"),
            sort_by: text_param(params, "sort_by"),
            find_like: text_param(params, "find_like"),
        }
    }

    /// Translate into a store query.
    ///
    /// A `find_like` without exactly one `=` is ignored.
    pub fn to_find_query(&self) -> FindQuery {
        let mut query = FindQuery::new();

        if let Some(category) = &self.category {
            query = query.filter("category", category.as_str());
        }

        if let Some(find_like) = &self.find_like {
            let parts: Vec<&str> = find_like.split('=').collect();
            if let [field, fragment] = parts.as_slice() {
                query = query.contains(*field, fragment);
            }
        }

        if let Some(sort_by) = &self.sort_by {
            query = query.sort_by(sort_by.as_str());
        }

        query
    }
}

fn product_fields(
    name: &str,
    description: &str,
    price: f64,
    category: &str,
    stock: i64,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), json!(name));
    fields.insert("description".into(), json!(description));
    fields.insert("price".into(), json!(price));
    fields.insert("category".into(), json!(category));
    fields.insert("stock".into(), json!(stock));
    fields
}

fn text_param(params: &Params, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn number_param(params: &Params, key: &str) -> Option<f64> {
    params.get(key).and_then(as_number)
}

fn int_param(params: &Params, key: &str) -> Option<i64> {
    params.get(key).and_then(as_int)
}

/// Numeric-looking value truncated toward zero.
pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        other => as_number(other).map(|n| n.trunc() as i64),
    }
}

/// The catalogue a fresh server starts with.
pub fn sample_products() -> Vec<Record> {
    let created_at = "2024-11-24T07:00:00Z";
    [
        (
            1,
            "Laptop",
            "High-performance laptop for developers",
            999.99,
            "Electronics",
            50,
        ),
        (
            2,
            "Wireless Mouse",
            "Ergonomic wireless mouse",
            29.99,
            "Electronics",
            100,
        ),
        (
            3,
            "USB-C Cable",
            "High-speed USB-C cable",
            15.99,
            "Accessories",
            200,
        ),
    ]
    .into_iter()
    .map(|(id, name, description, price, category, stock)| {
        let product = Product {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: category.to_string(),
            stock,
            created_at: created_at.to_string(),
        };
        Record::new(id, created_at, product.to_fields())
    })
    .collect()
}
