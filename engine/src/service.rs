//! Product service - business rules over a [`Store`].
//!
//! Each operation runs validate → act → respond and always produces an
//! [`Envelope`]. Backend failures become 500 envelopes; nothing here
//! returns an error to the caller.

use crate::locks::RecordLocks;
use crate::product::{ListQuery, NewProduct, Product, ProductPatch, COLLECTION};
use crate::{error::Result, Envelope, Error, RecordId, Store};
use serde_json::{json, Value};
use std::sync::Arc;

/// Service message used for backend failures outside debug mode.
pub const GENERIC_FAILURE: &str = "An error occurred";

/// A business rule the request broke.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Invalid product ID")]
    InvalidId,

    #[error("Product name is required")]
    MissingName,

    #[error("Product price must be greater than 0")]
    NonPositivePrice,

    #[error("Product stock cannot be negative")]
    NegativeStock,
}

impl RuleViolation {
    pub fn to_envelope(self) -> Envelope {
        match self {
            RuleViolation::InvalidId | RuleViolation::MissingName => {
                Envelope::bad_request(self.to_string())
            }
            RuleViolation::NonPositivePrice | RuleViolation::NegativeStock => {
                Envelope::unprocessable(self.to_string())
            }
        }
    }
}

fn check_id(id: i64) -> std::result::Result<RecordId, RuleViolation> {
    RecordId::try_from(id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or(RuleViolation::InvalidId)
}

fn check_price_and_stock(price: f64, stock: i64) -> std::result::Result<(), RuleViolation> {
    // Non-finite prices cannot be stored, so they fail here too.
    if !(price.is_finite() && price > 0.0) {
        return Err(RuleViolation::NonPositivePrice);
    }
    if stock < 0 {
        return Err(RuleViolation::NegativeStock);
    }
    Ok(())
}

fn not_found() -> Envelope {
    Envelope::not_found("Product not found")
}

/// Business operations on products.
#[derive(Debug)]
pub struct ProductService<S> {
    store: Arc<S>,
    locks: RecordLocks,
    debug: bool,
}

impl<S: Store> ProductService<S> {
    /// Create a service over `store`. Debug mode is off.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: RecordLocks::new(),
            debug: false,
        }
    }

    /// In debug mode a 500 carries the backend's own error text.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn create(&self, new: &NewProduct) -> Envelope {
        if new.name.is_empty() {
            return RuleViolation::MissingName.to_envelope();
        }
        if let Err(violation) = check_price_and_stock(new.price, new.stock) {
            return violation.to_envelope();
        }

        self.respond(|| {
            let id = self.store.insert(COLLECTION, new.to_fields())?;
            let data = self.product_value(id)?;
            Ok(Envelope::created("Product created successfully", data))
        })
    }

    pub fn read(&self, id: i64) -> Envelope {
        let id = match check_id(id) {
            Ok(id) => id,
            Err(violation) => return violation.to_envelope(),
        };

        self.respond(|| match self.store.find_by_id(COLLECTION, id)? {
            Some(record) => Ok(Envelope::ok(
                1,
                "Product retrieved successfully",
                Product::from_record(&record).to_value(),
            )),
            None => Ok(not_found()),
        })
    }

    pub fn update(&self, patch: &ProductPatch) -> Envelope {
        let id = match check_id(patch.id) {
            Ok(id) => id,
            Err(violation) => return violation.to_envelope(),
        };

        self.locks.with_lock(id, || {
            self.respond(|| {
                let Some(existing) = self.store.find_by_id(COLLECTION, id)? else {
                    return Ok(not_found());
                };

                let mut product = Product::from_record(&existing);
                patch.apply_to(&mut product);
                if let Err(violation) = check_price_and_stock(product.price, product.stock) {
                    return Ok(violation.to_envelope());
                }

                if !self.store.update(COLLECTION, id, product.to_fields())? {
                    return Ok(not_found());
                }
                let data = self.product_value(id)?;
                Ok(Envelope::updated("Product updated successfully", data))
            })
        })
    }

    pub fn delete(&self, id: i64) -> Envelope {
        let id = match check_id(id) {
            Ok(id) => id,
            Err(violation) => return violation.to_envelope(),
        };

        self.locks.with_lock(id, || {
            self.respond(|| {
                if self.store.find_by_id(COLLECTION, id)?.is_none() {
                    return Ok(not_found());
                }
                if !self.store.delete(COLLECTION, id)? {
                    return Ok(not_found());
                }
                Ok(Envelope::deleted(
                    "Product deleted successfully",
                    json!({ "deleted_id": id }),
                ))
            })
        })
    }

    pub fn list(&self, query: &ListQuery) -> Envelope {
        self.respond(|| {
            let records = self.store.find_all(COLLECTION, &query.to_find_query())?;
            let data: Vec<Value> = records
                .iter()
                .map(|record| Product::from_record(record).to_value())
                .collect();
            Ok(Envelope::ok(
                data.len(),
                "Products retrieved successfully",
                Value::Array(data),
            ))
        })
    }

    fn product_value(&self, id: RecordId) -> Result<Value> {
        Ok(self
            .store
            .find_by_id(COLLECTION, id)?
            .map(|record| Product::from_record(&record).to_value())
            .unwrap_or(Value::Null))
    }

    fn respond(&self, action: impl FnOnce() -> Result<Envelope>) -> Envelope {
        action().unwrap_or_else(|e| self.failure(&e))
    }

    fn failure(&self, error: &Error) -> Envelope {
        if self.debug {
            Envelope::internal(error.to_string())
        } else {
            Envelope::internal(GENERIC_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::sample_products;
    use crate::{FindQuery, Fields, MemoryStore, Record};

    fn test_service() -> ProductService<MemoryStore> {
        ProductService::new(Arc::new(MemoryStore::seeded(COLLECTION, sample_products())))
    }

    fn new_product(name: &str, price: f64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: String::new(),
            price,
            category: String::new(),
            stock,
        }
    }

    /// Backend whose every call fails.
    struct BrokenStore;

    impl Store for BrokenStore {
        fn insert(&self, _: &str, _: Fields) -> Result<RecordId> {
            Err(Error::Storage("connection refused".into()))
        }
        fn update(&self, _: &str, _: RecordId, _: Fields) -> Result<bool> {
            Err(Error::Storage("connection refused".into()))
        }
        fn delete(&self, _: &str, _: RecordId) -> Result<bool> {
            Err(Error::Storage("connection refused".into()))
        }
        fn find_by_id(&self, _: &str, _: RecordId) -> Result<Option<Record>> {
            Err(Error::Storage("connection refused".into()))
        }
        fn find_all(&self, _: &str, _: &FindQuery) -> Result<Vec<Record>> {
            Err(Error::Storage("connection refused".into()))
        }
    }

    #[test]
    fn create_assigns_id_and_timestamp() {
        let service = test_service();
        let envelope = service.create(&new_product("Keyboard", 149.99, 30));

        assert_eq!(envelope.response_code, 201);
        assert_eq!(envelope.message, "created");
        assert_eq!(envelope.count, 1);
        assert_eq!(envelope.data["id"], 4);
        assert_eq!(envelope.data["name"], "Keyboard");
        assert!(!envelope.data["created_at"].as_str().unwrap().is_empty());
    }

    #[test]
    fn create_rule_order() {
        let service = test_service();

        let envelope = service.create(&new_product("", -1.0, -1));
        assert_eq!(envelope.response_code, 400);
        assert_eq!(envelope.service_message, "Product name is required");

        let envelope = service.create(&new_product("x", 0.0, -1));
        assert_eq!(envelope.response_code, 422);
        assert_eq!(envelope.service_message, "Product price must be greater than 0");

        let envelope = service.create(&new_product("x", 1.0, -1));
        assert_eq!(envelope.response_code, 422);
        assert_eq!(envelope.service_message, "Product stock cannot be negative");

        assert_eq!(service.store().count(COLLECTION).unwrap(), 3);
    }

    #[test]
    fn read_checks_id_then_existence() {
        let service = test_service();

        assert_eq!(service.read(0).response_code, 400);
        assert_eq!(service.read(-4).response_code, 400);
        assert_eq!(service.read(42).response_code, 404);

        let envelope = service.read(2);
        assert_eq!(envelope.response_code, 200);
        assert_eq!(envelope.data["name"], "Wireless Mouse");
    }

    #[test]
    fn update_merges_supplied_fields() {
        let service = test_service();
        let before = service.read(1).data;

        let envelope = service.update(&ProductPatch {
            id: 1,
            stock: Some(45),
            ..Default::default()
        });

        assert_eq!(envelope.response_code, 209);
        assert_eq!(envelope.message, "updated");
        assert_eq!(envelope.data["stock"], 45);
        assert_eq!(envelope.data["name"], before["name"]);
        assert_eq!(envelope.data["price"], before["price"]);
        assert_eq!(envelope.data["created_at"], before["created_at"]);
    }

    #[test]
    fn update_rule_order() {
        let service = test_service();

        let bad_id = ProductPatch {
            id: 0,
            price: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(service.update(&bad_id).response_code, 400);

        let missing = ProductPatch {
            id: 99,
            price: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(service.update(&missing).response_code, 404);

        let bad_price = ProductPatch {
            id: 1,
            price: Some(0.0),
            stock: Some(-1),
            ..Default::default()
        };
        let envelope = service.update(&bad_price);
        assert_eq!(envelope.response_code, 422);
        assert_eq!(envelope.service_message, "Product price must be greater than 0");

        // Rejected update leaves the record alone
        assert_eq!(service.read(1).data["price"], 999.99);
    }

    #[test]
    fn infinite_price_breaks_the_price_rule() {
        let service = test_service();

        let envelope = service.create(&new_product("Moon", f64::INFINITY, 1));
        assert_eq!(envelope.response_code, 422);

        let envelope = service.update(&ProductPatch {
            id: 1,
            price: Some(f64::INFINITY),
            ..Default::default()
        });
        assert_eq!(envelope.response_code, 422);
        assert_eq!(service.read(1).data["price"], 999.99);
        assert_eq!(service.store().count(COLLECTION).unwrap(), 3);
    }

    #[test]
    fn lock_entries_do_not_outlive_requests() {
        let service = test_service();

        for id in 100..1_100 {
            assert_eq!(service.delete(id).response_code, 404);
            let patch = ProductPatch {
                id,
                stock: Some(1),
                ..Default::default()
            };
            assert_eq!(service.update(&patch).response_code, 404);
        }
        let patch = ProductPatch {
            id: 1,
            stock: Some(2),
            ..Default::default()
        };
        assert_eq!(service.update(&patch).response_code, 209);
        assert_eq!(service.delete(1).response_code, 210);

        assert!(service.locks.is_empty());
    }

    #[test]
    fn delete_then_read_is_not_found() {
        let service = test_service();

        let envelope = service.delete(2);
        assert_eq!(envelope.response_code, 210);
        assert_eq!(envelope.message, "deleted");
        assert_eq!(envelope.data, json!({"deleted_id": 2}));

        assert_eq!(service.read(2).response_code, 404);
        assert_eq!(service.delete(2).response_code, 404);
        assert_eq!(service.delete(0).response_code, 400);
    }

    #[test]
    fn list_counts_results() {
        let service = test_service();

        let envelope = service.list(&ListQuery {
            category: Some("Electronics".into()),
            ..Default::default()
        });
        assert_eq!(envelope.response_code, 200);
        assert_eq!(envelope.count, 2);
        assert_eq!(envelope.data.as_array().unwrap().len(), 2);
    }

    #[test]
    fn backend_failure_is_generic_outside_debug() {
        let service = ProductService::new(Arc::new(BrokenStore));

        for envelope in [
            service.create(&new_product("x", 1.0, 0)),
            service.read(1),
            service.update(&ProductPatch {
                id: 1,
                ..Default::default()
            }),
            service.delete(1),
            service.list(&ListQuery::default()),
        ] {
            assert_eq!(envelope.response_code, 500);
            assert_eq!(envelope.message, "Internal Server Error");
            assert_eq!(envelope.service_message, GENERIC_FAILURE);
        }
    }

    #[test]
    fn backend_failure_detail_in_debug() {
        let service = ProductService::new(Arc::new(BrokenStore)).with_debug(true);
        let envelope = service.read(1);

        assert_eq!(envelope.response_code, 500);
        assert_eq!(envelope.service_message, "storage failure: connection refused");
    }

    #[test]
    fn business_rules_run_before_backend() {
        let service = ProductService::new(Arc::new(BrokenStore));
        assert_eq!(service.create(&new_product("x", 0.0, 0)).response_code, 422);
        assert_eq!(service.read(0).response_code, 400);
    }
}
