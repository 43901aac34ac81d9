//! API layer - request schemas and dispatch.
//!
//! Takes an operation name plus the raw query and body mappings, validates
//! them against the operation's [`RequestSchema`], maps the accepted fields
//! into a typed request and hands it to the [`ProductService`].

use crate::product::{as_int, ListQuery, NewProduct, ProductPatch};
use crate::schema::{FieldDef, FieldKind, Params, RequestSchema};
use crate::{Envelope, ProductService, Store};
use std::str::FromStr;
use thiserror::Error;

/// Name under which the product operations are exposed.
pub const SERVICE_NAME: &str = "Product";

/// Operations exposed by the product service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::List,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }

    /// HTTP method the operation is documented under.
    pub fn http_method(&self) -> &'static str {
        match self {
            Operation::Read | Operation::List => "GET",
            Operation::Create | Operation::Update | Operation::Delete => "POST",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Operation::Create => "Create a new product",
            Operation::Read => "Read a product by ID",
            Operation::Update => "Update a product",
            Operation::Delete => "Delete a product",
            Operation::List => "List all products",
        }
    }

    /// Parameters the operation validates before running.
    pub fn schema(&self) -> Option<RequestSchema> {
        match self {
            Operation::Create => Some(RequestSchema::body(vec![
                FieldDef::required("name", FieldKind::String),
                FieldDef::required("price", FieldKind::Float),
                FieldDef::optional("description", FieldKind::String),
                FieldDef::optional("category", FieldKind::String),
                FieldDef::optional("stock", FieldKind::Int),
            ])),
            Operation::Read => Some(RequestSchema::query(vec![FieldDef::required(
                "id",
                FieldKind::Int,
            )])),
            Operation::Update => Some(RequestSchema::body(vec![
                FieldDef::required("id", FieldKind::Int),
                FieldDef::optional("name", FieldKind::String),
                FieldDef::optional("description", FieldKind::String),
                FieldDef::optional("price", FieldKind::Float),
                FieldDef::optional("category", FieldKind::String),
                FieldDef::optional("stock", FieldKind::Int),
            ])),
            Operation::Delete => Some(RequestSchema::body(vec![FieldDef::required(
                "id",
                FieldKind::Int,
            )])),
            Operation::List => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation name that the service does not expose.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Method '{0}' not found in service 'Product'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    /// Method names match case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Raw parameters of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub query: Params,
    pub body: Params,
}

impl Request {
    pub fn new(query: Params, body: Params) -> Self {
        Self { query, body }
    }
}

/// Validate and run one operation.
pub fn dispatch<S: Store>(
    service: &ProductService<S>,
    operation: Operation,
    request: &Request,
) -> Envelope {
    if let Some(schema) = operation.schema() {
        let params = match operation {
            Operation::Read => &request.query,
            _ => &request.body,
        };
        if let Err(errors) = schema.validate(params) {
            return Envelope::bad_request(errors.to_string());
        }
    }

    match operation {
        Operation::Create => service.create(&NewProduct::from_params(&request.body)),
        Operation::Read => service.read(id_param(&request.query)),
        Operation::Update => service.update(&ProductPatch::from_params(&request.body)),
        Operation::Delete => service.delete(id_param(&request.body)),
        Operation::List => service.list(&ListQuery::from_params(&request.query)),
    }
}

fn id_param(params: &Params) -> i64 {
    params.get("id").and_then(as_int).unwrap_or(0)
}
