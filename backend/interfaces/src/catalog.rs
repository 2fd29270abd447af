//! The merchant's product catalog (spec §1: out of scope as a standalone
//! admin CRUD surface; spec §6: backs `/ucp/products/search`).
//! Read-mostly; writes go through the admin collaborator this crate does
//! not model.

use async_trait::async_trait;
use domain_types::{api::ProductSearchItem, errors::DomainResult};

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn search(&self, query: Option<&str>, limit: u32) -> DomainResult<(Vec<ProductSearchItem>, u32)>;

    /// Whether `sku` is known, used by Create when the SKU-existence
    /// check is enabled (spec §4.1).
    async fn sku_exists(&self, sku: &str) -> DomainResult<bool>;
}
