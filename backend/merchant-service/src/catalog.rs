//! In-memory stand-in for the product-catalog external collaborator
//! (spec §1, §6). Seeded with a handful of demo products; a real
//! deployment would swap this for a client of the admin CRUD service.

use async_trait::async_trait;
use domain_types::{api::ProductSearchItem, errors::DomainResult};
use interfaces::catalog::CatalogProvider;

#[derive(Clone)]
struct SeedProduct {
    id: &'static str,
    title: &'static str,
    price_cents: i64,
    image_url: &'static str,
    description: &'static str,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "PROD-001",
        title: "Widget",
        price_cents: 499,
        image_url: "https://example.com/images/widget.png",
        description: "A small, dependable widget.",
    },
    SeedProduct {
        id: "PROD-002",
        title: "Gadget",
        price_cents: 1999,
        image_url: "https://example.com/images/gadget.png",
        description: "A gadget for every occasion.",
    },
    SeedProduct {
        id: "PROD-003",
        title: "Gizmo",
        price_cents: 3500,
        image_url: "https://example.com/images/gizmo.png",
        description: "An ambitious gizmo.",
    },
];

pub struct InMemoryCatalog;

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn search(&self, query: Option<&str>, limit: u32) -> DomainResult<(Vec<ProductSearchItem>, u32)> {
        let needle = query.map(str::to_lowercase);
        let matches: Vec<&SeedProduct> = SEED_PRODUCTS
            .iter()
            .filter(|product| match &needle {
                Some(needle) => {
                    product.title.to_lowercase().contains(needle) || product.description.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();
        let total = u32::try_from(matches.len()).unwrap_or(u32::MAX);
        let items = matches
            .into_iter()
            .take(limit as usize)
            .map(|product| ProductSearchItem {
                id: product.id.to_string(),
                title: product.title.to_string(),
                price: product.price_cents,
                image_url: product.image_url.to_string(),
                description: product.description.to_string(),
            })
            .collect();
        Ok((items, total))
    }

    async fn sku_exists(&self, sku: &str) -> DomainResult<bool> {
        Ok(SEED_PRODUCTS.iter().any(|product| product.id == sku))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_filters_case_insensitively() {
        let catalog = InMemoryCatalog;
        let (items, total) = catalog.search(Some("GADGET"), 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items.first().unwrap().id, "PROD-002");
    }

    #[tokio::test]
    async fn sku_exists_checks_the_seed_set() {
        let catalog = InMemoryCatalog;
        assert!(catalog.sku_exists("PROD-001").await.unwrap());
        assert!(!catalog.sku_exists("PROD-999").await.unwrap());
    }
}
