//! Products

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{ids::TypedId, money::major};

/// Product Id
pub type ProductId = TypedId<Product>;

/// A catalog item as listed for a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Stock keeping unit
    #[serde(default)]
    pub sku: String,

    /// Brand, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Selling price in minor units
    #[serde(rename = "sellingPrice", with = "major")]
    pub price: i64,

    /// Maximum retail price in minor units
    #[serde(default, with = "major")]
    pub mrp: i64,

    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Category id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl Product {
    /// Creates a product with a name and selling price; the MRP defaults to the selling price.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: String::new(),
            brand: None,
            description: None,
            price,
            mrp: price,
            image: None,
            category_id: None,
        }
    }

    /// Sets the SKU.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Sets the brand.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Returns true if the name, SKU or brand contains `needle`. `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.sku.to_lowercase().contains(needle)
            || self
                .brand
                .as_deref()
                .is_some_and(|brand| brand.to_lowercase().contains(needle))
    }
}

/// Filters products by a case-insensitive match on name, SKU or brand.
///
/// A blank term returns every product.
pub fn search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let needle = term.trim().to_lowercase();

    if needle.is_empty() {
        return products.iter().collect();
    }

    products
        .iter()
        .filter(|product| product.matches(&needle))
        .collect()
}

/// Products loaded for a store, indexed by id and SKU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: FxHashMap<ProductId, usize>,
    by_sku: FxHashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from a product listing.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut by_id = FxHashMap::default();
        let mut by_sku = FxHashMap::default();

        for (idx, product) in products.iter().enumerate() {
            by_id.insert(product.id.clone(), idx);

            if !product.sku.is_empty() {
                by_sku.insert(product.sku.to_lowercase(), idx);
            }
        }

        Self {
            products,
            by_id,
            by_sku,
        }
    }

    /// Looks up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.by_id
            .get(id)
            .and_then(|&idx| self.products.get(idx))
    }

    /// Looks up a product by SKU, ignoring case.
    #[must_use]
    pub fn by_sku(&self, sku: &str) -> Option<&Product> {
        self.by_sku
            .get(&sku.trim().to_lowercase())
            .and_then(|&idx| self.products.get(idx))
    }

    /// Looks up a product by SKU first, then by id.
    #[must_use]
    pub fn resolve(&self, code: &str) -> Option<&Product> {
        self.by_sku(code)
            .or_else(|| self.get(&ProductId::new(code.trim())))
    }

    /// Filters the catalog, see [`search`].
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        search(&self.products, term)
    }

    /// Iterate over the products in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
