//! Cache types for catalog responses.

use petsgo_core::{ProductId, VendorId};

use crate::api::types::{Category, ChatbotConfig, Product, ProductQuery, Vendor};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Vendor(VendorId),
    Vendors,
    Categories,
    ChatbotConfig,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Vendor(Box<Vendor>),
    Vendors(Vec<Vendor>),
    Categories(Vec<Category>),
    ChatbotConfig(Box<ChatbotConfig>),
}
