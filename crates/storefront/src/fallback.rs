//! Built-in demo catalogue.
//!
//! Rendered when the backend cannot serve catalog reads, so the storefront
//! still shows something browsable. Pages using it display a notice.

use petsgo_core::{CategoryId, Price, ProductId, VendorId};

use crate::api::{Category, Product, ProductQuery, Vendor};

fn category(id: i64, name: &str, slug: &str, emoji: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_string(),
        slug: slug.to_string(),
        emoji: Some(emoji.to_string()),
    }
}

fn vendor(id: i64, store_name: &str, description: &str, address: &str) -> Vendor {
    Vendor {
        id: VendorId::new(id),
        store_name: store_name.to_string(),
        description: Some(description.to_string()),
        logo_url: None,
        address: Some(address.to_string()),
        phone: None,
        email: None,
        status: Some("active".to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: i64,
    name: &str,
    description: &str,
    pesos: i64,
    stock: u32,
    category: &str,
    vendor_id: i64,
    vendor_name: &str,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: Some(description.to_string()),
        price: Price::from_pesos(pesos),
        stock: Some(stock),
        image_url: None,
        category: Some(category.to_string()),
        vendor_id: Some(VendorId::new(vendor_id)),
        vendor_name: Some(vendor_name.to_string()),
    }
}

/// Demo categories.
#[must_use]
pub fn categories() -> Vec<Category> {
    vec![
        category(1, "Perros", "perros", "🐶"),
        category(2, "Gatos", "gatos", "🐱"),
        category(3, "Aves", "aves", "🐦"),
        category(4, "Peces", "peces", "🐟"),
        category(5, "Accesorios", "accesorios", "🦴"),
    ]
}

/// Demo stores.
#[must_use]
pub fn vendors() -> Vec<Vendor> {
    vec![
        vendor(
            1,
            "Patitas Felices",
            "Alimentos y snacks para perros y gatos.",
            "Av. Providencia 1234, Santiago",
        ),
        vendor(
            2,
            "Mundo Mascota",
            "Accesorios, juguetes y camas para tu regalón.",
            "Los Leones 456, Providencia",
        ),
        vendor(
            3,
            "Acuario Austral",
            "Todo para peces y aves.",
            "Irarrázaval 789, Ñuñoa",
        ),
    ]
}

/// Demo products.
#[must_use]
pub fn products() -> Vec<Product> {
    vec![
        product(
            1,
            "Alimento Perro Adulto 15 kg",
            "Croquetas balanceadas para perros adultos de todas las razas.",
            32_990,
            25,
            "perros",
            1,
            "Patitas Felices",
        ),
        product(
            2,
            "Alimento Gato Indoor 7,5 kg",
            "Fórmula para gatos de interior con control de bolas de pelo.",
            24_990,
            18,
            "gatos",
            1,
            "Patitas Felices",
        ),
        product(
            3,
            "Snack Dental Perro x10",
            "Barritas dentales que ayudan a reducir el sarro.",
            5_490,
            60,
            "perros",
            1,
            "Patitas Felices",
        ),
        product(
            4,
            "Cama Ortopédica Mediana",
            "Espuma viscoelástica con funda lavable.",
            39_990,
            7,
            "accesorios",
            2,
            "Mundo Mascota",
        ),
        product(
            5,
            "Rascador Torre 90 cm",
            "Tres niveles con cuerda de sisal y cueva.",
            29_990,
            5,
            "gatos",
            2,
            "Mundo Mascota",
        ),
        product(
            6,
            "Collar Reflectante",
            "Ajustable, con hebilla de seguridad.",
            6_990,
            40,
            "accesorios",
            2,
            "Mundo Mascota",
        ),
        product(
            7,
            "Alpiste Premium 1 kg",
            "Mezcla de semillas para canarios y periquitos.",
            3_290,
            30,
            "aves",
            3,
            "Acuario Austral",
        ),
        product(
            8,
            "Filtro Acuario 60 L",
            "Filtro interno silencioso de tres etapas.",
            18_990,
            0,
            "peces",
            3,
            "Acuario Austral",
        ),
    ]
}

/// Demo products matching `query`, filtered the way the backend would.
#[must_use]
pub fn search(query: &ProductQuery) -> Vec<Product> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    products()
        .into_iter()
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|c| p.category.as_deref() == Some(c))
        })
        .filter(|p| query.vendor_id.is_none_or(|v| p.vendor_id == Some(v)))
        .filter(|p| {
            search.as_deref().is_none_or(|s| {
                p.name.to_lowercase().contains(s)
                    || p
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(s))
            })
        })
        .collect()
}

/// One demo product.
#[must_use]
pub fn product_by_id(id: ProductId) -> Option<Product> {
    products().into_iter().find(|p| p.id == id)
}

/// One demo store.
#[must_use]
pub fn vendor_by_id(id: VendorId) -> Option<Vendor> {
    vendors().into_iter().find(|v| v.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_product_belongs_to_a_demo_vendor() {
        let vendors = vendors();
        for p in products() {
            assert!(
                vendors.iter().any(|v| Some(v.id) == p.vendor_id),
                "{} has no vendor",
                p.name
            );
        }
    }

    #[test]
    fn test_search_filters_by_category_and_text() {
        let query = ProductQuery {
            category: Some("perros".to_string()),
            search: Some("  SNACK ".to_string()),
            ..ProductQuery::default()
        };
        let found = search(&query);
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|p| p.id), Some(ProductId::new(3)));
    }

    #[test]
    fn test_search_by_vendor() {
        let found = search(&ProductQuery::for_vendor(VendorId::new(3)));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_lookup_by_id() {
        assert!(product_by_id(ProductId::new(8)).is_some_and(|p| p.is_out_of_stock()));
        assert!(vendor_by_id(VendorId::new(99)).is_none());
    }
}
