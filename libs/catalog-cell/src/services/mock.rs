//! Sample catalog served while the document store is unreachable.

use chrono::{TimeZone, Utc};

use crate::models::{Category, Product, ProductImage, ProductQuery};

fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn sample_product(id: &str, name: &str, price: f64, featured: bool, rating: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} from the sample catalog", name),
        price,
        discount_price: None,
        images: vec![ProductImage {
            url: "https://via.placeholder.com/500".to_string(),
            alt: Some(name.to_string()),
        }],
        category: "1".to_string(),
        brand: None,
        stock: 100,
        sku: Some(format!("MOCK-{}", id)),
        ratings: Vec::new(),
        average_rating: rating,
        total_reviews: 0,
        is_featured: featured,
        is_active: true,
        tags: Vec::new(),
        specifications: Vec::new(),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn mock_products() -> Vec<Product> {
    vec![
        sample_product("1", "Sample Product 1", 99.99, true, 4.5),
        sample_product("2", "Sample Product 2", 199.99, true, 4.0),
    ]
}

pub fn mock_categories() -> Vec<Category> {
    [("1", "Sample Category 1"), ("2", "Sample Category 2")]
        .into_iter()
        .enumerate()
        .map(|(i, (id, name))| Category {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(format!("{} from the sample catalog", name)),
            parent: None,
            image: Some("https://via.placeholder.com/300".to_string()),
            icon: None,
            slug: format!("sample-category-{}", id),
            sort_order: i as i32,
            is_active: true,
            created_at: epoch(),
            updated_at: epoch(),
        })
        .collect()
}

/// The matching sample product, or the first one.
pub fn mock_product(id: &str) -> Option<Product> {
    let products = mock_products();
    products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .or_else(|| products.into_iter().next())
}

pub fn mock_category(id: &str) -> Option<Category> {
    let categories = mock_categories();
    categories
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .or_else(|| categories.into_iter().next())
}

/// Applies the list filters to the sample products so the fallback honours
/// what the client asked for.
pub fn filter_mock_products(query: &ProductQuery) -> Vec<Product> {
    let search = query.search.as_deref().map(|s| s.trim().to_lowercase());

    mock_products()
        .into_iter()
        .filter(|p| query.category.as_deref().map_or(true, |c| p.category == c))
        .filter(|p| query.min_price.map_or(true, |min| p.price >= min))
        .filter(|p| query.max_price.map_or(true, |max| p.price <= max))
        .filter(|p| match &search {
            Some(term) if !term.is_empty() => {
                p.name.to_lowercase().contains(term) || p.description.to_lowercase().contains(term)
            }
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_falls_back_to_first_sample() {
        assert_eq!(mock_product("2").unwrap().id, "2");
        assert_eq!(mock_product("missing").unwrap().id, "1");
        assert_eq!(mock_category("nope").unwrap().id, "1");
    }

    #[test]
    fn filters_samples() {
        let query = ProductQuery {
            min_price: Some(150.0),
            ..Default::default()
        };
        let products = filter_mock_products(&query);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "2");
    }
}
