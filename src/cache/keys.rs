//! Cache key definitions.

/// A catalog read operation together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Categories,
    Products,
    ProductsByCategory(String),
    ProductBySlug(String),
    /// Keyed by the trimmed search term.
    Search(String),
    Settings,
}

/// Groups of keys invalidated together after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Categories,
    Products,
    Settings,
}

impl QueryKey {
    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKey::Categories => QueryFamily::Categories,
            QueryKey::Products
            | QueryKey::ProductsByCategory(_)
            | QueryKey::ProductBySlug(_)
            | QueryKey::Search(_) => QueryFamily::Products,
            QueryKey::Settings => QueryFamily::Settings,
        }
    }

    /// Operation name used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            QueryKey::Categories => "list_categories",
            QueryKey::Products => "list_products",
            QueryKey::ProductsByCategory(_) => "list_products_by_category",
            QueryKey::ProductBySlug(_) => "find_product_by_slug",
            QueryKey::Search(_) => "search_products",
            QueryKey::Settings => "load_settings",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_reads_share_a_family() {
        for key in [
            QueryKey::Products,
            QueryKey::ProductsByCategory("sarees".into()),
            QueryKey::ProductBySlug("red-silk".into()),
            QueryKey::Search("silk".into()),
        ] {
            assert_eq!(key.family(), QueryFamily::Products);
        }
        assert_eq!(QueryKey::Categories.family(), QueryFamily::Categories);
        assert_eq!(QueryKey::Settings.family(), QueryFamily::Settings);
    }

    #[test]
    fn parameters_distinguish_keys() {
        assert_ne!(
            QueryKey::ProductsByCategory("sarees".into()),
            QueryKey::ProductsByCategory("lehengas".into())
        );
    }
}
