//! The fixed Aso-Ebi catalog.
//!
//! Prices are held server-side so a cart line can never carry a price the
//! shopper made up.

use crate::types::naira;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Women's attire
    Women,
    /// Men's attire
    Men,
    /// Head ties, jewellery
    Accessories,
}

impl Category {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Women => "women",
            Self::Men => "men",
            Self::Accessories => "accessories",
        }
    }

    /// Parse a wire name; `all` and unknown names yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "women" => Some(Self::Women),
            "men" => Some(Self::Men),
            "accessories" => Some(Self::Accessories),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchasable catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Stable item id
    pub id: u32,
    /// Display name
    pub name: &'static str,
    /// Section
    pub category: Category,
    /// Price in kobo
    pub price: i64,
    /// Product photo
    pub image: &'static str,
    /// Short blurb
    pub description: &'static str,
    /// Offered sizes
    pub sizes: &'static [&'static str],
    /// Offered colours
    pub colors: &'static [&'static str],
}

/// Why a size/colour pick was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    /// Size not offered for the item
    #[error("size {size} is not available for {item}")]
    UnknownSize {
        /// Item name
        item: &'static str,
        /// Requested size
        size: String,
    },
    /// Colour not offered for the item
    #[error("color {color} is not available for {item}")]
    UnknownColor {
        /// Item name
        item: &'static str,
        /// Requested colour
        color: String,
    },
}

impl CatalogItem {
    /// Check a size and colour against what the item is offered in.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError`] naming the first value that is not offered.
    pub fn check_variant(&self, size: &str, color: &str) -> Result<(), VariantError> {
        if !self.sizes.contains(&size) {
            return Err(VariantError::UnknownSize {
                item: self.name,
                size: size.to_string(),
            });
        }
        if !self.colors.contains(&color) {
            return Err(VariantError::UnknownColor {
                item: self.name,
                color: color.to_string(),
            });
        }
        Ok(())
    }
}

static CATALOG: [CatalogItem; 6] = [
    CatalogItem {
        id: 1,
        name: "Elegant Lace Gown",
        category: Category::Women,
        price: naira(45_000),
        image: "https://images.unsplash.com/photo-1594736797933-d0401ba2fe65?w=400&h=500&fit=crop",
        description: "Beautiful traditional lace gown with intricate embroidery",
        sizes: &["XS", "S", "M", "L", "XL", "XXL"],
        colors: &["Gold", "Royal Blue", "Emerald Green"],
    },
    CatalogItem {
        id: 2,
        name: "Traditional Agbada",
        category: Category::Men,
        price: naira(38_000),
        image: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=500&fit=crop",
        description: "Classic flowing agbada with gold embroidery",
        sizes: &["S", "M", "L", "XL", "XXL"],
        colors: &["Royal Blue", "Forest Green", "Burgundy"],
    },
    CatalogItem {
        id: 3,
        name: "Ankara Print Dress",
        category: Category::Women,
        price: naira(25_000),
        image: "https://images.unsplash.com/photo-1515372039744-b8f02a3ae446?w=400&h=500&fit=crop",
        description: "Vibrant ankara print with modern cut",
        sizes: &["XS", "S", "M", "L", "XL"],
        colors: &["Gold & Green", "Blue & Gold", "Purple & Gold"],
    },
    CatalogItem {
        id: 4,
        name: "Kaftan Set",
        category: Category::Men,
        price: naira(32_000),
        image: "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?w=400&h=500&fit=crop",
        description: "Comfortable kaftan with matching cap",
        sizes: &["M", "L", "XL", "XXL"],
        colors: &["Cream", "Royal Blue", "Forest Green"],
    },
    CatalogItem {
        id: 5,
        name: "Gele & Ipele Set",
        category: Category::Accessories,
        price: naira(15_000),
        image: "https://images.unsplash.com/photo-1583394838336-acd977736f90?w=400&h=500&fit=crop",
        description: "Traditional head tie and shoulder cloth",
        sizes: &["One Size"],
        colors: &["Gold", "Royal Blue", "Emerald", "Purple"],
    },
    CatalogItem {
        id: 6,
        name: "Beaded Jewelry Set",
        category: Category::Accessories,
        price: naira(12_000),
        image: "https://images.unsplash.com/photo-1535632066927-ab7c9ab60908?w=400&h=500&fit=crop",
        description: "Elegant coral beads necklace and earrings",
        sizes: &["One Size"],
        colors: &["Coral", "Gold", "Silver"],
    },
];

/// Every catalog item, in display order.
#[must_use]
pub fn catalog() -> &'static [CatalogItem] {
    &CATALOG
}

/// Look up an item by id.
#[must_use]
pub fn find(id: u32) -> Option<&'static CatalogItem> {
    CATALOG.iter().find(|item| item.id == id)
}

/// Items in one section, or all items when `category` is `None`.
#[must_use]
pub fn by_category(category: Option<Category>) -> Vec<&'static CatalogItem> {
    CATALOG
        .iter()
        .filter(|item| category.is_none_or(|c| item.category == c))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_six_priced_items() {
        assert_eq!(catalog().len(), 6);
        assert_eq!(find(1).unwrap().price, 4_500_000);
        assert_eq!(find(6).unwrap().name, "Beaded Jewelry Set");
        assert!(find(7).is_none());
    }

    #[test]
    fn filters_by_category() {
        let men: Vec<u32> = by_category(Some(Category::Men)).iter().map(|i| i.id).collect();
        assert_eq!(men, vec![2, 4]);
        assert_eq!(by_category(None).len(), 6);
        assert_eq!(Category::parse("all"), None);
        assert_eq!(Category::parse(" Accessories "), Some(Category::Accessories));
    }

    #[test]
    fn variant_check_names_the_bad_value() {
        let kaftan = find(4).unwrap();
        assert!(kaftan.check_variant("L", "Cream").is_ok());
        assert_eq!(
            kaftan.check_variant("XS", "Cream"),
            Err(VariantError::UnknownSize {
                item: "Kaftan Set",
                size: "XS".into()
            })
        );
        assert!(matches!(
            kaftan.check_variant("L", "Gold"),
            Err(VariantError::UnknownColor { .. })
        ));
    }
}
