//! Marketplace category extraction

use super::{find_string_field, PageDocument};

/// `leafCategoryName` from the embedded page data, untranslated
pub fn extract_leaf_category(doc: &PageDocument) -> Option<String> {
    find_string_field(doc.raw(), "leafCategoryName")
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
