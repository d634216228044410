//! Keyword taxonomy used when every translation backend fails

/// Coarse product category inferred from source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Home,
    Toys,
    Beauty,
    Sports,
    Automotive,
    Jewelry,
    Books,
    Food,
}

/// Checked in order; the first category with a matching keyword wins.
const TAXONOMY: &[(ProductCategory, &[&str])] = &[
    (
        ProductCategory::Electronics,
        &["手机", "电脑", "平板", "耳机", "充电器", "数据线", "phone", "computer", "tablet", "headphone", "charger", "cable"],
    ),
    (
        ProductCategory::Clothing,
        &["衣服", "裤子", "鞋子", "帽子", "包", "clothes", "pants", "shoes", "hat", "bag"],
    ),
    (
        ProductCategory::Home,
        &["家具", "装饰", "厨房", "浴室", "furniture", "decoration", "kitchen", "bathroom"],
    ),
    (ProductCategory::Toys, &["玩具", "游戏", "模型", "toy", "game", "model"]),
    (
        ProductCategory::Beauty,
        &["化妆品", "护肤品", "香水", "cosmetic", "skincare", "perfume"],
    ),
    (ProductCategory::Sports, &["运动", "健身", "户外", "sport", "fitness", "outdoor"]),
    (
        ProductCategory::Automotive,
        &["汽车", "摩托车", "配件", "car", "motorcycle", "accessory"],
    ),
    (
        ProductCategory::Jewelry,
        &["珠宝", "手表", "项链", "戒指", "jewelry", "watch", "necklace", "ring"],
    ),
    (ProductCategory::Books, &["书", "杂志", "book", "magazine"]),
    (ProductCategory::Food, &["食品", "饮料", "零食", "food", "drink", "snack"]),
];

/// Infer a category by keyword matching against the lowercased text
pub fn infer_category(text: &str) -> Option<ProductCategory> {
    let lower = text.to_lowercase();
    TAXONOMY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
}
