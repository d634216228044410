//! Languages, scripts and localized fallback labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::translate::category::ProductCategory;

/// Writing system used to score translated output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Han,
    Latin,
    Arabic,
}

impl Script {
    /// Whether `c` falls in this script's character range
    pub fn contains(self, c: char) -> bool {
        match self {
            Script::Han => ('\u{4e00}'..='\u{9fff}').contains(&c),
            Script::Latin => c.is_ascii_alphabetic() || ('\u{00c0}'..='\u{024f}').contains(&c),
            Script::Arabic => {
                ('\u{0600}'..='\u{06ff}').contains(&c) || ('\u{0750}'..='\u{077f}').contains(&c)
            }
        }
    }

    pub fn is_right_to_left(self) -> bool {
        matches!(self, Script::Arabic)
    }
}

/// Supported source/target languages, serialized as ISO 639-1 codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "de")]
    German,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
            Language::Arabic => "ar",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
        }
    }

    /// Code understood by the Google and MyMemory endpoints
    pub fn web_code(self) -> &'static str {
        match self {
            Language::Chinese => "zh-CN",
            other => other.code(),
        }
    }

    pub fn script(self) -> Script {
        match self {
            Language::Chinese => Script::Han,
            Language::Arabic => Script::Arabic,
            Language::English | Language::French | Language::Spanish | Language::German => {
                Script::Latin
            }
        }
    }

    /// Generic "high quality product" label
    pub fn generic_product_label(self) -> &'static str {
        match self {
            Language::English => "High-Quality Product",
            Language::Arabic => "منتج عالي الجودة",
            Language::French => "Produit de haute qualité",
            Language::Spanish => "Producto de alta calidad",
            Language::German => "Hochwertiges Produkt",
            Language::Chinese => "优质产品",
        }
    }

    /// Localized label for an inferred category
    pub fn category_label(self, category: ProductCategory) -> &'static str {
        use ProductCategory::*;
        match self {
            Language::English => match category {
                Electronics => "High-Quality Electronics",
                Clothing => "High-Quality Clothing",
                Home => "High-Quality Home Products",
                Toys => "High-Quality Toys",
                Beauty => "High-Quality Beauty Products",
                Sports => "High-Quality Sports Equipment",
                Automotive => "High-Quality Automotive Accessories",
                Jewelry => "High-Quality Jewelry",
                Books => "High-Quality Books",
                Food => "High-Quality Food Products",
            },
            Language::Arabic => match category {
                Electronics => "إلكترونيات عالية الجودة",
                Clothing => "ملابس عالية الجودة",
                Home => "منتجات منزلية عالية الجودة",
                Toys => "ألعاب عالية الجودة",
                Beauty => "منتجات تجميل عالية الجودة",
                Sports => "معدات رياضية عالية الجودة",
                Automotive => "إكسسوارات سيارات عالية الجودة",
                Jewelry => "مجوهرات عالية الجودة",
                Books => "كتب عالية الجودة",
                Food => "منتجات غذائية عالية الجودة",
            },
            Language::French => match category {
                Electronics => "Électronique de haute qualité",
                Clothing => "Vêtements de haute qualité",
                Home => "Produits pour la maison de haute qualité",
                Toys => "Jouets de haute qualité",
                Beauty => "Produits de beauté de haute qualité",
                Sports => "Équipement sportif de haute qualité",
                Automotive => "Accessoires auto de haute qualité",
                Jewelry => "Bijoux de haute qualité",
                Books => "Livres de haute qualité",
                Food => "Produits alimentaires de haute qualité",
            },
            Language::Spanish => match category {
                Electronics => "Electrónica de alta calidad",
                Clothing => "Ropa de alta calidad",
                Home => "Productos para el hogar de alta calidad",
                Toys => "Juguetes de alta calidad",
                Beauty => "Productos de belleza de alta calidad",
                Sports => "Equipamiento deportivo de alta calidad",
                Automotive => "Accesorios para coche de alta calidad",
                Jewelry => "Joyería de alta calidad",
                Books => "Libros de alta calidad",
                Food => "Alimentos de alta calidad",
            },
            Language::German => match category {
                Electronics => "Hochwertige Elektronik",
                Clothing => "Hochwertige Kleidung",
                Home => "Hochwertige Haushaltsprodukte",
                Toys => "Hochwertiges Spielzeug",
                Beauty => "Hochwertige Schönheitsprodukte",
                Sports => "Hochwertige Sportausrüstung",
                Automotive => "Hochwertiges Autozubehör",
                Jewelry => "Hochwertiger Schmuck",
                Books => "Hochwertige Bücher",
                Food => "Hochwertige Lebensmittel",
            },
            Language::Chinese => self.generic_product_label(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" => Ok(Language::Chinese),
            "en" => Ok(Language::English),
            "ar" => Ok(Language::Arabic),
            "fr" => Ok(Language::French),
            "es" => Ok(Language::Spanish),
            "de" => Ok(Language::German),
            other => Err(ConfigError::UnknownLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!("zh-CN".parse::<Language>().unwrap(), Language::Chinese);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_script_ranges() {
        assert!(Script::Han.contains('测'));
        assert!(!Script::Han.contains('a'));
        assert!(Script::Arabic.contains('م'));
        assert!(Script::Latin.contains('é'));
        assert!(Language::Arabic.script().is_right_to_left());
    }
}
