use serde::{Deserialize, Serialize};

/// Something a producer makes and a consumer buys.
///
/// Two products are the same item when every field matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product_type")]
pub enum Product {
    Tea {
        name: String,
        price: u32,
        #[serde(rename = "type")]
        kind: String,
    },
    Coffee {
        name: String,
        price: u32,
        acidity: f64,
        roast_level: String,
    },
}

impl Product {
    pub fn name(&self) -> &str {
        match self {
            Product::Tea { name, .. } | Product::Coffee { name, .. } => name,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Product::Tea { price, .. } | Product::Coffee { price, .. } => *price,
        }
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Product::Tea { name, price, kind } => {
                write!(f, "Tea(name='{name}', price={price}, type='{kind}')")
            }
            Product::Coffee {
                name,
                price,
                acidity,
                roast_level,
            } => write!(
                f,
                "Coffee(name='{name}', price={price}, acidity={acidity}, roast_level='{roast_level}')"
            ),
        }
    }
}
