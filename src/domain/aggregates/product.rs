//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable option of a product, carrying its own price. The serialized
/// shape (`{"type", "price"}`) is shared by the catalog, cart lines, and
/// order snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "type")]
    pub variant_type: String,
    pub price: Decimal,
}

#[derive(Clone, Debug)]
pub struct Product {
    id: Uuid,
    name: String,
    description: String,
    image_url: Vec<String>,
    variants: Vec<Variant>,
    is_top_product: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Validated construction for admin catalog writes. Image references are
    /// normalized to their trailing filename.
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: Vec<String>,
        variants: Vec<Variant>,
        is_top_product: bool,
    ) -> Result<Self, ProductError> {
        let name = name.into();
        let description = description.into();
        validate(&name, &description, &image_url, &variants)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            image_url: image_url.into_iter().map(|url| normalize_image(&url)).collect(),
            variants,
            is_top_product,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild the aggregate from a stored row.
    pub fn hydrate(
        id: Uuid,
        name: String,
        description: String,
        image_url: Vec<String>,
        variants: Vec<Variant>,
        is_top_product: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, name, description, image_url, variants, is_top_product, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn image_url(&self) -> &[String] { &self.image_url }
    pub fn variants(&self) -> &[Variant] { &self.variants }
    pub fn is_top_product(&self) -> bool { self.is_top_product }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Look up a variant by its type label.
    pub fn variant(&self, variant_type: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_type == variant_type)
    }

    /// Replace the mutable fields in place (admin update).
    pub fn update(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: Vec<String>,
        variants: Vec<Variant>,
        is_top_product: bool,
    ) -> Result<(), ProductError> {
        let name = name.into();
        let description = description.into();
        validate(&name, &description, &image_url, &variants)?;
        self.name = name;
        self.description = description;
        self.image_url = image_url.into_iter().map(|url| normalize_image(&url)).collect();
        self.variants = variants;
        self.is_top_product = is_top_product;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate(
    name: &str,
    description: &str,
    image_url: &[String],
    variants: &[Variant],
) -> Result<(), ProductError> {
    if name.trim().is_empty() { return Err(ProductError::MissingName); }
    if description.trim().is_empty() { return Err(ProductError::MissingDescription); }
    if image_url.is_empty() { return Err(ProductError::NoImages); }
    if variants.is_empty() { return Err(ProductError::NoVariants); }
    for v in variants {
        if v.variant_type.trim().is_empty() || v.price < Decimal::ZERO {
            return Err(ProductError::InvalidVariant);
        }
    }
    Ok(())
}

// Image references are stored as bare filenames; the image host prefixes them.
fn normalize_image(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductError { MissingName, MissingDescription, NoImages, NoVariants, InvalidVariant }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::MissingDescription => write!(f, "Missing description"),
            Self::NoImages => write!(f, "At least one image is required"),
            Self::NoVariants => write!(f, "At least one variant is required"),
            Self::InvalidVariant => write!(f, "Invalid variant data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<Variant> {
        vec![Variant { variant_type: "black".into(), price: Decimal::new(4999, 2) }]
    }

    #[test]
    fn create_normalizes_image_urls() {
        let p = Product::create(
            "Headphones",
            "Over-ear",
            vec!["https://img.host/u/abc123.png".into(), "plain.png".into()],
            variants(),
            false,
        )
        .unwrap();
        assert_eq!(p.image_url(), ["abc123.png", "plain.png"]);
    }

    #[test]
    fn create_rejects_empty_variants() {
        let err = Product::create("Headphones", "Over-ear", vec!["a.png".into()], vec![], false)
            .unwrap_err();
        assert_eq!(err, ProductError::NoVariants);
    }

    #[test]
    fn create_rejects_negative_variant_price() {
        let bad = vec![Variant { variant_type: "black".into(), price: Decimal::new(-1, 0) }];
        let err = Product::create("Headphones", "Over-ear", vec!["a.png".into()], bad, false)
            .unwrap_err();
        assert_eq!(err, ProductError::InvalidVariant);
    }

    #[test]
    fn variant_lookup_by_type() {
        let p = Product::create("Headphones", "Over-ear", vec!["a.png".into()], variants(), true)
            .unwrap();
        assert_eq!(p.variant("black").unwrap().price, Decimal::new(4999, 2));
        assert!(p.variant("gold").is_none());
    }
}
