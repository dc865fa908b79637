use serde::{Deserialize, Serialize};

use pizzeria_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, typed_id};

typed_id!(
    /// Product identifier (unique within the whole system, owned by one tenant).
    ProductId(EntityId)
);

/// A sellable product (a pizza, a drink, a side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Current list price. Orders copy it at creation time.
    pub price: Money,
    pub active: bool,
}

impl Product {
    pub fn new(tenant_id: TenantId, title: impl Into<String>, price: Money) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("product title cannot be empty"));
        }
        if price.is_negative() {
            return Err(DomainError::validation("product price cannot be negative"));
        }

        Ok(Self {
            id: ProductId::generate(),
            tenant_id,
            title,
            description: None,
            category: None,
            price,
            active: true,
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Reprice the product. Already-created orders are unaffected.
    pub fn reprice(&mut self, price: Money) -> DomainResult<()> {
        if price.is_negative() {
            return Err(DomainError::validation("product price cannot be negative"));
        }
        self.price = price;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_is_active_and_keeps_price() {
        let tenant_id = TenantId::new();
        let product = Product::new(tenant_id, "Muzzarella", Money::from_minor(5000)).unwrap();

        assert!(product.active);
        assert_eq!(product.tenant_id, tenant_id);
        assert_eq!(product.price, Money::from_minor(5000));
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Product::new(TenantId::new(), "  ", Money::from_minor(100)).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("title") => {}
            _ => panic!("Expected Validation error for blank title"),
        }
    }

    #[test]
    fn reprice_rejects_negative_amounts() {
        let mut product = Product::new(TenantId::new(), "Fugazzeta", Money::from_minor(100)).unwrap();
        assert!(product.reprice(Money::from_minor(-1)).is_err());
        assert_eq!(product.price, Money::from_minor(100));

        product.reprice(Money::from_minor(6000)).unwrap();
        assert_eq!(product.price, Money::from_minor(6000));
    }
}
