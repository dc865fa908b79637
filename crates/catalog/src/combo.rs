use serde::{Deserialize, Serialize};

use pizzeria_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, typed_id};

use crate::product::ProductId;

typed_id!(
    /// Combo identifier.
    ComboId(EntityId)
);

/// One `(product, quantity)` entry of a combo's composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboComponent {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A bundle of products sold at its own price.
///
/// The composition is fixed when the combo is created; an order referencing the
/// combo only freezes the combo's price, never its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub id: ComboId,
    pub tenant_id: TenantId,
    pub name: String,
    pub price: Money,
    pub active: bool,
    pub components: Vec<ComboComponent>,
}

impl Combo {
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        price: Money,
        components: Vec<ComboComponent>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("combo name cannot be empty"));
        }
        if price.is_negative() {
            return Err(DomainError::validation("combo price cannot be negative"));
        }
        if components.is_empty() {
            return Err(DomainError::validation("combo must contain at least one product"));
        }
        if components.iter().any(|c| c.quantity == 0) {
            return Err(DomainError::validation("combo component quantity must be positive"));
        }

        Ok(Self {
            id: ComboId::generate(),
            tenant_id,
            name,
            price,
            active: true,
            components,
        })
    }

    pub fn reprice(&mut self, price: Money) -> DomainResult<()> {
        if price.is_negative() {
            return Err(DomainError::validation("combo price cannot be negative"));
        }
        self.price = price;
        Ok(())
    }
}

impl Entity for Combo {
    type Id = ComboId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(quantity: u32) -> ComboComponent {
        ComboComponent {
            product_id: ProductId::generate(),
            quantity,
        }
    }

    #[test]
    fn combo_keeps_composition_order() {
        let parts = vec![component(2), component(1)];
        let combo = Combo::new(TenantId::new(), "Familiar", Money::from_minor(12000), parts.clone())
            .unwrap();
        assert_eq!(combo.components, parts);
    }

    #[test]
    fn empty_combo_is_rejected() {
        let err = Combo::new(TenantId::new(), "Vacío", Money::from_minor(100), vec![]).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("at least one product") => {}
            _ => panic!("Expected Validation error for empty combo"),
        }
    }

    #[test]
    fn zero_quantity_component_is_rejected() {
        assert!(
            Combo::new(TenantId::new(), "Raro", Money::from_minor(100), vec![component(0)]).is_err()
        );
    }
}
