use serde::{Deserialize, Serialize};

use pizzeria_core::{DomainError, DomainResult, Entity, EntityId, TenantId, typed_id};

typed_id!(
    /// Customer identifier.
    CustomerId(EntityId)
);

typed_id!(
    /// Delivery address identifier.
    AddressId(EntityId)
);

/// A registered delivery address of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub street: String,
    pub number: String,
    /// Free text such as "2nd floor, door B".
    pub description: Option<String>,
}

impl Address {
    pub fn new(street: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: AddressId::generate(),
            street: street.into(),
            number: number.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// One-line form used on tickets: `"<street> <number>"`, followed by
    /// `" (<description>)"` when a description is present.
    pub fn display_line(&self) -> String {
        let base = format!("{} {}", self.street.trim(), self.number.trim());
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{base} ({desc})"),
            _ => base,
        }
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
}

impl Customer {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        Ok(Self {
            id: CustomerId::generate(),
            tenant_id,
            name,
            phone: None,
            addresses: Vec::new(),
        })
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn address(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line_without_description() {
        let address = Address::new("Av. Colón", "1234");
        assert_eq!(address.display_line(), "Av. Colón 1234");
    }

    #[test]
    fn display_line_appends_description_in_parentheses() {
        let address = Address::new("San Martín", "50").with_description("Depto 3B");
        assert_eq!(address.display_line(), "San Martín 50 (Depto 3B)");
    }

    #[test]
    fn blank_description_is_ignored() {
        let address = Address::new("Belgrano", "9").with_description("   ");
        assert_eq!(address.display_line(), "Belgrano 9");
    }

    #[test]
    fn address_lookup_only_finds_own_addresses() {
        let home = Address::new("Mitre", "100");
        let home_id = home.id;
        let customer = Customer::new(TenantId::new(), "Lucía").unwrap().with_address(home);

        assert!(customer.address(home_id).is_some());
        assert!(customer.address(AddressId::generate()).is_none());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Customer::new(TenantId::new(), "").unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }
}
