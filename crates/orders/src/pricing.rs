//! Pricing engine: resolves requested lines against the catalog and freezes
//! their prices.
//!
//! Every request is validated before the catalog is consulted, so a malformed
//! line fails the whole order without a single lookup. Output lines keep input
//! order and get `line_no` 1..=n.

use thiserror::Error;
use tracing::debug;

use pizzeria_catalog::CatalogLookup;
use pizzeria_core::{Money, StoreError, TenantId};

use crate::line::{LineItem, LineRequest, OrderLine, OrderLineId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("an order must contain at least one line")]
    EmptyOrder,

    #[error("line {line_no}: {reason}")]
    InvalidLineComposition { line_no: u32, reason: &'static str },

    #[error("line {line_no}: quantity must be at least 1 (got {quantity})")]
    InvalidQuantity { line_no: u32, quantity: i64 },

    #[error("line {line_no}: {item} not found")]
    ItemNotFound { line_no: u32, item: LineItem },

    #[error("line {line_no}: amount overflow")]
    AmountOverflow { line_no: u32 },

    #[error("catalog lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

/// Result of pricing: the lines in input order and their exact sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLines {
    pub lines: Vec<OrderLine>,
    pub total: Money,
}

/// Validate the product-XOR-combo rule and the quantity of one request.
pub fn validate_line(line_no: u32, request: &LineRequest) -> Result<(LineItem, u32), PricingError> {
    let item = match (request.product_id, request.combo_id) {
        (Some(product_id), None) => LineItem::Product(product_id),
        (None, Some(combo_id)) => LineItem::Combo(combo_id),
        (Some(_), Some(_)) => {
            return Err(PricingError::InvalidLineComposition {
                line_no,
                reason: "a line cannot reference both a product and a combo",
            });
        }
        (None, None) => {
            return Err(PricingError::InvalidLineComposition {
                line_no,
                reason: "a line must reference a product or a combo",
            });
        }
    };

    let quantity = u32::try_from(request.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(PricingError::InvalidQuantity {
            line_no,
            quantity: request.quantity,
        })?;

    Ok((item, quantity))
}

/// Price every requested line against the tenant's current catalog.
pub async fn price_lines<C>(
    catalog: &C,
    tenant_id: TenantId,
    requests: &[LineRequest],
) -> Result<PricedLines, PricingError>
where
    C: CatalogLookup + ?Sized,
{
    if requests.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    let validated = requests
        .iter()
        .zip(1u32..)
        .map(|(request, line_no)| validate_line(line_no, request).map(|v| (line_no, v)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut lines = Vec::with_capacity(validated.len());
    let mut total = Money::ZERO;

    for (line_no, (item, quantity)) in validated {
        let unit_price = current_price(catalog, tenant_id, item)
            .await?
            .ok_or(PricingError::ItemNotFound { line_no, item })?;

        let subtotal = unit_price
            .checked_times(quantity)
            .ok_or(PricingError::AmountOverflow { line_no })?;
        total = total
            .checked_add(subtotal)
            .ok_or(PricingError::AmountOverflow { line_no })?;

        debug!(%tenant_id, line_no, %item, quantity, %unit_price, "line priced");

        lines.push(OrderLine {
            id: OrderLineId::generate(),
            line_no,
            item,
            quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(PricedLines { lines, total })
}

async fn current_price<C>(
    catalog: &C,
    tenant_id: TenantId,
    item: LineItem,
) -> Result<Option<Money>, StoreError>
where
    C: CatalogLookup + ?Sized,
{
    match item {
        LineItem::Product(id) => Ok(catalog
            .get_product(tenant_id, id)
            .await?
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.price)),
        LineItem::Combo(id) => Ok(catalog
            .get_combo(tenant_id, id)
            .await?
            .filter(|c| c.tenant_id == tenant_id)
            .map(|c| c.price)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzeria_catalog::{Combo, ComboComponent, ComboId, InMemoryCatalog, Product, ProductId};

    struct Fixture {
        tenant_id: TenantId,
        catalog: InMemoryCatalog,
        pizza: ProductId,
        combo: ComboId,
    }

    fn fixture() -> Fixture {
        let tenant_id = TenantId::new();
        let catalog = InMemoryCatalog::new();
        let pizza = Product::new(tenant_id, "Muzzarella", Money::from_minor(5000)).unwrap();
        let combo = Combo::new(
            tenant_id,
            "Pizza + bebida",
            Money::from_minor(12000),
            vec![ComboComponent {
                product_id: pizza.id,
                quantity: 1,
            }],
        )
        .unwrap();
        let (pizza_id, combo_id) = (pizza.id, combo.id);
        catalog.upsert_product(pizza);
        catalog.upsert_combo(combo);

        Fixture {
            tenant_id,
            catalog,
            pizza: pizza_id,
            combo: combo_id,
        }
    }

    #[tokio::test]
    async fn prices_products_and_combos_at_current_catalog_price() {
        let f = fixture();
        let priced = price_lines(
            &f.catalog,
            f.tenant_id,
            &[LineRequest::product(f.pizza, 2), LineRequest::combo(f.combo, 1)],
        )
        .await
        .unwrap();

        assert_eq!(priced.total, Money::from_minor(22000));
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].line_no, 1);
        assert_eq!(priced.lines[0].item, LineItem::Product(f.pizza));
        assert_eq!(priced.lines[0].unit_price, Money::from_minor(5000));
        assert_eq!(priced.lines[0].subtotal, Money::from_minor(10000));
        assert_eq!(priced.lines[1].line_no, 2);
        assert_eq!(priced.lines[1].item, LineItem::Combo(f.combo));
        assert_eq!(priced.lines[1].subtotal, Money::from_minor(12000));
    }

    #[tokio::test]
    async fn line_with_both_references_is_rejected() {
        let f = fixture();
        let request = LineRequest {
            product_id: Some(f.pizza),
            combo_id: Some(f.combo),
            quantity: 1,
        };

        let err = price_lines(&f.catalog, f.tenant_id, &[request]).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidLineComposition { line_no: 1, .. }));
    }

    #[tokio::test]
    async fn line_with_no_reference_is_rejected_even_after_a_missing_item() {
        let f = fixture();
        let requests = [
            LineRequest::product(ProductId::generate(), 1),
            LineRequest {
                product_id: None,
                combo_id: None,
                quantity: 1,
            },
        ];

        let err = price_lines(&f.catalog, f.tenant_id, &requests).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidLineComposition { line_no: 2, .. }));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let f = fixture();
        for quantity in [0, -3] {
            let err = price_lines(&f.catalog, f.tenant_id, &[LineRequest::product(f.pizza, quantity)])
                .await
                .unwrap_err();
            assert_eq!(err, PricingError::InvalidQuantity { line_no: 1, quantity });
        }
    }

    #[tokio::test]
    async fn item_of_another_tenant_is_not_found() {
        let f = fixture();
        let err = price_lines(&f.catalog, TenantId::new(), &[LineRequest::combo(f.combo, 1)])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PricingError::ItemNotFound {
                line_no: 1,
                item: LineItem::Combo(f.combo)
            }
        );
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let f = fixture();
        let err = price_lines(&f.catalog, f.tenant_id, &[]).await.unwrap_err();
        assert_eq!(err, PricingError::EmptyOrder);
    }

    #[tokio::test]
    async fn later_price_change_does_not_touch_priced_lines() {
        let f = fixture();
        let priced = price_lines(&f.catalog, f.tenant_id, &[LineRequest::product(f.pizza, 2)])
            .await
            .unwrap();

        assert!(f.catalog.set_product_price(f.tenant_id, f.pizza, Money::from_minor(6000)));

        assert_eq!(priced.lines[0].unit_price, Money::from_minor(5000));
        assert_eq!(priced.total, Money::from_minor(10000));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 32,
                ..ProptestConfig::default()
            })]

            #[test]
            fn total_is_sum_of_quantity_times_price(
                items in proptest::collection::vec((1i64..50_000, 1i64..20), 1..8)
            ) {
                let tenant_id = TenantId::new();
                let catalog = InMemoryCatalog::new();
                let mut requests = Vec::new();
                let mut expected = Money::ZERO;
                for (cents, quantity) in &items {
                    let product = Product::new(tenant_id, "Item", Money::from_minor(*cents)).unwrap();
                    requests.push(LineRequest::product(product.id, *quantity));
                    expected = expected + Money::from_minor(cents * quantity);
                    catalog.upsert_product(product);
                }

                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let forward = runtime.block_on(price_lines(&catalog, tenant_id, &requests)).unwrap();
                requests.reverse();
                let backward = runtime.block_on(price_lines(&catalog, tenant_id, &requests)).unwrap();

                prop_assert_eq!(forward.total, expected);
                prop_assert_eq!(backward.total, expected);
                let line_sum: Money = forward.lines.iter().map(|l| l.subtotal).sum();
                prop_assert_eq!(line_sum, forward.total);
            }
        }
    }
}
