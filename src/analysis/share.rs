use crate::model::SalesRow;
use indexmap::IndexMap;
use std::collections::BTreeMap;

pub type CityShares = IndexMap<String, f64>;

/// Sales quantity per SKU per city, cities in first appearance order.
pub fn sales_by_city<'a, I>(rows: I) -> BTreeMap<String, IndexMap<String, f64>>
where
    I: IntoIterator<Item = &'a SalesRow>,
{
    let mut totals: BTreeMap<String, IndexMap<String, f64>> = BTreeMap::new();
    for row in rows {
        *totals
            .entry(row.sku.clone())
            .or_default()
            .entry(row.city.clone())
            .or_insert(0.0) += row.quantity;
    }
    totals
}

/// Each SKU's sales proportion per city. Proportions of a SKU sum to 1; a
/// SKU whose recorded sales total zero maps to an empty share table.
pub fn share_by_city<'a, I>(rows: I) -> BTreeMap<String, CityShares>
where
    I: IntoIterator<Item = &'a SalesRow>,
{
    sales_by_city(rows)
        .into_iter()
        .map(|(sku, per_city)| {
            let total: f64 = per_city.values().sum();
            let shares = if total > 0.0 {
                per_city
                    .into_iter()
                    .map(|(city, qty)| (city, qty / total))
                    .collect()
            } else {
                CityShares::new()
            };
            (sku, shares)
        })
        .collect()
}
