//! Workbook to normalized row sets.
//!
//! Every sheet is resolved on its own: a sheet without data rows or without
//! a SKU column is skipped and reported, never treated as an error. Sales
//! are read either from the long layout (explicit cycle and quantity
//! columns) or, only when those are absent, from the wide layout (one
//! column per cycle).

use crate::analysis::cycles::{canonical_cycle, ciclo_key};
use crate::error::SkipReason;
use crate::ingest::brand::brand_from_sheet_name;
use crate::ingest::columns::{ColumnIndex, HeaderMap};
use crate::ingest::pdv::PdvLookup;
use crate::model::{CellValue, SalesRow, StockRow};
use crate::planning::promotion::parse_promotion;
use crate::utils::{coerce_number, coerce_quantity};
use crate::workbook::{Row, Sheet, Workbook};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SalesLayout {
    Long,
    Wide { cycles: Vec<String> },
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetOutcome {
    pub sheet: String,
    pub brand: String,
    pub layout: Option<SalesLayout>,
    pub stock_rows: usize,
    pub sales_rows: usize,
    pub skipped: Option<SkipReason>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub sheets: Vec<SheetOutcome>,
}

impl IngestReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SheetOutcome> {
        self.sheets.iter().filter(|s| s.skipped.is_some())
    }

    pub fn merge(&mut self, other: IngestReport) {
        self.sheets.extend(other.sheets);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappedRows {
    pub stock_rows: Vec<StockRow>,
    pub sales_rows: Vec<SalesRow>,
    pub report: IngestReport,
}

impl MappedRows {
    pub fn is_empty(&self) -> bool {
        self.stock_rows.is_empty() && self.sales_rows.is_empty()
    }

    pub fn extend(&mut self, other: MappedRows) {
        self.stock_rows.extend(other.stock_rows);
        self.sales_rows.extend(other.sales_rows);
        self.report.merge(other.report);
    }
}

struct SheetRows {
    layout: SalesLayout,
    stock_rows: Vec<StockRow>,
    sales_rows: Vec<SalesRow>,
}

pub fn map_workbook(workbook: &Workbook, pdv: &PdvLookup) -> MappedRows {
    let mut mapped = MappedRows::default();
    for sheet in &workbook.sheets {
        let brand = brand_from_sheet_name(&sheet.name);
        match map_sheet(sheet, &brand, pdv) {
            Ok(rows) => {
                tracing::debug!(
                    sheet = %sheet.name,
                    brand = %brand,
                    layout = ?rows.layout,
                    stock_rows = rows.stock_rows.len(),
                    sales_rows = rows.sales_rows.len(),
                    "sheet mapped"
                );
                mapped.report.sheets.push(SheetOutcome {
                    sheet: sheet.name.clone(),
                    brand,
                    layout: Some(rows.layout),
                    stock_rows: rows.stock_rows.len(),
                    sales_rows: rows.sales_rows.len(),
                    skipped: None,
                });
                mapped.stock_rows.extend(rows.stock_rows);
                mapped.sales_rows.extend(rows.sales_rows);
            }
            Err(reason) => {
                tracing::debug!(sheet = %sheet.name, %reason, "sheet skipped");
                mapped.report.sheets.push(SheetOutcome {
                    sheet: sheet.name.clone(),
                    brand,
                    layout: None,
                    stock_rows: 0,
                    sales_rows: 0,
                    skipped: Some(reason),
                });
            }
        }
    }
    mapped
}

fn map_sheet(sheet: &Sheet, brand: &str, pdv: &PdvLookup) -> Result<SheetRows, SkipReason> {
    let header = match sheet.header() {
        Some(header) if !sheet.is_empty() => header,
        _ => return Err(SkipReason::Empty),
    };
    let headers = HeaderMap::resolve(header);
    let index = ColumnIndex::from_header(&headers).ok_or(SkipReason::MissingSkuColumn)?;

    let layout = if index.has_long_sales_layout() {
        SalesLayout::Long
    } else {
        let cycles = headers.cycle_columns();
        if cycles.is_empty() {
            SalesLayout::None
        } else {
            SalesLayout::Wide {
                cycles: cycles.into_iter().map(|(_, c)| c).collect(),
            }
        }
    };

    let stock_rows = if index.has_stock_columns() || layout == SalesLayout::None {
        extract_stock(sheet.data_rows(), &index, brand, pdv)
    } else {
        Vec::new()
    };

    let sales_rows = match &layout {
        SalesLayout::Long => extract_long_sales(sheet.data_rows(), &index, brand, pdv),
        SalesLayout::Wide { .. } => {
            extract_wide_sales(sheet.data_rows(), &index, &headers.cycle_columns(), brand, pdv)
        }
        SalesLayout::None => Vec::new(),
    };

    Ok(SheetRows {
        layout,
        stock_rows,
        sales_rows,
    })
}

fn cell(row: &Row, column: Option<usize>) -> Option<&CellValue> {
    column.and_then(|idx| row.get(idx)).and_then(Option::as_ref)
}

fn text(row: &Row, column: Option<usize>) -> String {
    cell(row, column).map(CellValue::as_text).unwrap_or_default()
}

fn sku_of(row: &Row, index: &ColumnIndex) -> Option<String> {
    let sku = text(row, Some(index.sku));
    if sku.is_empty() { None } else { Some(sku) }
}

/// Point of sale and city of a row: the lookup wins over a city column.
fn location(row: &Row, index: &ColumnIndex, pdv: &PdvLookup) -> (String, String) {
    let code = text(row, index.pdv);
    let city = pdv
        .city_for(&code)
        .map(str::to_string)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| text(row, index.city));
    (code, city)
}

/// Grouping key of a sales row, matching [`StockRow::location`]: the city,
/// else the point-of-sale code.
fn sales_location(row: &Row, index: &ColumnIndex, pdv: &PdvLookup) -> String {
    let (code, city) = location(row, index, pdv);
    if city.is_empty() { code } else { city }
}

/// First non-empty description per SKU, in row order.
pub fn best_descriptions(rows: &[StockRow]) -> HashMap<String, String> {
    let mut best: HashMap<String, String> = HashMap::new();
    for row in rows {
        if !row.description.is_empty() && !best.contains_key(&row.sku) {
            best.insert(row.sku.clone(), row.description.clone());
        }
    }
    best
}

/// Fills empty descriptions from a sibling row of the same SKU, or with
/// `"SKU {sku}"` when no sibling has one.
pub fn backfill_descriptions(mut rows: Vec<StockRow>) -> Vec<StockRow> {
    let best = best_descriptions(&rows);
    for row in rows.iter_mut().filter(|r| r.description.is_empty()) {
        row.description = best
            .get(&row.sku)
            .cloned()
            .unwrap_or_else(|| format!("SKU {}", row.sku));
    }
    rows
}

fn extract_stock(rows: &[Row], index: &ColumnIndex, brand: &str, pdv: &PdvLookup) -> Vec<StockRow> {
    let drafts = rows
        .iter()
        .filter_map(|row| {
            let sku = sku_of(row, index)?;
            let (pdv_code, city) = location(row, index, pdv);
            let on_hand = coerce_quantity(cell(row, index.on_hand));
            let in_transit = coerce_quantity(cell(row, index.in_transit));
            let pending = coerce_quantity(cell(row, index.pending));
            let promo = parse_promotion(&text(row, index.promotion));
            Some(StockRow {
                brand: brand.to_string(),
                sku,
                description: text(row, index.description),
                pdv: pdv_code,
                city,
                class: text(row, index.class).to_uppercase(),
                category: text(row, index.category).to_uppercase(),
                unit_price: coerce_number(cell(row, index.price)).max(0.0),
                on_hand,
                in_transit,
                pending,
                net_pending: (pending - in_transit).max(0.0),
                deactivation_cycle: ciclo_key(&text(row, index.deactivation_cycle)),
                promo_cycle: promo.cycle,
                promo_discount_pct: promo.discount_pct,
                smart_buy_next_cycle: coerce_quantity(cell(row, index.smart_buy)),
                prior_cycle_sales: coerce_quantity(cell(row, index.prior_cycle_sales)),
                current_cycle_sales: coerce_quantity(cell(row, index.current_cycle_sales)),
            })
        })
        .collect();
    backfill_descriptions(drafts)
}

fn extract_long_sales(
    rows: &[Row],
    index: &ColumnIndex,
    brand: &str,
    pdv: &PdvLookup,
) -> Vec<SalesRow> {
    rows.iter()
        .filter_map(|row| {
            let sku = sku_of(row, index)?;
            let raw_cycle = text(row, index.cycle);
            if raw_cycle.is_empty() {
                return None;
            }
            let city = sales_location(row, index, pdv);
            Some(SalesRow {
                brand: brand.to_string(),
                sku,
                cycle: canonical_cycle(&raw_cycle),
                quantity: coerce_quantity(cell(row, index.quantity)),
                city,
            })
        })
        .collect()
}

fn extract_wide_sales(
    rows: &[Row],
    index: &ColumnIndex,
    cycle_columns: &[(usize, String)],
    brand: &str,
    pdv: &PdvLookup,
) -> Vec<SalesRow> {
    let mut out = Vec::new();
    for row in rows {
        let Some(sku) = sku_of(row, index) else {
            continue;
        };
        let city = sales_location(row, index, pdv);
        for (column, cycle) in cycle_columns {
            out.push(SalesRow {
                brand: brand.to_string(),
                sku: sku.clone(),
                cycle: cycle.clone(),
                quantity: coerce_quantity(cell(row, Some(*column))),
                city: city.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::pdv::PdvCity;
    use assert_matches::assert_matches;

    fn t(s: &str) -> Option<CellValue> {
        Some(CellValue::Text(s.to_string()))
    }

    fn n(v: f64) -> Option<CellValue> {
        Some(CellValue::Number(v))
    }

    fn lookup() -> PdvLookup {
        let mut lookup = PdvLookup::empty();
        lookup.insert(
            "1001",
            PdvCity {
                city: "Curitiba".into(),
                state: "PR".into(),
            },
        );
        lookup
    }

    #[test]
    fn stock_sheet_maps_fields_and_net_pending() {
        let sheet = Sheet::new(
            "Boticário",
            vec![
                vec![
                    t("Código"),
                    t("Descrição"),
                    t("PDV"),
                    t("Estoque Atual"),
                    t("Estoque em Trânsito"),
                    t("Pedidos Pendentes"),
                    t("Classe"),
                    t("Preço"),
                    t("Promoção"),
                    t("Ciclo Desativação"),
                ],
                vec![
                    n(123.0),
                    t("Perfume"),
                    n(1001.0),
                    t("1.234"),
                    n(2.0),
                    n(5.0),
                    t("a"),
                    t("R$ 89,90"),
                    t("Ciclo 202505 - 40% off"),
                    n(202504.0),
                ],
                vec![
                    t("456"),
                    None,
                    t("9999"),
                    t("abc"),
                    n(3.0),
                    n(1.0),
                    None,
                    None,
                    None,
                    None,
                ],
            ],
        );
        let mapped = map_workbook(&Workbook::new(vec![sheet]), &lookup());
        assert_eq!(mapped.stock_rows.len(), 2);
        let first = &mapped.stock_rows[0];
        assert_eq!(first.brand, "BOTICARIO");
        assert_eq!(first.sku, "123");
        assert_eq!(first.city, "Curitiba");
        assert_eq!(first.on_hand, 1234.0);
        assert_eq!(first.net_pending, 3.0);
        assert_eq!(first.class, "A");
        assert!((first.unit_price - 89.9).abs() < 1e-9);
        assert_eq!(first.promo_cycle, Some(202505));
        assert_eq!(first.promo_discount_pct, Some(40.0));
        assert_eq!(first.deactivation_cycle, Some(202504));

        let second = &mapped.stock_rows[1];
        assert_eq!(second.description, "SKU 456");
        assert_eq!(second.city, "");
        assert_eq!(second.pdv, "9999");
        assert_eq!(second.on_hand, 0.0);
        assert_eq!(second.net_pending, 0.0);
        assert!(mapped.sales_rows.is_empty());
    }

    #[test]
    fn later_rows_backfill_descriptions() {
        let sheet = Sheet::new(
            "Eudora",
            vec![
                vec![t("SKU"), t("Descrição"), t("Estoque")],
                vec![t("A1"), None, n(1.0)],
                vec![t("A1"), t("Batom"), n(2.0)],
                vec![t("B2"), None, n(3.0)],
            ],
        );
        let mapped = map_workbook(&Workbook::new(vec![sheet]), &PdvLookup::empty());
        let descriptions: Vec<&str> = mapped
            .stock_rows
            .iter()
            .map(|r| r.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Batom", "Batom", "SKU B2"]);
    }

    #[test]
    fn long_layout_sales() {
        let sheet = Sheet::new(
            "Vendas Eudora",
            vec![
                vec![t("SKU"), t("Ciclo"), t("Qtd"), t("PDV")],
                vec![t("A1"), t("ciclo 2025-6"), n(4.0), n(1001.0)],
                vec![t("A1"), n(202507.0), t("x"), None],
                vec![t(""), n(202507.0), n(9.0), None],
                vec![t("A1"), None, n(9.0), None],
            ],
        );
        let mapped = map_workbook(&Workbook::new(vec![sheet]), &lookup());
        assert!(mapped.stock_rows.is_empty());
        assert_eq!(mapped.sales_rows.len(), 2);
        assert_eq!(mapped.sales_rows[0].cycle, "202506");
        assert_eq!(mapped.sales_rows[0].city, "Curitiba");
        assert_eq!(mapped.sales_rows[1].quantity, 0.0);
        assert_matches!(mapped.report.sheets[0].layout, Some(SalesLayout::Long));
    }

    #[test]
    fn unmapped_pdv_codes_key_sales_like_stock() {
        let workbook = Workbook::new(vec![
            Sheet::new(
                "Eudora",
                vec![
                    vec![t("SKU"), t("PDV"), t("Estoque")],
                    vec![t("A1"), n(2002.0), n(4.0)],
                ],
            ),
            Sheet::new(
                "Vendas Eudora",
                vec![
                    vec![t("SKU"), t("Ciclo"), t("Qtd"), t("PDV")],
                    vec![t("A1"), n(202501.0), n(3.0), n(2002.0)],
                    vec![t("A1"), n(202501.0), n(1.0), n(1001.0)],
                ],
            ),
        ]);
        let mapped = map_workbook(&workbook, &lookup());
        assert_eq!(mapped.stock_rows[0].location(), "2002");
        let cities: Vec<&str> = mapped.sales_rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["2002", "Curitiba"]);
    }

    #[test]
    fn wide_layout_sales_emit_one_row_per_cycle_column() {
        let sheet = Sheet::new(
            "Vendas",
            vec![
                vec![t("SKU"), t("Cidade"), t("Ciclo 202501"), t("202502")],
                vec![t("A1"), t("Londrina"), n(5.0), None],
                vec![t("B2"), t("Maringá"), t("1,5"), n(2.0)],
            ],
        );
        let mapped = map_workbook(&Workbook::new(vec![sheet]), &PdvLookup::empty());
        assert_eq!(mapped.sales_rows.len(), 4);
        assert_eq!(mapped.sales_rows[1].cycle, "202502");
        assert_eq!(mapped.sales_rows[1].quantity, 0.0);
        assert_eq!(mapped.sales_rows[2].quantity, 1.5);
        assert_eq!(mapped.sales_rows[3].city, "Maringá");
        assert!(mapped.stock_rows.is_empty());
    }

    #[test]
    fn long_layout_blocks_wide_fallback() {
        let sheet = Sheet::new(
            "Vendas",
            vec![
                vec![t("SKU"), t("Ciclo"), t("Qtd"), t("202501")],
                vec![t("A1"), None, None, n(5.0)],
            ],
        );
        let mapped = map_workbook(&Workbook::new(vec![sheet]), &PdvLookup::empty());
        assert!(mapped.sales_rows.is_empty());
        assert_matches!(mapped.report.sheets[0].layout, Some(SalesLayout::Long));
    }

    #[test]
    fn sheets_without_rows_or_sku_are_skipped() {
        let workbook = Workbook::new(vec![
            Sheet::new("Vazia", vec![]),
            Sheet::new("Legenda", vec![vec![t("Nota")], vec![t("qualquer coisa")]]),
        ]);
        let mapped = map_workbook(&workbook, &PdvLookup::empty());
        assert!(mapped.is_empty());
        let reasons: Vec<_> = mapped.report.skipped().map(|s| s.skipped).collect();
        assert_eq!(
            reasons,
            vec![Some(SkipReason::Empty), Some(SkipReason::MissingSkuColumn)]
        );
    }
}
