//! Plan export: an xlsx workbook with one sheet per collection, the JSON
//! form of the whole report and a short text summary for the terminal.

use crate::PlanReport;
use crate::error::PlannerError;
use crate::model::CellValue;
use crate::utils::path_to_forward_slashes;
use indexmap::IndexSet;
use std::fmt::Write as _;
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub const PARAMETERS_SHEET: &str = "Parametros";
pub const MINIMUM_STOCK_SHEET: &str = "Estoque minimo";
pub const TRANSFERS_SHEET: &str = "Transferencias";
pub const PURCHASES_SHEET: &str = "Compras";
pub const PROMOTIONS_SHEET: &str = "Promocoes";
pub const STOCK_SUMMARY_SHEET: &str = "Resumo estoque";
pub const SALES_HISTORY_SHEET: &str = "Historico vendas";

fn text(value: impl Into<String>) -> CellValue {
    CellValue::Text(value.into())
}

fn num(value: impl Into<f64>) -> CellValue {
    CellValue::Number(value.into())
}

fn count(value: u64) -> CellValue {
    CellValue::Number(value as f64)
}

/// Writes rows top to bottom starting at row 1.
struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    row: u32,
}

impl<'a> SheetWriter<'a> {
    fn new(sheet: &'a mut Worksheet) -> Self {
        Self { sheet, row: 1 }
    }

    fn header(&mut self, titles: &[&str]) {
        let values: Vec<CellValue> = titles.iter().map(|t| text(*t)).collect();
        self.row(&values);
    }

    fn row(&mut self, values: &[CellValue]) {
        for (idx, value) in values.iter().enumerate() {
            let cell = self.sheet.get_cell_mut((idx as u32 + 1, self.row));
            match value {
                CellValue::Number(n) => {
                    cell.set_value_number(*n);
                }
                CellValue::Bool(b) => {
                    cell.set_value_bool(*b);
                }
                other => {
                    cell.set_value_string(other.as_text());
                }
            }
        }
        self.row += 1;
    }

    fn blank(&mut self) {
        self.row += 1;
    }
}

fn add_sheet<'a>(book: &'a mut Spreadsheet, name: &str) -> Result<SheetWriter<'a>, String> {
    let sheet = book.new_sheet(name).map_err(|e| e.to_string())?;
    Ok(SheetWriter::new(sheet))
}

/// Writes `report` as an xlsx workbook at `path`, replacing any file there.
pub fn write_xlsx(path: &Path, report: &PlanReport) -> Result<(), PlannerError> {
    let export_err = |message: String| PlannerError::Export {
        path: path.to_path_buf(),
        message,
    };

    let mut book = umya_spreadsheet::new_file();
    {
        let first = book
            .get_sheet_by_name_mut("Sheet1")
            .ok_or_else(|| export_err("new workbook has no default sheet".to_string()))?;
        first.set_name(PARAMETERS_SHEET);
        write_parameters(&mut SheetWriter::new(first), report);
    }
    write_minimum_stock(&mut add_sheet(&mut book, MINIMUM_STOCK_SHEET).map_err(export_err)?, report);
    write_transfers(&mut add_sheet(&mut book, TRANSFERS_SHEET).map_err(export_err)?, report);
    write_purchases(&mut add_sheet(&mut book, PURCHASES_SHEET).map_err(export_err)?, report);
    write_promotions(&mut add_sheet(&mut book, PROMOTIONS_SHEET).map_err(export_err)?, report);
    write_stock_summary(&mut add_sheet(&mut book, STOCK_SUMMARY_SHEET).map_err(export_err)?, report);
    write_sales_history(&mut add_sheet(&mut book, SALES_HISTORY_SHEET).map_err(export_err)?, report);

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| export_err(e.to_string()))?;
    tracing::info!(path = %path_to_forward_slashes(path), "plan exported");
    Ok(())
}

fn write_parameters(out: &mut SheetWriter<'_>, report: &PlanReport) {
    let p = &report.parameters;
    let join = |values: &[String]| {
        if values.is_empty() {
            "todos".to_string()
        } else {
            values.join(", ")
        }
    };
    let window = match (p.window.first(), p.window.last()) {
        (Some(first), Some(last)) => format!("{first} a {last} ({} ciclos)", p.window.len()),
        _ => "sem vendas".to_string(),
    };

    out.header(&["Parametro", "Valor"]);
    out.row(&[text("Metodo"), text(p.method.to_string())]);
    out.row(&[text("Fator de cobertura"), num(p.coverage_factor)]);
    out.row(&[
        text("Cenario"),
        text(p.scenario.map(|s| s.to_string()).unwrap_or_default()),
    ]);
    out.row(&[text("Horizonte (dias)"), num(p.horizon_days)]);
    out.row(&[text("Ciclo atual"), text(p.current_cycle.to_string())]);
    out.row(&[text("Janela"), text(window)]);
    out.row(&[text("Classes"), text(join(&p.filters.classes))]);
    out.row(&[text("Categorias"), text(join(&p.filters.categories))]);
    out.row(&[text("Cidades"), text(join(&p.filters.cities))]);
    out.row(&[text("Desativacao"), text(p.filters.deactivation.to_string())]);
    out.row(&[
        text("Compras de desativados"),
        text(p.deactivated_purchases.to_string()),
    ]);
    out.row(&[text("Transferencias"), CellValue::Bool(p.transfers_enabled)]);
    out.row(&[
        text("Ciclo promocional"),
        text(p.promo_cycle.map(|c| c.to_string()).unwrap_or_default()),
    ]);

    let t = &report.totals;
    out.blank();
    out.header(&["Totais", "Valor"]);
    out.row(&[text("SKUs planejados"), count(t.skus_planned as u64)]);
    out.row(&[text("Transferencias"), count(t.transfer_count as u64)]);
    out.row(&[text("Unidades transferidas"), count(t.transfer_units)]);
    out.row(&[text("Compras"), count(t.purchase_count as u64)]);
    out.row(&[text("Unidades compradas"), count(t.purchase_units)]);
    out.row(&[text("Valor de compra"), num(t.purchase_value)]);
    out.row(&[text("Valor sem transferencias"), num(t.baseline_purchase_value)]);
    out.row(&[text("Economia"), num(t.economy())]);

    out.blank();
    out.header(&["Arquivo", "Id", "Abas"]);
    for input in &report.inputs {
        out.row(&[
            text(path_to_forward_slashes(&input.path)),
            text(input.id.as_str()),
            text(input.sheets.join(", ")),
        ]);
    }
}

fn write_minimum_stock(out: &mut SheetWriter<'_>, report: &PlanReport) {
    out.header(&[
        "SKU", "Ciclos", "Media", "Maximo", "P85", "Desvio", "Metodo", "Fator", "Base", "Sugerido",
    ]);
    for rec in &report.minimum_stock {
        let stats = report.stats.get(&rec.sku).copied().unwrap_or_default();
        out.row(&[
            text(rec.sku.as_str()),
            count(stats.n as u64),
            num(stats.mean),
            num(stats.max),
            num(stats.p85),
            num(stats.sigma),
            text(rec.method.to_string()),
            num(rec.coverage_factor),
            num(rec.base),
            count(rec.suggested),
        ]);
    }
}

fn write_transfers(out: &mut SheetWriter<'_>, report: &PlanReport) {
    out.header(&["SKU", "Origem", "Destino", "Quantidade"]);
    for t in &report.transfers {
        out.row(&[
            text(t.sku.as_str()),
            text(t.origin.as_str()),
            text(t.destination.as_str()),
            count(t.quantity),
        ]);
    }
}

fn write_purchases(out: &mut SheetWriter<'_>, report: &PlanReport) {
    out.header(&[
        "SKU",
        "Descricao",
        "Classe",
        "Categoria",
        "Cidade",
        "Quantidade",
        "Preco unitario",
        "Total",
        "Vendas janela",
        "Vendas ciclo anterior",
        "Vendas ciclo atual",
        "Compra inteligente",
        "Melhor ciclo",
        "Vendas melhor ciclo",
    ]);
    for p in &report.purchases {
        let (best_cycle, best_quantity) = p
            .best_moment
            .as_ref()
            .map(|b| (b.cycle.clone(), b.quantity))
            .unwrap_or_default();
        out.row(&[
            text(p.sku.as_str()),
            text(p.description.as_str()),
            text(p.class.as_str()),
            text(p.category.as_str()),
            text(p.city.as_str()),
            count(p.quantity),
            num(p.unit_price),
            num(p.total_price),
            num(p.window_sales),
            num(p.prior_cycle_sales),
            num(p.current_cycle_sales),
            num(p.smart_buy_next_cycle),
            text(best_cycle),
            num(best_quantity),
        ]);
    }
}

fn write_promotions(out: &mut SheetWriter<'_>, report: &PlanReport) {
    out.header(&[
        "SKU",
        "Descricao",
        "Classe",
        "Ciclo promocional",
        "Desconto %",
        "Minimo base",
        "Alvo promocional",
        "Disponivel",
        "Sugerido",
        "Preco promocional",
        "Total",
        "Quantidade no horizonte",
        "Total no horizonte",
    ]);
    for (rec, view) in report.promotions.iter().zip(&report.promotion_view) {
        out.row(&[
            text(rec.sku.as_str()),
            text(rec.description.as_str()),
            text(rec.class.as_str()),
            text(rec.promo_cycle.to_string()),
            num(rec.discount_pct),
            count(rec.base_minimum),
            count(rec.target),
            num(rec.available),
            count(rec.suggested),
            num(rec.promo_unit_price),
            num(rec.total),
            count(view.quantity),
            num(view.total),
        ]);
    }
}

fn write_stock_summary(out: &mut SheetWriter<'_>, report: &PlanReport) {
    let titles = [
        "Agrupamento",
        "Grupo",
        "SKUs",
        "Estoque",
        "Em transito",
        "Pendentes",
        "Pendentes liquidos",
        "Valor em estoque",
    ];
    out.header(&titles);
    let groups = [
        ("Marca", &report.stock_summary.by_brand),
        ("Cidade", &report.stock_summary.by_city),
    ];
    for (label, rows) in groups {
        for row in rows.iter() {
            out.row(&[
                text(label),
                text(row.group.as_str()),
                count(row.skus as u64),
                num(row.on_hand),
                num(row.in_transit),
                num(row.pending),
                num(row.net_pending),
                num(row.stock_value),
            ]);
        }
    }
}

fn write_sales_history(out: &mut SheetWriter<'_>, report: &PlanReport) {
    let brands: IndexSet<&str> = report
        .sales_history
        .iter()
        .flat_map(|c| c.by_brand.keys().map(String::as_str))
        .collect();
    let mut titles = vec!["Ciclo", "Total"];
    titles.extend(brands.iter().copied());
    out.header(&titles);
    for cycle in &report.sales_history {
        let mut values = vec![text(cycle.cycle.as_str()), num(cycle.total)];
        values.extend(
            brands
                .iter()
                .map(|brand| num(cycle.by_brand.get(*brand).copied().unwrap_or(0.0))),
        );
        out.row(&values);
    }
}

pub fn to_json(report: &PlanReport) -> Result<String, PlannerError> {
    serde_json::to_string_pretty(report).map_err(|e| PlannerError::Export {
        path: "<stdout>".into(),
        message: e.to_string(),
    })
}

/// Short human-readable summary of a plan.
pub fn render_table(report: &PlanReport) -> String {
    let mut out = String::new();
    let p = &report.parameters;
    let t = &report.totals;

    let _ = writeln!(
        out,
        "ciclo atual {} | janela {} ciclos | metodo {} x{} | horizonte {} dias",
        p.current_cycle,
        p.window.len(),
        p.method,
        p.coverage_factor,
        p.horizon_days
    );
    for skipped in report.ingest.skipped() {
        if let Some(reason) = skipped.skipped {
            let _ = writeln!(out, "aba ignorada: {} ({reason})", skipped.sheet);
        }
    }
    let _ = writeln!(out, "SKUs com estoque minimo: {}", report.minimum_stock.len());
    let _ = writeln!(
        out,
        "transferencias: {} ({} un)",
        t.transfer_count, t.transfer_units
    );
    let _ = writeln!(
        out,
        "compras: {} ({} un, R$ {:.2})",
        t.purchase_count, t.purchase_units, t.purchase_value
    );
    let _ = writeln!(out, "economia com transferencias: R$ {:.2}", t.economy());
    let _ = writeln!(out, "sugestoes de promocao: {}", report.promotions.len());

    if !report.purchases.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<14} {:<20} {:>8} {:>12}", "SKU", "CIDADE", "QTD", "TOTAL");
        for purchase in report.purchases.iter().take(20) {
            let _ = writeln!(
                out,
                "{:<14} {:<20} {:>8} {:>12.2}",
                purchase.sku, purchase.city, purchase.quantity, purchase.total_price
            );
        }
        if report.purchases.len() > 20 {
            let _ = writeln!(out, "... {} compras a mais", report.purchases.len() - 20);
        }
    }
    out
}
