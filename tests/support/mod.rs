#![allow(dead_code)]

use std::path::{Path, PathBuf};

use stock_planner::PlannerConfig;
use stock_planner::model::CellValue;
use tempfile::{TempDir, tempdir};
use umya_spreadsheet::{self, Spreadsheet, Worksheet};

pub fn t(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

pub fn n(value: f64) -> CellValue {
    CellValue::Number(value)
}

/// Writes `rows` from A1 downwards. Text is stored as text even when it
/// looks numeric, the way exported spreadsheets usually carry codes.
pub fn write_rows(sheet: &mut Worksheet, rows: &[Vec<CellValue>]) {
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let cell = sheet.get_cell_mut((c as u32 + 1, r as u32 + 1));
            match value {
                CellValue::Number(v) => {
                    cell.set_value_number(*v);
                }
                CellValue::Bool(b) => {
                    cell.set_value_bool(*b);
                }
                other => {
                    let text = other.as_text();
                    if !text.is_empty() {
                        cell.set_value_string(text);
                    }
                }
            }
        }
    }
}

/// Adds a sheet holding `rows`; the default `Sheet1` is renamed on first use.
pub fn add_sheet(book: &mut Spreadsheet, name: &str, rows: &[Vec<CellValue>]) {
    if book.get_sheet_by_name("Sheet1").is_some() {
        book.get_sheet_by_name_mut("Sheet1")
            .expect("default sheet")
            .set_name(name);
    } else {
        book.new_sheet(name).expect("new sheet");
    }
    let sheet = book.get_sheet_by_name_mut(name).expect("sheet just added");
    write_rows(sheet, rows);
}

pub fn build_workbook<F>(f: F) -> PathBuf
where
    F: FnOnce(&mut Spreadsheet),
{
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("fixture.xlsx");
    write_workbook_to_path(&path, f);
    std::mem::forget(tmp);
    path
}

pub fn write_workbook_to_path<F>(path: &Path, f: F)
where
    F: FnOnce(&mut Spreadsheet),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

/// Cell texts of a sheet in a written workbook, row by row.
pub fn read_sheet(path: &Path, name: &str) -> Vec<Vec<String>> {
    let book = umya_spreadsheet::reader::xlsx::read(path).expect("read workbook");
    let sheet = book.get_sheet_by_name(name).expect("sheet present");
    let (cols, rows) = sheet.get_highest_column_and_row();
    (1..=rows)
        .map(|r| {
            (1..=cols)
                .map(|c| {
                    sheet
                        .get_cell((c, r))
                        .map(|cell| cell.get_value().to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn create_workbook<F>(&self, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.path(name);
        write_workbook_to_path(&path, f);
        path
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("write file");
        path
    }

    pub fn config(&self, workbooks: &[PathBuf]) -> PlannerConfig {
        PlannerConfig {
            workbooks: workbooks.to_vec(),
            ..Default::default()
        }
    }

    pub fn config_with<F>(&self, workbooks: &[PathBuf], configure: F) -> PlannerConfig
    where
        F: FnOnce(&mut PlannerConfig),
    {
        let mut config = self.config(workbooks);
        configure(&mut config);
        config
    }
}

/// Stock and sales for three SKUs across Londrina and Curitiba.
///
/// * `100` sells 6/cycle in Curitiba and 2/cycle in Londrina, but all of its
///   stock sits in Londrina.
/// * `200` sells 3/cycle in Curitiba and has one unit there.
/// * `300` is a class-A SKU with a 20% promotion in cycle 202505.
pub fn retail_workbook(book: &mut Spreadsheet) {
    retail_stock(book);
    retail_sales(book);
}

pub fn retail_stock(book: &mut Spreadsheet) {
    add_sheet(
        book,
        "Estoque Boticário",
        &[
            vec![
                t("SKU"),
                t("Descrição"),
                t("Cidade"),
                t("Estoque Atual"),
                t("Estoque em Trânsito"),
                t("Pedidos Pendentes"),
                t("Classe"),
                t("Preço"),
                t("Promoção"),
            ],
            vec![
                t("100"),
                t("Colônia"),
                t("Londrina"),
                n(10.0),
                n(0.0),
                n(0.0),
                t("B"),
                t("R$ 5,00"),
                t(""),
            ],
            vec![
                t("100"),
                t(""),
                t("Curitiba"),
                n(0.0),
                n(0.0),
                n(0.0),
                t("B"),
                t("R$ 5,00"),
                t(""),
            ],
            vec![
                t("200"),
                t("Batom"),
                t("Curitiba"),
                n(1.0),
                n(0.0),
                n(0.0),
                t("C"),
                t("R$ 10,00"),
                t(""),
            ],
            vec![
                t("300"),
                t("Perfume"),
                t("Curitiba"),
                n(2.0),
                n(0.0),
                n(0.0),
                t("a"),
                t("50"),
                t("Promo 202505 20%"),
            ],
        ],
    );
}

pub fn retail_sales(book: &mut Spreadsheet) {
    let mut sales = vec![vec![t("SKU"), t("Ciclo"), t("Qtd"), t("Cidade")]];
    for cycle in [202501.0, 202502.0, 202503.0] {
        sales.push(vec![t("100"), n(cycle), n(6.0), t("Curitiba")]);
        sales.push(vec![t("100"), n(cycle), n(2.0), t("Londrina")]);
        sales.push(vec![t("200"), n(cycle), n(3.0), t("Curitiba")]);
        sales.push(vec![t("300"), n(cycle), n(10.0), t("Curitiba")]);
    }
    add_sheet(book, "Vendas Boticário", &sales);
}
