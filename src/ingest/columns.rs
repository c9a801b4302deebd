//! Header resolution: maps loosely named spreadsheet columns onto the
//! semantic fields the mapper extracts.
//!
//! Headers are compared in normalized form (see [`normalize_text`]) against
//! a fixed synonym table. Resolution happens once per sheet and yields a
//! [`ColumnIndex`]; row extraction only ever reads positions from it.

use crate::model::CellValue;
use crate::utils::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;
use strum::{EnumIter, IntoEnumIterator};

/// Zero-based positions read by position in the smart-buy export layout.
pub const PRIOR_CYCLE_SALES_POSITION: usize = 25;
pub const CURRENT_CYCLE_SALES_POSITION: usize = 26;

static WIDE_CYCLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:ciclo\D*)?(\d{6})$").expect("valid wide cycle header pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum SemanticField {
    Sku,
    Description,
    OnHand,
    InTransit,
    Pending,
    Class,
    Category,
    DeactivationCycle,
    Promotion,
    Price,
    Pdv,
    City,
    SmartBuy,
    PriorCycleSales,
    CurrentCycleSales,
    Cycle,
    Quantity,
}

impl SemanticField {
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SemanticField::Sku => &[
                "sku",
                "codigo",
                "cod",
                "cod.",
                "codigo sku",
                "codigo produto",
                "codigo do produto",
                "cod produto",
                "cod. produto",
                "cod_produto",
                "codigo_produto",
                "material",
            ],
            SemanticField::Description => &[
                "descricao",
                "descricao produto",
                "descricao do produto",
                "desc",
                "desc produto",
                "nome",
                "nome produto",
                "nome do produto",
                "produto",
            ],
            SemanticField::OnHand => &[
                "estoque atual",
                "estoque_atual",
                "estq atual",
                "estq_atual",
                "estoque",
                "saldo estoque",
            ],
            SemanticField::InTransit => &[
                "estoque em transito",
                "estoque transito",
                "estoque_transito",
                "estq transito",
                "estq_transito",
                "em transito",
                "transito",
            ],
            SemanticField::Pending => &[
                "pedidos pendentes",
                "pedido pendente",
                "pedidos_pendentes",
                "pendentes",
                "pendente",
                "qtd pendente",
                "pedidos em aberto",
            ],
            SemanticField::Class => &["classe", "curva", "curva abc", "classe abc", "classificacao"],
            SemanticField::Category => &["categoria", "categ", "grupo", "departamento"],
            SemanticField::DeactivationCycle => &[
                "ciclo desativacao",
                "ciclo de desativacao",
                "ciclo_desativacao",
                "desativacao",
                "ciclo descontinuacao",
                "descontinuacao",
            ],
            SemanticField::Promotion => &[
                "promocao",
                "promocoes",
                "promo",
                "acao promocional",
                "ciclo promocao",
                "ciclo promocional",
            ],
            SemanticField::Price => &[
                "preco",
                "preco unitario",
                "preco_unitario",
                "preco venda",
                "preco de venda",
                "valor unitario",
                "pv",
            ],
            SemanticField::Pdv => &[
                "pdv",
                "cod pdv",
                "codigo pdv",
                "loja",
                "cod loja",
                "codigo loja",
                "ponto de venda",
            ],
            SemanticField::City => &["cidade", "municipio"],
            SemanticField::SmartBuy => &[
                "compra inteligente",
                "compra inteligente proximo ciclo",
                "sugestao compra inteligente",
                "compra_inteligente",
            ],
            SemanticField::PriorCycleSales => &["venda ciclo anterior", "vendas ciclo anterior"],
            SemanticField::CurrentCycleSales => &["venda ciclo atual", "vendas ciclo atual"],
            SemanticField::Cycle => &["ciclo", "ciclo venda", "ciclo de venda", "ciclo_venda"],
            SemanticField::Quantity => &[
                "quantidade",
                "quantidade vendida",
                "qtd",
                "qtd vendida",
                "qtde",
                "venda",
                "vendas",
                "unidades",
            ],
        }
    }
}

/// Normalized header text keyed by column position.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    normalized: Vec<String>,
}

impl HeaderMap {
    pub fn resolve(header: &[Option<CellValue>]) -> Self {
        let normalized = header
            .iter()
            .map(|cell| {
                cell.as_ref()
                    .map(|v| normalize_text(&v.as_text()))
                    .unwrap_or_default()
            })
            .collect();
        Self { normalized }
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// First column whose normalized header is one of `candidates`.
    pub fn column_key_for(&self, candidates: &[&str]) -> Option<usize> {
        self.normalized
            .iter()
            .position(|h| !h.is_empty() && candidates.contains(&h.as_str()))
    }

    pub fn column_for(&self, field: SemanticField) -> Option<usize> {
        self.column_key_for(field.synonyms())
    }

    /// Columns whose header names a single sales cycle (`ciclo 202501`,
    /// `202501`), paired with the six-digit cycle identifier.
    pub fn cycle_columns(&self) -> Vec<(usize, String)> {
        self.normalized
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                WIDE_CYCLE_HEADER
                    .captures(h)
                    .map(|caps| (idx, caps[1].to_string()))
            })
            .collect()
    }
}

/// Typed column positions for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    pub sku: usize,
    pub description: Option<usize>,
    pub on_hand: Option<usize>,
    pub in_transit: Option<usize>,
    pub pending: Option<usize>,
    pub class: Option<usize>,
    pub category: Option<usize>,
    pub deactivation_cycle: Option<usize>,
    pub promotion: Option<usize>,
    pub price: Option<usize>,
    pub pdv: Option<usize>,
    pub city: Option<usize>,
    pub smart_buy: Option<usize>,
    pub prior_cycle_sales: Option<usize>,
    pub current_cycle_sales: Option<usize>,
    pub cycle: Option<usize>,
    pub quantity: Option<usize>,
}

impl ColumnIndex {
    /// Resolves every semantic field. `None` when the sheet has no SKU column.
    ///
    /// Prior/current cycle sales come from fixed positions 25 and 26 whenever
    /// the header reaches that far, regardless of what those columns are named.
    pub fn from_header(headers: &HeaderMap) -> Option<Self> {
        let sku = headers.column_for(SemanticField::Sku)?;
        let mut index = ColumnIndex {
            sku,
            ..Default::default()
        };
        for field in SemanticField::iter() {
            let column = headers.column_for(field);
            match field {
                SemanticField::Sku => {}
                SemanticField::Description => index.description = column,
                SemanticField::OnHand => index.on_hand = column,
                SemanticField::InTransit => index.in_transit = column,
                SemanticField::Pending => index.pending = column,
                SemanticField::Class => index.class = column,
                SemanticField::Category => index.category = column,
                SemanticField::DeactivationCycle => index.deactivation_cycle = column,
                SemanticField::Promotion => index.promotion = column,
                SemanticField::Price => index.price = column,
                SemanticField::Pdv => index.pdv = column,
                SemanticField::City => index.city = column,
                SemanticField::SmartBuy => index.smart_buy = column,
                SemanticField::PriorCycleSales => index.prior_cycle_sales = column,
                SemanticField::CurrentCycleSales => index.current_cycle_sales = column,
                SemanticField::Cycle => index.cycle = column,
                SemanticField::Quantity => index.quantity = column,
            }
        }
        if headers.len() > CURRENT_CYCLE_SALES_POSITION {
            index.prior_cycle_sales = Some(PRIOR_CYCLE_SALES_POSITION);
            index.current_cycle_sales = Some(CURRENT_CYCLE_SALES_POSITION);
        }
        Some(index)
    }

    /// Long sales layout: explicit cycle and quantity columns.
    pub fn has_long_sales_layout(&self) -> bool {
        self.cycle.is_some() && self.quantity.is_some()
    }

    pub fn has_stock_columns(&self) -> bool {
        self.on_hand.is_some()
            || self.in_transit.is_some()
            || self.pending.is_some()
            || self.price.is_some()
            || self.class.is_some()
    }
}
