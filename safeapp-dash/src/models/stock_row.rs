//! Inventory rows
//!
//! The stock webhook reads a spreadsheet. Depending on the node that
//! produced it, a row is either an object keyed by column header or a bare
//! array, in which case the first row is the header row.

use super::lenient::{decimal, fold_key, non_negative_int, text};
use safeapp_common::CanonicalRow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque key the inventory source uses to target a row update
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    /// JSON form sent back to the source: a number when the key is numeric
    pub fn to_json(&self) -> Value {
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => Value::from(n),
            _ => Value::String(self.0.clone()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inventory line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub reference: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub marque: String,
    pub modele: String,
    pub quantity_remaining: u32,
    pub min_quantity: u32,
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,
    pub supplier: String,
    pub location: String,
    pub row_id: RowId,
}

impl StockRow {
    /// Low stock: at or under a configured (non-zero) minimum
    pub fn is_low_stock(&self) -> bool {
        self.min_quantity > 0 && self.quantity_remaining <= self.min_quantity
    }

    /// Display label: marque + modele, falling back to the reference
    pub fn label(&self) -> String {
        let name = format!("{} {}", self.marque, self.modele);
        let name = name.trim();
        if name.is_empty() {
            self.reference.clone()
        } else {
            name.to_string()
        }
    }

    /// Decode one header-keyed row. `sheet_row` is used when the row carries
    /// no identifier of its own.
    fn from_fields(fields: &Map<String, Value>, sheet_row: usize) -> Self {
        let mut folded: Vec<(String, &Value)> =
            fields.iter().map(|(k, v)| (fold_key(k), v)).collect();
        folded.retain(|(k, _)| !k.is_empty());

        let pick = |aliases: &[&str]| pick_column(&folded, aliases);

        let row_id = pick(&["rownumber", "rowid", "id"])
            .map(|v| text(Some(v)))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| sheet_row.to_string());

        StockRow {
            reference: text(pick(&["reference", "ref"])),
            kind: text(pick(&["type", "categorie", "category"])),
            marque: text(pick(&["marque", "brand"])),
            modele: text(pick(&["modele", "model", "nom", "name"])),
            quantity_remaining: non_negative_int(pick(&[
                "quantiterestante",
                "qterestante",
                "quantite",
                "qte",
                "quantity",
                "stock",
            ])),
            min_quantity: non_negative_int(pick(&[
                "quantiteminimum",
                "quantitemin",
                "qtemin",
                "min",
                "minquantity",
                "stockmin",
                "seuil",
            ])),
            unit_price: decimal(pick(&["prixunitaire", "prix", "unitprice"])),
            total_value: decimal(pick(&["valeurtotale", "valeur", "totalvalue"])),
            supplier: text(pick(&["fournisseur", "supplier"])),
            location: text(pick(&["emplacement", "location"])),
            row_id: RowId(row_id),
        }
    }
}

fn pick_column<'a>(folded: &[(String, &'a Value)], aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| folded.iter().find(|(k, _)| k == alias).map(|(_, v)| *v))
}

/// Decode canonical stock rows.
///
/// Object rows are read by header name. If the first row is an array, it is
/// the header row and the following array rows are zipped against it; their
/// identifier is the 1-based sheet row number (header is row 1).
pub fn decode_stock_rows(rows: Vec<CanonicalRow>) -> Vec<StockRow> {
    let header: Option<Vec<String>> = match rows.first() {
        Some(Value::Array(cells)) => Some(cells.iter().map(|c| text(Some(c))).collect()),
        _ => None,
    };

    match header {
        Some(header) => rows
            .into_iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, row)| match row {
                Value::Array(cells) => {
                    let fields: Map<String, Value> = header
                        .iter()
                        .cloned()
                        .zip(cells)
                        .collect();
                    Some(StockRow::from_fields(&fields, index + 1))
                }
                other => {
                    tracing::warn!(row = index, value = %other, "Skipping non-array stock row");
                    None
                }
            })
            .collect(),
        None => rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match row {
                Value::Object(fields) => Some(StockRow::from_fields(&fields, index + 2)),
                other => {
                    tracing::warn!(row = index, value = %other, "Skipping non-object stock row");
                    None
                }
            })
            .collect(),
    }
}
