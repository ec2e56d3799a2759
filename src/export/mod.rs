//! CSV exports of the ledger and the activity log.
//!
//! Header labels are written without accents; cell values are untouched.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::{
    activity::ActivityEntry,
    currency::round2,
    errors::Result,
    ledger::Comanda,
    utils::text::strip_accents,
};

const COMANDA_HEADERS: [&str; 16] = [
    "Número",
    "Fecha",
    "Unidad de negocio",
    "Caja",
    "Cliente",
    "Trabajador",
    "Tipo",
    "Estado",
    "Validación",
    "Método de pago",
    "Subtotal (USD)",
    "Descuentos (USD)",
    "Seña (USD)",
    "Total (USD)",
    "Total (ARS)",
    "Tipo de cambio",
];

const ACTIVITY_HEADERS: [&str; 5] = ["Fecha", "Usuario", "Acción", "Descripción", "Referencia"];

fn header_row(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| strip_accents(label)).collect()
}

fn money(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Writes one row per comanda, returning the number of rows written.
pub fn export_comandas_csv<'a, W, I>(comandas: I, rate: f64, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Comanda>,
{
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(header_row(&COMANDA_HEADERS))?;

    let mut rows = 0;
    for comanda in comandas {
        let method = comanda
            .primary_method()
            .map(|m| m.to_string())
            .unwrap_or_default();
        csv_writer.write_record([
            comanda.number.clone(),
            comanda.date.format("%Y-%m-%d %H:%M").to_string(),
            comanda.business_unit.clone(),
            comanda.register.label().to_string(),
            comanda.client.name.clone(),
            comanda.staff_member.name.clone(),
            comanda.kind.label().to_string(),
            comanda.business_state.label().to_string(),
            comanda.validation.label().to_string(),
            method,
            money(comanda.subtotal),
            money(comanda.total_discounts),
            money(comanda.total_deposit),
            money(comanda.final_total),
            money(comanda.final_total_ars(rate)),
            money(rate),
        ])?;
        rows += 1;
    }
    csv_writer.flush()?;
    tracing::info!(rows, "comandas exported");
    Ok(rows)
}

pub fn export_activity_csv<'a, W, I>(entries: I, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ActivityEntry>,
{
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(header_row(&ACTIVITY_HEADERS))?;

    let mut rows = 0;
    for entry in entries {
        csv_writer.write_record([
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.actor.clone(),
            entry.action.label().to_string(),
            entry.description.clone(),
            entry.reference.clone().unwrap_or_default(),
        ])?;
        rows += 1;
    }
    csv_writer.flush()?;
    tracing::info!(rows, "activity exported");
    Ok(rows)
}

pub fn export_comandas_to_path<'a, I>(comandas: I, rate: f64, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a Comanda>,
{
    export_comandas_csv(comandas, rate, File::create(path)?)
}

pub fn export_activity_to_path<'a, I>(entries: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a ActivityEntry>,
{
    export_activity_csv(entries, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activity::ActivityAction,
        ledger::{ComandaKind, ItemKind, LineItem, PartyRef},
    };
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn comanda_export_strips_header_accents_and_shows_both_currencies() {
        let mut comanda = Comanda::new(
            Utc.with_ymd_and_hms(2025, 3, 4, 15, 30, 0).unwrap(),
            "Peluquería",
            PartyRef::named("Sofía"),
            PartyRef::named("Ana"),
            ComandaKind::Income,
        )
        .with_line_item(LineItem::new(ItemKind::Service, "Color", 1, 40.0, 0.0));
        comanda.number = "00001".into();

        let mut buffer = Vec::new();
        let rows = export_comandas_csv([&comanda], 1200.0, &mut buffer).unwrap();
        assert_eq!(rows, 1);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Numero,Fecha"));
        assert!(header.contains("Validacion"));
        assert!(header.contains("Sena (USD)"));
        let row = lines.next().unwrap();
        assert!(row.contains("40.00"));
        assert!(row.contains("48000.00"));
        // cell values keep their accents
        assert!(row.contains("Peluquería"));
    }

    #[test]
    fn activity_export_writes_one_row_per_entry() {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap(),
            actor: "admin".into(),
            action: ActivityAction::Export,
            description: "comandas".into(),
            reference: None,
        };
        let mut buffer = Vec::new();
        export_activity_csv([&entry, &entry], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("Fecha,Usuario,Accion,Descripcion,Referencia"));
    }
}
