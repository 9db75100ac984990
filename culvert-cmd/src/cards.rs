//! Field-card management: list, show, annotate, delete and export.

use crate::emit;
use culvert_core::FieldCardStore;
use culvert_db::Database;
use culvert_report::{export, html};
use culvert_utils::dates::parse_rfc3339;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn run_list(db: &Database, since: Option<&str>, out: &mut dyn Write) -> anyhow::Result<()> {
    let since = since.map(parse_rfc3339).transpose()?;
    let summaries = db.query_summaries_since(since)?;
    if summaries.is_empty() {
        writeln!(out, "No field cards stored.")?;
        return Ok(());
    }
    for summary in &summaries {
        writeln!(
            out,
            "{}  {}  {:<8}  {} mm",
            summary.id, summary.created_at, summary.region, summary.recommended_size_mm
        )?;
    }
    Ok(())
}

pub fn run_show(db: &Database, id: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let card = db
        .get_field_card(id)?
        .ok_or_else(|| anyhow::anyhow!("no field card {}", id))?;
    writeln!(out, "{}", serde_json::to_string_pretty(&card)?)?;
    Ok(())
}

pub fn run_delete(db: &Database, id: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    if db.delete_field_card(id)? {
        writeln!(out, "Deleted {}", id)?;
        Ok(())
    } else {
        anyhow::bail!("no field card {}", id)
    }
}

pub fn run_notes(
    db: &Database,
    id: &str,
    notes: Option<&str>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let card = db
        .update_notes(id, notes)?
        .ok_or_else(|| anyhow::anyhow!("no field card {}", id))?;
    match &card.notes {
        Some(notes) => writeln!(out, "Notes on {}: {}", card.id, notes)?,
        None => writeln!(out, "Cleared notes on {}", card.id)?,
    }
    Ok(())
}

pub fn run_export(db: &Database, output: Option<&PathBuf>, out: &mut dyn Write) -> anyhow::Result<()> {
    let cards = db.get_field_cards()?;
    let csv_text = export::to_csv_string(&cards)?;
    emit(&csv_text, output, out)
}

pub fn run_report(
    db: &Database,
    id: &str,
    output: Option<&PathBuf>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let card = db
        .get_field_card(id)?
        .ok_or_else(|| anyhow::anyhow!("no field card {}", id))?;
    emit(&html::render_field_card(&card)?, output, out)
}

pub fn run_import(db: &Database, input: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(input)?;
    let count = db.load_field_cards_json(&json)?;
    info!("[Culvert] cmd: imported {} from {}", count, input.display());
    writeln!(out, "Imported {} field cards", count)?;
    Ok(())
}

pub fn run_dump(db: &Database, output: Option<&PathBuf>, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut json = db.dump_field_cards_json()?;
    json.push('\n');
    emit(&json, output, out)
}
