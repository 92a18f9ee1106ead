//! Bulk guest import from the seating spreadsheet export.
//!
//! Expected columns are `Firstname`, `Lastname`, `Table` and `*Typ*`; any
//! other column is ignored. Companion and service-staff rows carry incomplete
//! names in the spreadsheet and are given synthetic ones here.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ApiError;
use crate::models::{ImportOptions, NewGuest};
use crate::normalize::{full_name_key, normalize_name};
use crate::repository::{DbError, GuestFilter, GuestRepository, TableRepository};
use crate::seating::{occupancy_report, TableOccupancy};

const COMPANION: &str = "Osoba towarzysząca";

// Column widths of the guests table.
const MAX_NAME_LEN: usize = 150;
const MAX_GUEST_TYPE_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub first_name: String,
    pub last_name: String,
    pub table_number: Option<i32>,
    pub guest_type: String,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub occupancy: Vec<TableOccupancy>,
    pub unassigned: usize,
}

fn detect_delimiter(first_line: &str) -> u8 {
    if first_line.contains(';') { b';' } else { b',' }
}

/// Trims a cell and collapses inner whitespace, including newlines inside
/// quoted cells.
fn clean_cell(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_table(raw: &str) -> Option<i32> {
    // "-1", "x" and blanks all mean "not seated yet".
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

/// Fills in names for companions, staff and nameless rows.
/// Returns `None` for rows without any name.
fn resolve_names(first_name: &str, last_name: &str, guest_type: &str) -> Option<(String, String)> {
    let (mut first, mut last) = (first_name.trim().to_string(), last_name.trim().to_string());
    if first.is_empty() && last.is_empty() {
        return None;
    }

    if normalize_name(&first).starts_with("osoba towarzyszaca") || normalize_name(guest_type).contains("towarzyszaca") {
        if last.is_empty() {
            return Some((COMPANION.to_string(), "Nieznana".to_string()));
        }
        return Some((format!("{} {}", COMPANION, last), "Towarzyszaca".to_string()));
    }

    if first.is_empty() {
        let lowered = last.to_lowercase();
        if lowered.contains("fotograf") {
            first = std::mem::replace(&mut last, "Fotograf".to_string());
        } else if lowered.contains("dj") {
            first = "DJ".to_string();
            last = "Obsługa".to_string();
        } else {
            first = "Gość".to_string();
        }
    }

    if last.is_empty() {
        last = "Nieznany".to_string();
    }

    Some((first, last))
}

fn check_length(line: usize, column: &str, value: &str, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max {
        return Err(format!("line {}: {} is {} characters long, the limit is {}", line, column, len, max));
    }
    Ok(())
}

fn check_row(row: &ImportRow) -> Result<(), String> {
    check_length(row.line, "first name", &row.first_name, MAX_NAME_LEN)?;
    check_length(row.line, "last name", &row.last_name, MAX_NAME_LEN)?;
    check_length(row.line, "guest type", &row.guest_type, MAX_GUEST_TYPE_LEN)
}

pub fn parse_guest_csv(text: &str) -> Result<ParsedImport, ApiError> {
    let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return Err(ApiError::ValidationMissing("CSV body is empty".to_string()));
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ApiError::MalformedInput(format!("header: {}", e)))?
        .iter()
        .map(|h| h.replace('\u{feff}', "").trim().to_string())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let (first_col, last_col) = (column("Firstname"), column("Lastname"));
    if first_col.is_none() && last_col.is_none() {
        return Err(ApiError::MalformedInput("CSV header must contain Firstname and Lastname".to_string()));
    }
    let (table_col, type_col) = (column("Table"), column("*Typ*"));

    let mut parsed = ParsedImport::default();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(e.to_string());
                continue;
            }
        };
        let line_no = record.position().map_or(0, |p| p.line() as usize);
        let field = |col: Option<usize>| col.and_then(|i| record.get(i)).map(clean_cell).unwrap_or_default();

        let guest_type = field(type_col);
        let Some((first_name, last_name)) = resolve_names(&field(first_col), &field(last_col), &guest_type) else {
            parsed.skipped += 1;
            continue;
        };

        let row = ImportRow {
            line: line_no,
            first_name,
            last_name,
            table_number: parse_table(&field(table_col)),
            guest_type,
        };
        if let Err(e) = check_row(&row) {
            log::warn!("Rejected import row: {}", e);
            parsed.errors.push(e);
            continue;
        }
        parsed.rows.push(row);
    }

    Ok(parsed)
}

/// Writes parsed rows through the repositories.
///
/// Every row creates a guest unless `update_existing` is set, in which case a
/// row whose normalized full name matches an existing guest (or an earlier row)
/// moves that guest to the row's table instead. Anonymous companions share the
/// same synthetic name, so names alone never cause a row to be dropped.
pub fn apply_import<S>(store: &mut S, parsed: ParsedImport, options: &ImportOptions) -> Result<ImportSummary, DbError>
where
    S: TableRepository + GuestRepository,
{
    let mut known: HashMap<String, Option<i32>> = HashMap::new();
    if options.update_existing {
        for g in store.find_guests(&GuestFilter::all())? {
            known.entry(full_name_key(&g.first_name, &g.last_name)).or_insert(Some(g.id));
        }
    }

    let mut summary = ImportSummary {
        dry_run: options.dry_run,
        skipped: parsed.skipped,
        errors: parsed.errors,
        ..ImportSummary::default()
    };

    for row in parsed.rows {
        let key = full_name_key(&row.first_name, &row.last_name);
        if let (true, Some(existing)) = (options.update_existing, known.get(&key)) {
            if let (Some(id), false) = (existing, options.dry_run) {
                store.set_table_number(*id, row.table_number)?;
            }
            log::info!("Line {}: updated {} {} -> {:?}", row.line, row.first_name, row.last_name, row.table_number);
            summary.updated += 1;
            continue;
        }

        let id = if options.dry_run {
            None
        } else {
            let guest = store.insert_guest(&NewGuest {
                first_name: row.first_name.clone(),
                last_name: row.last_name.clone(),
                phone_number: String::new(),
                table_number: row.table_number,
                guest_type: row.guest_type.clone(),
                confirmed: true,
            })?;
            Some(guest.id)
        };
        log::info!("Line {}: created {} {} -> {:?}", row.line, row.first_name, row.last_name, row.table_number);
        known.entry(key).or_insert(id);
        summary.created += 1;
    }

    summary.occupancy = occupancy_report(store)?;
    summary.unassigned = store.find_guests(&GuestFilter::unassigned())?.len();

    Ok(summary)
}
