//! Extraction of the totals and county tables from the source page.
//!
//! The page carries two tables with the `travelAdvisories` class. The first
//! holds statewide testing totals and the report timestamp label in its header;
//! the second holds the per-county breakdown. Both have a leading label row in
//! the body which is skipped. Any deviation from this layout is rejected rather
//! than returning a partial snapshot.

use scraper::{ElementRef, Html, Selector};

use super::error::{ParseError, Table};
use crate::models::{CountyRow, ScrapeSnapshot};

pub const TOTALS_TITLE: &str = "Maine COVID-19 Testing Data";
pub const COUNTY_TITLE: &str = "Confirmed and Recovered Case Counts by County";

const TOTALS_COLUMNS: usize = 2;
const COUNTY_COLUMNS: usize = 3;

fn selector(css: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::InvalidSelector(css))
}

/// Parse a full page into a snapshot.
pub fn parse_page(html: &str) -> Result<ScrapeSnapshot, ParseError> {
    let document = Html::parse_document(html);
    let tables: Vec<ElementRef> = document.select(&selector(".travelAdvisories")?).collect();

    let totals = tables.first().ok_or(ParseError::NoTables)?;
    let (confirmed, negative, report_date_string) = parse_totals(*totals)?;

    let county = tables
        .get(1)
        .ok_or(ParseError::MissingTable(Table::County))?;
    let county_rows = parse_counties(*county)?;

    Ok(ScrapeSnapshot::new(
        confirmed,
        negative,
        report_date_string,
        county_rows,
    ))
}

fn parse_totals(table: ElementRef) -> Result<(i64, i64, String), ParseError> {
    let header = header(table, Table::Totals)?;

    let title = header
        .select(&selector(".advisory")?)
        .next()
        .map(element_text)
        .unwrap_or_default();
    if normalize(&title) != TOTALS_TITLE {
        return Err(ParseError::UnexpectedTitle {
            table: Table::Totals,
            expected: TOTALS_TITLE,
            found: title.trim().to_string(),
        });
    }

    let report_date_string = header
        .select(&selector(".advisoryDt")?)
        .next()
        .map(|el| element_text(el).trim().to_string())
        .filter(|label| !label.is_empty())
        .ok_or(ParseError::MissingReportDate(Table::Totals))?;

    let rows = data_rows(table, Table::Totals, TOTALS_COLUMNS)?;
    let first = &rows[0];
    Ok((
        parse_count(&first[0])?,
        parse_count(&first[1])?,
        report_date_string,
    ))
}

fn parse_counties(table: ElementRef) -> Result<Vec<CountyRow>, ParseError> {
    let header = header(table, Table::County)?;

    let title = header
        .select(&selector(".advisoryDt")?)
        .next()
        .map(element_text)
        .unwrap_or_default();
    if normalize(&title) != COUNTY_TITLE {
        return Err(ParseError::UnexpectedTitle {
            table: Table::County,
            expected: COUNTY_TITLE,
            found: title.trim().to_string(),
        });
    }

    data_rows(table, Table::County, COUNTY_COLUMNS)?
        .into_iter()
        .map(|cells| {
            Ok(CountyRow::new(
                cells[0].trim(),
                parse_count(&cells[1])?,
                parse_count(&cells[2])?,
            ))
        })
        .collect()
}

fn header(table: ElementRef<'_>, which: Table) -> Result<ElementRef<'_>, ParseError> {
    table
        .select(&selector("thead")?)
        .next()
        .ok_or(ParseError::MissingHeader(which))
}

/// Cell texts of every body row after the label row. Each row must have
/// exactly `columns` cells and at least one row must exist.
fn data_rows(table: ElementRef, which: Table, columns: usize) -> Result<Vec<Vec<String>>, ParseError> {
    let body = table
        .select(&selector("tbody")?)
        .next()
        .ok_or(ParseError::MissingBody(which))?;

    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let mut rows = Vec::new();
    for (index, tr) in body.select(&row_selector).enumerate().skip(1) {
        let cells: Vec<String> = tr.select(&cell_selector).map(element_text).collect();
        if cells.len() != columns {
            return Err(ParseError::ColumnCount {
                table: which,
                row: index,
                expected: columns,
                found: cells.len(),
            });
        }
        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(ParseError::NoDataRows(which));
    }
    Ok(rows)
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Collapse runs of whitespace (including non-breaking spaces) to one space.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a published count.
///
/// Thousands separators are stripped; a cell that is empty or only
/// (non-breaking) whitespace counts as zero.
pub fn parse_count(raw: &str) -> Result<i64, ParseError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    cleaned
        .parse()
        .map_err(|_| ParseError::InvalidNumber(raw.trim().to_string()))
}
