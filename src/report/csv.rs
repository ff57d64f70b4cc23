//! CSV export of a group's expense ledger, and the export file names.

use time::Date;

use crate::{Error, expense::ExpenseRecord};

/// The header row of the expense CSV export.
pub const CSV_HEADER: [&str; 6] = ["Date", "Member", "Email", "Category", "Description", "Amount"];

/// Render the expense ledger as CSV text.
///
/// Every field is quoted, with embedded quotes doubled, so descriptions
/// containing commas, quotes or newlines survive a round-trip through any
/// spreadsheet tool. Amounts are written with exactly two decimal places.
pub fn expenses_csv(expenses: &[ExpenseRecord]) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for expense in expenses {
        writer
            .write_record([
                expense.expense_date.to_string(),
                expense.paid_by_name.clone(),
                expense.paid_by_email.clone(),
                expense.category.clone(),
                expense.description.clone(),
                format!("{:.2}", expense.amount),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}

/// Make a trip name safe for use in a download file name.
///
/// Whitespace runs become single dashes; anything outside ASCII letters,
/// digits, dashes and underscores is dropped.
pub fn sanitize_trip_name(trip_name: &str) -> String {
    let dashed = trip_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    dashed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// The download file name for a trip log, e.g. `trip-log-Japan-2026-2026-03-10.html`.
pub fn trip_log_filename(trip_name: &str, generated_on: Date) -> String {
    format!(
        "trip-log-{}-{}.html",
        sanitize_trip_name(trip_name),
        generated_on
    )
}

/// The download file name for a CSV export, e.g. `expenses-2026-03-10.csv`.
pub fn csv_filename(generated_on: Date) -> String {
    format!("expenses-{generated_on}.csv")
}
