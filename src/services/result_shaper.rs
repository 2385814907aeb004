// Turns data-store rows into acquisition records and listing metadata
use crate::models::{
    Acquisition, AcquisitionMetadata, Company, CurrencyCount, Timestamp,
};
use crate::services::database::Row;
use async_graphql::ID;
use serde_json::Value;

/// Null-propagating numeric coercion: absent or null stays `None`, numbers and
/// numeric strings become numbers, anything else becomes `None`
pub fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Integer variant of [`coerce_f64`]; integral floats are accepted
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Text value of a column; numbers are rendered, null stays `None`
pub fn text_field(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn timestamp_field(row: &Row, field: &str) -> Option<Timestamp> {
    text_field(row, field).map(Timestamp::new)
}

fn company(row: &Row, prefix: &str) -> Company {
    Company {
        id: text_field(row, &format!("{}_id", prefix)),
        name: text_field(row, &format!("{}_name", prefix)),
        category_code: text_field(row, &format!("{}_category", prefix)),
        status: text_field(row, &format!("{}_status", prefix)),
        country_code: text_field(row, &format!("{}_country", prefix)),
    }
}

/// Flat listing row plus its two joined companies
pub fn shape_acquisition(row: &Row) -> Acquisition {
    Acquisition {
        id: ID(text_field(row, "id").unwrap_or_default()),
        acquisition_id: text_field(row, "acquisition_id"),
        acquiring_object_id: text_field(row, "acquiring_object_id"),
        acquired_object_id: text_field(row, "acquired_object_id"),
        term_code: text_field(row, "term_code"),
        price_amount: coerce_f64(row.get("price_amount")),
        price_currency_code: text_field(row, "price_currency_code"),
        acquired_at: timestamp_field(row, "acquired_at"),
        source_url: text_field(row, "source_url"),
        source_description: text_field(row, "source_description"),
        created_at: timestamp_field(row, "created_at"),
        updated_at: timestamp_field(row, "updated_at"),
        acquiring_company: company(row, "acquiring"),
        acquired_company: company(row, "acquired"),
    }
}

/// Combine the three aggregate results into listing metadata
///
/// Only the first row of the stats and company results is read. A missing row
/// leaves every field it would have supplied as `None`.
pub fn shape_metadata(
    stats_rows: &[Row],
    currency_rows: &[Row],
    company_rows: &[Row],
) -> AcquisitionMetadata {
    let stats = stats_rows.first();
    let companies = company_rows.first();
    let stat = |field: &str| stats.and_then(|row| row.get(field));
    let company_count = |field: &str| companies.and_then(|row| row.get(field));

    AcquisitionMetadata {
        total_count: coerce_i64(stat("total")),
        min_price: coerce_f64(stat("min")),
        max_price: coerce_f64(stat("max")),
        avg_price: coerce_f64(stat("avg")),
        sum_price: coerce_f64(stat("sum")),
        earliest_date: stats.and_then(|row| timestamp_field(row, "earliest_date")),
        latest_date: stats.and_then(|row| timestamp_field(row, "latest_date")),
        currency_counts: currency_rows
            .iter()
            .map(|row| CurrencyCount {
                currency: text_field(row, "price_currency_code"),
                count: coerce_i64(row.get("count")),
            })
            .collect(),
        distinct_acquiring_companies: coerce_i64(company_count("distinct_acquiring_companies")),
        distinct_acquired_companies: coerce_i64(company_count("distinct_acquired_companies")),
    }
}
