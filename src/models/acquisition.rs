use async_graphql::{
    ComplexObject, Enum, InputValueError, InputValueResult, Scalar, ScalarType, SimpleObject,
    Value, ID,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_OFFSET: i64 = 0;

/// ISO-8601 date or date-time, exposed to the schema as `DateTime`
///
/// Values coming out of the data store are kept as the text the store produced.
/// Values coming in as query arguments must carry a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date of this value, if it parses as a date or date-time
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.0.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
            return Some(date_time.date_naive());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|date_time| date_time.date())
    }
}

#[Scalar(name = "DateTime")]
impl ScalarType for Timestamp {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(raw) = &value {
            let timestamp = Timestamp::new(raw.clone());
            if timestamp.date().is_some() {
                return Ok(timestamp);
            }
            return Err(InputValueError::custom(format!(
                "\"{}\" is not an ISO-8601 date or date-time",
                raw
            )));
        }
        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "AcquisitionSortField", rename_items = "snake_case")]
pub enum SortField {
    AcquiredAt,
    PriceAmount,
    AcquisitionId,
}

impl SortField {
    /// Output column the listing statement orders by
    pub fn column(&self) -> &'static str {
        match self {
            SortField::AcquiredAt => "acquired_at",
            SortField::PriceAmount => "price_amount",
            SortField::AcquisitionId => "acquisition_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Asc
    }
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Optional listing filters; empty strings count as absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionFilter {
    pub term_code: Option<String>,
    pub currency: Option<String>,
    pub acquired_from: Option<NaiveDate>,
    pub acquired_to: Option<NaiveDate>,
    pub acquiring_object_id: Option<String>,
    pub acquired_object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingArgs {
    pub filter: AcquisitionFilter,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
}

impl Default for ListingArgs {
    fn default() -> Self {
        Self {
            filter: AcquisitionFilter::default(),
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            sort_by: None,
            sort_order: SortOrder::Asc,
        }
    }
}

/// Company joined onto an acquisition; every field is null when the join found no match
#[derive(Debug, Clone, Default, PartialEq, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Company {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category_code: Option<String>,
    pub status: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Acquisition {
    pub id: ID,
    /// Unique ID of the acquisition
    pub acquisition_id: Option<String>,
    /// Acquiring entity unique ID
    pub acquiring_object_id: Option<String>,
    /// Acquired entity unique ID
    pub acquired_object_id: Option<String>,
    /// Type of payment used in the acquisition
    pub term_code: Option<String>,
    /// Amount paid
    pub price_amount: Option<f64>,
    /// Currency of the transaction
    pub price_currency_code: Option<String>,
    /// Date of the deal
    pub acquired_at: Option<Timestamp>,
    /// URL of the information source
    pub source_url: Option<String>,
    /// Short description of the information source
    pub source_description: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub acquiring_company: Company,
    pub acquired_company: Company,
}

#[ComplexObject]
impl Acquisition {
    /// Price and currency together, eg `100000 GBP`
    async fn price(&self) -> Option<String> {
        self.display_price()
    }
}

impl Acquisition {
    pub fn display_price(&self) -> Option<String> {
        match (self.price_amount, self.price_currency_code.as_deref()) {
            (Some(amount), Some(currency)) if !currency.is_empty() => {
                Some(format!("{} {}", amount, currency))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct CurrencyCount {
    pub currency: Option<String>,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, SimpleObject)]
pub struct AcquisitionMetadata {
    pub total_count: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_price: Option<f64>,
    pub sum_price: Option<f64>,
    pub earliest_date: Option<Timestamp>,
    pub latest_date: Option<Timestamp>,
    pub currency_counts: Vec<CurrencyCount>,
    pub distinct_acquiring_companies: Option<i64>,
    pub distinct_acquired_companies: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct AcquisitionsResult {
    pub rows: Vec<Acquisition>,
    pub metadata: AcquisitionMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquisition(price_amount: Option<f64>, currency: Option<&str>) -> Acquisition {
        Acquisition {
            id: ID("1".to_string()),
            acquisition_id: Some("1".to_string()),
            acquiring_object_id: None,
            acquired_object_id: None,
            term_code: None,
            price_amount,
            price_currency_code: currency.map(str::to_string),
            acquired_at: None,
            source_url: None,
            source_description: None,
            created_at: None,
            updated_at: None,
            acquiring_company: Company::default(),
            acquired_company: Company::default(),
        }
    }

    #[test]
    fn test_timestamp_accepts_dates_and_date_times() {
        let expected = NaiveDate::from_ymd_opt(2001, 1, 31);
        assert_eq!(Timestamp::new("2001-01-31").date(), expected);
        assert_eq!(Timestamp::new("2001-01-31T10:00:00Z").date(), expected);
        assert_eq!(Timestamp::new("2001-01-31T10:00:00").date(), expected);
        assert_eq!(Timestamp::new("2001-01-31 10:00:00.5").date(), expected);
        assert_eq!(Timestamp::new("OPTIONAL").date(), None);
    }

    #[test]
    fn test_timestamp_scalar_rejects_non_dates() {
        assert!(<Timestamp as ScalarType>::parse(Value::String("2001-01-01".into())).is_ok());
        assert!(<Timestamp as ScalarType>::parse(Value::String("soon".into())).is_err());
        assert!(<Timestamp as ScalarType>::parse(Value::Boolean(true)).is_err());
    }

    #[test]
    fn test_price_combines_amount_and_currency() {
        assert_eq!(
            acquisition(Some(100000.0), Some("GBP")).display_price(),
            Some("100000 GBP".to_string())
        );
        assert_eq!(acquisition(Some(100000.0), None).display_price(), None);
        assert_eq!(acquisition(None, Some("GBP")).display_price(), None);
        assert_eq!(acquisition(Some(100000.0), Some("")).display_price(), None);
    }

    #[test]
    fn test_listing_defaults() {
        let args = ListingArgs::default();
        assert_eq!(args.limit, 100);
        assert_eq!(args.offset, 0);
        assert_eq!(args.sort_order, SortOrder::Asc);
        assert!(args.sort_by.is_none());
    }
}
