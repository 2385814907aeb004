// Statement builders for the acquisitions listing and its aggregates
//
// Every user-supplied value is bound as a positional parameter. Column names,
// sort keys and sort directions come from static text only.

use crate::models::{AcquisitionFilter, ListingArgs};
use crate::services::database::SqlParam;

const ACQUISITION_COLUMNS: &str = "SELECT \
a.id, a.acquisition_id, a.acquiring_object_id, a.acquired_object_id, a.term_code, \
a.price_amount::float8 AS price_amount, a.price_currency_code, a.acquired_at, \
a.source_url, a.source_description, a.created_at, a.updated_at, \
acquired.id AS acquired_id, acquired.name AS acquired_name, acquired.category_code AS acquired_category, \
acquired.status AS acquired_status, acquired.country_code AS acquired_country, \
acquiring.id AS acquiring_id, acquiring.name AS acquiring_name, acquiring.category_code AS acquiring_category, \
acquiring.status AS acquiring_status, acquiring.country_code AS acquiring_country \
FROM acquisitions a \
LEFT JOIN companies acquired ON a.acquired_object_id = acquired.id \
LEFT JOIN companies acquiring ON a.acquiring_object_id = acquiring.id";

/// SQL text plus the values for its `$n` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Ordered WHERE fragments and their bound values, shared by every statement of a plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl PredicateSet {
    /// Build fragments in the fixed field order: term_code, currency, acquired_from,
    /// acquired_to, acquiring_object_id, acquired_object_id
    pub fn from_filter(filter: &AcquisitionFilter) -> Self {
        let mut set = Self::default();

        if let Some(term_code) = non_empty(&filter.term_code) {
            set.push("term_code =", SqlParam::from(term_code));
        }
        if let Some(currency) = non_empty(&filter.currency) {
            set.push("price_currency_code =", SqlParam::from(currency));
        }
        if let Some(acquired_from) = filter.acquired_from {
            set.push("acquired_at >=", SqlParam::from(acquired_from));
        }
        if let Some(acquired_to) = filter.acquired_to {
            set.push("acquired_at <=", SqlParam::from(acquired_to));
        }
        if let Some(acquiring) = non_empty(&filter.acquiring_object_id) {
            set.push("acquiring_object_id =", SqlParam::from(acquiring));
        }
        if let Some(acquired) = non_empty(&filter.acquired_object_id) {
            set.push("acquired_object_id =", SqlParam::from(acquired));
        }

        set
    }

    fn push(&mut self, column_and_operator: &str, value: SqlParam) {
        let index = self.next_param_index();
        self.conditions
            .push(format!("{} ${}", column_and_operator, index));
        self.params.push(value);
    }

    #[cfg(test)]
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 1-based index the next placeholder should use
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }

    /// `WHERE a AND b`, or an empty string when there are no filters
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// The shared predicate plus one extra condition
    fn where_clause_with(&self, extra: &str) -> String {
        if self.is_empty() {
            format!(" WHERE {}", extra)
        } else {
            format!("{} AND {}", self.where_clause(), extra)
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// The four statements behind one listing request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub listing: Statement,
    pub stats: Statement,
    pub currency: Statement,
    pub company_counts: Statement,
}

pub fn build_query_plan(args: &ListingArgs) -> QueryPlan {
    let predicates = PredicateSet::from_filter(&args.filter);
    tracing::debug!("Acquisitions query - values: {:?}", predicates.params());

    QueryPlan {
        listing: build_listing_statement(&predicates, args),
        stats: build_stats_statement(&predicates),
        currency: build_currency_statement(&predicates),
        company_counts: build_company_count_statement(&predicates),
    }
}

pub fn build_listing_statement(predicates: &PredicateSet, args: &ListingArgs) -> Statement {
    let order_clause = match args.sort_by {
        Some(sort_by) => format!(
            "ORDER BY {} {}, id ASC",
            sort_by.column(),
            args.sort_order.keyword()
        ),
        None => "ORDER BY id".to_string(),
    };

    let limit_index = predicates.next_param_index();
    let sql = format!(
        "{}{} {} LIMIT ${} OFFSET ${}",
        ACQUISITION_COLUMNS,
        predicates.where_clause(),
        order_clause,
        limit_index,
        limit_index + 1
    );

    let mut params = predicates.params().to_vec();
    params.push(SqlParam::from(args.limit));
    params.push(SqlParam::from(args.offset));

    Statement { sql, params }
}

pub fn build_stats_statement(predicates: &PredicateSet) -> Statement {
    let sql = format!(
        "SELECT COUNT(*) AS total, MIN(price_amount)::float8 AS min, MAX(price_amount)::float8 AS max, \
AVG(price_amount)::float8 AS avg, SUM(price_amount)::float8 AS sum, \
MIN(acquired_at) AS earliest_date, MAX(acquired_at) AS latest_date \
FROM acquisitions{}",
        predicates.where_clause_with("price_amount IS NOT NULL")
    );

    Statement {
        sql,
        params: predicates.params().to_vec(),
    }
}

pub fn build_currency_statement(predicates: &PredicateSet) -> Statement {
    let sql = format!(
        "SELECT price_currency_code, COUNT(*) AS count FROM acquisitions{} GROUP BY price_currency_code",
        predicates.where_clause()
    );

    Statement {
        sql,
        params: predicates.params().to_vec(),
    }
}

pub fn build_company_count_statement(predicates: &PredicateSet) -> Statement {
    let sql = format!(
        "SELECT COUNT(DISTINCT acquiring_object_id) AS distinct_acquiring_companies, \
COUNT(DISTINCT acquired_object_id) AS distinct_acquired_companies FROM acquisitions{}",
        predicates.where_clause()
    );

    Statement {
        sql,
        params: predicates.params().to_vec(),
    }
}

/// Single acquisition by numeric id
pub fn build_lookup_statement(id: i64) -> Statement {
    Statement {
        sql: format!("{} WHERE a.id = $1", ACQUISITION_COLUMNS),
        params: vec![SqlParam::from(id)],
    }
}
