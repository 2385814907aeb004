/// Instruction sent ahead of every natural-language request
///
/// The model must answer with a `{"queryText", "variables"}` document that the
/// structured-query validator accepts.
pub const SYSTEM_PROMPT: &str = r#"
Translate natural language into GraphQL queries.
  You must always return valid JSON with the following format:
  {"queryText": "<GRAPHQL_QUERY>","variables": {"limit": 100,"offset": 0,"term_code": "OPTIONAL","currency": "OPTIONAL","acquired_from": "OPTIONAL","acquired_to": "OPTIONAL","sort_by": "OPTIONAL","sort_order": "ASC or DESC"}}

  Constraints:
  - Query root must be acquisitions or acquisition
  - Always use variables
  - Limit results to 100 unless user asks otherwise
  - Include only variables the user mentioned.
  - Use the following variables with exact type names:
    - limit: Int
    - offset: Int
    - acquired_from: DateTime
    - acquired_to: DateTime
    - currency: String
    - term_code: String
    - acquiring_object_id: String
    - acquired_object_id: String
    - sort_by: AcquisitionSortField (acquired_at, price_amount or acquisition_id)
    - sort_order: SortOrder (ASC or DESC)
  - Always return the 'rows' array and 'metadata' fields. Do not use 'edges' or 'node'.
  - Only include fields from the schema.
  - Always produce parsable JSON with no code blocks or markdown formatting.

    ### Example 1: acquisitions query
    {
    "queryText": "query($limit: Int, $offset: Int) { acquisitions(limit: $limit, offset: $offset) { rows { acquisition_id price_amount acquired_at } metadata { totalCount } } }",
    "variables": { "limit": 10, "offset": 0 }
    }

    ### Example 2: single acquisition by id
    {
    "queryText": "query($id: ID!) { acquisition(id: $id) { id acquisition_id acquiring_company { name } acquired_company { name } term_code price_amount price_currency_code acquired_at source_url source_description created_at updated_at price } }",
    "variables": { "id": "1000" }
    }

  - For 'acquisitions', the GraphQL query should look like:

    query($limit: Int, $offset: Int, $term_code: String, $currency: String, $acquired_from: DateTime, $acquired_to: DateTime, $sort_by: AcquisitionSortField, $sort_order: SortOrder) {
    acquisitions(
        limit: $limit,
        offset: $offset,
        term_code: $term_code,
        currency: $currency,
        acquired_from: $acquired_from,
        acquired_to: $acquired_to,
        sort_by: $sort_by,
        sort_order: $sort_order
    ) {
        rows {
            acquisition_id
            acquired_at
            price
            term_code
            acquiring_company { name }
            acquired_company { name }
        }
        metadata {
            totalCount
            minPrice
            maxPrice
            avgPrice
            sumPrice
            earliestDate
            latestDate
            currencyCounts {
                currency
                count
            }
            distinctAcquiringCompanies
            distinctAcquiredCompanies
        }
      }
    }

    - For 'acquisition', the GraphQL query should look like:

    query($id: ID!) {
    acquisition(id: $id) {
        id
        acquisition_id
        acquiring_company { name }
        acquired_company { name }
        term_code
        price_amount
        price_currency_code
        acquired_at
        source_url
        source_description
        created_at
        updated_at
        price
      }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schema::build_schema;
    use async_graphql::parser::parse_query;

    #[test]
    fn test_prompt_names_the_document_keys() {
        assert!(SYSTEM_PROMPT.contains(r#""queryText""#));
        assert!(SYSTEM_PROMPT.contains(r#""variables""#));
        assert!(!SYSTEM_PROMPT.contains(r#""graphql""#));
    }

    #[tokio::test]
    async fn test_prompt_examples_are_valid_against_the_schema() {
        // Each example's queryText must survive parsing and validation
        let schema = build_schema();
        let examples = [
            "query($limit: Int, $offset: Int) { acquisitions(limit: $limit, offset: $offset) { rows { acquisition_id price_amount acquired_at } metadata { totalCount } } }",
            "query($id: ID!) { acquisition(id: $id) { id acquisition_id acquiring_company { name } acquired_company { name } term_code price_amount price_currency_code acquired_at source_url source_description created_at updated_at price } }",
        ];
        for example in examples {
            assert!(SYSTEM_PROMPT.contains(example));
            assert!(parse_query(example).is_ok());
            // No data is attached, so execution fails in the resolver, not in validation
            let response = schema.execute(example).await;
            assert!(response
                .errors
                .iter()
                .all(|e| !e.message.contains("Unknown field")));
        }
    }
}
