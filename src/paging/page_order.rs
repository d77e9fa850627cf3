use super::error::PagingError;
use super::types::{SortDirection, SortOrder, SortProperty};

pub struct PageOrder;

impl PageOrder {
    /// Parse one or more `sort` parameter values.
    ///
    /// Each value is `prop[,prop...][,asc|desc]`; the trailing direction applies
    /// to every property in that value. Values are concatenated in order.
    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Result<Vec<SortOrder>, PagingError> {
        let mut out = Vec::new();
        for v in values {
            out.extend(Self::parse_sort_param(v.as_ref())?);
        }
        Ok(out)
    }

    pub fn parse_sort_param(s: &str) -> Result<Vec<SortOrder>, PagingError> {
        let mut tokens: Vec<&str> = s.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();

        let direction = match tokens.last().and_then(|t| SortDirection::parse(t)) {
            Some(dir) => {
                tokens.pop();
                dir
            }
            None => SortDirection::Asc,
        };

        tokens
            .into_iter()
            .map(|t| {
                Ok(SortOrder {
                    property: t.parse::<SortProperty>()?,
                    direction,
                })
            })
            .collect()
    }

    /// Build an ORDER BY clause. Ties always fall back to ascending id.
    pub fn generate(orders: &[SortOrder]) -> String {
        let mut parts: Vec<String> = orders
            .iter()
            .map(|o| format!("\"{}\" {}", o.property.column(), o.direction.to_sql()))
            .collect();
        if !orders.iter().any(|o| o.property == SortProperty::Id) {
            parts.push("\"id\" ASC".to_string());
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}
