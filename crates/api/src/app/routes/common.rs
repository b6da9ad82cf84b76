use core::str::FromStr;

use hireflow_core::DomainError;

use crate::app::errors::ApiError;

/// Parse a path or body identifier, reporting `field` on failure.
pub fn parse_id<T>(raw: &str, field: &'static str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("{field} is not a valid identifier")))
}

pub fn parse_optional_id<T>(raw: Option<&str>, field: &'static str) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(|r| parse_id(r, field)).transpose()
}

#[cfg(test)]
mod tests {
    use hireflow_core::JobId;

    use super::*;

    #[test]
    fn rejects_malformed_ids_with_the_field_name() {
        let id = JobId::new();
        assert_eq!(parse_id::<JobId>(&id.to_string(), "job_id").unwrap(), id);
        let err = parse_id::<JobId>("not-a-uuid", "job_id").unwrap_err();
        assert!(err.to_string().contains("job_id"));
        assert_eq!(parse_optional_id::<JobId>(None, "job_id").unwrap(), None);
    }
}
