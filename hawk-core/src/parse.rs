//! Parsers for the line-oriented probe contracts.
//!
//! Lines that do not match the expected shape are dropped silently.

use crate::state::{CommandCatalogEntry, EndpointHealth};

pub const CATALOG_DELIMITER: char = '|';
pub const HEALTH_DELIMITER: char = '\t';

/// `id|title|runner|description`, at most three splits so the
/// description may itself contain `|`. Empty title, runner or description
/// are kept; an empty id is not, since it cannot be run.
pub fn parse_catalog(output: &str) -> Vec<CommandCatalogEntry> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(4, CATALOG_DELIMITER).map(str::trim).collect();
            match parts.as_slice() {
                [id, title, runner, description] if !id.is_empty() => Some(CommandCatalogEntry {
                    id: id.to_string(),
                    title: title.to_string(),
                    runner: runner.to_string(),
                    description: description.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// `endpoint<TAB>status<TAB>latency<TAB>source`. Status is upper-cased;
/// tabs past the third stay in the source field.
pub fn parse_health(output: &str) -> Vec<EndpointHealth> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(4, HEALTH_DELIMITER).map(str::trim).collect();
            match parts.as_slice() {
                [endpoint, status, latency, source] => Some(EndpointHealth {
                    endpoint: endpoint.to_string(),
                    status: status.to_uppercase(),
                    latency: latency.to_string(),
                    source: source.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Every non-blank line, verbatim
pub fn parse_streams(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_requires_four_fields() {
        let out = "build|Build Service|shell|Builds the service\n\
                   broken|only three|fields\n\
                   \n\
                   deploy | Deploy | awk | ships it | with pipes";
        let rows = parse_catalog(out);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            CommandCatalogEntry {
                id: "build".into(),
                title: "Build Service".into(),
                runner: "shell".into(),
                description: "Builds the service".into(),
            }
        );
        assert_eq!(rows[1].id, "deploy");
        assert_eq!(rows[1].description, "ships it | with pipes");
    }

    #[test]
    fn test_catalog_keeps_empty_fields() {
        let rows = parse_catalog("x|||");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "x");
        assert!(rows[0].title.is_empty());
        assert!(rows[0].description.is_empty());
    }

    #[test]
    fn test_catalog_drops_empty_id() {
        let rows = parse_catalog("|Orphan|shell|no id\n  |x|y|z\nok|Ok|shell|");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "ok");
    }

    #[test]
    fn test_health_classification() {
        let out = "svcA\tSERVING\t12ms\tprobe1\nsvcB\tDOWN\t--\tprobe1\nsvcC\tserving\t3ms\tp2";
        let rows = parse_health(out);

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_serving());
        assert_eq!(rows[1].status, "DOWN");
        assert!(!rows[1].is_serving());
        assert!(rows[2].is_serving());
    }

    #[test]
    fn test_health_drops_short_lines() {
        let rows = parse_health("svcA\tSERVING\t12ms\nnot a row");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_health_not_serving_is_bad() {
        let rows = parse_health("svc\tNOT_SERVING\t9ms\tgrpc");
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_serving());
    }

    #[test]
    fn test_streams_skip_blank_lines() {
        let rows = parse_streams("orders  lag=3\n\n   \npayments lag=0");
        assert_eq!(rows, vec!["orders  lag=3", "payments lag=0"]);
    }
}
