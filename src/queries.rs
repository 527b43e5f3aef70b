use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// The two per-1000m measures a grouped route can average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Days,
    Cost,
}

impl Metric {
    /// Fixed column identifier. Only these two strings ever reach SQL.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Days => "Days_per_1000m",
            Metric::Cost => "Cost_per_1000m",
        }
    }

    pub fn avg_key(self) -> &'static str {
        match self {
            Metric::Days => "avg_days",
            Metric::Cost => "avg_cost",
        }
    }
}

impl FromStr for Metric {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(Metric::Days),
            "cost" => Ok(Metric::Cost),
            _ => Err(ApiError::InvalidColumn),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Days => "days",
            Metric::Cost => "cost",
        })
    }
}

/// What a grouped route slices the wells by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Era,
    WellType,
    Region,
    Year,
}

impl Dimension {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "era" => Some(Dimension::Era),
            "well_type" => Some(Dimension::WellType),
            "region" => Some(Dimension::Region),
            "year" => Some(Dimension::Year),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Dimension::Era => "era",
            Dimension::WellType => "well_type",
            Dimension::Region => "region",
            Dimension::Year => "year",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Dimension::Era => "Era",
            Dimension::WellType => "Well_Type",
            Dimension::Region => "Region",
            Dimension::Year => "Year",
        }
    }

    /// Two-column query: the dimension label and the metric average.
    /// Every grouping except year sorts by the average, highest first.
    pub fn grouped_avg_sql(self, metric: Metric) -> String {
        let column = metric.column();
        let alias = metric.avg_key();
        match self {
            Dimension::Era => format!(
                r#"
                SELECT b.Era, CAST(AVG(a.{column}) AS DOUBLE PRECISION) AS {alias}
                FROM WellsDataTable a
                LEFT JOIN AgeDim b ON UPPER(a.Age) = UPPER(b.Age)
                GROUP BY b.Era
                ORDER BY {alias} DESC"#
            ),
            Dimension::WellType => format!(
                r#"
                SELECT b.Well_Type_Name, CAST(AVG(a.{column}) AS DOUBLE PRECISION) AS {alias}
                FROM WellsDataTable a
                LEFT JOIN WellTypeDim b ON UPPER(a.Well_Type) = UPPER(b.Well_Type)
                GROUP BY b.Well_Type_Name
                ORDER BY {alias} DESC"#
            ),
            Dimension::Region => format!(
                r#"
                SELECT a.Region, CAST(AVG(a.{column}) AS DOUBLE PRECISION) AS {alias}
                FROM WellsDataTable a
                GROUP BY a.Region
                ORDER BY {alias} DESC"#
            ),
            Dimension::Year => format!(
                r#"
                SELECT a.Year, CAST(AVG(a.{column}) AS DOUBLE PRECISION) AS {alias}
                FROM WellsDataTable a
                GROUP BY a.Year"#
            ),
        }
    }
}

/// A `/api/{column}_per_{dimension}` route after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedRoute {
    pub metric: Metric,
    pub dimension: Dimension,
}

impl GroupedRoute {
    /// Unknown dimensions are `NotFound`; a known dimension with a column
    /// other than `days`/`cost` is `InvalidColumn`.
    pub fn parse(endpoint: &str) -> Result<Self, ApiError> {
        let (column, suffix) = endpoint.rsplit_once("_per_").ok_or(ApiError::NotFound)?;
        let dimension = Dimension::from_suffix(suffix).ok_or(ApiError::NotFound)?;
        if column.is_empty() {
            return Err(ApiError::NotFound);
        }
        let metric = column.parse()?;
        Ok(Self { metric, dimension })
    }

    pub fn sql(&self) -> String {
        self.dimension.grouped_avg_sql(self.metric)
    }

    /// Canonical path of the route, independent of how the request spelled it.
    pub fn cache_key(&self) -> String {
        format!("/api/{}_per_{}", self.metric, self.dimension.suffix())
    }
}

pub const TOTAL_WELLS_KEY: &str = "/api/total_wells";
pub const AVG_DAYS_KEY: &str = "/api/avg_days";
pub const SUMMARY_STATS_KEY: &str = "/api/summary_stats";

pub const TOTAL_WELLS_SQL: &str =
    "SELECT CAST(SUM(Number_of_Wells) AS BIGINT) AS total_wells FROM WellsDataTable";

pub const AVG_DAYS_SQL: &str =
    "SELECT CAST(AVG(Days_per_1000m) AS DOUBLE PRECISION) AS avg_days FROM WellsDataTable";

pub const SUMMARY_STATS_SQL: &str = r#"
    SELECT
        CAST(SUM(Number_of_Wells) AS BIGINT) AS total_wells,
        CAST(AVG(Cost_per_1000m) AS DOUBLE PRECISION) AS avg_cost,
        CAST(AVG(Days_per_1000m) AS DOUBLE PRECISION) AS avg_days
    FROM WellsDataTable"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_allow_list() {
        assert_eq!("days".parse::<Metric>().unwrap(), Metric::Days);
        assert_eq!("cost".parse::<Metric>().unwrap(), Metric::Cost);

        for rejected in ["Days", "COST", "depth", "", "days; DROP TABLE WellsDataTable"] {
            assert!(
                matches!(rejected.parse::<Metric>(), Err(ApiError::InvalidColumn)),
                "'{rejected}' should be rejected"
            );
        }
    }

    #[test]
    fn test_metric_columns() {
        assert_eq!(Metric::Days.column(), "Days_per_1000m");
        assert_eq!(Metric::Cost.column(), "Cost_per_1000m");
        assert_eq!(Metric::Days.avg_key(), "avg_days");
        assert_eq!(Metric::Cost.avg_key(), "avg_cost");
        assert_eq!(Metric::Cost.to_string(), "cost");
    }

    #[test]
    fn test_parse_grouped_routes() {
        let cases = [
            ("days_per_era", Metric::Days, Dimension::Era),
            ("cost_per_era", Metric::Cost, Dimension::Era),
            ("days_per_well_type", Metric::Days, Dimension::WellType),
            ("cost_per_region", Metric::Cost, Dimension::Region),
            ("days_per_year", Metric::Days, Dimension::Year),
        ];
        for (endpoint, metric, dimension) in cases {
            assert_eq!(
                GroupedRoute::parse(endpoint).unwrap(),
                GroupedRoute { metric, dimension },
                "Failed for endpoint: {endpoint}"
            );
        }
    }

    #[test]
    fn test_parse_invalid_column() {
        for endpoint in ["depth_per_era", "x_per_y_per_region", "DAYS_per_year"] {
            assert!(
                matches!(GroupedRoute::parse(endpoint), Err(ApiError::InvalidColumn)),
                "Expected invalid column for: {endpoint}"
            );
        }
    }

    #[test]
    fn test_parse_unknown_route() {
        for endpoint in ["days_per_galaxy", "days", "total", "_per_era", "days_per_"] {
            assert!(
                matches!(GroupedRoute::parse(endpoint), Err(ApiError::NotFound)),
                "Expected not found for: {endpoint}"
            );
        }
    }

    #[test]
    fn test_cache_key_is_canonical() {
        let route = GroupedRoute::parse("cost_per_well_type").unwrap();
        assert_eq!(route.cache_key(), "/api/cost_per_well_type");

        for dimension in [Dimension::Era, Dimension::WellType, Dimension::Region, Dimension::Year] {
            assert_eq!(Dimension::from_suffix(dimension.suffix()), Some(dimension));
        }
    }

    #[test]
    fn test_grouped_sql_uses_fixed_identifiers() {
        let sql = Dimension::Era.grouped_avg_sql(Metric::Cost);
        assert!(sql.contains("AVG(a.Cost_per_1000m)"));
        assert!(sql.contains("AS avg_cost"));
        assert!(sql.contains("UPPER(a.Age) = UPPER(b.Age)"));
        assert!(sql.contains("ORDER BY avg_cost DESC"));

        let sql = Dimension::WellType.grouped_avg_sql(Metric::Days);
        assert!(sql.contains("UPPER(a.Well_Type) = UPPER(b.Well_Type)"));
        assert!(sql.contains("GROUP BY b.Well_Type_Name"));
    }

    #[test]
    fn test_only_year_is_unordered() {
        for metric in [Metric::Days, Metric::Cost] {
            assert!(!Dimension::Year.grouped_avg_sql(metric).contains("ORDER BY"));
            for dimension in [Dimension::Era, Dimension::WellType, Dimension::Region] {
                assert!(dimension.grouped_avg_sql(metric).contains("DESC"));
            }
        }
    }
}
