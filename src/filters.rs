// ABOUTME: Allow-list filter builder for attribute searches
// ABOUTME: Resolves caller column/operator names to static SQL fragments with a bound value

use crate::error::DataError;
use crate::utils::sanitize_identifier;
use tokio_postgres::types::ToSql;

/// How a column's values compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

/// A closed set of columns an entity may be filtered on
///
/// Implementors are plain enums; the column spelling that reaches SQL is a
/// `&'static str` chosen by the enum, never the caller's input.
pub trait FilterColumn: Sized + Copy + 'static {
    /// The allow-list
    const ALL: &'static [Self];

    fn column_name(self) -> &'static str;

    fn kind(self) -> ColumnKind;

    /// Look up a caller-supplied attribute name in the allow-list
    fn parse_column(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.column_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftColumn {
    AircraftId,
    IcaoCode,
    Registration,
    Name,
    Manufacturer,
    Model,
}

impl FilterColumn for AircraftColumn {
    const ALL: &'static [Self] = &[
        AircraftColumn::AircraftId,
        AircraftColumn::IcaoCode,
        AircraftColumn::Registration,
        AircraftColumn::Name,
        AircraftColumn::Manufacturer,
        AircraftColumn::Model,
    ];

    fn column_name(self) -> &'static str {
        match self {
            AircraftColumn::AircraftId => "aircraftid",
            AircraftColumn::IcaoCode => "icaocode",
            AircraftColumn::Registration => "aircraftregistration",
            AircraftColumn::Name => "name",
            AircraftColumn::Manufacturer => "manufacturer",
            AircraftColumn::Model => "model",
        }
    }

    fn kind(self) -> ColumnKind {
        match self {
            AircraftColumn::AircraftId => ColumnKind::Integer,
            _ => ColumnKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    UserId,
    FirstName,
    LastName,
    UserRoleId,
}

impl FilterColumn for UserColumn {
    const ALL: &'static [Self] = &[
        UserColumn::UserId,
        UserColumn::FirstName,
        UserColumn::LastName,
        UserColumn::UserRoleId,
    ];

    fn column_name(self) -> &'static str {
        match self {
            UserColumn::UserId => "userid",
            UserColumn::FirstName => "firstname",
            UserColumn::LastName => "lastname",
            UserColumn::UserRoleId => "userroleid",
        }
    }

    fn kind(self) -> ColumnKind {
        match self {
            UserColumn::UserRoleId => ColumnKind::Integer,
            _ => ColumnKind::Text,
        }
    }
}

/// Comparison operators a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    LessThan,
    GreaterThan,
    NotEqual,
    /// Case-insensitive "contains"
    Like,
    /// Case-insensitive regular expression match
    Matches,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Equal,
        FilterOperator::LessThan,
        FilterOperator::GreaterThan,
        FilterOperator::NotEqual,
        FilterOperator::Like,
        FilterOperator::Matches,
    ];

    /// Accepts `=`, `<`, `>`, `<>`, `LIKE` (any case) and `~`
    pub fn parse(operator: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol().eq_ignore_ascii_case(operator))
    }

    /// Spelling a caller uses to request this operator
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOperator::Matches => "~",
            other => other.sql(),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::LessThan => "<",
            FilterOperator::GreaterThan => ">",
            FilterOperator::NotEqual => "<>",
            FilterOperator::Like => "LIKE",
            FilterOperator::Matches => "~*",
        }
    }
}

/// A value bound as a positional parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

impl SqlValue {
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlValue::Text(text) => text as &(dyn ToSql + Sync),
            SqlValue::Integer(n) => n as &(dyn ToSql + Sync),
        }
    }
}

/// A validated WHERE fragment whose only parameter is `$1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    clause: String,
    param: SqlValue,
}

impl SqlFilter {
    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn param(&self) -> &SqlValue {
        &self.param
    }
}

fn allowed_operators() -> String {
    FilterOperator::ALL
        .iter()
        .map(|op| op.symbol())
        .collect::<Vec<_>>()
        .join(", ")
}

fn reject_attribute(attribute: &str) -> String {
    let attribute = sanitize_identifier(attribute);
    tracing::warn!("Rejected filter attribute '{}'", attribute);
    format!("Invalid attribute name '{}'", attribute)
}

fn integer_value(name: &str, value: &str) -> Result<i64, DataError> {
    value.trim().parse::<i64>().map_err(|_| {
        DataError::Validation(vec![format!(
            "Value for '{}' must be a whole number",
            name
        )])
    })
}

/// Build an exact `col = $1` fragment
///
/// Unlike `=` in [`build_filter`], text is compared case-sensitively, so a
/// lookup on a key column matches only that key.
///
/// # Errors
///
/// Returns [`DataError::Validation`] if the attribute is not in `C`'s
/// allow-list or an integer column is given a non-numeric value.
pub fn build_equality<C: FilterColumn>(
    attribute: &str,
    value: &str,
) -> Result<SqlFilter, DataError> {
    let column = C::parse_column(attribute)
        .ok_or_else(|| DataError::Validation(vec![reject_attribute(attribute)]))?;

    let name = column.column_name();
    let param = match column.kind() {
        ColumnKind::Text => SqlValue::Text(value.to_string()),
        ColumnKind::Integer => SqlValue::Integer(integer_value(name, value)?),
    };

    Ok(SqlFilter {
        clause: format!("{} = $1", name),
        param,
    })
}

/// Build a WHERE fragment from caller-supplied attribute, operator and value
///
/// The attribute must be in `C`'s allow-list and the operator in
/// [`FilterOperator::parse`]'s. Only their static spellings are written into
/// the fragment; the value is always bound as `$1`.
///
/// Fragment shapes:
/// - text column, comparison: `lower(col) OP lower($1)`
/// - integer column, comparison: `col OP $1` (value must parse as `i64`)
/// - `LIKE`: `lower(col::text) LIKE lower($1)`, value bound as `%value%`
/// - `~`: `col::text ~* $1`
///
/// # Errors
///
/// Returns [`DataError::Validation`] listing every rejected input.
///
/// # Examples
///
/// ```
/// # use fleet_records::filters::{build_filter, UserColumn, SqlValue};
/// let filter = build_filter::<UserColumn>("lastname", "LIKE", "smi").unwrap();
/// assert_eq!(filter.clause(), "lower(lastname::text) LIKE lower($1)");
/// assert_eq!(filter.param(), &SqlValue::Text("%smi%".to_string()));
///
/// assert!(build_filter::<UserColumn>("userroleid; DROP TABLE users", "=", "1").is_err());
/// ```
pub fn build_filter<C: FilterColumn>(
    attribute: &str,
    operator: &str,
    value: &str,
) -> Result<SqlFilter, DataError> {
    let column = C::parse_column(attribute);
    let op = FilterOperator::parse(operator);

    let mut violations = Vec::new();
    if column.is_none() {
        violations.push(reject_attribute(attribute));
    }
    if op.is_none() {
        tracing::warn!("Rejected filter operator '{}'", sanitize_identifier(operator));
        violations.push(format!(
            "Invalid filter type '{}' (expected one of {})",
            sanitize_identifier(operator),
            allowed_operators()
        ));
    }

    let (Some(column), Some(op)) = (column, op) else {
        return Err(DataError::Validation(violations));
    };

    let name = column.column_name();
    let filter = match (op, column.kind()) {
        (FilterOperator::Like, _) => SqlFilter {
            clause: format!("lower({}::text) LIKE lower($1)", name),
            param: SqlValue::Text(format!("%{}%", value)),
        },
        (FilterOperator::Matches, _) => SqlFilter {
            clause: format!("{}::text {} $1", name, op.sql()),
            param: SqlValue::Text(value.to_string()),
        },
        (_, ColumnKind::Text) => SqlFilter {
            clause: format!("lower({}) {} lower($1)", name, op.sql()),
            param: SqlValue::Text(value.to_string()),
        },
        (_, ColumnKind::Integer) => SqlFilter {
            clause: format!("{} {} $1", name, op.sql()),
            param: SqlValue::Integer(integer_value(name, value)?),
        },
    };

    Ok(filter)
}
