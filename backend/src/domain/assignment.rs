//! Agent and responsable assignments plus satisfaction ratings.
//!
//! Tickets and work orders share these shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Error, ResponsableRole};

/// Body for attaching an agent to a ticket or work order.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AgentAssignmentInput {
    pub matricule: Option<String>,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

/// Body for adding a responsable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ResponsableInput {
    pub matricule: Option<String>,
    /// Defaults to `Secondaire`.
    pub role: Option<ResponsableRole>,
}

/// Agent attached to a parent record for a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AgentAssignment {
    pub id: i32,
    /// Ticket or work order id, depending on the route.
    pub parent_id: i32,
    pub matricule: String,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgentAssignment {
    pub parent_id: i32,
    pub matricule: String,
    pub date_debut: Option<DateTime<Utc>>,
    pub date_fin: Option<DateTime<Utc>>,
}

/// Role-tagged responsable association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Responsable {
    pub id: i32,
    pub parent_id: i32,
    pub matricule: String,
    pub role: ResponsableRole,
    pub created_at: DateTime<Utc>,
}

/// Client satisfaction for a ticket or work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Satisfaction {
    pub rating: i16,
    pub commentaire: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of satisfaction submissions.
///
/// `rating` stays untyped so non-integers are reported as validation errors
/// rather than JSON parse failures.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SatisfactionInput {
    #[schema(value_type = i32, example = 4)]
    pub rating: Option<Value>,
    #[serde(alias = "comment")]
    pub commentaire: Option<String>,
}

/// Rating constrained to `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i16);

impl Rating {
    /// Parse a JSON rating.
    ///
    /// Integral numbers and integer strings are accepted.
    ///
    /// # Examples
    /// ```
    /// use fieldops::domain::Rating;
    /// use serde_json::json;
    ///
    /// assert_eq!(Rating::parse(Some(&json!(4))).map(|r| r.value()), Ok(4));
    /// assert!(Rating::parse(Some(&json!(4.5))).is_err());
    /// assert!(Rating::parse(Some(&json!(6))).is_err());
    /// ```
    pub fn parse(raw: Option<&Value>) -> Result<Self, Error> {
        let invalid = || Error::invalid_request("rating must be an integer between 1 and 5");
        let value = match raw {
            Some(Value::Number(number)) => number.as_i64().ok_or_else(invalid)?,
            Some(Value::String(text)) => text.trim().parse::<i64>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        if !(1..=5).contains(&value) {
            return Err(invalid());
        }
        i16::try_from(value).map(Self).map_err(|_| invalid())
    }

    pub fn value(self) -> i16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(1), Some(1))]
    #[case(json!(5), Some(5))]
    #[case(json!("3"), Some(3))]
    #[case(json!(0), None)]
    #[case(json!(6), None)]
    #[case(json!(2.5), None)]
    #[case(json!("bien"), None)]
    #[case(json!(null), None)]
    fn rating_bounds(#[case] raw: Value, #[case] expected: Option<i16>) {
        assert_eq!(Rating::parse(Some(&raw)).ok().map(Rating::value), expected);
    }

    #[rstest]
    fn missing_rating_is_invalid() {
        assert!(Rating::parse(None).is_err());
    }
}
