//! Wire shapes of the scoring backend and their checked conversion into the
//! core model.
//!
//! The backend is loose about numbers: ids, ratios, scores and bonuses come
//! back either as JSON numbers or as numeric strings. Both are accepted.
//! Anything else is a schema error; fields are never silently zeroed.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ratewise_core::error::ApiError;
use ratewise_core::model::{Member, MemberRating, RatingSubmission, TemplateItem};
use ratewise_core::result::{EmployeeResult, FeedbackReport};
use ratewise_core::scoring::{BONUS_RANGE, SCORE_RANGE};

#[derive(Debug, Deserialize)]
pub(crate) struct MemberDto {
    id: Value,
    username: String,
    #[serde(default)]
    team: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatingItemDto {
    id: Value,
    name: String,
    ratio: Value,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberRatingDto {
    iteminfo: Value,
    #[serde(default)]
    userinfo: Value,
    score: Value,
    plus: Value,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultDto {
    name: String,
    #[serde(default)]
    center: Option<String>,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    team: Option<String>,
    score: Value,
    #[serde(default)]
    feedback: Option<String>,
}

/// One line of `POST /saveUserRatings`. Every value travels as a string.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RatingSubmissionDto {
    item_info: String,
    plus: String,
    score: String,
    user_info: String,
    comment: String,
}

impl From<&RatingSubmission> for RatingSubmissionDto {
    fn from(rating: &RatingSubmission) -> Self {
        Self {
            item_info: rating.item_id.clone(),
            plus: rating.bonus.to_string(),
            score: rating.score.to_string(),
            user_info: rating.user_id.clone(),
            comment: rating.comment.clone(),
        }
    }
}

impl TryFrom<MemberDto> for Member {
    type Error = ApiError;

    fn try_from(dto: MemberDto) -> Result<Self, Self::Error> {
        Ok(Member {
            id: id_string(&dto.id, "member.id")?,
            username: dto.username,
            team: dto.team.unwrap_or_default(),
        })
    }
}

impl TryFrom<RatingItemDto> for TemplateItem {
    type Error = ApiError;

    fn try_from(dto: RatingItemDto) -> Result<Self, Self::Error> {
        let ratio = number(&dto.ratio, "ratingItem.ratio")?;
        if !(0.0..=100.0).contains(&ratio) {
            return Err(schema(format!("ratingItem.ratio out of range: {ratio}")));
        }
        Ok(TemplateItem {
            id: id_string(&dto.id, "ratingItem.id")?,
            name: dto.name,
            ratio,
            description: dto.description.unwrap_or_default(),
        })
    }
}

impl TryFrom<MemberRatingDto> for MemberRating {
    type Error = ApiError;

    fn try_from(dto: MemberRatingDto) -> Result<Self, Self::Error> {
        let user_id = if dto.userinfo.is_null() {
            String::new()
        } else {
            id_string(&dto.userinfo, "rating.userinfo")?
        };
        Ok(MemberRating {
            item_id: id_string(&dto.iteminfo, "rating.iteminfo")?,
            user_id,
            score: whole(&dto.score, "rating.score", SCORE_RANGE)?,
            bonus: whole(&dto.plus, "rating.plus", BONUS_RANGE)?,
            comment: dto.comment.unwrap_or_default(),
        })
    }
}

impl TryFrom<ResultDto> for EmployeeResult {
    type Error = ApiError;

    fn try_from(dto: ResultDto) -> Result<Self, Self::Error> {
        let feedback = match dto.feedback.as_deref() {
            Some(raw) => FeedbackReport::parse_embedded(raw)
                .map_err(|e| schema(format!("result.feedback is not valid JSON: {e}")))?,
            None => None,
        };
        Ok(EmployeeResult {
            name: dto.name,
            center: dto.center.unwrap_or_default(),
            division: dto.division.unwrap_or_default(),
            team: dto.team.unwrap_or_default(),
            score: number(&dto.score, "result.score")?,
            feedback,
        })
    }
}

/// Convert a list of DTOs, failing on the first malformed entry.
pub(crate) fn convert_all<D, T>(dtos: Vec<D>) -> Result<Vec<T>, ApiError>
where
    T: TryFrom<D, Error = ApiError>,
{
    dtos.into_iter().map(T::try_from).collect()
}

fn schema(message: String) -> ApiError {
    ApiError::Schema(message)
}

fn id_string(value: &Value, field: &str) -> Result<String, ApiError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(schema(format!("{field}: expected id, got {other}"))),
    }
}

fn number(value: &Value, field: &str) -> Result<f64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| schema(format!("{field}: expected number, got {value}")))
}

fn whole(value: &Value, field: &str, range: RangeInclusive<u32>) -> Result<u32, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    let n = parsed.ok_or_else(|| schema(format!("{field}: expected whole number, got {value}")))?;
    u32::try_from(n)
        .ok()
        .filter(|n| range.contains(n))
        .ok_or_else(|| {
            schema(format!(
                "{field}: {n} outside {}..={}",
                range.start(),
                range.end()
            ))
        })
}
