//! Exit code domain models.
//!
//! An exit code lets a student leave locked exam mode. Personal codes are
//! bound to one student and can be consumed once. Room-wide codes are
//! reusable by every student of the room until revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::PageMeta;
use uuid::Uuid;
use validator::Validate;

/// An issued exit code.
#[derive(Debug, Clone, Serialize)]
pub struct ExitCode {
    pub id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    #[serde(rename = "student_user_id")]
    pub student_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub reusable: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state derived from `used_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCodeStatus {
    Unused,
    Used,
}

impl ExitCodeStatus {
    pub fn from_used_at(used_at: Option<DateTime<Utc>>) -> Self {
        if used_at.is_some() {
            ExitCodeStatus::Used
        } else {
            ExitCodeStatus::Unused
        }
    }
}

/// Request payload for `POST /api/exit-codes`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateExitCodesRequest {
    #[serde(default)]
    pub room_id: Option<String>,

    #[serde(default)]
    pub student_ids: Vec<String>,

    #[serde(default)]
    pub all_students: bool,

    #[validate(custom(function = "shared::validation::validate_code_length"))]
    pub length: Option<i32>,

    #[serde(default)]
    pub single_for_room: bool,
}

/// How a generate request selects its targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationMode {
    /// One reusable code shared by the whole room.
    SingleForRoom,
    /// A personal code for each current room member.
    AllStudents,
    /// A personal code for each listed student.
    Students(Vec<String>),
}

/// Why a generate request was rejected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationRequestError {
    #[error("room_id is required")]
    MissingRoom,
    #[error("student_ids is required unless all_students is true")]
    MissingStudents,
    #[error("student_ids must be empty when all_students is true")]
    StudentsWithAllStudents,
}

impl GenerateExitCodesRequest {
    /// Resolves the trimmed room id and the generation mode.
    ///
    /// `single_for_room` takes priority over the student selection fields.
    pub fn mode(&self) -> Result<(&str, GenerationMode), GenerationRequestError> {
        let room_id = self
            .room_id
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(GenerationRequestError::MissingRoom)?;

        if self.single_for_room {
            return Ok((room_id, GenerationMode::SingleForRoom));
        }

        match (self.all_students, self.student_ids.is_empty()) {
            (false, true) => Err(GenerationRequestError::MissingStudents),
            (true, false) => Err(GenerationRequestError::StudentsWithAllStudents),
            (true, true) => Ok((room_id, GenerationMode::AllStudents)),
            (false, false) => Ok((room_id, GenerationMode::Students(self.student_ids.clone()))),
        }
    }
}

/// One code in the generate response.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedExitCode {
    pub id: Uuid,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Uuid>,
    pub reusable: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<ExitCode> for GeneratedExitCode {
    fn from(code: ExitCode) -> Self {
        Self {
            id: code.id,
            code: code.code,
            student_user_id: code.student_id,
            room_id: code.room_id,
            reusable: code.reusable,
            created_by: code.created_by,
            created_at: code.created_at,
        }
    }
}

/// Response for `POST /api/exit-codes`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateExitCodesResponse {
    pub data: Vec<GeneratedExitCode>,
}

/// Request payload for `POST /api/exit-codes/consume`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ConsumeExitCodeRequest {
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub code: String,

    #[serde(default)]
    pub room_id: Option<String>,

    #[serde(default)]
    pub student_user_id: Option<String>,
}

/// Response for a successful consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeExitCodeResponse {
    pub message: String,
    pub reusable: bool,
}

/// Which codes a list request includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsedFilter {
    #[default]
    Unused,
    Used,
    All,
}

impl UsedFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("true") | Some("1") => UsedFilter::Used,
            Some("all") => UsedFilter::All,
            _ => UsedFilter::Unused,
        }
    }
}

/// Query parameters for `GET /api/exit-codes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListExitCodesQuery {
    pub room_id: Option<Uuid>,
    pub student_user_id: Option<Uuid>,
    pub used: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub all: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Sort columns accepted by the exit code list.
pub const EXIT_CODE_SORT_COLUMNS: &[&str] =
    &["created_at", "id", "used_at", "code", "student_user_id"];

/// Exit code row in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct ExitCodeItem {
    pub id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub student_user_id: Option<Uuid>,
    pub student_name: Option<String>,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
    pub reusable: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub status: ExitCodeStatus,
}

/// Response for `GET /api/exit-codes`.
#[derive(Debug, Clone, Serialize)]
pub struct ListExitCodesResponse {
    pub data: Vec<ExitCodeItem>,
    pub meta: PageMeta,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Interprets `all=true` / `all=1` query flags.
pub fn parse_all_flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(room: Option<&str>) -> GenerateExitCodesRequest {
        GenerateExitCodesRequest {
            room_id: room.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_requires_room() {
        assert_eq!(
            request(None).mode().unwrap_err(),
            GenerationRequestError::MissingRoom
        );
        assert_eq!(
            request(Some("   ")).mode().unwrap_err(),
            GenerationRequestError::MissingRoom
        );
    }

    #[test]
    fn test_mode_single_for_room_wins() {
        let mut req = request(Some(" r1 "));
        req.single_for_room = true;
        req.all_students = true;
        req.student_ids = vec!["a".into()];
        assert_eq!(req.mode().unwrap(), ("r1", GenerationMode::SingleForRoom));
    }

    #[test]
    fn test_mode_requires_students_without_all() {
        assert_eq!(
            request(Some("r1")).mode().unwrap_err(),
            GenerationRequestError::MissingStudents
        );
    }

    #[test]
    fn test_mode_rejects_students_with_all() {
        let mut req = request(Some("r1"));
        req.all_students = true;
        req.student_ids = vec!["a".into()];
        assert_eq!(
            req.mode().unwrap_err(),
            GenerationRequestError::StudentsWithAllStudents
        );
    }

    #[test]
    fn test_mode_all_and_explicit() {
        let mut req = request(Some("r1"));
        req.all_students = true;
        assert_eq!(req.mode().unwrap().1, GenerationMode::AllStudents);

        let mut req = request(Some("r1"));
        req.student_ids = vec!["a".into(), "b".into()];
        assert_eq!(
            req.mode().unwrap().1,
            GenerationMode::Students(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_length_validation() {
        let mut req = request(Some("r1"));
        req.length = Some(33);
        assert!(req.validate().is_err());
        req.length = Some(-1);
        assert!(req.validate().is_ok());
        req.length = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_consume_request_requires_code() {
        let req = ConsumeExitCodeRequest {
            code: "  ".into(),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_used_filter_parse() {
        assert_eq!(UsedFilter::parse(None), UsedFilter::Unused);
        assert_eq!(UsedFilter::parse(Some("false")), UsedFilter::Unused);
        assert_eq!(UsedFilter::parse(Some("true")), UsedFilter::Used);
        assert_eq!(UsedFilter::parse(Some("ALL")), UsedFilter::All);
    }

    #[test]
    fn test_status_from_used_at() {
        assert_eq!(ExitCodeStatus::from_used_at(None), ExitCodeStatus::Unused);
        assert_eq!(
            ExitCodeStatus::from_used_at(Some(Utc::now())),
            ExitCodeStatus::Used
        );
    }

    #[test]
    fn test_generated_code_omits_absent_student() {
        let code = GeneratedExitCode {
            id: Uuid::new_v4(),
            code: "ABCDEF".into(),
            student_user_id: None,
            room_id: Some(Uuid::new_v4()),
            reusable: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&code).unwrap();
        assert!(json.get("student_user_id").is_none());
        assert_eq!(json["reusable"], true);
    }

    #[test]
    fn test_parse_all_flag() {
        assert!(parse_all_flag(Some("true")));
        assert!(parse_all_flag(Some("1")));
        assert!(!parse_all_flag(Some("no")));
        assert!(!parse_all_flag(None));
    }
}
