//! Domain model for the simulation platform.
//!
//! Every stored entity carries a server-generated [`RecordId`] and a
//! server-assigned `created_at` timestamp; clients never supply either.
//! Partial-update structs (`*Update`) hold `Option` fields that are merged
//! over the existing record by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use simward_types::PageRange;
use simward_uuid::RecordId;

// ============================================================================
// ACCOUNTS AND SESSIONS
// ============================================================================

/// Account role. Students act through group scope; the other three roles are
/// staff and bypass group-based patient filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
    Coordinator,
}

impl Role {
    /// True for instructor, admin, and coordinator accounts.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Student)
    }
}

/// A platform account.
///
/// Passwords are stored and compared as plaintext strings. This mirrors the
/// behaviour the login error paths depend on (wrong password and unknown
/// username are indistinguishable to the client) and is flagged in DESIGN.md
/// as a known defect of the modelled system, not a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// Partial update for [`User`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A timed teaching scenario owned by one instructor.
///
/// No uniqueness rule constrains `active`; an instructor may run several
/// active sessions at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: RecordId,
    pub name: String,
    pub instructor_id: RecordId,
    pub active: bool,
    pub time_remaining_secs: i64,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub instructor_id: RecordId,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub time_remaining_secs: i64,
}

/// Partial update for [`Session`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub time_remaining_secs: Option<i64>,
}

// ============================================================================
// PATIENTS
// ============================================================================

/// Clinical status banner shown against a scenario patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Critical,
    Stable,
    Monitoring,
}

/// A simulated patient, optionally attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub status: PatientStatus,
    pub chief_complaint: String,
    pub session_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Patient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub sex: Option<String>,
    pub status: PatientStatus,
    pub chief_complaint: String,
    #[serde(default)]
    pub session_id: Option<RecordId>,
}

/// Partial update for [`Patient`].
///
/// `session_id` uses a nested `Option` so that an explicit `null` detaches
/// the patient from its session while an absent key leaves it unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub status: Option<PatientStatus>,
    pub chief_complaint: Option<String>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Option<RecordId>>,
}

/// Serde helper distinguishing "absent" from "explicit null" on updates.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(Some(Option::deserialize(deserializer)?))
    }
}

// ============================================================================
// GROUPS
// ============================================================================

/// A set of students sharing one account scope within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: RecordId,
    pub name: String,
    pub session_id: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub session_id: RecordId,
}

/// Partial update for [`Group`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
}

/// Join row between a group and a user. A user may belong to several groups;
/// the earliest membership is the default scope when none is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: RecordId,
    pub user_id: RecordId,
    pub added_at: DateTime<Utc>,
}

// ============================================================================
// ASSETS AND VISIBILITY
// ============================================================================

/// An uploaded teaching file attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: RecordId,
    pub filename: String,
    /// Free-text type tag ("image", "handout", ...), as supplied by the uploader.
    pub kind: String,
    /// Content hash of the stored blob.
    pub content_hash: String,
    pub session_id: RecordId,
    pub uploaded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Asset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
    pub filename: String,
    pub kind: String,
    pub content_hash: String,
    pub session_id: RecordId,
    pub uploaded_by: RecordId,
}

/// Per-(asset, group) visibility toggle.
///
/// Absence of a row means NOT visible; there is no default-allow path. The
/// row records who last changed it and when; writes are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetGroupVisibility {
    pub asset_id: RecordId,
    pub group_id: RecordId,
    pub visible: bool,
    pub changed_by: RecordId,
    pub changed_at: DateTime<Utc>,
}

// ============================================================================
// DOCUMENTS AND RELEASES
// ============================================================================

/// A coordinator-managed document attached to a session and optionally a
/// patient. Content lives in the blob store when `content_hash` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub session_id: RecordId,
    pub patient_id: Option<RecordId>,
    pub content_hash: Option<String>,
    pub uploaded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub session_id: RecordId,
    #[serde(default)]
    pub patient_id: Option<RecordId>,
    #[serde(default)]
    pub content_hash: Option<String>,
    pub uploaded_by: RecordId,
}

/// Partial update for [`Document`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_hash: Option<String>,
}

/// Lifecycle of a document release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Pending,
    Released,
    Cancelled,
}

/// Scheduled or performed delivery of one document to one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRelease {
    pub id: RecordId,
    pub document_id: RecordId,
    pub group_id: RecordId,
    pub status: ReleaseStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`DocumentRelease`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentRelease {
    pub document_id: RecordId,
    pub group_id: RecordId,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_by: RecordId,
}

/// Partial update for [`DocumentRelease`], used by the release/cancel paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentReleaseUpdate {
    pub status: Option<ReleaseStatus>,
    pub released_at: Option<DateTime<Utc>>,
}

// ============================================================================
// DATA VERSIONS AND ASSIGNMENTS
// ============================================================================

/// A named revision of scenario teaching data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataVersion {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`DataVersion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDataVersion {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Grants a group access to one patient's records under a data version.
/// Patient read paths 403 student scopes with no assignment for the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDataAssignment {
    pub id: RecordId,
    pub group_id: RecordId,
    pub data_version_id: RecordId,
    pub patient_id: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`GroupDataAssignment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroupDataAssignment {
    pub group_id: RecordId,
    pub data_version_id: RecordId,
    pub patient_id: RecordId,
}

// ============================================================================
// INVESTIGATION REQUESTS
// ============================================================================

/// Lifecycle of an investigation request. One-way: `pending → completed`.
/// There is deliberately no rejected or cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
}

/// Blood test panels a group can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodTestType {
    FullBloodCount,
    UreaElectrolytes,
    LiverFunction,
    CoagulationScreen,
    CReactiveProtein,
    BloodCultures,
    ArterialBloodGas,
    Troponin,
}

/// Imaging studies a group can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagingType {
    ChestXray,
    AbdominalXray,
    CtHead,
    CtChest,
    CtAbdomen,
    Ultrasound,
    Mri,
    Echocardiogram,
}

/// A patient file granted to the requesting group on approval, optionally
/// scoped to a page range. The range is mandatory when the referenced file
/// has `requires_pagination` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedFile {
    pub file_id: RecordId,
    #[serde(default)]
    pub page_range: Option<PageRange>,
}

/// A blood test request raised by a group against a patient.
///
/// Created `pending` regardless of client input; completing it attaches the
/// `approved_files` grants that the file-view path later honours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodTestRequest {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub requested_by: RecordId,
    pub group_id: RecordId,
    pub test_types: Vec<BloodTestType>,
    pub details: String,
    pub status: RequestStatus,
    pub signed_off_name: Option<String>,
    pub signed_off_role: Option<String>,
    pub approved_files: Vec<ApprovedFile>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`BloodTestRequest`]. Status is not accepted here;
/// the store always writes `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBloodTestRequest {
    pub patient_id: RecordId,
    pub requested_by: RecordId,
    pub group_id: RecordId,
    pub test_types: Vec<BloodTestType>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

/// An imaging request raised by a group against a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagingRequest {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub requested_by: RecordId,
    pub group_id: RecordId,
    pub imaging_types: Vec<ImagingType>,
    pub details: String,
    pub status: RequestStatus,
    pub signed_off_name: Option<String>,
    pub signed_off_role: Option<String>,
    pub approved_files: Vec<ApprovedFile>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`ImagingRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImagingRequest {
    pub patient_id: RecordId,
    pub requested_by: RecordId,
    pub group_id: RecordId,
    pub imaging_types: Vec<ImagingType>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

// ============================================================================
// PATIENT FILES
// ============================================================================

/// Category tag for a patient file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    LabReport,
    Imaging,
    Ecg,
    ObservationChart,
    Referral,
    Other,
}

/// A viewable file belonging to one patient. Bytes live in the blob store;
/// access for student groups goes through investigation-request approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientFile {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub display_name: String,
    pub category: FileCategory,
    /// When set, approvals granting this file must carry a page range and
    /// views are checked against the granted range.
    pub requires_pagination: bool,
    pub content_hash: String,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`PatientFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientFile {
    pub patient_id: RecordId,
    pub display_name: String,
    pub category: FileCategory,
    #[serde(default)]
    pub requires_pagination: bool,
    pub content_hash: String,
    #[serde(default)]
    pub media_type: Option<String>,
}

// ============================================================================
// OBSERVATION SUB-RECORDS
// ============================================================================

/// Blood pressure reading in mmHg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressure {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub systolic: i32,
    pub diastolic: i32,
    pub created_at: DateTime<Utc>,
}

/// Heart rate in beats per minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartRate {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub rate: i32,
    pub created_at: DateTime<Utc>,
}

/// Body temperature, kept as a decimal string to preserve display precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyTemperature {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub temperature: String,
    pub created_at: DateTime<Utc>,
}

/// Respiratory rate in breaths per minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespiratoryRate {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub rate: i32,
    pub created_at: DateTime<Utc>,
}

/// Blood sugar level, kept as a decimal string to preserve display precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodSugar {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub sugar_level: String,
    pub created_at: DateTime<Utc>,
}

/// Oxygen saturation percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OxygenSaturation {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub saturation_percentage: i32,
    pub created_at: DateTime<Utc>,
}

/// Self-reported pain score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainScore {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub recorded_by: RecordId,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// CLINICAL CHART RECORDS
// ============================================================================

/// Past-history entry on a patient's chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub title: String,
    pub notes: String,
    pub recorded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`MedicalHistoryEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicalHistoryEntry {
    pub patient_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub recorded_by: RecordId,
}

/// Prescribed medication on a patient's chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
    pub recorded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`Medication`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub patient_id: RecordId,
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
    pub recorded_by: RecordId,
}

/// Instructor-entered vitals row (distinct from the student observation
/// bundle records, which are keyed per sign).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSignsEntry {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub heart_rate: Option<i32>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub temperature: Option<String>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub recorded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`VitalSignsEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVitalSignsEntry {
    pub patient_id: RecordId,
    #[serde(default)]
    pub heart_rate: Option<i32>,
    #[serde(default)]
    pub systolic: Option<i32>,
    #[serde(default)]
    pub diastolic: Option<i32>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub respiratory_rate: Option<i32>,
    #[serde(default)]
    pub oxygen_saturation: Option<i32>,
    pub recorded_by: RecordId,
}

/// Released laboratory result on a patient's chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub recorded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`LabResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabResult {
    pub patient_id: RecordId,
    pub test_name: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    pub recorded_by: RecordId,
}

/// SOAP-format progress note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapNote {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
    pub recorded_by: RecordId,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`SoapNote`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSoapNote {
    pub patient_id: RecordId,
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
    pub recorded_by: RecordId,
}

/// Standing clinical order against a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalOrder {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub description: String,
    pub ordered_by: RecordId,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`ClinicalOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClinicalOrder {
    pub patient_id: RecordId,
    pub description: String,
    pub ordered_by: RecordId,
    #[serde(default)]
    pub completed: bool,
}

// ============================================================================
// ADMIN AND COORDINATOR RECORDS
// ============================================================================

/// Append-only audit trail entry behind the admin log view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: RecordId,
    pub actor_id: Option<RecordId>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`AuditLogEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditLogEntry {
    pub actor_id: Option<RecordId>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
}

/// A named teaching week grouping coordinator schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationWeek {
    pub id: RecordId,
    pub name: String,
    pub week_number: i32,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for [`SimulationWeek`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSimulationWeek {
    pub name: String,
    pub week_number: i32,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

/// Partial update for [`SimulationWeek`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationWeekUpdate {
    pub name: Option<String>,
    pub week_number: Option<i32>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Coordinator).unwrap(), "\"coordinator\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn staff_roles() {
        assert!(!Role::Student.is_staff());
        assert!(Role::Instructor.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::Coordinator.is_staff());
    }

    #[test]
    fn patient_update_distinguishes_absent_from_null_session() {
        let absent: PatientUpdate = serde_json::from_str(r#"{"age": 30}"#).unwrap();
        assert!(absent.session_id.is_none());

        let detach: PatientUpdate = serde_json::from_str(r#"{"session_id": null}"#).unwrap();
        assert_eq!(detach.session_id, Some(None));
    }

    #[test]
    fn test_type_enums_use_snake_case() {
        assert_eq!(
            serde_json::to_string(&BloodTestType::FullBloodCount).unwrap(),
            "\"full_blood_count\""
        );
        assert_eq!(
            serde_json::to_string(&ImagingType::ChestXray).unwrap(),
            "\"chest_xray\""
        );
    }
}
