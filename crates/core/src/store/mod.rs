//! The persistence seam.
//!
//! [`EntityStore`] is the single repository interface the services are
//! written against. The in-memory adapter ([`MemoryStore`]) backs development
//! and tests; a relational adapter can implement the same trait without
//! touching any call site.
//!
//! ## Contract
//!
//! - Ids and `created_at` timestamps are assigned inside the store on every
//!   `create_*`; client-supplied values are never honoured.
//! - `update_*` merges the partial-update struct over the existing record and
//!   returns `Ok(None)` when the id does not exist. Callers branch on `None`
//!   before responding (404). Field values are taken as-is; no re-validation
//!   happens here.
//! - `delete_patient` returns `false` when the patient does not exist and
//!   otherwise cascades over the eight dependent collections (medical
//!   history, medications, vital signs, lab results, SOAP notes, orders,
//!   group-data-assignments, and documents, including those documents'
//!   releases). All other deletes are idempotent no-ops on missing ids.
//! - Listing methods return records in creation order.
//! - Multi-record operations built on top of this trait (observation
//!   bundles, bulk visibility updates) are sequences of independent writes;
//!   a failure partway through leaves earlier writes in place.

mod memory;

pub use memory::{MemoryStore, StoreSnapshot};

use crate::error::StoreResult;
use crate::model::*;
use chrono::{DateTime, Utc};
use simward_uuid::RecordId;

/// Repository interface over all platform entities.
pub trait EntityStore: Send + Sync {
    // -- users ---------------------------------------------------------------

    fn create_user(&self, new: NewUser) -> StoreResult<User>;
    fn get_user(&self, id: RecordId) -> StoreResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    fn list_users(&self) -> StoreResult<Vec<User>>;
    fn update_user(&self, id: RecordId, update: UserUpdate) -> StoreResult<Option<User>>;
    fn delete_user(&self, id: RecordId) -> StoreResult<()>;

    // -- sessions ------------------------------------------------------------

    fn create_session(&self, new: NewSession) -> StoreResult<Session>;
    fn get_session(&self, id: RecordId) -> StoreResult<Option<Session>>;
    fn list_sessions(&self) -> StoreResult<Vec<Session>>;
    fn sessions_by_instructor(&self, instructor_id: RecordId) -> StoreResult<Vec<Session>>;
    fn update_session(&self, id: RecordId, update: SessionUpdate) -> StoreResult<Option<Session>>;
    fn delete_session(&self, id: RecordId) -> StoreResult<()>;

    // -- patients ------------------------------------------------------------

    fn create_patient(&self, new: NewPatient) -> StoreResult<Patient>;
    fn get_patient(&self, id: RecordId) -> StoreResult<Option<Patient>>;
    fn list_patients(&self) -> StoreResult<Vec<Patient>>;
    fn patients_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Patient>>;
    fn update_patient(&self, id: RecordId, update: PatientUpdate) -> StoreResult<Option<Patient>>;

    /// Deletes a patient and everything hanging off it.
    ///
    /// Returns `false` (with no side effects) when the id is unknown.
    fn delete_patient(&self, id: RecordId) -> StoreResult<bool>;

    // -- groups and membership ----------------------------------------------

    fn create_group(&self, new: NewGroup) -> StoreResult<Group>;
    fn get_group(&self, id: RecordId) -> StoreResult<Option<Group>>;
    fn groups_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Group>>;
    fn list_groups(&self) -> StoreResult<Vec<Group>>;
    fn update_group(&self, id: RecordId, update: GroupUpdate) -> StoreResult<Option<Group>>;
    fn delete_group(&self, id: RecordId) -> StoreResult<()>;

    /// Adds a membership row; adding an existing (group, user) pair is a
    /// no-op that returns the existing row.
    fn add_group_member(&self, group_id: RecordId, user_id: RecordId)
        -> StoreResult<GroupMember>;
    fn remove_group_member(&self, group_id: RecordId, user_id: RecordId) -> StoreResult<()>;
    fn members_of_group(&self, group_id: RecordId) -> StoreResult<Vec<GroupMember>>;

    /// Groups the user belongs to, oldest membership first. The head of this
    /// list is the default scope when a request names no group.
    fn groups_for_user(&self, user_id: RecordId) -> StoreResult<Vec<Group>>;

    // -- assets and visibility ----------------------------------------------

    fn create_asset(&self, new: NewAsset) -> StoreResult<Asset>;
    fn get_asset(&self, id: RecordId) -> StoreResult<Option<Asset>>;
    fn assets_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Asset>>;
    fn delete_asset(&self, id: RecordId) -> StoreResult<()>;

    /// Upserts the single (asset, group) visibility row. Last writer wins.
    fn upsert_asset_visibility(
        &self,
        asset_id: RecordId,
        group_id: RecordId,
        visible: bool,
        changed_by: RecordId,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<AssetGroupVisibility>;
    fn get_asset_visibility(
        &self,
        asset_id: RecordId,
        group_id: RecordId,
    ) -> StoreResult<Option<AssetGroupVisibility>>;
    fn visibility_rows_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<AssetGroupVisibility>>;

    // -- documents and releases ----------------------------------------------

    fn create_document(&self, new: NewDocument) -> StoreResult<Document>;
    fn get_document(&self, id: RecordId) -> StoreResult<Option<Document>>;
    fn documents_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Document>>;
    fn list_documents(&self) -> StoreResult<Vec<Document>>;
    fn update_document(
        &self,
        id: RecordId,
        update: DocumentUpdate,
    ) -> StoreResult<Option<Document>>;
    fn delete_document(&self, id: RecordId) -> StoreResult<()>;

    fn create_document_release(&self, new: NewDocumentRelease)
        -> StoreResult<DocumentRelease>;
    fn get_document_release(&self, id: RecordId) -> StoreResult<Option<DocumentRelease>>;
    fn list_document_releases(&self) -> StoreResult<Vec<DocumentRelease>>;
    fn releases_for_group(&self, group_id: RecordId) -> StoreResult<Vec<DocumentRelease>>;
    fn update_document_release(
        &self,
        id: RecordId,
        update: DocumentReleaseUpdate,
    ) -> StoreResult<Option<DocumentRelease>>;
    fn delete_document_release(&self, id: RecordId) -> StoreResult<()>;

    // -- data versions and assignments ---------------------------------------

    fn create_data_version(&self, new: NewDataVersion) -> StoreResult<DataVersion>;
    fn get_data_version(&self, id: RecordId) -> StoreResult<Option<DataVersion>>;
    fn list_data_versions(&self) -> StoreResult<Vec<DataVersion>>;
    fn delete_data_version(&self, id: RecordId) -> StoreResult<()>;

    fn create_group_data_assignment(
        &self,
        new: NewGroupDataAssignment,
    ) -> StoreResult<GroupDataAssignment>;
    fn assignments_for_group(&self, group_id: RecordId)
        -> StoreResult<Vec<GroupDataAssignment>>;
    fn assignment_exists(&self, group_id: RecordId, patient_id: RecordId) -> StoreResult<bool>;
    fn delete_group_data_assignment(&self, id: RecordId) -> StoreResult<()>;

    // -- investigation requests ----------------------------------------------

    /// Creates a blood test request. Status is always written as `pending`.
    fn create_blood_test_request(
        &self,
        new: NewBloodTestRequest,
    ) -> StoreResult<BloodTestRequest>;
    fn get_blood_test_request(&self, id: RecordId) -> StoreResult<Option<BloodTestRequest>>;
    fn list_blood_test_requests(
        &self,
        patient_id: Option<RecordId>,
    ) -> StoreResult<Vec<BloodTestRequest>>;
    fn blood_test_requests_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<BloodTestRequest>>;

    /// Marks a blood test request completed with its file grants. The
    /// transition itself is validated by the investigation service; the store
    /// only persists.
    fn complete_blood_test_request(
        &self,
        id: RecordId,
        approved_files: Vec<ApprovedFile>,
        signed_off_name: Option<String>,
        signed_off_role: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<BloodTestRequest>>;
    fn delete_blood_test_request(&self, id: RecordId) -> StoreResult<()>;

    /// Creates an imaging request. Status is always written as `pending`.
    fn create_imaging_request(&self, new: NewImagingRequest) -> StoreResult<ImagingRequest>;
    fn get_imaging_request(&self, id: RecordId) -> StoreResult<Option<ImagingRequest>>;
    fn list_imaging_requests(
        &self,
        patient_id: Option<RecordId>,
    ) -> StoreResult<Vec<ImagingRequest>>;
    fn imaging_requests_for_group(&self, group_id: RecordId)
        -> StoreResult<Vec<ImagingRequest>>;
    fn complete_imaging_request(
        &self,
        id: RecordId,
        approved_files: Vec<ApprovedFile>,
        signed_off_name: Option<String>,
        signed_off_role: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<ImagingRequest>>;
    fn delete_imaging_request(&self, id: RecordId) -> StoreResult<()>;

    // -- patient files -------------------------------------------------------

    fn create_patient_file(&self, new: NewPatientFile) -> StoreResult<PatientFile>;
    fn get_patient_file(&self, id: RecordId) -> StoreResult<Option<PatientFile>>;
    fn files_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<PatientFile>>;
    fn delete_patient_file(&self, id: RecordId) -> StoreResult<()>;

    // -- observation sub-records ---------------------------------------------

    fn create_blood_pressure(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        systolic: i32,
        diastolic: i32,
    ) -> StoreResult<BloodPressure>;
    fn blood_pressures_by_patient(&self, patient_id: RecordId)
        -> StoreResult<Vec<BloodPressure>>;

    fn create_heart_rate(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        rate: i32,
    ) -> StoreResult<HeartRate>;
    fn heart_rates_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<HeartRate>>;

    fn create_body_temperature(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        temperature: String,
    ) -> StoreResult<BodyTemperature>;
    fn body_temperatures_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<BodyTemperature>>;

    fn create_respiratory_rate(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        rate: i32,
    ) -> StoreResult<RespiratoryRate>;
    fn respiratory_rates_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<RespiratoryRate>>;

    fn create_blood_sugar(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        sugar_level: String,
    ) -> StoreResult<BloodSugar>;
    fn blood_sugars_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<BloodSugar>>;

    fn create_oxygen_saturation(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        saturation_percentage: i32,
    ) -> StoreResult<OxygenSaturation>;
    fn oxygen_saturations_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<OxygenSaturation>>;

    fn create_pain_score(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        score: i32,
    ) -> StoreResult<PainScore>;
    fn pain_scores_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<PainScore>>;

    // -- clinical chart records ----------------------------------------------

    fn create_medical_history(
        &self,
        new: NewMedicalHistoryEntry,
    ) -> StoreResult<MedicalHistoryEntry>;
    fn medical_history_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<MedicalHistoryEntry>>;

    fn create_medication(&self, new: NewMedication) -> StoreResult<Medication>;
    fn medications_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<Medication>>;

    fn create_vital_signs(&self, new: NewVitalSignsEntry) -> StoreResult<VitalSignsEntry>;
    fn vital_signs_by_patient(&self, patient_id: RecordId)
        -> StoreResult<Vec<VitalSignsEntry>>;

    fn create_lab_result(&self, new: NewLabResult) -> StoreResult<LabResult>;
    fn lab_results_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<LabResult>>;

    fn create_soap_note(&self, new: NewSoapNote) -> StoreResult<SoapNote>;
    fn soap_notes_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<SoapNote>>;

    fn create_clinical_order(&self, new: NewClinicalOrder) -> StoreResult<ClinicalOrder>;
    fn clinical_orders_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<ClinicalOrder>>;

    // -- audit and scheduling ------------------------------------------------

    fn append_audit(&self, new: NewAuditLogEntry) -> StoreResult<AuditLogEntry>;
    fn list_audit_logs(&self) -> StoreResult<Vec<AuditLogEntry>>;

    fn create_simulation_week(&self, new: NewSimulationWeek) -> StoreResult<SimulationWeek>;
    fn get_simulation_week(&self, id: RecordId) -> StoreResult<Option<SimulationWeek>>;
    fn list_simulation_weeks(&self) -> StoreResult<Vec<SimulationWeek>>;
    fn update_simulation_week(
        &self,
        id: RecordId,
        update: SimulationWeekUpdate,
    ) -> StoreResult<Option<SimulationWeek>>;
    fn delete_simulation_week(&self, id: RecordId) -> StoreResult<()>;
}
