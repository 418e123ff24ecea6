//! In-memory store adapter.
//!
//! Backs development and tests. All tables live behind one `RwLock`, so a
//! single write guard covers any one store call; ordering within each table
//! is creation order. The snapshot type doubles as the seed-file format.

use super::EntityStore;
use crate::error::{StoreError, StoreResult};
use crate::model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simward_uuid::RecordId;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Full dump of every table. Serialisable, so it is also the seed-file
/// format consumed at startup and produced by the `simward` CLI.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
    pub patients: Vec<Patient>,
    pub groups: Vec<Group>,
    pub group_members: Vec<GroupMember>,
    pub assets: Vec<Asset>,
    pub asset_visibility: Vec<AssetGroupVisibility>,
    pub documents: Vec<Document>,
    pub document_releases: Vec<DocumentRelease>,
    pub data_versions: Vec<DataVersion>,
    pub group_data_assignments: Vec<GroupDataAssignment>,
    pub blood_test_requests: Vec<BloodTestRequest>,
    pub imaging_requests: Vec<ImagingRequest>,
    pub patient_files: Vec<PatientFile>,
    pub blood_pressures: Vec<BloodPressure>,
    pub heart_rates: Vec<HeartRate>,
    pub body_temperatures: Vec<BodyTemperature>,
    pub respiratory_rates: Vec<RespiratoryRate>,
    pub blood_sugars: Vec<BloodSugar>,
    pub oxygen_saturations: Vec<OxygenSaturation>,
    pub pain_scores: Vec<PainScore>,
    pub medical_history: Vec<MedicalHistoryEntry>,
    pub medications: Vec<Medication>,
    pub vital_signs: Vec<VitalSignsEntry>,
    pub lab_results: Vec<LabResult>,
    pub soap_notes: Vec<SoapNote>,
    pub clinical_orders: Vec<ClinicalOrder>,
    pub audit_logs: Vec<AuditLogEntry>,
    pub simulation_weeks: Vec<SimulationWeek>,
}

/// In-memory [`EntityStore`] adapter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated from a snapshot, preserving the ids and
    /// timestamps it carries.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Dumps every table. Used by the CLI seed tooling and by tests.
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreSnapshot>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreSnapshot>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

impl EntityStore for MemoryStore {
    // -- users ---------------------------------------------------------------

    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user = User {
            id: RecordId::new(),
            username: new.username,
            password: new.password,
            role: new.role,
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: now(),
        };
        self.write()?.users.push(user.clone());
        Ok(user)
    }

    fn get_user(&self, id: RecordId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    fn update_user(&self, id: RecordId, update: UserUpdate) -> StoreResult<Option<User>> {
        let mut tables = self.write()?;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(password) = update.password {
            user.password = password;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        Ok(Some(user.clone()))
    }

    fn delete_user(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.users.retain(|u| u.id != id);
        tables.group_members.retain(|m| m.user_id != id);
        Ok(())
    }

    // -- sessions ------------------------------------------------------------

    fn create_session(&self, new: NewSession) -> StoreResult<Session> {
        let session = Session {
            id: RecordId::new(),
            name: new.name,
            instructor_id: new.instructor_id,
            active: new.active,
            time_remaining_secs: new.time_remaining_secs,
            created_at: now(),
        };
        self.write()?.sessions.push(session.clone());
        Ok(session)
    }

    fn get_session(&self, id: RecordId) -> StoreResult<Option<Session>> {
        Ok(self.read()?.sessions.iter().find(|s| s.id == id).cloned())
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        Ok(self.read()?.sessions.clone())
    }

    fn sessions_by_instructor(&self, instructor_id: RecordId) -> StoreResult<Vec<Session>> {
        Ok(self
            .read()?
            .sessions
            .iter()
            .filter(|s| s.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    fn update_session(&self, id: RecordId, update: SessionUpdate) -> StoreResult<Option<Session>> {
        let mut tables = self.write()?;
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            session.name = name;
        }
        if let Some(active) = update.active {
            session.active = active;
        }
        if let Some(secs) = update.time_remaining_secs {
            session.time_remaining_secs = secs;
        }
        Ok(Some(session.clone()))
    }

    fn delete_session(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.sessions.retain(|s| s.id != id);
        Ok(())
    }

    // -- patients ------------------------------------------------------------

    fn create_patient(&self, new: NewPatient) -> StoreResult<Patient> {
        let patient = Patient {
            id: RecordId::new(),
            first_name: new.first_name,
            last_name: new.last_name,
            age: new.age,
            sex: new.sex,
            status: new.status,
            chief_complaint: new.chief_complaint,
            session_id: new.session_id,
            created_at: now(),
        };
        self.write()?.patients.push(patient.clone());
        Ok(patient)
    }

    fn get_patient(&self, id: RecordId) -> StoreResult<Option<Patient>> {
        Ok(self.read()?.patients.iter().find(|p| p.id == id).cloned())
    }

    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.read()?.patients.clone())
    }

    fn patients_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Patient>> {
        Ok(self
            .read()?
            .patients
            .iter()
            .filter(|p| p.session_id == Some(session_id))
            .cloned()
            .collect())
    }

    fn update_patient(&self, id: RecordId, update: PatientUpdate) -> StoreResult<Option<Patient>> {
        let mut tables = self.write()?;
        let Some(patient) = tables.patients.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = update.first_name {
            patient.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            patient.last_name = last_name;
        }
        if let Some(age) = update.age {
            patient.age = Some(age);
        }
        if let Some(sex) = update.sex {
            patient.sex = Some(sex);
        }
        if let Some(status) = update.status {
            patient.status = status;
        }
        if let Some(chief_complaint) = update.chief_complaint {
            patient.chief_complaint = chief_complaint;
        }
        if let Some(session_id) = update.session_id {
            patient.session_id = session_id;
        }
        Ok(Some(patient.clone()))
    }

    fn delete_patient(&self, id: RecordId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if !tables.patients.iter().any(|p| p.id == id) {
            return Ok(false);
        }

        tables.patients.retain(|p| p.id != id);

        // Cascade over the eight dependent collections.
        tables.medical_history.retain(|r| r.patient_id != id);
        tables.medications.retain(|r| r.patient_id != id);
        tables.vital_signs.retain(|r| r.patient_id != id);
        tables.lab_results.retain(|r| r.patient_id != id);
        tables.soap_notes.retain(|r| r.patient_id != id);
        tables.clinical_orders.retain(|r| r.patient_id != id);
        tables
            .group_data_assignments
            .retain(|r| r.patient_id != id);

        let doomed_documents: Vec<RecordId> = tables
            .documents
            .iter()
            .filter(|d| d.patient_id == Some(id))
            .map(|d| d.id)
            .collect();
        tables.documents.retain(|d| d.patient_id != Some(id));
        tables
            .document_releases
            .retain(|r| !doomed_documents.contains(&r.document_id));

        Ok(true)
    }

    // -- groups and membership ----------------------------------------------

    fn create_group(&self, new: NewGroup) -> StoreResult<Group> {
        let group = Group {
            id: RecordId::new(),
            name: new.name,
            session_id: new.session_id,
            created_at: now(),
        };
        self.write()?.groups.push(group.clone());
        Ok(group)
    }

    fn get_group(&self, id: RecordId) -> StoreResult<Option<Group>> {
        Ok(self.read()?.groups.iter().find(|g| g.id == id).cloned())
    }

    fn groups_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Group>> {
        Ok(self
            .read()?
            .groups
            .iter()
            .filter(|g| g.session_id == session_id)
            .cloned()
            .collect())
    }

    fn list_groups(&self) -> StoreResult<Vec<Group>> {
        Ok(self.read()?.groups.clone())
    }

    fn update_group(&self, id: RecordId, update: GroupUpdate) -> StoreResult<Option<Group>> {
        let mut tables = self.write()?;
        let Some(group) = tables.groups.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            group.name = name;
        }
        Ok(Some(group.clone()))
    }

    fn delete_group(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.groups.retain(|g| g.id != id);
        tables.group_members.retain(|m| m.group_id != id);
        tables.asset_visibility.retain(|v| v.group_id != id);
        tables.group_data_assignments.retain(|a| a.group_id != id);
        Ok(())
    }

    fn add_group_member(
        &self,
        group_id: RecordId,
        user_id: RecordId,
    ) -> StoreResult<GroupMember> {
        let mut tables = self.write()?;
        if let Some(existing) = tables
            .group_members
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
        {
            return Ok(existing.clone());
        }
        let member = GroupMember {
            group_id,
            user_id,
            added_at: now(),
        };
        tables.group_members.push(member.clone());
        Ok(member)
    }

    fn remove_group_member(&self, group_id: RecordId, user_id: RecordId) -> StoreResult<()> {
        self.write()?
            .group_members
            .retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        Ok(())
    }

    fn members_of_group(&self, group_id: RecordId) -> StoreResult<Vec<GroupMember>> {
        Ok(self
            .read()?
            .group_members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    fn groups_for_user(&self, user_id: RecordId) -> StoreResult<Vec<Group>> {
        let tables = self.read()?;
        let groups = tables
            .group_members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.groups.iter().find(|g| g.id == m.group_id))
            .cloned()
            .collect();
        Ok(groups)
    }

    // -- assets and visibility ----------------------------------------------

    fn create_asset(&self, new: NewAsset) -> StoreResult<Asset> {
        let asset = Asset {
            id: RecordId::new(),
            filename: new.filename,
            kind: new.kind,
            content_hash: new.content_hash,
            session_id: new.session_id,
            uploaded_by: new.uploaded_by,
            created_at: now(),
        };
        self.write()?.assets.push(asset.clone());
        Ok(asset)
    }

    fn get_asset(&self, id: RecordId) -> StoreResult<Option<Asset>> {
        Ok(self.read()?.assets.iter().find(|a| a.id == id).cloned())
    }

    fn assets_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Asset>> {
        Ok(self
            .read()?
            .assets
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    fn delete_asset(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.assets.retain(|a| a.id != id);
        tables.asset_visibility.retain(|v| v.asset_id != id);
        Ok(())
    }

    fn upsert_asset_visibility(
        &self,
        asset_id: RecordId,
        group_id: RecordId,
        visible: bool,
        changed_by: RecordId,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<AssetGroupVisibility> {
        let mut tables = self.write()?;
        if let Some(row) = tables
            .asset_visibility
            .iter_mut()
            .find(|v| v.asset_id == asset_id && v.group_id == group_id)
        {
            row.visible = visible;
            row.changed_by = changed_by;
            row.changed_at = changed_at;
            return Ok(row.clone());
        }
        let row = AssetGroupVisibility {
            asset_id,
            group_id,
            visible,
            changed_by,
            changed_at,
        };
        tables.asset_visibility.push(row.clone());
        Ok(row)
    }

    fn get_asset_visibility(
        &self,
        asset_id: RecordId,
        group_id: RecordId,
    ) -> StoreResult<Option<AssetGroupVisibility>> {
        Ok(self
            .read()?
            .asset_visibility
            .iter()
            .find(|v| v.asset_id == asset_id && v.group_id == group_id)
            .cloned())
    }

    fn visibility_rows_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<AssetGroupVisibility>> {
        Ok(self
            .read()?
            .asset_visibility
            .iter()
            .filter(|v| v.group_id == group_id)
            .cloned()
            .collect())
    }

    // -- documents and releases ----------------------------------------------

    fn create_document(&self, new: NewDocument) -> StoreResult<Document> {
        let document = Document {
            id: RecordId::new(),
            title: new.title,
            description: new.description,
            session_id: new.session_id,
            patient_id: new.patient_id,
            content_hash: new.content_hash,
            uploaded_by: new.uploaded_by,
            created_at: now(),
        };
        self.write()?.documents.push(document.clone());
        Ok(document)
    }

    fn get_document(&self, id: RecordId) -> StoreResult<Option<Document>> {
        Ok(self.read()?.documents.iter().find(|d| d.id == id).cloned())
    }

    fn documents_by_session(&self, session_id: RecordId) -> StoreResult<Vec<Document>> {
        Ok(self
            .read()?
            .documents
            .iter()
            .filter(|d| d.session_id == session_id)
            .cloned()
            .collect())
    }

    fn list_documents(&self) -> StoreResult<Vec<Document>> {
        Ok(self.read()?.documents.clone())
    }

    fn update_document(
        &self,
        id: RecordId,
        update: DocumentUpdate,
    ) -> StoreResult<Option<Document>> {
        let mut tables = self.write()?;
        let Some(document) = tables.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(description) = update.description {
            document.description = Some(description);
        }
        if let Some(content_hash) = update.content_hash {
            document.content_hash = Some(content_hash);
        }
        Ok(Some(document.clone()))
    }

    fn delete_document(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.documents.retain(|d| d.id != id);
        tables.document_releases.retain(|r| r.document_id != id);
        Ok(())
    }

    fn create_document_release(
        &self,
        new: NewDocumentRelease,
    ) -> StoreResult<DocumentRelease> {
        let release = DocumentRelease {
            id: RecordId::new(),
            document_id: new.document_id,
            group_id: new.group_id,
            status: ReleaseStatus::Pending,
            scheduled_at: new.scheduled_at,
            released_at: None,
            created_by: new.created_by,
            created_at: now(),
        };
        self.write()?.document_releases.push(release.clone());
        Ok(release)
    }

    fn get_document_release(&self, id: RecordId) -> StoreResult<Option<DocumentRelease>> {
        Ok(self
            .read()?
            .document_releases
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn list_document_releases(&self) -> StoreResult<Vec<DocumentRelease>> {
        Ok(self.read()?.document_releases.clone())
    }

    fn releases_for_group(&self, group_id: RecordId) -> StoreResult<Vec<DocumentRelease>> {
        Ok(self
            .read()?
            .document_releases
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }

    fn update_document_release(
        &self,
        id: RecordId,
        update: DocumentReleaseUpdate,
    ) -> StoreResult<Option<DocumentRelease>> {
        let mut tables = self.write()?;
        let Some(release) = tables.document_releases.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            release.status = status;
        }
        if let Some(released_at) = update.released_at {
            release.released_at = Some(released_at);
        }
        Ok(Some(release.clone()))
    }

    fn delete_document_release(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.document_releases.retain(|r| r.id != id);
        Ok(())
    }

    // -- data versions and assignments ---------------------------------------

    fn create_data_version(&self, new: NewDataVersion) -> StoreResult<DataVersion> {
        let version = DataVersion {
            id: RecordId::new(),
            name: new.name,
            description: new.description,
            created_at: now(),
        };
        self.write()?.data_versions.push(version.clone());
        Ok(version)
    }

    fn get_data_version(&self, id: RecordId) -> StoreResult<Option<DataVersion>> {
        Ok(self
            .read()?
            .data_versions
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    fn list_data_versions(&self) -> StoreResult<Vec<DataVersion>> {
        Ok(self.read()?.data_versions.clone())
    }

    fn delete_data_version(&self, id: RecordId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.data_versions.retain(|v| v.id != id);
        tables
            .group_data_assignments
            .retain(|a| a.data_version_id != id);
        Ok(())
    }

    fn create_group_data_assignment(
        &self,
        new: NewGroupDataAssignment,
    ) -> StoreResult<GroupDataAssignment> {
        let assignment = GroupDataAssignment {
            id: RecordId::new(),
            group_id: new.group_id,
            data_version_id: new.data_version_id,
            patient_id: new.patient_id,
            created_at: now(),
        };
        self.write()?
            .group_data_assignments
            .push(assignment.clone());
        Ok(assignment)
    }

    fn assignments_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<GroupDataAssignment>> {
        Ok(self
            .read()?
            .group_data_assignments
            .iter()
            .filter(|a| a.group_id == group_id)
            .cloned()
            .collect())
    }

    fn assignment_exists(&self, group_id: RecordId, patient_id: RecordId) -> StoreResult<bool> {
        Ok(self
            .read()?
            .group_data_assignments
            .iter()
            .any(|a| a.group_id == group_id && a.patient_id == patient_id))
    }

    fn delete_group_data_assignment(&self, id: RecordId) -> StoreResult<()> {
        self.write()?
            .group_data_assignments
            .retain(|a| a.id != id);
        Ok(())
    }

    // -- investigation requests ----------------------------------------------

    fn create_blood_test_request(
        &self,
        new: NewBloodTestRequest,
    ) -> StoreResult<BloodTestRequest> {
        let request = BloodTestRequest {
            id: RecordId::new(),
            patient_id: new.patient_id,
            requested_by: new.requested_by,
            group_id: new.group_id,
            test_types: new.test_types,
            details: new.details,
            status: RequestStatus::Pending,
            signed_off_name: new.signed_off_name,
            signed_off_role: new.signed_off_role,
            approved_files: Vec::new(),
            completed_at: None,
            created_at: now(),
        };
        self.write()?.blood_test_requests.push(request.clone());
        Ok(request)
    }

    fn get_blood_test_request(&self, id: RecordId) -> StoreResult<Option<BloodTestRequest>> {
        Ok(self
            .read()?
            .blood_test_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn list_blood_test_requests(
        &self,
        patient_id: Option<RecordId>,
    ) -> StoreResult<Vec<BloodTestRequest>> {
        Ok(self
            .read()?
            .blood_test_requests
            .iter()
            .filter(|r| patient_id.map_or(true, |p| r.patient_id == p))
            .cloned()
            .collect())
    }

    fn blood_test_requests_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<BloodTestRequest>> {
        Ok(self
            .read()?
            .blood_test_requests
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }

    fn complete_blood_test_request(
        &self,
        id: RecordId,
        approved_files: Vec<ApprovedFile>,
        signed_off_name: Option<String>,
        signed_off_role: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<BloodTestRequest>> {
        let mut tables = self.write()?;
        let Some(request) = tables.blood_test_requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.status = RequestStatus::Completed;
        request.approved_files = approved_files;
        request.completed_at = Some(completed_at);
        if signed_off_name.is_some() {
            request.signed_off_name = signed_off_name;
        }
        if signed_off_role.is_some() {
            request.signed_off_role = signed_off_role;
        }
        Ok(Some(request.clone()))
    }

    fn delete_blood_test_request(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.blood_test_requests.retain(|r| r.id != id);
        Ok(())
    }

    fn create_imaging_request(&self, new: NewImagingRequest) -> StoreResult<ImagingRequest> {
        let request = ImagingRequest {
            id: RecordId::new(),
            patient_id: new.patient_id,
            requested_by: new.requested_by,
            group_id: new.group_id,
            imaging_types: new.imaging_types,
            details: new.details,
            status: RequestStatus::Pending,
            signed_off_name: new.signed_off_name,
            signed_off_role: new.signed_off_role,
            approved_files: Vec::new(),
            completed_at: None,
            created_at: now(),
        };
        self.write()?.imaging_requests.push(request.clone());
        Ok(request)
    }

    fn get_imaging_request(&self, id: RecordId) -> StoreResult<Option<ImagingRequest>> {
        Ok(self
            .read()?
            .imaging_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn list_imaging_requests(
        &self,
        patient_id: Option<RecordId>,
    ) -> StoreResult<Vec<ImagingRequest>> {
        Ok(self
            .read()?
            .imaging_requests
            .iter()
            .filter(|r| patient_id.map_or(true, |p| r.patient_id == p))
            .cloned()
            .collect())
    }

    fn imaging_requests_for_group(
        &self,
        group_id: RecordId,
    ) -> StoreResult<Vec<ImagingRequest>> {
        Ok(self
            .read()?
            .imaging_requests
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }

    fn complete_imaging_request(
        &self,
        id: RecordId,
        approved_files: Vec<ApprovedFile>,
        signed_off_name: Option<String>,
        signed_off_role: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<ImagingRequest>> {
        let mut tables = self.write()?;
        let Some(request) = tables.imaging_requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.status = RequestStatus::Completed;
        request.approved_files = approved_files;
        request.completed_at = Some(completed_at);
        if signed_off_name.is_some() {
            request.signed_off_name = signed_off_name;
        }
        if signed_off_role.is_some() {
            request.signed_off_role = signed_off_role;
        }
        Ok(Some(request.clone()))
    }

    fn delete_imaging_request(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.imaging_requests.retain(|r| r.id != id);
        Ok(())
    }

    // -- patient files -------------------------------------------------------

    fn create_patient_file(&self, new: NewPatientFile) -> StoreResult<PatientFile> {
        let file = PatientFile {
            id: RecordId::new(),
            patient_id: new.patient_id,
            display_name: new.display_name,
            category: new.category,
            requires_pagination: new.requires_pagination,
            content_hash: new.content_hash,
            media_type: new.media_type,
            created_at: now(),
        };
        self.write()?.patient_files.push(file.clone());
        Ok(file)
    }

    fn get_patient_file(&self, id: RecordId) -> StoreResult<Option<PatientFile>> {
        Ok(self
            .read()?
            .patient_files
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    fn files_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<PatientFile>> {
        Ok(self
            .read()?
            .patient_files
            .iter()
            .filter(|f| f.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn delete_patient_file(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.patient_files.retain(|f| f.id != id);
        Ok(())
    }

    // -- observation sub-records ---------------------------------------------

    fn create_blood_pressure(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        systolic: i32,
        diastolic: i32,
    ) -> StoreResult<BloodPressure> {
        let record = BloodPressure {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            systolic,
            diastolic,
            created_at: now(),
        };
        self.write()?.blood_pressures.push(record.clone());
        Ok(record)
    }

    fn blood_pressures_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<BloodPressure>> {
        Ok(self
            .read()?
            .blood_pressures
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_heart_rate(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        rate: i32,
    ) -> StoreResult<HeartRate> {
        let record = HeartRate {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            rate,
            created_at: now(),
        };
        self.write()?.heart_rates.push(record.clone());
        Ok(record)
    }

    fn heart_rates_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<HeartRate>> {
        Ok(self
            .read()?
            .heart_rates
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_body_temperature(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        temperature: String,
    ) -> StoreResult<BodyTemperature> {
        let record = BodyTemperature {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            temperature,
            created_at: now(),
        };
        self.write()?.body_temperatures.push(record.clone());
        Ok(record)
    }

    fn body_temperatures_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<BodyTemperature>> {
        Ok(self
            .read()?
            .body_temperatures
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_respiratory_rate(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        rate: i32,
    ) -> StoreResult<RespiratoryRate> {
        let record = RespiratoryRate {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            rate,
            created_at: now(),
        };
        self.write()?.respiratory_rates.push(record.clone());
        Ok(record)
    }

    fn respiratory_rates_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<RespiratoryRate>> {
        Ok(self
            .read()?
            .respiratory_rates
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_blood_sugar(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        sugar_level: String,
    ) -> StoreResult<BloodSugar> {
        let record = BloodSugar {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            sugar_level,
            created_at: now(),
        };
        self.write()?.blood_sugars.push(record.clone());
        Ok(record)
    }

    fn blood_sugars_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<BloodSugar>> {
        Ok(self
            .read()?
            .blood_sugars
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_oxygen_saturation(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        saturation_percentage: i32,
    ) -> StoreResult<OxygenSaturation> {
        let record = OxygenSaturation {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            saturation_percentage,
            created_at: now(),
        };
        self.write()?.oxygen_saturations.push(record.clone());
        Ok(record)
    }

    fn oxygen_saturations_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<OxygenSaturation>> {
        Ok(self
            .read()?
            .oxygen_saturations
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_pain_score(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        score: i32,
    ) -> StoreResult<PainScore> {
        let record = PainScore {
            id: RecordId::new(),
            patient_id,
            recorded_by,
            score,
            created_at: now(),
        };
        self.write()?.pain_scores.push(record.clone());
        Ok(record)
    }

    fn pain_scores_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<PainScore>> {
        Ok(self
            .read()?
            .pain_scores
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    // -- clinical chart records ----------------------------------------------

    fn create_medical_history(
        &self,
        new: NewMedicalHistoryEntry,
    ) -> StoreResult<MedicalHistoryEntry> {
        let entry = MedicalHistoryEntry {
            id: RecordId::new(),
            patient_id: new.patient_id,
            title: new.title,
            notes: new.notes,
            recorded_by: new.recorded_by,
            created_at: now(),
        };
        self.write()?.medical_history.push(entry.clone());
        Ok(entry)
    }

    fn medical_history_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<MedicalHistoryEntry>> {
        Ok(self
            .read()?
            .medical_history
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_medication(&self, new: NewMedication) -> StoreResult<Medication> {
        let medication = Medication {
            id: RecordId::new(),
            patient_id: new.patient_id,
            name: new.name,
            dose: new.dose,
            route: new.route,
            frequency: new.frequency,
            recorded_by: new.recorded_by,
            created_at: now(),
        };
        self.write()?.medications.push(medication.clone());
        Ok(medication)
    }

    fn medications_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<Medication>> {
        Ok(self
            .read()?
            .medications
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_vital_signs(&self, new: NewVitalSignsEntry) -> StoreResult<VitalSignsEntry> {
        let entry = VitalSignsEntry {
            id: RecordId::new(),
            patient_id: new.patient_id,
            heart_rate: new.heart_rate,
            systolic: new.systolic,
            diastolic: new.diastolic,
            temperature: new.temperature,
            respiratory_rate: new.respiratory_rate,
            oxygen_saturation: new.oxygen_saturation,
            recorded_by: new.recorded_by,
            created_at: now(),
        };
        self.write()?.vital_signs.push(entry.clone());
        Ok(entry)
    }

    fn vital_signs_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<VitalSignsEntry>> {
        Ok(self
            .read()?
            .vital_signs
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_lab_result(&self, new: NewLabResult) -> StoreResult<LabResult> {
        let result = LabResult {
            id: RecordId::new(),
            patient_id: new.patient_id,
            test_name: new.test_name,
            value: new.value,
            unit: new.unit,
            reference_range: new.reference_range,
            recorded_by: new.recorded_by,
            created_at: now(),
        };
        self.write()?.lab_results.push(result.clone());
        Ok(result)
    }

    fn lab_results_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<LabResult>> {
        Ok(self
            .read()?
            .lab_results
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_soap_note(&self, new: NewSoapNote) -> StoreResult<SoapNote> {
        let note = SoapNote {
            id: RecordId::new(),
            patient_id: new.patient_id,
            subjective: new.subjective,
            objective: new.objective,
            assessment: new.assessment,
            plan: new.plan,
            recorded_by: new.recorded_by,
            created_at: now(),
        };
        self.write()?.soap_notes.push(note.clone());
        Ok(note)
    }

    fn soap_notes_by_patient(&self, patient_id: RecordId) -> StoreResult<Vec<SoapNote>> {
        Ok(self
            .read()?
            .soap_notes
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn create_clinical_order(&self, new: NewClinicalOrder) -> StoreResult<ClinicalOrder> {
        let order = ClinicalOrder {
            id: RecordId::new(),
            patient_id: new.patient_id,
            description: new.description,
            ordered_by: new.ordered_by,
            completed: new.completed,
            created_at: now(),
        };
        self.write()?.clinical_orders.push(order.clone());
        Ok(order)
    }

    fn clinical_orders_by_patient(
        &self,
        patient_id: RecordId,
    ) -> StoreResult<Vec<ClinicalOrder>> {
        Ok(self
            .read()?
            .clinical_orders
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    // -- audit and scheduling ------------------------------------------------

    fn append_audit(&self, new: NewAuditLogEntry) -> StoreResult<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: RecordId::new(),
            actor_id: new.actor_id,
            action: new.action,
            entity: new.entity,
            entity_id: new.entity_id,
            created_at: now(),
        };
        self.write()?.audit_logs.push(entry.clone());
        Ok(entry)
    }

    fn list_audit_logs(&self) -> StoreResult<Vec<AuditLogEntry>> {
        Ok(self.read()?.audit_logs.clone())
    }

    fn create_simulation_week(&self, new: NewSimulationWeek) -> StoreResult<SimulationWeek> {
        let week = SimulationWeek {
            id: RecordId::new(),
            name: new.name,
            week_number: new.week_number,
            starts_on: new.starts_on,
            ends_on: new.ends_on,
            created_at: now(),
        };
        self.write()?.simulation_weeks.push(week.clone());
        Ok(week)
    }

    fn get_simulation_week(&self, id: RecordId) -> StoreResult<Option<SimulationWeek>> {
        Ok(self
            .read()?
            .simulation_weeks
            .iter()
            .find(|w| w.id == id)
            .cloned())
    }

    fn list_simulation_weeks(&self) -> StoreResult<Vec<SimulationWeek>> {
        Ok(self.read()?.simulation_weeks.clone())
    }

    fn update_simulation_week(
        &self,
        id: RecordId,
        update: SimulationWeekUpdate,
    ) -> StoreResult<Option<SimulationWeek>> {
        let mut tables = self.write()?;
        let Some(week) = tables.simulation_weeks.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            week.name = name;
        }
        if let Some(number) = update.week_number {
            week.week_number = number;
        }
        if let Some(starts_on) = update.starts_on {
            week.starts_on = starts_on;
        }
        if let Some(ends_on) = update.ends_on {
            week.ends_on = ends_on;
        }
        Ok(Some(week.clone()))
    }

    fn delete_simulation_week(&self, id: RecordId) -> StoreResult<()> {
        self.write()?.simulation_weeks.retain(|w| w.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    fn sample_patient(store: &MemoryStore) -> Patient {
        store
            .create_patient(NewPatient {
                first_name: "Alex".into(),
                last_name: "Morgan".into(),
                age: Some(54),
                sex: Some("F".into()),
                status: PatientStatus::Stable,
                chief_complaint: "Chest pain".into(),
                session_id: None,
            })
            .unwrap()
    }

    fn sample_user(store: &MemoryStore, role: Role) -> User {
        store
            .create_user(NewUser {
                username: format!("user-{}", RecordId::new()),
                password: "pw".into(),
                role,
                first_name: "Test".into(),
                last_name: "User".into(),
            })
            .unwrap()
    }

    #[test]
    fn create_assigns_id_and_timestamp() {
        let store = store();
        let patient = sample_patient(&store);
        assert_eq!(
            store.get_patient(patient.id).unwrap().unwrap().first_name,
            "Alex"
        );
    }

    #[test]
    fn update_missing_id_returns_none() {
        let store = store();
        let result = store
            .update_patient(RecordId::new(), PatientUpdate::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn update_merges_partial_fields() {
        let store = store();
        let patient = sample_patient(&store);
        let updated = store
            .update_patient(
                patient.id,
                PatientUpdate {
                    status: Some(PatientStatus::Critical),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PatientStatus::Critical);
        // untouched fields survive the merge
        assert_eq!(updated.chief_complaint, "Chest pain");
    }

    #[test]
    fn delete_patient_missing_returns_false() {
        let store = store();
        assert!(!store.delete_patient(RecordId::new()).unwrap());
    }

    #[test]
    fn delete_patient_cascades_dependent_records() {
        let store = store();
        let instructor = sample_user(&store, Role::Instructor);
        let patient = sample_patient(&store);
        let other = sample_patient(&store);

        let session = store
            .create_session(NewSession {
                name: "Week 1".into(),
                instructor_id: instructor.id,
                active: true,
                time_remaining_secs: 3600,
            })
            .unwrap();
        let group = store
            .create_group(NewGroup {
                name: "Group A".into(),
                session_id: session.id,
            })
            .unwrap();
        let version = store
            .create_data_version(NewDataVersion {
                name: "v1".into(),
                description: None,
            })
            .unwrap();

        store
            .create_medical_history(NewMedicalHistoryEntry {
                patient_id: patient.id,
                title: "Hypertension".into(),
                notes: String::new(),
                recorded_by: instructor.id,
            })
            .unwrap();
        store
            .create_medication(NewMedication {
                patient_id: patient.id,
                name: "Amlodipine".into(),
                dose: "5mg".into(),
                route: "PO".into(),
                frequency: "OD".into(),
                recorded_by: instructor.id,
            })
            .unwrap();
        store
            .create_vital_signs(NewVitalSignsEntry {
                patient_id: patient.id,
                heart_rate: Some(88),
                systolic: Some(135),
                diastolic: Some(85),
                temperature: Some("37.1".into()),
                respiratory_rate: Some(16),
                oxygen_saturation: Some(97),
                recorded_by: instructor.id,
            })
            .unwrap();
        store
            .create_lab_result(NewLabResult {
                patient_id: patient.id,
                test_name: "Hb".into(),
                value: "141".into(),
                unit: Some("g/L".into()),
                reference_range: None,
                recorded_by: instructor.id,
            })
            .unwrap();
        store
            .create_soap_note(NewSoapNote {
                patient_id: patient.id,
                subjective: "s".into(),
                objective: "o".into(),
                assessment: "a".into(),
                plan: "p".into(),
                recorded_by: instructor.id,
            })
            .unwrap();
        store
            .create_clinical_order(NewClinicalOrder {
                patient_id: patient.id,
                description: "IV access".into(),
                ordered_by: instructor.id,
                completed: false,
            })
            .unwrap();
        store
            .create_group_data_assignment(NewGroupDataAssignment {
                group_id: group.id,
                data_version_id: version.id,
                patient_id: patient.id,
            })
            .unwrap();
        let document = store
            .create_document(NewDocument {
                title: "Admission letter".into(),
                description: None,
                session_id: session.id,
                patient_id: Some(patient.id),
                content_hash: None,
                uploaded_by: instructor.id,
            })
            .unwrap();
        store
            .create_document_release(NewDocumentRelease {
                document_id: document.id,
                group_id: group.id,
                scheduled_at: None,
                created_by: instructor.id,
            })
            .unwrap();
        // a record on a different patient must survive
        store
            .create_lab_result(NewLabResult {
                patient_id: other.id,
                test_name: "Na".into(),
                value: "139".into(),
                unit: Some("mmol/L".into()),
                reference_range: None,
                recorded_by: instructor.id,
            })
            .unwrap();

        assert!(store.delete_patient(patient.id).unwrap());

        assert!(store.get_patient(patient.id).unwrap().is_none());
        assert!(store
            .medical_history_by_patient(patient.id)
            .unwrap()
            .is_empty());
        assert!(store.medications_by_patient(patient.id).unwrap().is_empty());
        assert!(store.vital_signs_by_patient(patient.id).unwrap().is_empty());
        assert!(store.lab_results_by_patient(patient.id).unwrap().is_empty());
        assert!(store.soap_notes_by_patient(patient.id).unwrap().is_empty());
        assert!(store
            .clinical_orders_by_patient(patient.id)
            .unwrap()
            .is_empty());
        assert!(!store.assignment_exists(group.id, patient.id).unwrap());
        assert!(store.get_document(document.id).unwrap().is_none());
        assert!(store.list_document_releases().unwrap().is_empty());
        assert_eq!(store.lab_results_by_patient(other.id).unwrap().len(), 1);
    }

    #[test]
    fn visibility_upsert_keeps_one_row() {
        let store = store();
        let user = sample_user(&store, Role::Instructor);
        let session = store
            .create_session(NewSession {
                name: "S".into(),
                instructor_id: user.id,
                active: true,
                time_remaining_secs: 0,
            })
            .unwrap();
        let group = store
            .create_group(NewGroup {
                name: "G".into(),
                session_id: session.id,
            })
            .unwrap();
        let asset = store
            .create_asset(NewAsset {
                filename: "ecg.png".into(),
                kind: "image".into(),
                content_hash: "h".into(),
                session_id: session.id,
                uploaded_by: user.id,
            })
            .unwrap();

        let first_ts = Utc::now();
        store
            .upsert_asset_visibility(asset.id, group.id, true, user.id, first_ts)
            .unwrap();
        let second_ts = Utc::now();
        let row = store
            .upsert_asset_visibility(asset.id, group.id, true, user.id, second_ts)
            .unwrap();

        assert_eq!(store.visibility_rows_for_group(group.id).unwrap().len(), 1);
        assert_eq!(row.changed_at, second_ts);
    }

    #[test]
    fn blood_test_requests_always_start_pending() {
        let store = store();
        let user = sample_user(&store, Role::Student);
        let patient = sample_patient(&store);
        let request = store
            .create_blood_test_request(NewBloodTestRequest {
                patient_id: patient.id,
                requested_by: user.id,
                group_id: RecordId::new(),
                test_types: vec![BloodTestType::FullBloodCount],
                details: String::new(),
                signed_off_name: None,
                signed_off_role: None,
            })
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.approved_files.is_empty());
        assert!(request.completed_at.is_none());
    }

    #[test]
    fn add_group_member_is_idempotent() {
        let store = store();
        let user = sample_user(&store, Role::Student);
        let instructor = sample_user(&store, Role::Instructor);
        let session = store
            .create_session(NewSession {
                name: "S".into(),
                instructor_id: instructor.id,
                active: true,
                time_remaining_secs: 0,
            })
            .unwrap();
        let group = store
            .create_group(NewGroup {
                name: "G".into(),
                session_id: session.id,
            })
            .unwrap();

        store.add_group_member(group.id, user.id).unwrap();
        store.add_group_member(group.id, user.id).unwrap();

        assert_eq!(store.members_of_group(group.id).unwrap().len(), 1);
        assert_eq!(store.groups_for_user(user.id).unwrap().len(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let store = store();
        sample_patient(&store);
        sample_user(&store, Role::Admin);

        let snapshot = store.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let store2 = MemoryStore::from_snapshot(restored);

        assert_eq!(store2.list_patients().unwrap().len(), 1);
        assert_eq!(store2.list_users().unwrap().len(), 1);
    }
}
