//! Investigation request workflow.
//!
//! Blood test and imaging requests share one lifecycle: created `pending` by
//! a group, later marked `completed` by staff with a list of file grants.
//! The transition is one-way; there is no rejected or cancelled state.
//!
//! Completion validates every grant server-side: the file must exist, belong
//! to the request's patient, and carry a page range whenever the file
//! requires pagination.

use crate::error::{CoreError, CoreResult};
use crate::model::{
    ApprovedFile, BloodTestRequest, BloodTestType, ImagingRequest, ImagingType,
    NewBloodTestRequest, NewImagingRequest, RequestStatus,
};
use crate::store::EntityStore;
use crate::visibility::GroupScope;
use crate::ListOrdering;
use chrono::Utc;
use simward_uuid::RecordId;
use std::sync::Arc;

/// Client payload for raising a blood test request.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateBloodTestInput {
    pub test_types: Vec<BloodTestType>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

/// Client payload for raising an imaging request.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateImagingInput {
    pub imaging_types: Vec<ImagingType>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

/// Completion payload: the grants to attach plus optional sign-off.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CompleteRequestInput {
    #[serde(default)]
    pub approved_files: Vec<ApprovedFile>,
    #[serde(default)]
    pub signed_off_name: Option<String>,
    #[serde(default)]
    pub signed_off_role: Option<String>,
}

/// Create / list / complete / delete over both request kinds.
#[derive(Clone)]
pub struct InvestigationService {
    store: Arc<dyn EntityStore>,
}

impl InvestigationService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Raises a blood test request for the scope's active group.
    ///
    /// Status is forced to `pending` regardless of anything the client sent;
    /// at least one test type is required and the patient must exist.
    pub fn create_blood_test(
        &self,
        patient_id: RecordId,
        scope: &GroupScope,
        input: CreateBloodTestInput,
    ) -> CoreResult<BloodTestRequest> {
        let group_id = scope.require_group()?;
        self.store
            .get_patient(patient_id)?
            .ok_or(CoreError::NotFound("patient"))?;
        if input.test_types.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one test type is required".into(),
            ));
        }

        let request = self.store.create_blood_test_request(NewBloodTestRequest {
            patient_id,
            requested_by: scope.user.id,
            group_id,
            test_types: input.test_types,
            details: input.details,
            signed_off_name: input.signed_off_name,
            signed_off_role: input.signed_off_role,
        })?;
        tracing::info!(request = %request.id, patient = %patient_id, "blood test request raised");
        Ok(request)
    }

    /// Raises an imaging request for the scope's active group.
    pub fn create_imaging(
        &self,
        patient_id: RecordId,
        scope: &GroupScope,
        input: CreateImagingInput,
    ) -> CoreResult<ImagingRequest> {
        let group_id = scope.require_group()?;
        self.store
            .get_patient(patient_id)?
            .ok_or(CoreError::NotFound("patient"))?;
        if input.imaging_types.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one imaging type is required".into(),
            ));
        }

        let request = self.store.create_imaging_request(NewImagingRequest {
            patient_id,
            requested_by: scope.user.id,
            group_id,
            imaging_types: input.imaging_types,
            details: input.details,
            signed_off_name: input.signed_off_name,
            signed_off_role: input.signed_off_role,
        })?;
        tracing::info!(request = %request.id, patient = %patient_id, "imaging request raised");
        Ok(request)
    }

    /// Lists blood test requests, optionally filtered to one patient.
    /// Default order is creation order; `-created_at` gives newest-first.
    pub fn list_blood_tests(
        &self,
        patient_id: Option<RecordId>,
        ordering: ListOrdering,
    ) -> CoreResult<Vec<BloodTestRequest>> {
        let mut requests = self.store.list_blood_test_requests(patient_id)?;
        if ordering == ListOrdering::CreatedDesc {
            requests.reverse();
        }
        Ok(requests)
    }

    /// Lists imaging requests, optionally filtered to one patient.
    pub fn list_imaging(
        &self,
        patient_id: Option<RecordId>,
        ordering: ListOrdering,
    ) -> CoreResult<Vec<ImagingRequest>> {
        let mut requests = self.store.list_imaging_requests(patient_id)?;
        if ordering == ListOrdering::CreatedDesc {
            requests.reverse();
        }
        Ok(requests)
    }

    /// Completes a pending blood test request, attaching its file grants.
    ///
    /// The only permitted transition is `pending → completed`; completing an
    /// already-completed request is rejected and leaves it untouched.
    pub fn complete_blood_test(
        &self,
        id: RecordId,
        input: CompleteRequestInput,
    ) -> CoreResult<BloodTestRequest> {
        let request = self
            .store
            .get_blood_test_request(id)?
            .ok_or(CoreError::NotFound("blood test request"))?;
        if request.status == RequestStatus::Completed {
            return Err(CoreError::InvalidInput(
                "request has already been completed".into(),
            ));
        }

        self.validate_approved_files(request.patient_id, &input.approved_files)?;

        let completed = self
            .store
            .complete_blood_test_request(
                id,
                input.approved_files,
                input.signed_off_name,
                input.signed_off_role,
                Utc::now(),
            )?
            .ok_or(CoreError::NotFound("blood test request"))?;
        tracing::info!(request = %id, files = completed.approved_files.len(), "blood test request completed");
        Ok(completed)
    }

    /// Completes a pending imaging request, attaching its file grants.
    pub fn complete_imaging(
        &self,
        id: RecordId,
        input: CompleteRequestInput,
    ) -> CoreResult<ImagingRequest> {
        let request = self
            .store
            .get_imaging_request(id)?
            .ok_or(CoreError::NotFound("imaging request"))?;
        if request.status == RequestStatus::Completed {
            return Err(CoreError::InvalidInput(
                "request has already been completed".into(),
            ));
        }

        self.validate_approved_files(request.patient_id, &input.approved_files)?;

        let completed = self
            .store
            .complete_imaging_request(
                id,
                input.approved_files,
                input.signed_off_name,
                input.signed_off_role,
                Utc::now(),
            )?
            .ok_or(CoreError::NotFound("imaging request"))?;
        tracing::info!(request = %id, files = completed.approved_files.len(), "imaging request completed");
        Ok(completed)
    }

    /// Deletes a blood test request. Idempotent: deleting a missing or
    /// already-completed request is a no-op, not an error; pending-only
    /// deletion is a client policy, not a server rule.
    pub fn delete_blood_test(&self, id: RecordId) -> CoreResult<()> {
        Ok(self.store.delete_blood_test_request(id)?)
    }

    /// Deletes an imaging request. Same leniency as blood tests.
    pub fn delete_imaging(&self, id: RecordId) -> CoreResult<()> {
        Ok(self.store.delete_imaging_request(id)?)
    }

    /// Every grant must name an existing file of the request's patient, and
    /// carry a page range whenever the file requires pagination.
    fn validate_approved_files(
        &self,
        patient_id: RecordId,
        approved_files: &[ApprovedFile],
    ) -> CoreResult<()> {
        for approved in approved_files {
            let file = self
                .store
                .get_patient_file(approved.file_id)?
                .ok_or_else(|| {
                    CoreError::InvalidInput(format!(
                        "approved file {} does not exist",
                        approved.file_id
                    ))
                })?;

            if file.patient_id != patient_id {
                return Err(CoreError::InvalidInput(format!(
                    "approved file {} belongs to a different patient",
                    approved.file_id
                )));
            }

            if file.requires_pagination && approved.page_range.is_none() {
                return Err(CoreError::InvalidInput(format!(
                    "file {} requires a page range",
                    approved.file_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::store::MemoryStore;
    use crate::visibility::resolve_group_scope;
    use simward_types::PageRange;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: InvestigationService,
        scope: GroupScope,
        patient: Patient,
        other_patient: Patient,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = InvestigationService::new(store.clone());

        let instructor = store
            .create_user(NewUser {
                username: "instructor".into(),
                password: "pw".into(),
                role: Role::Instructor,
                first_name: "Ira".into(),
                last_name: "Stone".into(),
            })
            .unwrap();
        let student = store
            .create_user(NewUser {
                username: "student".into(),
                password: "pw".into(),
                role: Role::Student,
                first_name: "Sam".into(),
                last_name: "Lee".into(),
            })
            .unwrap();
        let session = store
            .create_session(NewSession {
                name: "Sim".into(),
                instructor_id: instructor.id,
                active: true,
                time_remaining_secs: 0,
            })
            .unwrap();
        let group = store
            .create_group(NewGroup {
                name: "A".into(),
                session_id: session.id,
            })
            .unwrap();
        store.add_group_member(group.id, student.id).unwrap();

        let patient = store
            .create_patient(NewPatient {
                first_name: "Pat".into(),
                last_name: "One".into(),
                age: None,
                sex: None,
                status: PatientStatus::Stable,
                chief_complaint: "SOB".into(),
                session_id: Some(session.id),
            })
            .unwrap();
        let other_patient = store
            .create_patient(NewPatient {
                first_name: "Pat".into(),
                last_name: "Two".into(),
                age: None,
                sex: None,
                status: PatientStatus::Stable,
                chief_complaint: "Falls".into(),
                session_id: Some(session.id),
            })
            .unwrap();

        let scope = resolve_group_scope(store.as_ref(), student.id, None).unwrap();

        Fixture {
            store,
            service,
            scope,
            patient,
            other_patient,
        }
    }

    fn paginated_file(f: &Fixture, patient_id: RecordId) -> PatientFile {
        f.store
            .create_patient_file(NewPatientFile {
                patient_id,
                display_name: "FBC report".into(),
                category: FileCategory::LabReport,
                requires_pagination: true,
                content_hash: "hash".into(),
                media_type: Some("application/pdf".into()),
            })
            .unwrap()
    }

    fn raise(f: &Fixture) -> BloodTestRequest {
        f.service
            .create_blood_test(
                f.patient.id,
                &f.scope,
                CreateBloodTestInput {
                    test_types: vec![BloodTestType::FullBloodCount],
                    details: "?anaemia".into(),
                    signed_off_name: Some("Sam Lee".into()),
                    signed_off_role: Some("Student".into()),
                },
            )
            .unwrap()
    }

    #[test]
    fn requests_start_pending() {
        let f = fixture();
        let request = raise(&f);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.approved_files.is_empty());
    }

    #[test]
    fn create_requires_a_test_type() {
        let f = fixture();
        let err = f
            .service
            .create_blood_test(
                f.patient.id,
                &f.scope,
                CreateBloodTestInput {
                    test_types: vec![],
                    details: String::new(),
                    signed_off_name: None,
                    signed_off_role: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn create_rejects_unknown_patient() {
        let f = fixture();
        let err = f
            .service
            .create_blood_test(
                RecordId::new(),
                &f.scope,
                CreateBloodTestInput {
                    test_types: vec![BloodTestType::Troponin],
                    details: String::new(),
                    signed_off_name: None,
                    signed_off_role: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("patient")));
    }

    #[test]
    fn complete_attaches_grants_and_sets_timestamp() {
        let f = fixture();
        let file = paginated_file(&f, f.patient.id);
        let request = raise(&f);

        let completed = f
            .service
            .complete_blood_test(
                request.id,
                CompleteRequestInput {
                    approved_files: vec![ApprovedFile {
                        file_id: file.id,
                        page_range: Some(PageRange::parse("1-3").unwrap()),
                    }],
                    signed_off_name: Some("Dr Reed".into()),
                    signed_off_role: Some("Consultant".into()),
                },
            )
            .unwrap();

        assert_eq!(completed.status, RequestStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.approved_files.len(), 1);
        assert_eq!(completed.signed_off_name.as_deref(), Some("Dr Reed"));
    }

    #[test]
    fn complete_twice_is_rejected() {
        let f = fixture();
        let request = raise(&f);
        f.service
            .complete_blood_test(request.id, CompleteRequestInput::default())
            .unwrap();

        let err = f
            .service
            .complete_blood_test(request.id, CompleteRequestInput::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn paginated_file_requires_a_page_range() {
        let f = fixture();
        let file = paginated_file(&f, f.patient.id);
        let request = raise(&f);

        let err = f
            .service
            .complete_blood_test(
                request.id,
                CompleteRequestInput {
                    approved_files: vec![ApprovedFile {
                        file_id: file.id,
                        page_range: None,
                    }],
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        // the failed completion left the request pending
        let still_pending = f
            .store
            .get_blood_test_request(request.id)
            .unwrap()
            .unwrap();
        assert_eq!(still_pending.status, RequestStatus::Pending);
    }

    #[test]
    fn grant_for_foreign_patient_file_is_rejected() {
        let f = fixture();
        let foreign = paginated_file(&f, f.other_patient.id);
        let request = raise(&f);

        let err = f
            .service
            .complete_blood_test(
                request.id,
                CompleteRequestInput {
                    approved_files: vec![ApprovedFile {
                        file_id: foreign.id,
                        page_range: Some(PageRange::parse("1").unwrap()),
                    }],
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn list_honours_ordering() {
        let f = fixture();
        let first = raise(&f);
        let second = raise(&f);

        let asc = f
            .service
            .list_blood_tests(Some(f.patient.id), ListOrdering::CreatedAsc)
            .unwrap();
        assert_eq!(asc[0].id, first.id);

        let desc = f
            .service
            .list_blood_tests(Some(f.patient.id), ListOrdering::CreatedDesc)
            .unwrap();
        assert_eq!(desc[0].id, second.id);
    }

    #[test]
    fn delete_is_idempotent() {
        let f = fixture();
        let request = raise(&f);
        f.service.delete_blood_test(request.id).unwrap();
        // second delete of the same id is a no-op
        f.service.delete_blood_test(request.id).unwrap();
        assert!(f
            .store
            .get_blood_test_request(request.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn imaging_workflow_mirrors_blood_tests() {
        let f = fixture();
        let request = f
            .service
            .create_imaging(
                f.patient.id,
                &f.scope,
                CreateImagingInput {
                    imaging_types: vec![ImagingType::ChestXray],
                    details: "?consolidation".into(),
                    signed_off_name: None,
                    signed_off_role: None,
                },
            )
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let completed = f
            .service
            .complete_imaging(request.id, CompleteRequestInput::default())
            .unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
    }
}
