//! Group-scoped visibility resolution.
//!
//! This module answers the question "may this group see this thing?" for the
//! three kinds of gated material:
//!
//! - **Assets** are gated by explicit per-(asset, group) visibility rows.
//!   Absence of a row means not visible; there is no default-allow path.
//! - **Patients** are gated by group-data-assignment rows; student scopes
//!   without an assignment naming the patient are rejected.
//! - **Patient files** are gated by completed investigation requests whose
//!   `approved_files` name the file, optionally scoped to a page range.
//!
//! Group scope itself is an explicit value ([`GroupScope`]) resolved once per
//! request and passed to whatever needs it, never ambient request state.

use crate::error::{CoreError, CoreResult};
use crate::model::{
    Asset, AssetGroupVisibility, Document, GroupDataAssignment, NewAuditLogEntry, PatientFile,
    ReleaseStatus, RequestStatus, User,
};
use crate::store::EntityStore;
use chrono::Utc;
use simward_types::PageRange;
use simward_uuid::RecordId;
use std::sync::Arc;

/// Resolved acting scope for one request.
///
/// `active_group` is the group whose data the request operates on. Staff
/// roles may have no group at all; students always act through one.
#[derive(Debug, Clone)]
pub struct GroupScope {
    pub user: User,
    pub active_group: Option<RecordId>,
    pub memberships: Vec<RecordId>,
}

impl GroupScope {
    /// The active group, or a `Forbidden` error when the scope has none.
    pub fn require_group(&self) -> CoreResult<RecordId> {
        self.active_group
            .ok_or_else(|| CoreError::Forbidden("no active group for this user".into()))
    }
}

/// Resolves the acting user's group scope.
///
/// `requested_group`, when given, must be one of the user's memberships
/// (403 otherwise). When absent, the user's first (oldest) membership is the
/// default. Students with no membership at all are rejected; staff may
/// legitimately operate without one.
///
/// # Errors
///
/// - `Unauthenticated` when the user id is unknown.
/// - `Forbidden` for a foreign `requested_group`, or a group-less student.
pub fn resolve_group_scope(
    store: &dyn EntityStore,
    user_id: RecordId,
    requested_group: Option<RecordId>,
) -> CoreResult<GroupScope> {
    let user = store
        .get_user(user_id)?
        .ok_or_else(|| CoreError::Unauthenticated("unknown user".into()))?;

    let memberships: Vec<RecordId> = store
        .groups_for_user(user_id)?
        .into_iter()
        .map(|g| g.id)
        .collect();

    let active_group = match requested_group {
        Some(group_id) => {
            if !memberships.contains(&group_id) {
                return Err(CoreError::Forbidden(
                    "user is not a member of the requested group".into(),
                ));
            }
            Some(group_id)
        }
        None => memberships.first().copied(),
    };

    if active_group.is_none() && !user.role.is_staff() {
        return Err(CoreError::Forbidden(
            "student account has no group membership".into(),
        ));
    }

    Ok(GroupScope {
        user,
        active_group,
        memberships,
    })
}

/// Access granted to one patient file, carrying the approved page range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGrant {
    /// Granted range; `None` means the whole file.
    pub page_range: Option<PageRange>,
}

/// Outcome of a bulk visibility update. Each id is applied independently;
/// there is no rollback, so `updated` rows stand even when later ids land in
/// `skipped`.
#[derive(Debug, Clone)]
pub struct BulkVisibilityOutcome {
    pub updated: Vec<AssetGroupVisibility>,
    pub skipped: Vec<RecordId>,
}

/// Read-path filter and visibility writer over the entity store.
#[derive(Clone)]
pub struct VisibilityService {
    store: Arc<dyn EntityStore>,
}

impl VisibilityService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Assets the group may see: exactly those with a visibility row whose
    /// `visible` flag is true. Assets with no row, or a row set to false,
    /// are excluded.
    pub fn visible_assets_for_group(&self, group_id: RecordId) -> CoreResult<Vec<Asset>> {
        self.store
            .get_group(group_id)?
            .ok_or(CoreError::NotFound("group"))?;

        let rows = self.store.visibility_rows_for_group(group_id)?;
        let mut assets = Vec::new();
        for row in rows.iter().filter(|r| r.visible) {
            if let Some(asset) = self.store.get_asset(row.asset_id)? {
                assets.push(asset);
            }
        }
        Ok(assets)
    }

    /// Upserts the visibility row for one (asset, group) pair.
    ///
    /// Last writer wins; the row records the actor and timestamp of the most
    /// recent change. The write is audited.
    pub fn update_asset_visibility(
        &self,
        asset_id: RecordId,
        group_id: RecordId,
        visible: bool,
        changed_by: RecordId,
    ) -> CoreResult<AssetGroupVisibility> {
        self.store
            .get_asset(asset_id)?
            .ok_or(CoreError::NotFound("asset"))?;
        self.store
            .get_group(group_id)?
            .ok_or(CoreError::NotFound("group"))?;

        let row = self.store.upsert_asset_visibility(
            asset_id,
            group_id,
            visible,
            changed_by,
            Utc::now(),
        )?;

        self.store.append_audit(NewAuditLogEntry {
            actor_id: Some(changed_by),
            action: if visible {
                "asset.visibility.grant".into()
            } else {
                "asset.visibility.revoke".into()
            },
            entity: "asset".into(),
            entity_id: Some(asset_id.to_string()),
        })?;

        Ok(row)
    }

    /// Applies the single-pair upsert independently to each asset id.
    ///
    /// Unknown asset ids are skipped and reported; earlier writes are not
    /// rolled back. The group must exist.
    pub fn bulk_update_asset_visibility(
        &self,
        asset_ids: &[RecordId],
        group_id: RecordId,
        visible: bool,
        changed_by: RecordId,
    ) -> CoreResult<BulkVisibilityOutcome> {
        self.store
            .get_group(group_id)?
            .ok_or(CoreError::NotFound("group"))?;

        let mut outcome = BulkVisibilityOutcome {
            updated: Vec::new(),
            skipped: Vec::new(),
        };

        for &asset_id in asset_ids {
            if self.store.get_asset(asset_id)?.is_none() {
                tracing::warn!(%asset_id, "bulk visibility update skipping unknown asset");
                outcome.skipped.push(asset_id);
                continue;
            }
            let row = self.store.upsert_asset_visibility(
                asset_id,
                group_id,
                visible,
                changed_by,
                Utc::now(),
            )?;
            outcome.updated.push(row);
        }

        self.store.append_audit(NewAuditLogEntry {
            actor_id: Some(changed_by),
            action: "asset.visibility.bulk".into(),
            entity: "group".into(),
            entity_id: Some(group_id.to_string()),
        })?;

        Ok(outcome)
    }

    /// Patient-record assignments for a group.
    pub fn assignments_for_group(
        &self,
        group_id: RecordId,
    ) -> CoreResult<Vec<GroupDataAssignment>> {
        self.store
            .get_group(group_id)?
            .ok_or(CoreError::NotFound("group"))?;
        Ok(self.store.assignments_for_group(group_id)?)
    }

    /// Rejects student scopes that have no assignment naming the patient.
    /// Staff roles pass unconditionally.
    pub fn ensure_patient_access(
        &self,
        scope: &GroupScope,
        patient_id: RecordId,
    ) -> CoreResult<()> {
        if scope.user.role.is_staff() {
            return Ok(());
        }

        let group_id = scope.require_group()?;
        if self.store.assignment_exists(group_id, patient_id)? {
            Ok(())
        } else {
            Err(CoreError::Forbidden(
                "group has no assignment for this patient".into(),
            ))
        }
    }

    /// Documents with a `released` release for the group.
    pub fn released_documents_for_group(&self, group_id: RecordId) -> CoreResult<Vec<Document>> {
        self.store
            .get_group(group_id)?
            .ok_or(CoreError::NotFound("group"))?;

        let releases = self.store.releases_for_group(group_id)?;
        let mut documents = Vec::new();
        for release in releases
            .iter()
            .filter(|r| r.status == ReleaseStatus::Released)
        {
            if let Some(document) = self.store.get_document(release.document_id)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Checks whether a group may view a patient file, honouring the grants
    /// attached to the group's completed investigation requests.
    ///
    /// The first matching grant wins. When the grant carries a page range,
    /// a requested range must lie within it; a request for the whole of a
    /// range-limited file is likewise rejected.
    pub fn can_group_view_file(
        &self,
        group_id: RecordId,
        file: &PatientFile,
        requested: Option<&PageRange>,
    ) -> CoreResult<FileGrant> {
        let grant = self
            .find_grant(group_id, file.id)?
            .ok_or_else(|| {
                CoreError::Forbidden("file has not been approved for this group".into())
            })?;

        match (&grant.page_range, requested) {
            (Some(granted), Some(asked)) if !granted.contains(asked) => {
                Err(CoreError::Forbidden(format!(
                    "requested pages {} exceed the approved range {}",
                    asked, granted
                )))
            }
            (Some(granted), None) => {
                // A range-limited grant never exposes the whole file.
                Err(CoreError::Forbidden(format!(
                    "access to this file is limited to pages {}",
                    granted
                )))
            }
            _ => Ok(grant),
        }
    }

    fn find_grant(&self, group_id: RecordId, file_id: RecordId) -> CoreResult<Option<FileGrant>> {
        for request in self.store.blood_test_requests_for_group(group_id)? {
            if request.status != RequestStatus::Completed {
                continue;
            }
            if let Some(approved) = request.approved_files.iter().find(|f| f.file_id == file_id) {
                return Ok(Some(FileGrant {
                    page_range: approved.page_range,
                }));
            }
        }
        for request in self.store.imaging_requests_for_group(group_id)? {
            if request.status != RequestStatus::Completed {
                continue;
            }
            if let Some(approved) = request.approved_files.iter().find(|f| f.file_id == file_id) {
                return Ok(Some(FileGrant {
                    page_range: approved.page_range,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: VisibilityService,
        instructor: User,
        student: User,
        group_a: Group,
        group_b: Group,
        asset: Asset,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = VisibilityService::new(store.clone());

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
                name: "Sim week".into(),
                instructor_id: instructor.id,
                active: true,
                time_remaining_secs: 5400,
            })
            .unwrap();
        let group_a = store
            .create_group(NewGroup {
                name: "Group A".into(),
                session_id: session.id,
            })
            .unwrap();
        let group_b = store
            .create_group(NewGroup {
                name: "Group B".into(),
                session_id: session.id,
            })
            .unwrap();
        store.add_group_member(group_a.id, student.id).unwrap();
        let asset = store
            .create_asset(NewAsset {
                filename: "cxr.png".into(),
                kind: "image".into(),
                content_hash: "hash".into(),
                session_id: session.id,
                uploaded_by: instructor.id,
            })
            .unwrap();

        Fixture {
            store,
            service,
            instructor,
            student,
            group_a,
            group_b,
            asset,
        }
    }

    #[test]
    fn absence_of_row_means_not_visible() {
        let f = fixture();
        assert!(f
            .service
            .visible_assets_for_group(f.group_a.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn visible_row_exposes_asset_to_that_group_only() {
        let f = fixture();
        f.service
            .update_asset_visibility(f.asset.id, f.group_a.id, true, f.instructor.id)
            .unwrap();

        let for_a = f.service.visible_assets_for_group(f.group_a.id).unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].id, f.asset.id);

        assert!(f
            .service
            .visible_assets_for_group(f.group_b.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn row_with_false_is_excluded() {
        let f = fixture();
        f.service
            .update_asset_visibility(f.asset.id, f.group_a.id, false, f.instructor.id)
            .unwrap();
        assert!(f
            .service
            .visible_assets_for_group(f.group_a.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn upsert_is_idempotent_with_last_writer_wins_metadata() {
        let f = fixture();
        let first = f
            .service
            .update_asset_visibility(f.asset.id, f.group_a.id, true, f.instructor.id)
            .unwrap();
        let second = f
            .service
            .update_asset_visibility(f.asset.id, f.group_a.id, true, f.student.id)
            .unwrap();

        let rows = f.store.visibility_rows_for_group(f.group_a.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(second.changed_by, f.student.id);
        assert!(second.changed_at >= first.changed_at);
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .update_asset_visibility(RecordId::new(), f.group_a.id, true, f.instructor.id)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("asset")));
    }

    #[test]
    fn bulk_update_skips_unknown_ids_without_rollback() {
        let f = fixture();
        let ghost = RecordId::new();
        let outcome = f
            .service
            .bulk_update_asset_visibility(
                &[f.asset.id, ghost],
                f.group_a.id,
                true,
                f.instructor.id,
            )
            .unwrap();

        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.skipped, vec![ghost]);
        // the successful write stands
        assert_eq!(
            f.service
                .visible_assets_for_group(f.group_a.id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn scope_resolution_rejects_unknown_user() {
        let f = fixture();
        let err = resolve_group_scope(f.store.as_ref(), RecordId::new(), None).unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated(_)));
    }

    #[test]
    fn scope_resolution_rejects_foreign_group() {
        let f = fixture();
        let err =
            resolve_group_scope(f.store.as_ref(), f.student.id, Some(f.group_b.id)).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn scope_defaults_to_first_membership() {
        let f = fixture();
        let scope = resolve_group_scope(f.store.as_ref(), f.student.id, None).unwrap();
        assert_eq!(scope.active_group, Some(f.group_a.id));
    }

    #[test]
    fn staff_scope_may_have_no_group() {
        let f = fixture();
        let scope = resolve_group_scope(f.store.as_ref(), f.instructor.id, None).unwrap();
        assert!(scope.active_group.is_none());
    }

    #[test]
    fn patient_access_requires_assignment_for_students() {
        let f = fixture();
        let patient = f
            .store
            .create_patient(NewPatient {
                first_name: "Pat".into(),
                last_name: "Able".into(),
                age: None,
                sex: None,
                status: PatientStatus::Monitoring,
                chief_complaint: "Fever".into(),
                session_id: None,
            })
            .unwrap();
        let scope = resolve_group_scope(f.store.as_ref(), f.student.id, None).unwrap();

        let err = f
            .service
            .ensure_patient_access(&scope, patient.id)
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let version = f
            .store
            .create_data_version(NewDataVersion {
                name: "v1".into(),
                description: None,
            })
            .unwrap();
        f.store
            .create_group_data_assignment(NewGroupDataAssignment {
                group_id: f.group_a.id,
                data_version_id: version.id,
                patient_id: patient.id,
            })
            .unwrap();

        assert!(f.service.ensure_patient_access(&scope, patient.id).is_ok());

        // staff bypass
        let staff_scope = resolve_group_scope(f.store.as_ref(), f.instructor.id, None).unwrap();
        assert!(f
            .service
            .ensure_patient_access(&staff_scope, patient.id)
            .is_ok());
    }

    #[test]
    fn visibility_changes_are_audited() {
        let f = fixture();
        f.service
            .update_asset_visibility(f.asset.id, f.group_a.id, true, f.instructor.id)
            .unwrap();
        let logs = f.store.list_audit_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "asset.visibility.grant");
    }
}
