//! Seed-data loading and the built-in demo dataset.
//!
//! The seed format is the store snapshot itself ([`StoreSnapshot`]), so any
//! dataset the CLI can dump is also a valid startup seed.

use crate::error::{CoreError, CoreResult};
use crate::model::*;
use crate::store::{EntityStore, MemoryStore, StoreSnapshot};
use std::path::Path;

/// Reads a snapshot from a JSON seed file.
pub fn load_snapshot(path: &Path) -> CoreResult<StoreSnapshot> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CoreError::InvalidInput(format!("cannot read seed file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        CoreError::InvalidInput(format!("seed file {} is not valid: {}", path.display(), e))
    })
}

/// Writes a snapshot to a JSON seed file.
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot, pretty: bool) -> CoreResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    }
    .map_err(|e| CoreError::InvalidInput(format!("cannot serialise seed data: {}", e)))?;

    std::fs::write(path, text).map_err(|e| {
        CoreError::InvalidInput(format!("cannot write seed file {}: {}", path.display(), e))
    })
}

/// Sanity-checks referential integrity of a seed file: every foreign key must
/// resolve within the snapshot. Returns the list of problems found.
pub fn check_snapshot(snapshot: &StoreSnapshot) -> Vec<String> {
    let mut problems = Vec::new();

    let user_ids: Vec<_> = snapshot.users.iter().map(|u| u.id).collect();
    let session_ids: Vec<_> = snapshot.sessions.iter().map(|s| s.id).collect();
    let group_ids: Vec<_> = snapshot.groups.iter().map(|g| g.id).collect();
    let patient_ids: Vec<_> = snapshot.patients.iter().map(|p| p.id).collect();

    for session in &snapshot.sessions {
        if !user_ids.contains(&session.instructor_id) {
            problems.push(format!(
                "session '{}' names unknown instructor {}",
                session.name, session.instructor_id
            ));
        }
    }
    for group in &snapshot.groups {
        if !session_ids.contains(&group.session_id) {
            problems.push(format!(
                "group '{}' names unknown session {}",
                group.name, group.session_id
            ));
        }
    }
    for member in &snapshot.group_members {
        if !group_ids.contains(&member.group_id) {
            problems.push(format!("membership names unknown group {}", member.group_id));
        }
        if !user_ids.contains(&member.user_id) {
            problems.push(format!("membership names unknown user {}", member.user_id));
        }
    }
    for patient in &snapshot.patients {
        if let Some(session_id) = patient.session_id {
            if !session_ids.contains(&session_id) {
                problems.push(format!(
                    "patient '{} {}' names unknown session {}",
                    patient.first_name, patient.last_name, session_id
                ));
            }
        }
    }
    for assignment in &snapshot.group_data_assignments {
        if !group_ids.contains(&assignment.group_id) {
            problems.push(format!(
                "assignment names unknown group {}",
                assignment.group_id
            ));
        }
        if !patient_ids.contains(&assignment.patient_id) {
            problems.push(format!(
                "assignment names unknown patient {}",
                assignment.patient_id
            ));
        }
    }
    for file in &snapshot.patient_files {
        if !patient_ids.contains(&file.patient_id) {
            problems.push(format!(
                "patient file '{}' names unknown patient {}",
                file.display_name, file.patient_id
            ));
        }
    }

    problems
}

/// Builds the demo dataset used for local development: one admin, one
/// coordinator, one instructor running an active session with two groups of
/// students, two scenario patients, and the assignments that let each group
/// reach its own patient.
pub fn demo_snapshot() -> StoreSnapshot {
    let store = MemoryStore::new();
    build_demo(&store).expect("in-memory demo build cannot fail");
    store.snapshot().expect("snapshot of a fresh store")
}

fn build_demo(store: &MemoryStore) -> CoreResult<()> {
    store.create_user(NewUser {
        username: "admin".into(),
        password: "admin".into(),
        role: Role::Admin,
        first_name: "Avery".into(),
        last_name: "Quinn".into(),
    })?;
    let coordinator = store.create_user(NewUser {
        username: "coordinator".into(),
        password: "coordinator".into(),
        role: Role::Coordinator,
        first_name: "Casey".into(),
        last_name: "Bright".into(),
    })?;
    let instructor = store.create_user(NewUser {
        username: "instructor".into(),
        password: "instructor".into(),
        role: Role::Instructor,
        first_name: "Indra".into(),
        last_name: "Shaw".into(),
    })?;
    let group_a_account = store.create_user(NewUser {
        username: "group-a".into(),
        password: "group-a".into(),
        role: Role::Student,
        first_name: "Group".into(),
        last_name: "A".into(),
    })?;
    let group_b_account = store.create_user(NewUser {
        username: "group-b".into(),
        password: "group-b".into(),
        role: Role::Student,
        first_name: "Group".into(),
        last_name: "B".into(),
    })?;

    let session = store.create_session(NewSession {
        name: "Acute medicine, week 1".into(),
        instructor_id: instructor.id,
        active: true,
        time_remaining_secs: 2 * 60 * 60,
    })?;

    let group_a = store.create_group(NewGroup {
        name: "Group A".into(),
        session_id: session.id,
    })?;
    let group_b = store.create_group(NewGroup {
        name: "Group B".into(),
        session_id: session.id,
    })?;
    store.add_group_member(group_a.id, group_a_account.id)?;
    store.add_group_member(group_b.id, group_b_account.id)?;

    let patient_a = store.create_patient(NewPatient {
        first_name: "Margaret".into(),
        last_name: "Hollis".into(),
        age: Some(67),
        sex: Some("F".into()),
        status: PatientStatus::Critical,
        chief_complaint: "Central crushing chest pain".into(),
        session_id: Some(session.id),
    })?;
    let patient_b = store.create_patient(NewPatient {
        first_name: "Derek".into(),
        last_name: "Mwangi".into(),
        age: Some(45),
        sex: Some("M".into()),
        status: PatientStatus::Stable,
        chief_complaint: "Productive cough and fever".into(),
        session_id: Some(session.id),
    })?;

    let version = store.create_data_version(NewDataVersion {
        name: "2026-intake".into(),
        description: Some("Teaching data for the 2026 intake".into()),
    })?;
    store.create_group_data_assignment(NewGroupDataAssignment {
        group_id: group_a.id,
        data_version_id: version.id,
        patient_id: patient_a.id,
    })?;
    store.create_group_data_assignment(NewGroupDataAssignment {
        group_id: group_b.id,
        data_version_id: version.id,
        patient_id: patient_b.id,
    })?;

    store.create_medical_history(NewMedicalHistoryEntry {
        patient_id: patient_a.id,
        title: "Hypertension".into(),
        notes: "Diagnosed 2019, on amlodipine".into(),
        recorded_by: instructor.id,
    })?;
    store.create_medication(NewMedication {
        patient_id: patient_a.id,
        name: "Amlodipine".into(),
        dose: "5mg".into(),
        route: "PO".into(),
        frequency: "OD".into(),
        recorded_by: instructor.id,
    })?;
    store.create_vital_signs(NewVitalSignsEntry {
        patient_id: patient_a.id,
        heart_rate: Some(104),
        systolic: Some(92),
        diastolic: Some(60),
        temperature: Some("36.4".into()),
        respiratory_rate: Some(22),
        oxygen_saturation: Some(94),
        recorded_by: instructor.id,
    })?;

    store.create_document(NewDocument {
        title: "Pre-brief handout".into(),
        description: Some("Read before the session starts".into()),
        session_id: session.id,
        patient_id: None,
        content_hash: None,
        uploaded_by: coordinator.id,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn demo_snapshot_is_internally_consistent() {
        let snapshot = demo_snapshot();
        assert!(check_snapshot(&snapshot).is_empty());
        assert_eq!(snapshot.users.len(), 5);
        assert_eq!(snapshot.groups.len(), 2);
        assert_eq!(snapshot.patients.len(), 2);
        assert_eq!(snapshot.group_data_assignments.len(), 2);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seed.json");

        let snapshot = demo_snapshot();
        save_snapshot(&path, &snapshot, true).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded.users.len(), snapshot.users.len());
        assert_eq!(loaded.patients.len(), snapshot.patients.len());
    }

    #[test]
    fn check_reports_dangling_references() {
        let mut snapshot = demo_snapshot();
        snapshot.users.clear();
        let problems = check_snapshot(&snapshot);
        assert!(!problems.is_empty());
    }

    #[test]
    fn load_rejects_malformed_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_snapshot(&path).is_err());
    }
}
