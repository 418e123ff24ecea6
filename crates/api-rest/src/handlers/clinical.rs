//! Patient chart sub-resources: vitals, labs, history, medications,
//! SOAP notes, and orders.
//!
//! Every route resolves group scope, checks patient access, and stamps the
//! acting user as the recorder. The six resources share one access helper;
//! the bodies differ per record type.

use super::store_err;
use crate::context::Scope;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use simward_core::model::*;
use simward_core::GroupScope;
use simward_uuid::RecordId;

/// Confirms the patient exists and the scope may touch it.
fn check_access(
    state: &AppState,
    scope: &GroupScope,
    patient_id: RecordId,
) -> Result<(), ApiError> {
    state
        .store
        .get_patient(patient_id)
        .map_err(store_err)?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    state.visibility.ensure_patient_access(scope, patient_id)?;
    Ok(())
}

// -- vitals ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VitalsBody {
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
}

pub async fn list_vitals(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<VitalSignsEntry>>> {
    check_access(&state, &scope, patient_id)?;
    let entries = state
        .store
        .vital_signs_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(entries))
}

pub async fn create_vitals(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<VitalsBody>,
) -> ApiResult<(StatusCode, Json<VitalSignsEntry>)> {
    check_access(&state, &scope, patient_id)?;
    let entry = state
        .store
        .create_vital_signs(NewVitalSignsEntry {
            patient_id,
            heart_rate: body.heart_rate,
            systolic: body.systolic,
            diastolic: body.diastolic,
            temperature: body.temperature,
            respiratory_rate: body.respiratory_rate,
            oxygen_saturation: body.oxygen_saturation,
            recorded_by: scope.user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// -- labs --------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LabResultBody {
    pub test_name: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
}

pub async fn list_labs(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<LabResult>>> {
    check_access(&state, &scope, patient_id)?;
    let results = state
        .store
        .lab_results_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(results))
}

pub async fn create_lab(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<LabResultBody>,
) -> ApiResult<(StatusCode, Json<LabResult>)> {
    check_access(&state, &scope, patient_id)?;
    let result = state
        .store
        .create_lab_result(NewLabResult {
            patient_id,
            test_name: body.test_name,
            value: body.value,
            unit: body.unit,
            reference_range: body.reference_range,
            recorded_by: scope.user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(result)))
}

// -- medical history ---------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryBody {
    pub title: String,
    #[serde(default)]
    pub notes: String,
}

pub async fn list_history(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<MedicalHistoryEntry>>> {
    check_access(&state, &scope, patient_id)?;
    let entries = state
        .store
        .medical_history_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(entries))
}

pub async fn create_history(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<HistoryBody>,
) -> ApiResult<(StatusCode, Json<MedicalHistoryEntry>)> {
    check_access(&state, &scope, patient_id)?;
    let entry = state
        .store
        .create_medical_history(NewMedicalHistoryEntry {
            patient_id,
            title: body.title,
            notes: body.notes,
            recorded_by: scope.user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// -- medications -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MedicationBody {
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
}

pub async fn list_medications(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<Medication>>> {
    check_access(&state, &scope, patient_id)?;
    let medications = state
        .store
        .medications_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(medications))
}

pub async fn create_medication(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<MedicationBody>,
) -> ApiResult<(StatusCode, Json<Medication>)> {
    check_access(&state, &scope, patient_id)?;
    let medication = state
        .store
        .create_medication(NewMedication {
            patient_id,
            name: body.name,
            dose: body.dose,
            route: body.route,
            frequency: body.frequency,
            recorded_by: scope.user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(medication)))
}

// -- SOAP notes --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SoapNoteBody {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

pub async fn list_soap_notes(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<SoapNote>>> {
    check_access(&state, &scope, patient_id)?;
    let notes = state
        .store
        .soap_notes_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(notes))
}

pub async fn create_soap_note(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<SoapNoteBody>,
) -> ApiResult<(StatusCode, Json<SoapNote>)> {
    check_access(&state, &scope, patient_id)?;
    let note = state
        .store
        .create_soap_note(NewSoapNote {
            patient_id,
            subjective: body.subjective,
            objective: body.objective,
            assessment: body.assessment,
            plan: body.plan,
            recorded_by: scope.user.id,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(note)))
}

// -- orders ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderBody {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
) -> ApiResult<Json<Vec<ClinicalOrder>>> {
    check_access(&state, &scope, patient_id)?;
    let orders = state
        .store
        .clinical_orders_by_patient(patient_id)
        .map_err(store_err)?;
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    Scope(scope): Scope,
    Path(patient_id): Path<RecordId>,
    Json(body): Json<OrderBody>,
) -> ApiResult<(StatusCode, Json<ClinicalOrder>)> {
    check_access(&state, &scope, patient_id)?;
    let order = state
        .store
        .create_clinical_order(NewClinicalOrder {
            patient_id,
            description: body.description,
            ordered_by: scope.user.id,
            completed: body.completed,
        })
        .map_err(store_err)?;
    Ok((StatusCode::CREATED, Json(order)))
}
