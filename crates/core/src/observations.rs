//! Observation bundle writer and reader.
//!
//! Student groups chart vital signs as a sparse bundle: one API call carries
//! up to seven optional sub-payloads, and each populated key writes exactly
//! one independently-keyed sub-record with a server-assigned timestamp.
//! Omitted keys write nothing.
//!
//! Writes are sequential independent inserts, as documented on the store
//! trait. All field validation happens before the first insert, so a bundle
//! that fails validation writes nothing at all; a backend failure partway
//! through would leave earlier sub-records in place.

use crate::error::{CoreError, CoreResult};
use crate::model::{
    BloodPressure, BloodSugar, BodyTemperature, HeartRate, OxygenSaturation, PainScore,
    RespiratoryRate,
};
use crate::store::EntityStore;
use crate::ListOrdering;
use simward_uuid::RecordId;
use std::sync::Arc;

/// Blood pressure payload within a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BloodPressureInput {
    pub systolic: i32,
    pub diastolic: i32,
}

/// Heart rate payload within a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HeartRateInput {
    pub rate: i32,
}

/// Body temperature payload; a decimal string such as `"37.2"`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BodyTemperatureInput {
    pub temperature: String,
}

/// Respiratory rate payload within a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RespiratoryRateInput {
    pub rate: i32,
}

/// Blood sugar payload; a decimal string such as `"5.6"`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BloodSugarInput {
    pub sugar_level: String,
}

/// Oxygen saturation payload within a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OxygenSaturationInput {
    pub saturation_percentage: i32,
}

/// Pain score payload within a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PainScoreInput {
    pub score: i32,
}

/// A sparse bundle of vital-sign readings. Every key is optional.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ObservationBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressureInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<HeartRateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<BodyTemperatureInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<RespiratoryRateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<BloodSugarInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<OxygenSaturationInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_score: Option<PainScoreInput>,
}

impl ObservationBundle {
    /// True when no sub-payload is populated.
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.heart_rate.is_none()
            && self.body_temperature.is_none()
            && self.respiratory_rate.is_none()
            && self.blood_sugar.is_none()
            && self.oxygen_saturation.is_none()
            && self.pain_score.is_none()
    }
}

/// One array per vital-sign type. Under `-created_at` ordering, the head of
/// each array is the latest reading of that type.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ObservationSet {
    pub blood_pressures: Vec<BloodPressure>,
    pub heart_rates: Vec<HeartRate>,
    pub body_temperatures: Vec<BodyTemperature>,
    pub respiratory_rates: Vec<RespiratoryRate>,
    pub blood_sugars: Vec<BloodSugar>,
    pub oxygen_saturations: Vec<OxygenSaturation>,
    pub pain_scores: Vec<PainScore>,
}

impl ObservationSet {
    /// Total number of records across all seven arrays.
    pub fn total(&self) -> usize {
        self.blood_pressures.len()
            + self.heart_rates.len()
            + self.body_temperatures.len()
            + self.respiratory_rates.len()
            + self.blood_sugars.len()
            + self.oxygen_saturations.len()
            + self.pain_scores.len()
    }
}

/// Writes and reads observation sub-records.
#[derive(Clone)]
pub struct ObservationService {
    store: Arc<dyn EntityStore>,
}

impl ObservationService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Writes the populated sub-records of a bundle.
    ///
    /// Returns an [`ObservationSet`] holding exactly the records created by
    /// this call (each array has zero or one element). Decimal-string fields
    /// are validated before anything is written.
    pub fn create_bundle(
        &self,
        patient_id: RecordId,
        recorded_by: RecordId,
        bundle: ObservationBundle,
    ) -> CoreResult<ObservationSet> {
        self.store
            .get_patient(patient_id)?
            .ok_or(CoreError::NotFound("patient"))?;

        if bundle.is_empty() {
            return Err(CoreError::InvalidInput(
                "bundle contains no observations".into(),
            ));
        }

        if let Some(temp) = &bundle.body_temperature {
            validate_decimal("temperature", &temp.temperature)?;
        }
        if let Some(sugar) = &bundle.blood_sugar {
            validate_decimal("sugar_level", &sugar.sugar_level)?;
        }

        let mut created = ObservationSet::default();

        if let Some(bp) = bundle.blood_pressure {
            created.blood_pressures.push(self.store.create_blood_pressure(
                patient_id,
                recorded_by,
                bp.systolic,
                bp.diastolic,
            )?);
        }
        if let Some(hr) = bundle.heart_rate {
            created
                .heart_rates
                .push(self.store.create_heart_rate(patient_id, recorded_by, hr.rate)?);
        }
        if let Some(temp) = bundle.body_temperature {
            created.body_temperatures.push(self.store.create_body_temperature(
                patient_id,
                recorded_by,
                temp.temperature,
            )?);
        }
        if let Some(rr) = bundle.respiratory_rate {
            created.respiratory_rates.push(self.store.create_respiratory_rate(
                patient_id,
                recorded_by,
                rr.rate,
            )?);
        }
        if let Some(sugar) = bundle.blood_sugar {
            created.blood_sugars.push(self.store.create_blood_sugar(
                patient_id,
                recorded_by,
                sugar.sugar_level,
            )?);
        }
        if let Some(sat) = bundle.oxygen_saturation {
            created.oxygen_saturations.push(self.store.create_oxygen_saturation(
                patient_id,
                recorded_by,
                sat.saturation_percentage,
            )?);
        }
        if let Some(pain) = bundle.pain_score {
            created
                .pain_scores
                .push(self.store.create_pain_score(patient_id, recorded_by, pain.score)?);
        }

        tracing::debug!(patient = %patient_id, records = created.total(), "observation bundle written");
        Ok(created)
    }

    /// Reads all observations for a patient, one array per type, each sorted
    /// by the given ordering.
    pub fn list(
        &self,
        patient_id: RecordId,
        ordering: ListOrdering,
    ) -> CoreResult<ObservationSet> {
        self.store
            .get_patient(patient_id)?
            .ok_or(CoreError::NotFound("patient"))?;

        let mut set = ObservationSet {
            blood_pressures: self.store.blood_pressures_by_patient(patient_id)?,
            heart_rates: self.store.heart_rates_by_patient(patient_id)?,
            body_temperatures: self.store.body_temperatures_by_patient(patient_id)?,
            respiratory_rates: self.store.respiratory_rates_by_patient(patient_id)?,
            blood_sugars: self.store.blood_sugars_by_patient(patient_id)?,
            oxygen_saturations: self.store.oxygen_saturations_by_patient(patient_id)?,
            pain_scores: self.store.pain_scores_by_patient(patient_id)?,
        };

        if ordering == ListOrdering::CreatedDesc {
            set.blood_pressures.reverse();
            set.heart_rates.reverse();
            set.body_temperatures.reverse();
            set.respiratory_rates.reverse();
            set.blood_sugars.reverse();
            set.oxygen_saturations.reverse();
            set.pain_scores.reverse();
        }

        Ok(set)
    }
}

/// Accepts plain decimal strings: digits with at most one decimal point, and
/// digits on both sides of it. Signs, exponents, and whitespace are rejected;
/// these values are stored verbatim for display, not parsed into floats.
fn validate_decimal(field: &str, value: &str) -> CoreResult<()> {
    let mut parts = value.split('.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    let part_ok = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    let valid = parts.next().is_none()
        && part_ok(whole)
        && fraction.map_or(true, part_ok);

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(format!(
            "{} must be a decimal string, got '{}'",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewPatient, NewUser, PatientStatus, Role};
    use crate::store::MemoryStore;

    struct Fixture {
        service: ObservationService,
        patient: RecordId,
        user: RecordId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = ObservationService::new(store.clone());
        let user = store
            .create_user(NewUser {
                username: "student".into(),
                password: "pw".into(),
                role: Role::Student,
                first_name: "Sam".into(),
                last_name: "Lee".into(),
            })
            .unwrap();
        let patient = store
            .create_patient(NewPatient {
                first_name: "Pat".into(),
                last_name: "Able".into(),
                age: None,
                sex: None,
                status: PatientStatus::Stable,
                chief_complaint: "Chest pain".into(),
                session_id: None,
            })
            .unwrap();
        Fixture {
            service,
            patient: patient.id,
            user: user.id,
        }
    }

    #[test]
    fn heart_rate_only_bundle_writes_one_record() {
        let f = fixture();
        let created = f
            .service
            .create_bundle(
                f.patient,
                f.user,
                ObservationBundle {
                    heart_rate: Some(HeartRateInput { rate: 88 }),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(created.heart_rates.len(), 1);
        assert_eq!(created.total(), 1);

        let listed = f.service.list(f.patient, ListOrdering::CreatedAsc).unwrap();
        assert_eq!(listed.heart_rates.len(), 1);
        assert!(listed.blood_pressures.is_empty());
        assert!(listed.body_temperatures.is_empty());
        assert!(listed.respiratory_rates.is_empty());
        assert!(listed.blood_sugars.is_empty());
        assert!(listed.oxygen_saturations.is_empty());
        assert!(listed.pain_scores.is_empty());
    }

    #[test]
    fn blood_pressure_round_trips_exact_values() {
        let f = fixture();
        f.service
            .create_bundle(
                f.patient,
                f.user,
                ObservationBundle {
                    blood_pressure: Some(BloodPressureInput {
                        systolic: 120,
                        diastolic: 80,
                    }),
                    ..Default::default()
                },
            )
            .unwrap();

        let listed = f.service.list(f.patient, ListOrdering::CreatedAsc).unwrap();
        let bp = &listed.blood_pressures[0];
        assert_eq!(bp.systolic, 120);
        assert_eq!(bp.diastolic, 80);
        assert_eq!(bp.patient_id, f.patient);
        assert_eq!(bp.recorded_by, f.user);
    }

    #[test]
    fn full_bundle_writes_all_seven_types() {
        let f = fixture();
        let created = f
            .service
            .create_bundle(
                f.patient,
                f.user,
                ObservationBundle {
                    blood_pressure: Some(BloodPressureInput {
                        systolic: 118,
                        diastolic: 76,
                    }),
                    heart_rate: Some(HeartRateInput { rate: 72 }),
                    body_temperature: Some(BodyTemperatureInput {
                        temperature: "36.8".into(),
                    }),
                    respiratory_rate: Some(RespiratoryRateInput { rate: 14 }),
                    blood_sugar: Some(BloodSugarInput {
                        sugar_level: "5.4".into(),
                    }),
                    oxygen_saturation: Some(OxygenSaturationInput {
                        saturation_percentage: 98,
                    }),
                    pain_score: Some(PainScoreInput { score: 2 }),
                },
            )
            .unwrap();
        assert_eq!(created.total(), 7);
    }

    #[test]
    fn empty_bundle_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .create_bundle(f.patient, f.user, ObservationBundle::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn invalid_decimal_writes_nothing() {
        let f = fixture();
        let err = f
            .service
            .create_bundle(
                f.patient,
                f.user,
                ObservationBundle {
                    heart_rate: Some(HeartRateInput { rate: 80 }),
                    body_temperature: Some(BodyTemperatureInput {
                        temperature: "37.2C".into(),
                    }),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        // validation happens before any insert, so the heart rate was not written
        let listed = f.service.list(f.patient, ListOrdering::CreatedAsc).unwrap();
        assert_eq!(listed.total(), 0);
    }

    #[test]
    fn descending_order_puts_latest_first() {
        let f = fixture();
        for rate in [60, 70, 80] {
            f.service
                .create_bundle(
                    f.patient,
                    f.user,
                    ObservationBundle {
                        heart_rate: Some(HeartRateInput { rate }),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let listed = f
            .service
            .list(f.patient, ListOrdering::CreatedDesc)
            .unwrap();
        assert_eq!(listed.heart_rates[0].rate, 80);
        assert_eq!(listed.heart_rates[2].rate, 60);
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .create_bundle(
                RecordId::new(),
                f.user,
                ObservationBundle {
                    pain_score: Some(PainScoreInput { score: 5 }),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("patient")));
    }

    #[test]
    fn decimal_validation_rules() {
        assert!(validate_decimal("t", "37").is_ok());
        assert!(validate_decimal("t", "37.25").is_ok());
        assert!(validate_decimal("t", "0.5").is_ok());
        assert!(validate_decimal("t", "").is_err());
        assert!(validate_decimal("t", ".5").is_err());
        assert!(validate_decimal("t", "37.").is_err());
        assert!(validate_decimal("t", "3.7.2").is_err());
        assert!(validate_decimal("t", "-1.0").is_err());
        assert!(validate_decimal("t", "37,2").is_err());
    }
}
