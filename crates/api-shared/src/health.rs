use crate::dto::HealthRes;

/// Simple health service behind the `/health` endpoint.
///
/// Exists as a standalone type so monitoring responses stay uniform if the
/// platform ever grows a second API surface.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "simward is alive".into(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
