//! A stand-in fitting experiment served by `nudock serve`.
//!
//! It holds oscillation and systematic parameters and computes a fake
//! log-likelihood: squared distance of each oscillation parameter from its
//! central value plus the squared value of each systematic (centered at 0,
//! sigma 1).

use std::collections::BTreeMap;

use nudock_endpoint::{HandlerError, HandlerResult};
use serde_json::{json, Value};
use tracing::info;

const OSC_CENTRAL_VALUES: [(&str, f64); 6] = [
    ("Deltam2_32", 0.0025),
    ("Deltam2_21", 0.000075),
    ("Theta12", 0.55),
    ("Theta13", 0.15),
    ("Theta23", 0.5),
    ("DeltaCP", 0.0),
];

#[derive(Debug, Default)]
pub struct Experiment {
    osc_pars: BTreeMap<String, f64>,
    sys_pars: BTreeMap<String, f64>,
}

impl Experiment {
    /// Merge `osc_pars` and `sys_pars` from the request. Nothing is applied
    /// if any value is not a number.
    pub fn set_parameters(&mut self, request: &Value) -> HandlerResult {
        let osc = numeric_entries(request, "osc_pars", "osc_param")?;
        let sys = numeric_entries(request, "sys_pars", "sys_param")?;
        self.osc_pars.extend(osc);
        self.sys_pars.extend(sys);

        info!(osc_pars = ?self.osc_pars, sys_pars = ?self.sys_pars, "parameters set");
        Ok(json!({ "status": "parameters set" }))
    }

    pub fn log_likelihood(&self, _request: &Value) -> HandlerResult {
        let osc: f64 = OSC_CENTRAL_VALUES
            .iter()
            .map(|(name, central)| {
                let current = self.osc_pars.get(*name).copied().unwrap_or(*central);
                (current - central).powi(2)
            })
            .sum();
        let sys: f64 = self.sys_pars.values().map(|value| value.powi(2)).sum();

        Ok(json!({ "log_likelihood": osc + sys }))
    }
}

pub fn pong(request: &Value) -> HandlerResult {
    info!(%request, "ping received");
    Ok(json!("pong"))
}

fn numeric_entries(
    request: &Value,
    section: &str,
    label: &str,
) -> Result<Vec<(String, f64)>, HandlerError> {
    let Some(entries) = request.get(section) else {
        return Ok(Vec::new());
    };
    let Some(entries) = entries.as_object() else {
        return Err(HandlerError::new(format!("{section} must be an object")));
    };

    entries
        .iter()
        .map(|(key, value)| {
            value
                .as_f64()
                .map(|number| (key.clone(), number))
                .ok_or_else(|| HandlerError::new(format!("Invalid {label} value for key: {key}")))
        })
        .collect()
}
