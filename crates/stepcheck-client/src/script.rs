//! Test scripts and script file loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stepcheck::{StepError, StepRequest};

/// One scripted step: what to send and how long to wait afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub step_id: i64,
    pub timeout: i64,
    /// Seconds to wait after the step; fractional values are allowed.
    pub interval: f64,
}

impl ScriptStep {
    pub fn new(step_id: i64, timeout: i64, interval: f64) -> Self {
        Self {
            step_id,
            timeout,
            interval,
        }
    }

    pub fn request(&self) -> StepRequest {
        StepRequest::new(self.step_id, self.timeout)
    }

    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval).unwrap_or(Duration::ZERO)
    }
}

/// Ordered steps replayed by the driver, as stored under `test_services`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestScript {
    #[serde(default)]
    pub test_services: Vec<ScriptStep>,
}

impl TestScript {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            test_services: steps,
        }
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.test_services
    }

    pub fn len(&self) -> usize {
        self.test_services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_services.is_empty()
    }
}

/// Bundled data sets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSet {
    Success,
    Failure,
}

impl DataSet {
    pub fn file_name(self) -> &'static str {
        match self {
            DataSet::Success => "success_data.json",
            DataSet::Failure => "failure_data.json",
        }
    }

    pub fn path_in<P: AsRef<Path>>(self, data_dir: P) -> PathBuf {
        data_dir.as_ref().join(self.file_name())
    }
}

pub struct ScriptLoader;

impl ScriptLoader {
    /// Load a script from disk.
    /// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<TestScript, StepError> {
        let path = path.as_ref();
        let load_error = |reason: String| StepError::ScriptLoad {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let script: TestScript = match extension.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| load_error(e.to_string()))?
            }
            _ => serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?,
        };

        Self::validate(&script).map_err(load_error)?;
        Ok(script)
    }

    fn validate(script: &TestScript) -> Result<(), String> {
        for step in script.steps() {
            // Negative, non-finite and out-of-range values all fail the conversion.
            if Duration::try_from_secs_f64(step.interval).is_err() {
                return Err(format!(
                    "step {} has invalid interval {}",
                    step.step_id, step.interval
                ));
            }
        }
        Ok(())
    }
}
