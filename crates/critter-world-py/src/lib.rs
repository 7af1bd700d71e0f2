use critter_world_core::config::SimConfig;
use critter_world_core::thing::{ThingId, ThingKind};
use critter_world_core::world::World;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde::Serialize;

fn to_json<T: Serialize>(value: &T, what: &str) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyValueError::new_err(format!("failed to serialize {what}: {e}")))
}

fn parse_config(config_json: &str) -> PyResult<SimConfig> {
    serde_json::from_str(config_json)
        .map_err(|e| PyValueError::new_err(format!("invalid config json: {e}")))
}

fn parse_kind(kind: &str) -> PyResult<ThingKind> {
    ThingKind::ALL
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(kind))
        .ok_or_else(|| PyValueError::new_err(format!("unknown thing kind: {kind}")))
}

/// PyO3 module exposing critter-world-core to Python.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pyfunction]
fn default_config_json() -> PyResult<String> {
    to_json(&SimConfig::default(), "default config")
}

#[pyfunction]
fn validate_config_json(config_json: &str) -> PyResult<bool> {
    let config = parse_config(config_json)?;
    config
        .validate()
        .map(|_| true)
        .map_err(|e| PyValueError::new_err(format!("invalid world configuration: {e}")))
}

/// A simulation handle driven from Python, e.g. by a renderer.
#[pyclass(name = "World", unsendable)]
struct PyWorld {
    inner: World,
}

#[pymethods]
impl PyWorld {
    #[new]
    #[pyo3(signature = (config_json = None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => parse_config(json)?,
            None => SimConfig::default(),
        };
        let inner = World::try_new(config)
            .map_err(|e| PyValueError::new_err(format!("invalid world configuration: {e}")))?;
        Ok(Self { inner })
    }

    #[getter]
    fn tick(&self) -> u64 {
        self.inner.tick()
    }

    /// Advance one tick and return `(spawned, removed, total_us)`.
    fn step(&mut self) -> (usize, usize, u64) {
        let report = self.inner.step();
        (report.spawned, report.removed, report.timings.total_us)
    }

    /// Advance `n` ticks and return the population statistics as JSON.
    fn run(&mut self, n: usize) -> PyResult<String> {
        let stats = self.inner.run(n);
        to_json(&stats, "population stats")
    }

    fn run_experiment_json(&mut self, steps: usize, sample_every: usize) -> PyResult<String> {
        let summary = self
            .inner
            .try_run_experiment(steps, sample_every)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        to_json(&summary, "run summary")
    }

    fn reset(&mut self) -> PyResult<()> {
        self.inner
            .reset()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn set_learning(&mut self, enabled: bool) {
        self.inner.set_learning(enabled);
    }

    fn population_count(&self, kind: &str) -> PyResult<usize> {
        Ok(self.inner.population_count(parse_kind(kind)?))
    }

    fn population_stats_json(&self) -> PyResult<String> {
        to_json(&self.inner.population_stats(), "population stats")
    }

    /// Place a thing at an explicit position and return its id.
    fn insert_thing(&mut self, kind: &str, x: f64, y: f64) -> PyResult<u64> {
        let kind = parse_kind(kind)?;
        self.inner
            .insert_thing(kind, [x, y])
            .map(|id| id.0)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Events recorded since the last call, as a JSON array.
    fn drain_events_json(&mut self) -> PyResult<String> {
        to_json(&self.inner.drain_events(), "events")
    }

    /// JSON description of a thing, or `None` if the id is unknown.
    fn describe_json(&self, id: u64) -> PyResult<Option<String>> {
        self.inner
            .describe(ThingId(id))
            .map(|d| to_json(&d, "description"))
            .transpose()
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(validate_config_json, m)?)?;
    m.add_class::<PyWorld>()?;
    Ok(())
}
