//! Routing of observations, agent state and metrics to log sinks.
//!
//! A [`Source`] names a value and, optionally, which stream it comes from.
//! [`LogsObserver`] keeps a registry of sinks and the sources connected to
//! each; every `update_*` call looks each connected source up in the new data
//! and hands whatever it finds to the sink method matching the value's shape.
//!
//! The bandit core never calls into this module. Controllers feed it the same
//! observation maps and states they pass to the agents.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::egreedy::EGreedyState;
use crate::error::{BanditError, Result};
use crate::spaces::{Observation, Value};
use crate::state::BanditState;

/// Which stream a source is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceType {
    Observation,
    State,
    Metric,
}

/// A named value to log. `kind: None` listens on all three streams.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Source {
    pub name: String,
    pub kind: Option<SourceType>,
}

impl Source {
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    pub fn observation(name: impl Into<String>) -> Self {
        Self::of(name, SourceType::Observation)
    }

    pub fn state(name: impl Into<String>) -> Self {
        Self::of(name, SourceType::State)
    }

    pub fn metric(name: impl Into<String>) -> Self {
        Self::of(name, SourceType::Metric)
    }

    fn of(name: impl Into<String>, kind: SourceType) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
        }
    }

    fn listens_to(&self, kind: SourceType) -> bool {
        self.kind.is_none_or(|k| k == kind)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            None => write!(f, "{}", self.name),
            Some(k) => write!(f, "{}-{:?}", self.name, k),
        }
    }
}

/// Destination for routed values.
pub trait LogSink {
    /// Called once with every source connected to this sink.
    fn init(&mut self, _sources: &[Source]) {}

    fn finish(&mut self) {}

    fn log_scalar(&mut self, source: &Source, value: f64);

    fn log_array(&mut self, source: &Source, value: &[f64]);

    fn log_dict(&mut self, source: &Source, value: &BTreeMap<String, Value>);
}

/// Agent state whose fields can be looked up by name.
pub trait LoggableState {
    fn field(&self, name: &str) -> Option<Value>;
}

impl LoggableState for BanditState {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "alpha" => Some(Value::Array(self.alpha().to_vec())),
            "beta" => Some(Value::Array(self.beta().to_vec())),
            "last_decay" => Some(Value::Array(self.last_decay().to_vec())),
            _ => None,
        }
    }
}

impl LoggableState for EGreedyState {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "q" => Some(Value::Array(self.q().to_vec())),
            "n" => Some(Value::Array(self.n().iter().map(|&x| x as f64).collect())),
            _ => None,
        }
    }
}

/// Registry of named sinks and the sources routed to each.
#[derive(Default)]
pub struct LogsObserver {
    sinks: BTreeMap<String, Box<dyn LogSink>>,
    sources: BTreeMap<String, Vec<Source>>,
}

impl fmt::Debug for LogsObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogsObserver")
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .field("sources", &self.sources)
            .finish()
    }
}

impl LogsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink under `name`. One instance per name: if `name` is
    /// already taken the existing sink is kept and `false` is returned.
    pub fn add_sink(&mut self, name: impl Into<String>, sink: Box<dyn LogSink>) -> bool {
        let name = name.into();
        if self.sinks.contains_key(&name) {
            return false;
        }
        self.sinks.insert(name.clone(), sink);
        self.sources.entry(name).or_default();
        true
    }

    /// Route `source` to the sink registered as `sink`.
    pub fn connect(&mut self, source: Source, sink: &str) -> Result<()> {
        let Some(list) = self.sources.get_mut(sink) else {
            return Err(BanditError::UnknownSource(sink.to_string()));
        };
        list.push(source);
        Ok(())
    }

    pub fn init_sinks(&mut self) {
        for (name, sink) in self.sinks.iter_mut() {
            let sources = self.sources.get(name).map(Vec::as_slice).unwrap_or(&[]);
            sink.init(sources);
        }
    }

    pub fn finish_sinks(&mut self) {
        for sink in self.sinks.values_mut() {
            sink.finish();
        }
    }

    pub fn update_observations(&mut self, obs: &Observation) {
        self.route(SourceType::Observation, |name| obs.get(name).cloned());
    }

    pub fn update_state<S: LoggableState>(&mut self, state: &S) {
        self.route(SourceType::State, |name| state.field(name));
    }

    pub fn update_metric(&mut self, name: &str, value: &Value) {
        self.route(SourceType::Metric, |n| (n == name).then(|| value.clone()));
    }

    fn route<F>(&mut self, kind: SourceType, get: F)
    where
        F: Fn(&str) -> Option<Value>,
    {
        for (name, sink) in self.sinks.iter_mut() {
            let Some(sources) = self.sources.get(name) else {
                continue;
            };
            for source in sources.iter().filter(|s| s.listens_to(kind)) {
                if let Some(value) = get(&source.name) {
                    dispatch(sink.as_mut(), source, &value);
                }
            }
        }
    }
}

fn dispatch(sink: &mut dyn LogSink, source: &Source, value: &Value) {
    match value {
        Value::Int(i) => sink.log_scalar(source, *i as f64),
        Value::Float(x) => sink.log_scalar(source, *x),
        Value::Array(xs) => sink.log_array(source, xs),
        Value::Dict(d) => sink.log_dict(source, d),
    }
}

/// Emits every routed value as a `tracing` event at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn init(&mut self, sources: &[Source]) {
        tracing::debug!(n_sources = sources.len(), "tracing sink ready");
    }

    fn log_scalar(&mut self, source: &Source, value: f64) {
        tracing::info!(source = %source, value, "scalar");
    }

    fn log_array(&mut self, source: &Source, value: &[f64]) {
        tracing::info!(source = %source, value = ?value, "array");
    }

    fn log_dict(&mut self, source: &Source, value: &BTreeMap<String, Value>) {
        tracing::info!(source = %source, value = ?value, "dict");
    }
}

/// One value recorded by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub source: Source,
    pub value: Value,
}

/// Keeps everything it receives. Clones share the same buffer, so keep one
/// handle and give the other to the observer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, source: &Source, value: Value) {
        self.lock().push(LogEntry {
            source: source.clone(),
            value,
        });
    }
}

impl LogSink for MemorySink {
    fn log_scalar(&mut self, source: &Source, value: f64) {
        self.push(source, Value::Float(value));
    }

    fn log_array(&mut self, source: &Source, value: &[f64]) {
        self.push(source, Value::Array(value.to_vec()));
    }

    fn log_dict(&mut self, source: &Source, value: &BTreeMap<String, Value>) {
        self.push(source, Value::Dict(value.clone()));
    }
}
