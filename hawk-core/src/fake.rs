//! Scripted gateway
//!
//! Answers probes from a table keyed by the arguments after the program
//! name (`"list"`, `"run grpc_health"`, `"restart hawk-agent.service"`).
//! Used by tests and for running the console without real probes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::probe::{Gateway, ProbeOutcome};

#[derive(Debug)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, ProbeOutcome>>,
    calls: Mutex<Vec<Vec<String>>>,
    envs: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            envs: Mutex::new(Vec::new()),
        }
    }

    /// Script the outcome for one argument string
    pub fn respond(&self, args: &str, outcome: ProbeOutcome) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(args.to_string(), outcome);
    }

    /// Shorthand for a successful run printing `output`
    pub fn respond_ok(&self, args: &str, output: &str) {
        self.respond(args, ProbeOutcome::exited(0, output));
    }

    /// Every argv seen so far, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Extra environment passed with the most recent call
    pub fn last_env(&self) -> Vec<(String, String)> {
        self.envs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// How many times `args` was invoked
    pub fn call_count(&self, args: &str) -> usize {
        self.calls()
            .iter()
            .filter(|argv| key(argv) == args)
            .count()
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn key(argv: &[String]) -> String {
    argv.iter().skip(1).cloned().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn execute(
        &self,
        argv: &[String],
        _cwd: &Path,
        env: &[(String, String)],
        _timeout: Duration,
    ) -> ProbeOutcome {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(argv.to_vec());
        self.envs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(env.to_vec());

        let k = key(argv);
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&k)
            .cloned()
            .unwrap_or_else(|| ProbeOutcome::spawn_failed(format!("no scripted response: {}", k)))
    }
}
