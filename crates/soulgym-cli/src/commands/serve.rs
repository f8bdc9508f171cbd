//! Serve command implementation.
//!
//! One JSON request per stdin line, one JSON response per stdout line:
//!
//! ```text
//! > {"op":"reset"}
//! < {"ok":true,"observation":[454.0, ...]}
//! > {"op":"step","action":0,"movement":1.0}
//! < {"ok":true,"result":{"observation":[...],"reward":0.0,"terminated":false,...}}
//! > {"op":"close"}
//! < {"ok":true}
//! ```
//!
//! Failures answer `{"ok":false,"error":"...","fatal":bool}`; `fatal` is set
//! when the game process is gone.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use soulgym::{ActionInput, Actuator, Attach, Config, EpisodeController, Observation, StepResult};
use tracing::{debug, info, warn};

use super::build_controller;
use crate::shutdown::ShutdownSignal;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Reset,
    Step {
        action: i64,
        #[serde(default)]
        movement: Option<f32>,
    },
    Close,
}

#[derive(Debug, Default, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<bool>,
}

impl Response {
    fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    fn failure(error: impl ToString, fatal: bool) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            fatal: Some(fatal),
            ..Default::default()
        }
    }

    fn from_error(error: soulgym::Error) -> Self {
        let fatal = error.is_attach_failure();
        Self::failure(error, fatal)
    }
}

/// The part of the controller the protocol drives
pub trait Environment {
    fn reset(&mut self) -> soulgym::Result<Observation>;
    fn step(&mut self, input: ActionInput) -> soulgym::Result<StepResult>;
    fn close(&mut self);
}

impl<A: Attach, K: Actuator> Environment for EpisodeController<A, K> {
    fn reset(&mut self) -> soulgym::Result<Observation> {
        EpisodeController::reset(self)
    }

    fn step(&mut self, input: ActionInput) -> soulgym::Result<StepResult> {
        EpisodeController::step(self, input)
    }

    fn close(&mut self) {
        EpisodeController::close(self)
    }
}

/// Answer one request line; the flag is set once the session should end
pub fn handle_line<E: Environment>(env: &mut E, line: &str) -> (Response, bool) {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return (Response::failure(format!("bad request: {}", e), false), false),
    };
    debug!("Request: {:?}", request);

    match request {
        Request::Reset => match env.reset() {
            Ok(observation) => (
                Response {
                    observation: Some(observation),
                    ..Response::ok()
                },
                false,
            ),
            Err(e) => (Response::from_error(e), false),
        },
        Request::Step { action, movement } => {
            let result = ActionInput::from_raw(action, movement).and_then(|input| env.step(input));
            match result {
                Ok(result) => (
                    Response {
                        result: Some(result),
                        ..Response::ok()
                    },
                    false,
                ),
                Err(e) => (Response::from_error(e), false),
            }
        }
        Request::Close => {
            env.close();
            (Response::ok(), true)
        }
    }
}

/// Serve requests until `close`, end of input or shutdown
pub fn serve_loop<E, R, W>(
    env: &mut E,
    input: R,
    mut output: W,
    shutdown: &ShutdownSignal,
) -> Result<()>
where
    E: Environment,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (response, done) = handle_line(env, &line);
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
        if done || shutdown.is_shutdown() {
            if !done {
                env.close();
            }
            return Ok(());
        }
    }

    info!("Input closed");
    env.close();
    Ok(())
}

pub fn run(config: &Config, shutdown: Arc<ShutdownSignal>) -> Result<()> {
    let mut controller = build_controller(config, shutdown.clone())?;
    info!("Serving on stdin/stdout");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let result = serve_loop(&mut controller, stdin.lock(), stdout.lock(), &shutdown);
    if let Err(e) = &result {
        warn!("Serve loop ended: {}", e);
    }
    result
}
