use std::sync::{Arc, Mutex, MutexGuard};

use nudock_endpoint::{handler_fn, Endpoint, HandlerError};
use tracing::info;

use crate::cmd::ServeArgs;
use crate::exit::{endpoint_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::experiment::{pong, Experiment};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let mut endpoint = Endpoint::new(args.endpoint_config());
    register_experiment(&mut endpoint, Arc::new(Mutex::new(Experiment::default())))
        .map_err(|err| endpoint_error("handler registration failed", err))?;

    let handle = endpoint.server_handle();
    ctrlc::set_handler(move || {
        info!("interrupt received");
        handle.stop();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    endpoint
        .start_server()
        .map_err(|err| endpoint_error("server failed", err))?;
    Ok(SUCCESS)
}

pub fn register_experiment(
    endpoint: &mut Endpoint,
    experiment: Arc<Mutex<Experiment>>,
) -> nudock_endpoint::Result<()> {
    endpoint.register_handler("/ping", pong)?;

    let shared = Arc::clone(&experiment);
    endpoint.register_handler(
        "/set_parameters",
        handler_fn(move |request| lock(&shared)?.set_parameters(request)),
    )?;

    endpoint.register_handler(
        "/log_likelihood",
        handler_fn(move |request| lock(&experiment)?.log_likelihood(request)),
    )?;
    Ok(())
}

fn lock(experiment: &Mutex<Experiment>) -> Result<MutexGuard<'_, Experiment>, HandlerError> {
    experiment
        .lock()
        .map_err(|_| HandlerError::new("experiment state is poisoned"))
}
