use std::thread;
use std::time::Duration;

use log::info;
use rand_distr::{Distribution, Gamma};

const SHAPE: f64 = 15.0;
const SCALE: f64 = 0.1;

/// Sleep for a Gamma(15, 0.1)-distributed number of seconds (mean ~1.5 s,
/// long right tail) so repeated queries never hit the service on a fixed
/// cadence. Called before every outbound fetch, up to twice per query.
pub fn wait_before_request() {
    let gamma = Gamma::new(SHAPE, SCALE).expect("valid gamma parameters");
    let delay_secs = gamma.sample(&mut rand::thread_rng());
    info!("Waiting {:.2}s before request...", delay_secs);
    thread::sleep(Duration::from_secs_f64(delay_secs));
}
