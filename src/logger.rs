use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// Set up timestamped logging. Verbose mode announces every URL and terminal
/// outcome at info level; quiet mode keeps warnings only. The filter never
/// changes control flow or outcomes.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}
