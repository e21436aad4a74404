use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes the global logger.
///
/// When `verbose` is `true`, debug messages are printed. Otherwise only info
/// level and above are shown. With a `file`, output goes there instead of
/// stderr so it does not tear the terminal renderer.
pub fn init(verbose: bool, file: Option<&Path>) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    if let Some(path) = file {
        match File::create(path) {
            Ok(mut handle) => {
                if let Err(err) = write_header(&mut handle) {
                    eprintln!("Could not write to log file {}: {err}", path.display());
                }
                builder.target(Target::Pipe(Box::new(handle)));
            }
            Err(err) => eprintln!("Could not open log file {}: {err}", path.display()),
        }
    }

    // `try_init` only fails if a logger was already set.
    let _ = builder.try_init();
}

fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "# chronotherium session {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}
