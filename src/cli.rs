//! Command line parsing exposed via the library.
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use super::minify;

#[derive(StructOpt)]
#[structopt(about = "Minify JavaScript artifacts with their source maps")]
enum PumiceCommands {
    /// Minify files into an output directory
    Minify {
        /// Options file (JSON)
        #[structopt(short = "c", long = "config", parse(from_os_str))]
        options: Option<PathBuf>,

        /// Output directory
        #[structopt(
            short,
            long,
            parse(from_os_str),
            default_value = "dist"
        )]
        output: PathBuf,

        /// Generate source maps
        #[structopt(short, long)]
        source_map: bool,

        /// Project directory used to shorten paths in diagnostics
        #[structopt(long, parse(from_os_str))]
        context: Option<PathBuf>,

        /// Print diagnostics as JSON
        #[structopt(short, long)]
        json: bool,

        /// Files to minify
        #[structopt(parse(from_os_str), required = true)]
        files: Vec<PathBuf>,
    },
}

/// Parse the given arguments list or `std::env::os_args` and run the program.
pub fn run<T>(argv: Option<Vec<T>>) -> Result<()>
where
    T: Into<OsString> + Clone,
{
    let app = PumiceCommands::clap();
    let matches = if let Some(argv) = argv {
        app.get_matches_from(argv)
    } else {
        app.get_matches()
    };
    let args = PumiceCommands::from_clap(&matches);
    match args {
        PumiceCommands::Minify {
            options,
            output,
            source_map,
            context,
            json,
            files,
        } => minify(files, options, output, source_map, context, json)?,
    }
    Ok(())
}
