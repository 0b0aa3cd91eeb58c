use std::{
    io::{stdout, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use run_statistics::{
    config::Config,
    config_file::LoadConfigFile,
    export_cycle::{delete_tables, CycleParams, ExportCycle},
    get_terminal_width::get_terminal_width,
    info,
    output::terminal_table::TerminalTableOpts,
    run_folder::{last_n, list_run_folders, parse_run_folders, RunFolder},
    utillib::{
        home::path_resolve_home,
        logging::{set_log_level, LogLevelOpt},
    },
};

const PROGRAM_NAME: &str = "run-statistics";
const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(set_term_width = get_terminal_width(4))]
/// Turn resource usage samples of CI test runs into tables, show
/// them, and upload them to a table store.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// Path to the configuration file (default:
    /// `~/.run-statistics.{json5,json,yml,yaml}`, if present)
    #[clap(long)]
    config: Option<PathBuf>,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Debug, clap::Args)]
struct LakeOpt {
    /// Directory holding the unpacked CI artifacts
    /// (`results_<N>_unpack` folders and metadata files)
    #[clap(long, default_value = "~/DataLake")]
    lake: PathBuf,
}

#[derive(Debug, clap::Args)]
struct BatchOpts {
    #[clap(flatten)]
    lake: LakeOpt,

    /// Name of the system test whose output is evaluated
    #[clap(long)]
    test_name: String,

    /// Artifact file key of the CPU samples (`<key>.out`)
    #[clap(long, default_value = "stat_mapper_stdout")]
    cpu_artifact_key: String,

    /// Artifact file key of the memory samples (`<key>.out`)
    #[clap(long, default_value = "statm_mapper_stdout")]
    memory_artifact_key: String,

    /// Name of the process, as it appears in `/proc/<pid>/stat`
    #[clap(long, default_value = "tedge-mapper")]
    process_name: String,

    /// Number of samples per run
    #[clap(long)]
    data_length: usize,

    /// Number of runs the tables have room for (default: the number
    /// of folders processed)
    #[clap(long)]
    data_amount: Option<usize>,

    /// Only process the last K of the run folders
    #[clap(long)]
    last: Option<usize>,

    /// The run folders to process, in this order. Default: all
    /// `results_<N>_unpack` folders in the lake, ordered by N.
    folders: Vec<String>,
}

impl BatchOpts {
    fn run_folders(&self, lake: &Path) -> Result<Vec<RunFolder>> {
        let folders = if self.folders.is_empty() {
            list_run_folders(lake)?
        } else {
            parse_run_folders(&self.folders)?
        };
        let folders = if let Some(n) = self.last {
            last_n(&folders, n).to_vec()
        } else {
            folders
        };
        if folders.is_empty() {
            bail!("no run folders to process in {lake:?}")
        }
        Ok(folders)
    }

    fn postprocess(&self, config: &Config) -> Result<ExportCycle> {
        let lake = path_resolve_home(&self.lake.lake)?;
        let folders = self.run_folders(&lake)?;
        info!(
            "processing {} run folders, {} .. {}",
            folders.len(),
            folders[0],
            folders[folders.len() - 1]
        );
        let params = CycleParams {
            lake,
            test_name: self.test_name.clone(),
            cpu_artifact_key: self.cpu_artifact_key.clone(),
            memory_artifact_key: self.memory_artifact_key.clone(),
            process_name: self.process_name.clone(),
            data_length: self.data_length,
            data_amount: self.data_amount,
        };
        ExportCycle::postprocess(config, &params, folders)
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print version
    Version,

    /// List the run folders in the lake, ordered by run number
    List {
        #[clap(flatten)]
        lake: LakeOpt,
    },

    /// Build the tables and show them
    Show {
        #[clap(flatten)]
        batch: BatchOpts,

        #[clap(flatten)]
        terminal_table_opts: TerminalTableOpts,

        /// Also write the tables to this Excel file (one worksheet
        /// per table)
        #[clap(long)]
        excel: Option<PathBuf>,
    },

    /// Build the tables and replace them in the configured store
    Upload {
        #[clap(flatten)]
        batch: BatchOpts,

        /// Show the tables, too
        #[clap(long)]
        show: bool,
    },

    /// Delete the tables from the configured store
    Delete,
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        subcommand,
    } = Opts::parse();
    set_log_level(log_level.try_into()?);

    let load_config = || -> Result<Config> {
        let path = config.as_ref().map(|p| path_resolve_home(p)).transpose()?;
        Config::load_config(path)
    };

    match subcommand {
        SubCommand::Version => println!("{PROGRAM_NAME} version {PROGRAM_VERSION}"),
        SubCommand::List { lake } => {
            let lake = path_resolve_home(&lake.lake)?;
            for folder in list_run_folders(&lake)? {
                println!("{}\t{folder}", folder.index());
            }
        }
        SubCommand::Show {
            batch,
            terminal_table_opts,
            excel,
        } => {
            let config = load_config()?;
            let cycle = batch.postprocess(&config)?;
            let out = stdout();
            let is_terminal = out.is_terminal();
            cycle.render(&terminal_table_opts, &mut out.lock(), is_terminal)?;
            if let Some(path) = excel {
                cycle
                    .write_excel(&path)
                    .with_context(|| anyhow!("writing Excel file {path:?}"))?;
            }
        }
        SubCommand::Upload { batch, show } => {
            let config = load_config()?;
            if config.credentials()?.is_some() {
                info!("credentials found in the configured environment variable");
            }
            let cycle = batch.postprocess(&config)?;
            if show {
                let out = stdout();
                let is_terminal = out.is_terminal();
                cycle.render(&TerminalTableOpts::default(), &mut out.lock(), is_terminal)?;
            }
            let mut store = config.open_store()?;
            cycle.upload(&mut *store, &config)?;
        }
        SubCommand::Delete => {
            let config = load_config()?;
            let mut store = config.open_store()?;
            delete_tables(&mut *store, &config)?;
        }
    }

    Ok(())
}
