use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use metaspec_validator::{
    Result, RunConfig, SystemLaunchValidator, ValidationSettings, build_launch_report,
    launch_rules,
};

#[derive(Parser)]
#[command(name = "metaspec-validate")]
#[command(about = "Launch-time validation of master and feed specifications", long_about = None)]
struct Cli {
    /// Verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the master spec and print the active datasets as JSON.
    Validate {
        /// INI run configuration ([DEFAULT] file_hunt_path, [FILES] master_spec_name).
        #[arg(long, conflicts_with_all = ["base_path", "master_spec"])]
        config: Option<String>,

        /// Base metadata directory.
        #[arg(long, requires = "master_spec")]
        base_path: Option<String>,

        /// Master spec file name, relative to the base directory.
        #[arg(long, requires = "base_path")]
        master_spec: Option<String>,

        /// Run every rule and report all failures instead of stopping at the first.
        #[arg(long)]
        collect_all: bool,

        /// Write the report here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,
    },

    /// List the launch rules in execution order.
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Validate {
            config,
            base_path,
            master_spec,
            collect_all,
            out,
        } => {
            // 1) Resolve where the metadata lives.
            let (mut launcher, fail_fast) = match (config, base_path, master_spec) {
                (Some(path), _, _) => {
                    let cfg = RunConfig::from_file(&path)?;
                    tracing::debug!(base_path = %cfg.base_path.display(), "loaded run config");
                    (SystemLaunchValidator::from_config(&cfg), cfg.fail_fast)
                }
                (None, Some(base), Some(name)) => (SystemLaunchValidator::new(base, name), true),
                _ => bail!("either --config or both --base-path and --master-spec are required"),
            };

            // 2) Validate.
            if fail_fast && !collect_all {
                launcher.run()?;
            } else {
                launcher.run_collect_all()?;
            }

            // 3) Report the active subset.
            let active = launcher.get_validated_master_specs()?;
            let report = build_launch_report(launcher.context(), &active)?;
            let json = serde_json::to_string_pretty(&report)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("write report {}", path))?;
                    println!("Wrote {}", path);
                }
                None => println!("{}", json),
            }
        }
        Commands::Rules => {
            for (idx, rule) in launch_rules(&ValidationSettings::default())
                .iter()
                .enumerate()
            {
                println!("{:>2}. {}", idx + 1, rule.name());
            }
        }
    }

    Ok(())
}
