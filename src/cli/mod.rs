// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All work is delegated to Layer 2 (application); this layer
// only loads the config, routes, and prints results.
//
// The --config flag is global: it can follow any subcommand and
// applies to whichever stages that subcommand runs.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::infra::config_store;
use commands::{
    AugmentArgs, Commands, DocdbArgs, EvaluateArgs, InitConfigArgs, OndbArgs, TransformArgs,
    ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "ink-corpus",
    version = "0.1.0",
    about = "Prepare online handwriting corpora for recognition training and score decoded output."
)]
pub struct Cli {
    /// Pipeline config (JSON); defaults are used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the config, then dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        let config = config_store::load_or_default(self.config.as_deref())?;

        match self.command {
            Commands::OndbToText(args)  => run_ondb(args, config),
            Commands::DocdbToText(args) => run_docdb(args, config),
            Commands::Augment(args)     => run_augment(args, config),
            Commands::Flatten(args)     => run_transform(args, config, Stage::Flatten),
            Commands::Normalize(args)   => run_transform(args, config, Stage::Normalize),
            Commands::ToDelta(args)     => run_transform(args, config, Stage::ToDelta),
            Commands::Validate(args)    => run_validate(args, config),
            Commands::Evaluate(args)    => run_evaluate(args),
            Commands::InitConfig(args)  => run_init_config(args, config),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Flatten,
    Normalize,
    ToDelta,
}

fn run_ondb(args: OndbArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::convert_use_case::ConvertUseCase;
    use crate::data::ondb_loader::OndbLoader;

    tracing::info!("Converting ONDB subset '{}' from '{}'", args.subset, args.root.display());

    let loader  = OndbLoader::new(args.root, args.subset);
    let written = ConvertUseCase::new(Box::new(loader), config.filter).execute(&args.out)?;

    println!("Wrote {} lines to '{}'", written, args.out.display());
    Ok(())
}

fn run_docdb(args: DocdbArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::convert_use_case::ConvertUseCase;
    use crate::data::inkml_loader::InkmlLoader;

    tracing::info!(
        "Converting {:?} from manifest '{}' in '{}'",
        args.data_type,
        args.subset,
        args.root.display()
    );

    let loader  = InkmlLoader::new(args.root, args.subset, args.data_type.into());
    let written = ConvertUseCase::new(Box::new(loader), config.filter).execute(&args.out)?;

    println!("Wrote {} samples to '{}'", written, args.out.display());
    Ok(())
}

fn run_augment(args: AugmentArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let written = PrepareUseCase::new(config).augment(
        &args.from,
        &args.to,
        args.subset.as_deref(),
        args.target_size,
    )?;

    println!("Wrote {} samples to '{}'", written, args.to.display());
    Ok(())
}

fn run_transform(args: TransformArgs, config: PipelineConfig, stage: Stage) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let use_case = PrepareUseCase::new(config);
    let written = match stage {
        Stage::Flatten   => use_case.flatten(&args.from, &args.to)?,
        Stage::Normalize => use_case.normalize(&args.from, &args.to)?,
        Stage::ToDelta   => use_case.to_delta(&args.from, &args.to)?,
    };

    println!("Wrote {} samples to '{}'", written, args.to.display());
    Ok(())
}

fn run_validate(args: ValidateArgs, config: PipelineConfig) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let summary = PrepareUseCase::new(config).validate(&args.path)?;
    for (i, findings) in &summary.flagged {
        let reasons: Vec<String> = findings.iter().map(ToString::to_string).collect();
        println!("Bad line {}: {}", i, reasons.join(","));
    }

    println!("{} of {} samples flagged", summary.flagged.len(), summary.total);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let summary = EvaluateUseCase::new(args.beam_width, args.allowed_chars.as_deref())
        .execute(&args.predictions, args.report.as_deref())?;

    for row in &summary.rows {
        println!("{} -> {} [{:.4}]", row.truth, row.pred, row.cer);
    }

    let exact = summary.rows.iter().filter(|r| r.is_exact()).count();
    println!("Exact matches: {} of {}", exact, summary.rows.len());

    match summary.mean_cer {
        Some(mean) => println!("Mean CER: {mean:.6}"),
        None       => println!("Mean CER: n/a (no samples)"),
    }
    Ok(())
}

fn run_init_config(args: InitConfigArgs, config: PipelineConfig) -> Result<()> {
    config_store::save_config(&args.path, &config)?;
    println!("Wrote pipeline config to '{}'", args.path.display());
    Ok(())
}
