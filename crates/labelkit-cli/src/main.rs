// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use labelkit::{
    Error, ExportAssetState, FeatureKind, LocalAssetProvider, LocalStorage, Progress, Project,
    TfRecordReader, TfRecordsExportOptions, TfRecordsExporter, label_map,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client Command
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Export a project's assets as record files plus a label map. One
    /// record file is written per asset into a `<project>-TFRecords-export`
    /// folder under the project's target connection.
    Export {
        /// Path to the project JSON file
        project: PathBuf,

        /// Which assets to include: all, visited, or tagged
        #[clap(long, default_value = "all")]
        asset_state: String,

        /// Number of assets processed concurrently per batch
        #[clap(long, env = "LABELKIT_BATCH_SIZE")]
        batch_size: Option<usize>,

        /// Override the folder assets are read from
        #[clap(long)]
        source: Option<PathBuf>,

        /// Override the folder exports are written to
        #[clap(long)]
        target: Option<PathBuf>,
    },
    /// Print the label map for a project's tag vocabulary.
    LabelMap {
        /// Path to the project JSON file
        project: PathBuf,
    },
    /// Inspect a record file: report how far it parsed and summarize each
    /// record. Corrupted files are read up to the first bad frame.
    Inspect {
        /// Path to the record file
        file: PathBuf,
    },
}

async fn load_project(path: &Path) -> Result<Project, Error> {
    let text = tokio::fs::read_to_string(path).await?;
    Project::from_json(&text)
}

async fn handle_export(
    project: PathBuf,
    asset_state: String,
    batch_size: Option<usize>,
    source: Option<PathBuf>,
    target: Option<PathBuf>,
) -> Result<(), Error> {
    use indicatif::{ProgressBar, ProgressStyle};
    use tokio::sync::mpsc;

    let project = load_project(&project).await?;
    let source = source.unwrap_or_else(|| PathBuf::from(&project.source_connection));
    let target = target.unwrap_or_else(|| PathBuf::from(&project.target_connection));

    let assets = LocalAssetProvider::new(source);
    let storage = LocalStorage::new(target);
    let options = TfRecordsExportOptions {
        asset_state: ExportAssetState::try_from(asset_state.as_str())?,
        batch_size: batch_size.unwrap_or_else(labelkit::batch_size),
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
        )
        .unwrap()
        .progress_chars("█▇▆▅▄▃▂▁  "),
    );
    bar.set_message(project.name.clone());

    let (tx, mut rx) = mpsc::channel::<Progress>(1);

    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if progress.total > 0 {
                bar.set_length(progress.total as u64);
                bar.set_position(progress.current as u64);
            }
        }
    });

    let exporter = TfRecordsExporter::new(&project, &storage, &assets, options);
    let results = exporter.export(Some(tx)).await?;

    println!(
        "Exported {}/{} assets from project {}",
        results.completed(),
        results.count(),
        project.name
    );
    for failure in results.errors() {
        if let Some(err) = &failure.error {
            println!("  {} failed: {}", failure.asset.name, err);
        }
    }
    Ok(())
}

async fn handle_label_map(project: PathBuf) -> Result<(), Error> {
    let project = load_project(&project).await?;
    print!("{}", label_map(&project.tags));
    Ok(())
}

async fn handle_inspect(file: PathBuf) -> Result<(), Error> {
    let bytes = tokio::fs::read(&file).await?;
    let reader = TfRecordReader::parse(&bytes);

    println!("{} record(s), outcome: {:?}", reader.len(), reader.outcome());

    for (index, record) in reader.records().iter().enumerate() {
        let filename = record
            .feature("image/filename", FeatureKind::String)
            .ok()
            .and_then(|v| v.strings().and_then(|s| s.first().cloned()))
            .unwrap_or_else(|| "<unknown>".to_string());
        let width = record
            .feature("image/width", FeatureKind::Int64)
            .ok()
            .and_then(|v| v.int64s().and_then(|i| i.first().copied()))
            .unwrap_or(0);
        let height = record
            .feature("image/height", FeatureKind::Int64)
            .ok()
            .and_then(|v| v.int64s().and_then(|i| i.first().copied()))
            .unwrap_or(0);
        let objects = record
            .feature("image/object/class/label", FeatureKind::Int64)
            .ok()
            .map(|v| v.int64s().map(|i| i.len()).unwrap_or(0))
            .unwrap_or(0);

        println!(
            "  [{}] {} {}x{} with {} object(s)",
            index, filename, width, height, objects
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.cmd {
        Command::Export {
            project,
            asset_state,
            batch_size,
            source,
            target,
        } => handle_export(project, asset_state, batch_size, source, target).await,
        Command::LabelMap { project } => handle_label_map(project).await,
        Command::Inspect { file } => handle_inspect(file).await,
    }
}
