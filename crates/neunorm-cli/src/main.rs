use clap::{Parser, Subcommand};
use std::path::PathBuf;

use neunorm_cli::{expand_inputs, parse_export_format, parse_roi};
use neunorm_core::config::{
    load_norm_config, log_config_usage, norm_config_handle, set_verbose, NormConfigHandle,
};
use neunorm_core::progress::ProgressSink;
use neunorm_core::{DataType, NormalizeOptions, Normalization, Roi, RoiSelection};

#[derive(Parser)]
#[command(name = "neunorm")]
#[command(version, about = "Neutron radiograph normalization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize sample radiographs against open beam references
    Normalize {
        /// Sample image files or directories
        #[arg(short, long, value_name = "PATH", required = true, num_args = 1..)]
        sample: Vec<PathBuf>,

        /// Open beam image files or directories
        #[arg(short, long, value_name = "PATH", num_args = 1..)]
        ob: Vec<PathBuf>,

        /// Dark field image files or directories
        #[arg(short, long, value_name = "PATH", num_args = 1..)]
        df: Vec<PathBuf>,

        /// Output directory for normalized images
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// ROI whose intensity must match between sample and OB (repeatable)
        #[arg(long, value_name = "X0,Y0,X1,Y1")]
        roi: Vec<String>,

        /// Crop region applied after normalization
        #[arg(long, value_name = "X0,Y0,X1,Y1")]
        crop: Option<String>,

        /// Export format (tif or fits); defaults to the config file value
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,

        /// Normalize each sample frame by its own ROI mean, no OB needed
        #[arg(long)]
        use_only_sample: bool,

        /// Aggregate OB frames with a per-pixel mean
        #[arg(long)]
        force_mean_ob: bool,

        /// Aggregate OB frames with a per-pixel median
        #[arg(long)]
        force_median_ob: bool,

        /// Disable the automatic gamma pixel filter
        #[arg(long)]
        no_auto_gamma: bool,

        /// Use the threshold-based manual gamma filter instead
        #[arg(long)]
        manual_gamma: bool,

        /// Manual gamma coefficient (0.0 to 1.0)
        #[arg(long, value_name = "FLOAT")]
        manual_gamma_threshold: Option<f32>,

        /// Also export the dark field corrected sample and OB images
        #[arg(long)]
        export_raw: bool,

        /// Config file path
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print progress and config details to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Progress sink that writes "label n/total" lines to stderr
struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn update(&mut self, label: &str, current: usize, total: usize) {
        eprintln!("{} {}/{}", label, current, total);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_normalize(
    sample: Vec<PathBuf>,
    ob: Vec<PathBuf>,
    df: Vec<PathBuf>,
    out: PathBuf,
    roi: Vec<String>,
    crop: Option<String>,
    format: Option<String>,
    use_only_sample: bool,
    force_mean_ob: bool,
    force_median_ob: bool,
    no_auto_gamma: bool,
    manual_gamma: bool,
    manual_gamma_threshold: Option<f32>,
    export_raw: bool,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), String> {
    set_verbose(verbose);

    // an explicit --config path bypasses the process-wide handle
    let custom = config.as_deref().map(|path| load_norm_config(Some(path)));
    let handle: &NormConfigHandle = match &custom {
        Some(handle) => {
            if verbose {
                for warning in &handle.warnings {
                    eprintln!("Config warning: {}", warning);
                }
            }
            handle
        }
        None => {
            log_config_usage();
            norm_config_handle()
        }
    };
    let defaults = &handle.config.defaults;

    let mut load_options = defaults.load_options();
    if no_auto_gamma {
        load_options.auto_gamma_filter = false;
    }
    if manual_gamma {
        load_options.auto_gamma_filter = false;
        load_options.manual_gamma_filter = true;
    }
    if let Some(threshold) = manual_gamma_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!(
                "Manual gamma threshold must be between 0.0 and 1.0, got: {}",
                threshold
            ));
        }
        load_options.manual_gamma_threshold = threshold;
    }

    let export_format = match format {
        Some(name) => parse_export_format(&name)?,
        None => parse_export_format(&defaults.export_format)?,
    };

    let sample_files = expand_inputs(&sample)?;
    if sample_files.is_empty() {
        return Err("No sample images found".to_string());
    }
    let ob_files = expand_inputs(&ob)?;
    if ob_files.is_empty() && !use_only_sample {
        return Err("No open beam images found (use --use-only-sample to normalize without OB)"
            .to_string());
    }
    let df_files = expand_inputs(&df)?;

    let rois = roi
        .iter()
        .map(|text| parse_roi(text))
        .collect::<Result<Vec<Roi>, String>>()?;
    let roi_selection: Option<RoiSelection> = match rois.len() {
        0 => None,
        1 => Some(rois[0].into()),
        _ => Some(rois.into()),
    };
    let crop_roi = crop.as_deref().map(parse_roi).transpose()?;

    let mut pipeline = if verbose {
        Normalization::with_progress(Box::new(StderrProgress))
    } else {
        Normalization::new()
    };

    pipeline
        .load_files(&sample_files, DataType::Sample, &load_options)
        .map_err(|e| e.to_string())?;
    pipeline
        .load_files(&ob_files, DataType::Ob, &load_options)
        .map_err(|e| e.to_string())?;
    pipeline
        .load_files(&df_files, DataType::Df, &load_options)
        .map_err(|e| e.to_string())?;

    if !df_files.is_empty() {
        pipeline.df_correction(false).map_err(|e| e.to_string())?;
    }

    let options = NormalizeOptions {
        roi: roi_selection,
        force: false,
        force_mean_ob,
        force_median_ob,
        use_only_sample,
    };
    pipeline.normalization(&options).map_err(|e| e.to_string())?;

    if let Some(region) = crop_roi {
        pipeline.crop(&region, false).map_err(|e| e.to_string())?;
    }

    // the destination must pre-exist; export fails with a clear error otherwise
    pipeline
        .export(&out, DataType::Normalized, export_format)
        .map_err(|e| e.to_string())?;
    if export_raw {
        for target in [DataType::Sample, DataType::Ob, DataType::Df] {
            pipeline
                .export(&out, target, export_format)
                .map_err(|e| e.to_string())?;
        }
    }

    let count = pipeline.normalized_data().map_or(0, |frames| frames.len());
    println!("Normalized {} image(s) into {}", count, out.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize {
            sample,
            ob,
            df,
            out,
            roi,
            crop,
            format,
            use_only_sample,
            force_mean_ob,
            force_median_ob,
            no_auto_gamma,
            manual_gamma,
            manual_gamma_threshold,
            export_raw,
            config,
            verbose,
        } => cmd_normalize(
            sample,
            ob,
            df,
            out,
            roi,
            crop,
            format,
            use_only_sample,
            force_mean_ob,
            force_median_ob,
            no_auto_gamma,
            manual_gamma,
            manual_gamma_threshold,
            export_raw,
            config,
            verbose,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
