//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
/// Welcome to dtm
pub struct DtmArgs {
    /// A command to initialize an exemplary config
    #[arg(long)]
    pub generate_example_config: bool,

    /// The mode of dtm
    #[command(subcommand)]
    pub mode: Option<RunMode>,
}

#[derive(Subcommand, Debug)]
pub enum RunMode {
    /// Builds the training and test feature matrices from two corpus csv files.
    BUILD {
        /// The folder the matrices and the schema are written to.
        #[arg(short, long, default_value = "dtm_data")]
        output: Utf8PathBuf,
        /// The pipeline config, discovered in the working directory when not set.
        #[arg(short, long)]
        config: Option<Utf8PathBuf>,
        /// Overrides the negative-class frequency threshold from the config.
        #[arg(long)]
        negative_threshold: Option<f64>,
        /// Overrides the positive-class frequency threshold from the config.
        #[arg(long)]
        positive_threshold: Option<f64>,
        /// Overrides the test frequency threshold from the config.
        #[arg(long)]
        test_threshold: Option<f64>,
        /// The log level of dtm
        #[arg(long, default_value_t = log::LevelFilter::Info)]
        log_level: log::LevelFilter,
        /// Log to file
        #[arg(long)]
        log_to_file: bool,
        /// The labeled training corpus csv.
        train: Utf8PathBuf,
        /// The test corpus csv.
        test: Utf8PathBuf,
    },
}

/// Everything necessary to execute one pipeline run.
#[derive(Debug)]
pub struct RunPlan {
    pub train: Utf8PathBuf,
    pub test: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub log_level: log::LevelFilter,
    pub log_to_file: bool,
    pub config: PipelineConfig,
}

#[derive(Debug)]
pub enum ConsumedArgs {
    RunConfig(RunPlan),
    Nothing,
}

/// Consumes the args and returns everything necessary to execute dtm
pub fn consume_args(args: DtmArgs) -> Result<ConsumedArgs, PipelineError> {
    if let Some(mode) = args.mode {
        match mode {
            RunMode::BUILD {
                output,
                config,
                negative_threshold,
                positive_threshold,
                test_threshold,
                log_level,
                log_to_file,
                train,
                test,
            } => {
                let mut config = match config {
                    None => PipelineConfig::discover_or_default()?,
                    Some(path) => PipelineConfig::load_from_path(path)?,
                };

                if let Some(value) = negative_threshold {
                    config.negative_class_frequency_threshold = value;
                }
                if let Some(value) = positive_threshold {
                    config.positive_class_frequency_threshold = value;
                }
                if let Some(value) = test_threshold {
                    config.test_frequency_threshold = value;
                }
                config.validate()?;

                Ok(ConsumedArgs::RunConfig(RunPlan {
                    train,
                    test,
                    output,
                    log_level,
                    log_to_file,
                    config,
                }))
            }
        }
    } else if args.generate_example_config {
        let config = PipelineConfig::default();
        let mut out = BufWriter::new(
            File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open("dtm.example.yaml")?,
        );
        out.write_all(serde_yaml::to_string(&config)?.as_bytes())?;
        out.write_all(
            b"\n# Rename the file to dtm.yaml to use it as the default config.\n\
              # Every value can be deleted if not needed.\n",
        )?;
        Ok(ConsumedArgs::Nothing)
    } else {
        Ok(ConsumedArgs::Nothing)
    }
}
