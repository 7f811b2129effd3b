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

use clap::Parser;
use dtm::args::{consume_args, ConsumedArgs, DtmArgs, RunPlan};
use dtm::corpus::read_corpus_from_path;
use dtm::error::PipelineError;
use dtm::logging::configure_logging;
use dtm::pipeline;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    match exec_args(DtmArgs::parse()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn exec_args(args: DtmArgs) -> Result<(), PipelineError> {
    match consume_args(args)? {
        ConsumedArgs::RunConfig(plan) => exec(plan),
        ConsumedArgs::Nothing => Ok(()),
    }
}

/// Execute one pipeline run.
fn exec(plan: RunPlan) -> Result<(), PipelineError> {
    std::fs::create_dir_all(plan.output.as_std_path())?;
    configure_logging(plan.log_level, plan.log_to_file, &plan.output);

    let train = read_corpus_from_path(&plan.train, &plan.config.columns)?;
    let test = read_corpus_from_path(&plan.test, &plan.config.columns)?;
    info!(
        "Loaded {} training and {} test documents.",
        train.len(),
        test.len()
    );

    let (training_matrix, test_matrix) = pipeline::run(&train, &test, &plan.config)?;

    training_matrix.write_csv_to_path(plan.output.join("train_features.csv"))?;
    test_matrix.write_csv_to_path(plan.output.join("test_features.csv"))?;

    let out = BufWriter::new(File::create(plan.output.join("schema.json").as_std_path())?);
    serde_json::to_writer_pretty(out, &training_matrix.feature_schema())?;

    info!("Wrote the matrices and the schema to {}.", plan.output);
    Ok(())
}
