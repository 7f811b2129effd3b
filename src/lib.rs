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

//! Converts a labeled corpus of free-text reviews into class-ready
//! numeric feature matrices for a downstream classifier: per-class
//! vocabulary selection, document-term counting, matrix merging,
//! joining with precomputed aggregate features and projection of the
//! test matrix onto the training schema.

pub mod args;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod logging;
pub mod matrix;
pub mod pipeline;
pub mod tokenizer;
pub mod vocabulary;
